// Calculation module
// Walks a directory tree and populates a fingerprint store with per-file digests

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Sender};
use indicatif::{ProgressBar, ProgressStyle};
use jwalk::WalkDir;
use rayon::prelude::*;

use super::digest::{DigestComputer, DigestRegistry};
use super::error::ImprintError;
use super::path_util;
use super::store::{FingerprintRecord, FingerprintStore};

/// A per-file failure collected during a walk; never aborts the batch
#[derive(Debug, Clone, serde::Serialize)]
pub struct FileFailure {
    pub path: PathBuf,
    pub message: String,
}

/// Statistics collected during a calculation
#[derive(Debug, Clone, serde::Serialize)]
pub struct CalcStats {
    pub files_hashed: usize,
    pub files_skipped: usize,
    pub failures: Vec<FileFailure>,
    pub total_bytes: u64,
    #[serde(serialize_with = "serialize_duration")]
    pub duration: Duration,
}

// Helper function to serialize Duration as seconds
fn serialize_duration<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_f64(duration.as_secs_f64())
}

impl CalcStats {
    /// Print a human-readable summary
    pub fn display(&self) {
        println!("\nCalculation complete!");
        println!("Files fingerprinted: {}", self.files_hashed);
        println!("Files skipped:       {}", self.files_skipped);
        println!("Files failed:        {}", self.failures.len());
        println!(
            "Total bytes: {} ({:.2} MB)",
            self.total_bytes,
            self.total_bytes as f64 / 1_048_576.0
        );
        println!("Duration: {:.2}s", self.duration.as_secs_f64());

        if self.duration.as_secs_f64() > 0.0 {
            let throughput_mbps =
                (self.total_bytes as f64 / 1_048_576.0) / self.duration.as_secs_f64();
            println!("Throughput: {:.2} MB/s", throughput_mbps);
        }
    }
}

/// Engine for populating a fingerprint store from live filesystem content
pub struct Calculator {
    computer: DigestComputer,
    parallel: bool,
}

impl Calculator {
    /// Create a new sequential Calculator
    pub fn new() -> Self {
        Self {
            computer: DigestComputer::new(),
            parallel: false,
        }
    }

    /// Create a new Calculator with parallel hashing control
    pub fn with_parallel(parallel: bool) -> Self {
        Self {
            computer: DigestComputer::new(),
            parallel,
        }
    }

    /// Fingerprint every regular file under `root`
    ///
    /// Paths are recorded relative to `base_path`, normalized to forward
    /// slashes. With `incremental` set, files whose store path is already
    /// present are skipped without re-hashing ("missing only" mode); otherwise
    /// every file is hashed and its record overwritten.
    ///
    /// Mutates the store in place; persisting it is the caller's concern.
    /// Unreadable files are collected in the returned stats, not fatal.
    pub fn calculate(
        &self,
        store: &mut FingerprintStore,
        root: &Path,
        algorithm: &str,
        base_path: &Path,
        incremental: bool,
    ) -> Result<CalcStats, ImprintError> {
        // Reject unknown algorithms before touching the filesystem
        DigestRegistry::get_hasher(algorithm)?;

        if !root.is_dir() {
            return Err(ImprintError::DirectoryNotFound {
                path: root.to_path_buf(),
            });
        }

        let start_time = Instant::now();

        if self.parallel {
            self.calculate_parallel(store, root, algorithm, base_path, incremental, start_time)
        } else {
            self.calculate_sequential(store, root, algorithm, base_path, incremental, start_time)
        }
    }

    /// Sequential implementation
    fn calculate_sequential(
        &self,
        store: &mut FingerprintStore,
        root: &Path,
        algorithm: &str,
        base_path: &Path,
        incremental: bool,
        start_time: Instant,
    ) -> Result<CalcStats, ImprintError> {
        let files = collect_files(root);

        let mut files_hashed = 0;
        let mut files_skipped = 0;
        let mut failures = Vec::new();
        let mut total_bytes = 0u64;

        let pb = ProgressBar::new(files.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%) | {msg}")
                .unwrap()
                .progress_chars("=>-"),
        );

        for file_path in files.iter() {
            pb.set_message(format!(
                "{} OK, {} skipped, {} failed",
                files_hashed,
                files_skipped,
                failures.len()
            ));

            let store_path = path_util::to_store_path(file_path, base_path);

            if incremental && store.contains(&store_path) {
                files_skipped += 1;
                pb.inc(1);
                continue;
            }

            match self.computer.digest_file(file_path, algorithm) {
                Ok(digest) => {
                    total_bytes += fs::metadata(file_path).map(|m| m.len()).unwrap_or(0);
                    store.add(FingerprintRecord::new(store_path, digest, algorithm));
                    files_hashed += 1;
                }
                Err(e) => {
                    eprintln!("Warning: Failed to hash {}: {}", file_path.display(), e);
                    failures.push(FileFailure {
                        path: file_path.clone(),
                        message: e.to_string(),
                    });
                }
            }

            pb.inc(1);
        }

        pb.finish_and_clear();

        Ok(CalcStats {
            files_hashed,
            files_skipped,
            failures,
            total_bytes,
            duration: start_time.elapsed(),
        })
    }

    /// Parallel implementation: a walker thread streams paths into a bounded
    /// channel, rayon workers hash them, and the store is updated only after
    /// the collect barrier so the result is identical to a sequential run
    fn calculate_parallel(
        &self,
        store: &mut FingerprintStore,
        root: &Path,
        algorithm: &str,
        base_path: &Path,
        incremental: bool,
        start_time: Instant,
    ) -> Result<CalcStats, ImprintError> {
        // Snapshot of already-known paths; the store itself is not shared with
        // the worker threads
        let known_paths: HashSet<String> = if incremental {
            store.records().map(|r| r.path.clone()).collect()
        } else {
            HashSet::new()
        };

        let files_skipped = Arc::new(Mutex::new(0usize));
        let failures = Arc::new(Mutex::new(Vec::new()));

        let pb = ProgressBar::new(0);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {pos} files | {msg}")
                .unwrap()
                .progress_chars("=>-"),
        );

        let (sender, receiver) = bounded::<PathBuf>(10000);
        let walker_root = root.to_path_buf();
        let walker_handle = thread::spawn(move || walk_streaming(&walker_root, sender));

        let base = base_path.to_path_buf();
        let files_skipped_clone = Arc::clone(&files_skipped);
        let failures_clone = Arc::clone(&failures);
        let pb_clone = pb.clone();

        let mut results: Vec<(String, String, u64)> = receiver
            .into_iter()
            .par_bridge()
            .filter_map(|file_path| {
                let store_path = path_util::to_store_path(&file_path, &base);

                if incremental && known_paths.contains(&store_path) {
                    let mut skipped = files_skipped_clone.lock().unwrap();
                    *skipped += 1;
                    pb_clone.inc(1);
                    return None;
                }

                let computer = DigestComputer::new();
                let result = match computer.digest_file(&file_path, algorithm) {
                    Ok(digest) => {
                        let size = fs::metadata(&file_path).map(|m| m.len()).unwrap_or(0);
                        Some((store_path, digest, size))
                    }
                    Err(e) => {
                        eprintln!("Warning: Failed to hash {}: {}", file_path.display(), e);
                        let mut list = failures_clone.lock().unwrap();
                        list.push(FileFailure {
                            path: file_path.clone(),
                            message: e.to_string(),
                        });
                        None
                    }
                };

                pb_clone.inc(1);
                result
            })
            .collect();

        if let Err(e) = walker_handle.join() {
            eprintln!("Warning: Walker thread panicked: {:?}", e);
        }

        pb.finish_and_clear();

        // All hashing is finished here; merge into the store deterministically
        results.sort_by(|a, b| a.0.cmp(&b.0));

        let mut total_bytes = 0u64;
        let files_hashed = results.len();
        for (store_path, digest, size) in results {
            total_bytes += size;
            store.add(FingerprintRecord::new(store_path, digest, algorithm));
        }

        let mut failures = Arc::try_unwrap(failures)
            .map(|m| m.into_inner().unwrap())
            .unwrap_or_default();
        failures.sort_by(|a, b| a.path.cmp(&b.path));

        let files_skipped = *files_skipped.lock().unwrap();
        Ok(CalcStats {
            files_hashed,
            files_skipped,
            failures,
            total_bytes,
            duration: start_time.elapsed(),
        })
    }
}

impl Default for Calculator {
    fn default() -> Self {
        Self::new()
    }
}

/// Recursively collect all regular files under a root, in sorted order
///
/// Walk errors are warned and skipped so one unreadable directory never hides
/// the rest of the tree.
pub fn collect_files(root: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for entry_result in WalkDir::new(root)
        .sort(true)
        .skip_hidden(false)
        .follow_links(false)
    {
        match entry_result {
            Ok(entry) => {
                if entry.file_type().is_file() {
                    files.push(entry.path());
                }
            }
            Err(e) => {
                eprintln!("Warning: Error walking directory: {}", e);
            }
        }
    }

    files.sort();
    files
}

/// Walk a directory and stream file paths into a channel as they are found
fn walk_streaming(root: &Path, sender: Sender<PathBuf>) {
    for entry_result in WalkDir::new(root)
        .parallelism(jwalk::Parallelism::RayonNewPool(0))
        .skip_hidden(false)
        .follow_links(false)
    {
        match entry_result {
            Ok(entry) => {
                if !entry.file_type().is_file() {
                    continue;
                }
                // A send error means the receiver is gone; stop walking
                if sender.send(entry.path()).is_err() {
                    break;
                }
            }
            Err(e) => {
                eprintln!("Warning: Error walking directory: {}", e);
            }
        }
    }
}
