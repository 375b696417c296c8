// Verification module
// Re-hashes every stored fingerprint against live file content

use std::path::Path;
use std::sync::{Arc, Mutex};

use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;

use super::digest::DigestComputer;
use super::error::ImprintError;
use super::path_util;
use super::scan::FileFailure;
use super::store::FingerprintStore;

/// Outcome of checking one record against the filesystem
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum VerifyStatus {
    Ok,
    Mismatch,
    Missing,
}

/// One record's verification result
///
/// `actual` is populated for Ok and Mismatch; a missing file has no digest.
#[derive(Debug, Clone, serde::Serialize)]
pub struct VerificationResult {
    pub path: String,
    pub expected: String,
    pub actual: Option<String>,
    pub status: VerifyStatus,
}

/// Report of verification results
#[derive(Debug, serde::Serialize)]
pub struct VerifyReport {
    pub results: Vec<VerificationResult>,
    pub failures: Vec<FileFailure>,
}

impl VerifyReport {
    pub fn ok_count(&self) -> usize {
        self.count(VerifyStatus::Ok)
    }

    pub fn mismatch_count(&self) -> usize {
        self.count(VerifyStatus::Mismatch)
    }

    pub fn missing_count(&self) -> usize {
        self.count(VerifyStatus::Missing)
    }

    fn count(&self, status: VerifyStatus) -> usize {
        self.results.iter().filter(|r| r.status == status).count()
    }

    /// True when every record verified clean
    pub fn is_clean(&self) -> bool {
        self.mismatch_count() == 0 && self.missing_count() == 0 && self.failures.is_empty()
    }

    /// Display a detailed report of verification results
    pub fn display(&self) {
        let has_issues = !self.is_clean();

        println!("\n================================================================");
        if has_issues {
            println!("                  FILE CHANGES DETECTED                         ");
        } else {
            println!("                       ALL GOOD                                 ");
        }
        println!("================================================================\n");

        println!("Verification Summary:");
        println!("  Matches:        {}", self.ok_count());
        println!("  Mismatches:     {}", self.mismatch_count());
        println!("  Missing files:  {}", self.missing_count());
        println!("  Read failures:  {}", self.failures.len());

        if !has_issues {
            println!("\nAll files match the store. No changes detected.");
            println!("Total files verified: {}", self.results.len());
            return;
        }

        let mismatches: Vec<_> = self
            .results
            .iter()
            .filter(|r| r.status == VerifyStatus::Mismatch)
            .collect();
        if !mismatches.is_empty() {
            println!("\n--- Files with Changed Content ({}) ---", mismatches.len());
            for result in mismatches {
                println!();
                println!("  File: {}", result.path);
                println!("    Expected: {}", result.expected);
                println!(
                    "    Actual:   {}",
                    result.actual.as_deref().unwrap_or("<unavailable>")
                );
            }
            println!("----------------------------------------------------------------");
        }

        let missing: Vec<_> = self
            .results
            .iter()
            .filter(|r| r.status == VerifyStatus::Missing)
            .collect();
        if !missing.is_empty() {
            println!("\n--- Deleted Files ({}) ---", missing.len());
            println!("(in store but not in filesystem)");
            for result in missing {
                println!("  - {}", result.path);
            }
            println!("----------------------------------------------------------------");
        }

        if !self.failures.is_empty() {
            println!("\n--- Unreadable Files ({}) ---", self.failures.len());
            for failure in &self.failures {
                println!("  ! {}: {}", failure.path.display(), failure.message);
            }
            println!("----------------------------------------------------------------");
        }
    }

    /// Format the report as JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        #[derive(serde::Serialize)]
        struct JsonOutput<'a> {
            metadata: Metadata,
            summary: Summary,
            results: &'a [VerificationResult],
            failures: &'a [FileFailure],
        }

        #[derive(serde::Serialize)]
        struct Metadata {
            timestamp: String,
        }

        #[derive(serde::Serialize)]
        struct Summary {
            ok_count: usize,
            mismatch_count: usize,
            missing_count: usize,
            failure_count: usize,
        }

        let output = JsonOutput {
            metadata: Metadata {
                timestamp: chrono::Utc::now().to_rfc3339(),
            },
            summary: Summary {
                ok_count: self.ok_count(),
                mismatch_count: self.mismatch_count(),
                missing_count: self.missing_count(),
                failure_count: self.failures.len(),
            },
            results: &self.results,
            failures: &self.failures,
        };

        serde_json::to_string_pretty(&output)
    }
}

/// Engine for verifying stored fingerprints against file content
pub struct Verifier {
    computer: DigestComputer,
    parallel: bool,
}

impl Verifier {
    /// Create a new sequential Verifier
    pub fn new() -> Self {
        Self {
            computer: DigestComputer::new(),
            parallel: false,
        }
    }

    /// Create a new Verifier with parallel hashing control
    pub fn with_parallel(parallel: bool) -> Self {
        Self {
            computer: DigestComputer::new(),
            parallel,
        }
    }

    /// Check every record in the store against `base_path/<record.path>`
    ///
    /// Each record is recomputed with its own recorded algorithm. The run never
    /// aborts early and never mutates the store: corruption in one file must
    /// not hide the status of any other.
    pub fn verify(
        &self,
        store: &FingerprintStore,
        base_path: &Path,
    ) -> Result<VerifyReport, ImprintError> {
        if self.parallel {
            self.verify_parallel(store, base_path)
        } else {
            self.verify_sequential(store, base_path)
        }
    }

    fn verify_sequential(
        &self,
        store: &FingerprintStore,
        base_path: &Path,
    ) -> Result<VerifyReport, ImprintError> {
        let mut results = Vec::with_capacity(store.len());
        let mut failures = Vec::new();

        let pb = ProgressBar::new(store.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%) | {msg}")
                .unwrap()
                .progress_chars("=>-"),
        );

        for record in store.records() {
            pb.set_message(format!("Verifying: {}", record.path));

            match self.check_record(record, base_path) {
                Ok(result) => results.push(result),
                Err(failure) => {
                    eprintln!(
                        "Warning: Failed to hash {}: {}",
                        failure.path.display(),
                        failure.message
                    );
                    failures.push(failure);
                }
            }

            pb.inc(1);
        }

        pb.finish_and_clear();

        Ok(VerifyReport { results, failures })
    }

    fn verify_parallel(
        &self,
        store: &FingerprintStore,
        base_path: &Path,
    ) -> Result<VerifyReport, ImprintError> {
        let failures = Arc::new(Mutex::new(Vec::new()));

        let pb = ProgressBar::new(store.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%) | {msg}")
                .unwrap()
                .progress_chars("=>-"),
        );

        let failures_clone = Arc::clone(&failures);
        let pb_clone = pb.clone();

        let records: Vec<_> = store.records().collect();
        let mut results: Vec<VerificationResult> = records
            .par_iter()
            .filter_map(|record| {
                let result = match self.check_record(record, base_path) {
                    Ok(result) => Some(result),
                    Err(failure) => {
                        eprintln!(
                            "Warning: Failed to hash {}: {}",
                            failure.path.display(),
                            failure.message
                        );
                        let mut list = failures_clone.lock().unwrap();
                        list.push(failure);
                        None
                    }
                };
                pb_clone.inc(1);
                result
            })
            .collect();

        pb.finish_and_clear();

        // Deterministic report order regardless of worker scheduling
        results.sort_by(|a, b| a.path.cmp(&b.path));

        let mut failures = Arc::try_unwrap(failures)
            .map(|m| m.into_inner().unwrap())
            .unwrap_or_default();
        failures.sort_by(|a, b| a.path.cmp(&b.path));

        Ok(VerifyReport { results, failures })
    }

    /// Classify a single record; a present-but-unreadable file is a recoverable
    /// failure, not a verdict
    fn check_record(
        &self,
        record: &super::store::FingerprintRecord,
        base_path: &Path,
    ) -> Result<VerificationResult, FileFailure> {
        let file_path = path_util::resolve(&record.path, base_path);

        if !file_path.is_file() {
            return Ok(VerificationResult {
                path: record.path.clone(),
                expected: record.digest.clone(),
                actual: None,
                status: VerifyStatus::Missing,
            });
        }

        match self.computer.digest_file(&file_path, &record.algorithm) {
            Ok(actual) => {
                let status = if actual == record.digest {
                    VerifyStatus::Ok
                } else {
                    VerifyStatus::Mismatch
                };
                Ok(VerificationResult {
                    path: record.path.clone(),
                    expected: record.digest.clone(),
                    actual: Some(actual),
                    status,
                })
            }
            Err(e) => Err(FileFailure {
                path: file_path,
                message: e.to_string(),
            }),
        }
    }
}

impl Default for Verifier {
    fn default() -> Self {
        Self::new()
    }
}
