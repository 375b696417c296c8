// Comparison module
// Reconciles an old fingerprint snapshot against a live directory to detect
// files whose content is unchanged but whose path moved

use std::collections::{HashMap, HashSet};
use std::path::Path;

use csv::WriterBuilder;

use super::error::ImprintError;
use super::scan::{CalcStats, Calculator};
use super::store::FingerprintStore;

/// One detected move: content existed at `old_path`, now lives at `new_path`
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct RenamePair {
    pub old_path: String,
    pub new_path: String,
}

/// Result of a compare-and-match run
///
/// `residual` holds only records for genuinely new or content-changed files,
/// suitable for persisting as the next baseline.
#[derive(Debug)]
pub struct CompareOutcome {
    pub renames: Vec<RenamePair>,
    pub residual: FingerprintStore,
    pub unchanged: usize,
    pub stats: CalcStats,
}

impl CompareOutcome {
    /// Print a human-readable summary
    pub fn display(&self) {
        println!("\n=== Rename Detection Report ===\n");

        println!("Summary:");
        println!("  Unchanged files: {}", self.unchanged);
        println!("  Renamed files:   {}", self.renames.len());
        println!("  New or changed:  {}", self.residual.len());

        if !self.renames.is_empty() {
            println!("\nRenamed Files:");
            for pair in &self.renames {
                println!("  {} -> {}", pair.old_path, pair.new_path);
            }
        }

        if !self.residual.is_empty() {
            println!("\nNew or Changed Files:");
            for record in self.residual.records() {
                println!("  {}", record.path);
            }
        }

        println!();
    }

    /// Format the outcome as JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        #[derive(serde::Serialize)]
        struct JsonOutput<'a> {
            metadata: Metadata,
            summary: Summary,
            renames: &'a [RenamePair],
            new_or_changed: Vec<&'a str>,
        }

        #[derive(serde::Serialize)]
        struct Metadata {
            timestamp: String,
        }

        #[derive(serde::Serialize)]
        struct Summary {
            unchanged_count: usize,
            renamed_count: usize,
            new_or_changed_count: usize,
        }

        let output = JsonOutput {
            metadata: Metadata {
                timestamp: chrono::Utc::now().to_rfc3339(),
            },
            summary: Summary {
                unchanged_count: self.unchanged,
                renamed_count: self.renames.len(),
                new_or_changed_count: self.residual.len(),
            },
            renames: &self.renames,
            new_or_changed: self.residual.records().map(|r| r.path.as_str()).collect(),
        };

        serde_json::to_string_pretty(&output)
    }

    /// Persist the rename pairs as a two-column CSV (old path, new path)
    pub fn save_renames(&self, path: &Path) -> Result<(), ImprintError> {
        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .from_path(path)
            .map_err(|e| ImprintError::StoreWrite {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        for pair in &self.renames {
            writer
                .write_record([&pair.old_path, &pair.new_path])
                .map_err(|e| ImprintError::StoreWrite {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                })?;
        }

        writer.flush().map_err(|e| ImprintError::StoreWrite {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}

/// Engine for matching an old snapshot against a freshly calculated one
pub struct Comparer {
    calculator: Calculator,
}

impl Comparer {
    /// Create a new Comparer with sequential hashing
    pub fn new() -> Self {
        Self {
            calculator: Calculator::new(),
        }
    }

    /// Create a new Comparer with parallel hashing control
    pub fn with_parallel(parallel: bool) -> Self {
        Self {
            calculator: Calculator::with_parallel(parallel),
        }
    }

    /// Calculate fingerprints for `input_dir` and match them against `old_store`
    ///
    /// Digest equality is the only identity signal, so matching is only valid
    /// within one algorithm: any old record fingerprinted with a different
    /// algorithm is a fatal configuration error, caught before any hashing.
    ///
    /// Duplicate digests are expected, not an error. Matching is deterministic:
    /// an old path identical to a new path is always consumed by that new path
    /// (an unmoved duplicate is never stolen), then remaining new records in
    /// lexicographic order pair with remaining old paths in lexicographic
    /// order. Old paths left over are presumed deleted and go unreported.
    pub fn compare_and_match(
        &self,
        old_store: &FingerprintStore,
        input_dir: &Path,
        algorithm: &str,
        base_path: &Path,
    ) -> Result<CompareOutcome, ImprintError> {
        for record in old_store.records() {
            if !record.algorithm.eq_ignore_ascii_case(algorithm) {
                return Err(ImprintError::AlgorithmMismatch {
                    expected: algorithm.to_string(),
                    found: record.algorithm.clone(),
                    record: record.path.clone(),
                });
            }
        }

        let mut new_store = FingerprintStore::new();
        let stats =
            self.calculator
                .calculate(&mut new_store, input_dir, algorithm, base_path, false)?;

        // Digest -> old paths sharing it; BTreeMap iteration keeps each group
        // in lexicographic order
        let mut old_index: HashMap<&str, Vec<&str>> = HashMap::new();
        for record in old_store.records() {
            old_index
                .entry(record.digest.as_str())
                .or_default()
                .push(record.path.as_str());
        }

        let mut unchanged = 0;
        let mut matched_new: HashSet<&str> = HashSet::new();

        // Pass 1: exact-path matches first, so an unmoved duplicate always
        // matches itself regardless of what other new paths share its digest
        for record in new_store.records() {
            if let Some(candidates) = old_index.get_mut(record.digest.as_str()) {
                if let Some(pos) = candidates.iter().position(|p| *p == record.path) {
                    candidates.remove(pos);
                    matched_new.insert(record.path.as_str());
                    unchanged += 1;
                }
            }
        }

        // Pass 2: remaining new records consume remaining old paths one-to-one
        let mut renames = Vec::new();
        for record in new_store.records() {
            if matched_new.contains(record.path.as_str()) {
                continue;
            }
            if let Some(candidates) = old_index.get_mut(record.digest.as_str()) {
                if !candidates.is_empty() {
                    let old_path = candidates.remove(0);
                    renames.push(RenamePair {
                        old_path: old_path.to_string(),
                        new_path: record.path.clone(),
                    });
                    matched_new.insert(record.path.as_str());
                }
            }
        }

        // Whatever was not explained by an old record is genuinely new content
        let mut residual = FingerprintStore::new();
        for record in new_store.records() {
            if !matched_new.contains(record.path.as_str()) {
                residual.add(record.clone());
            }
        }

        Ok(CompareOutcome {
            renames,
            residual,
            unchanged,
            stats,
        })
    }
}

impl Default for Comparer {
    fn default() -> Self {
        Self::new()
    }
}
