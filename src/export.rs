// Export module
// Serializes a fingerprint store into per-directory file-manager checksum
// listings, filtered by a name pattern

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobMatcher};

use super::error::ImprintError;
use super::path_util;
use super::store::FingerprintStore;

/// Counts collected during an export
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct ExportStats {
    pub files_written: usize,
    pub records_exported: usize,
}

/// Name filter: empty matches all, wildcards become a glob, anything else is a
/// plain substring match on the file name
enum NameFilter {
    All,
    Glob(GlobMatcher),
    Substring(String),
}

impl NameFilter {
    fn parse(pattern: &str) -> Result<Self, ImprintError> {
        if pattern.is_empty() {
            return Ok(NameFilter::All);
        }
        if contains_wildcard(pattern) {
            let glob = Glob::new(pattern).map_err(|e| ImprintError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            })?;
            return Ok(NameFilter::Glob(glob.compile_matcher()));
        }
        Ok(NameFilter::Substring(pattern.to_string()))
    }

    fn matches(&self, file_name: &str) -> bool {
        match self {
            NameFilter::All => true,
            NameFilter::Glob(matcher) => matcher.is_match(file_name),
            NameFilter::Substring(needle) => file_name.contains(needle),
        }
    }
}

/// Check if a string contains wildcard characters
pub fn contains_wildcard(s: &str) -> bool {
    s.contains('*') || s.contains('?') || s.contains('[')
}

/// Writer of per-directory checksum listings
pub struct Exporter;

impl Exporter {
    pub fn new() -> Self {
        Exporter
    }

    /// Export the matching subset of a store under `output_dir`
    ///
    /// Records are partitioned by their parent directory; each directory gets
    /// one `checksums.<algorithm>` listing with `filename;digest` entries
    /// sorted by filename, mirroring the file-manager convention of one
    /// checksum file per directory.
    ///
    /// Each listing is written in a single call: a write failure is fatal and
    /// leaves no partially written file referenced, while listings already
    /// written are independent outputs and stay.
    pub fn export(
        &self,
        store: &FingerprintStore,
        output_dir: &Path,
        name_pattern: &str,
    ) -> Result<ExportStats, ImprintError> {
        let filter = NameFilter::parse(name_pattern)?;

        // (directory, algorithm) -> sorted entries; records within a store
        // normally share one algorithm, but a mixed store still partitions
        // cleanly instead of producing a listing that lies about its digests
        let mut groups: BTreeMap<(String, String), Vec<(String, String)>> = BTreeMap::new();
        let mut records_exported = 0;

        for record in store.records() {
            let (dir, name) = path_util::split_dir_name(&record.path);
            if !filter.matches(name) {
                continue;
            }
            groups
                .entry((dir.to_string(), record.algorithm.clone()))
                .or_default()
                .push((name.to_string(), record.digest.clone()));
            records_exported += 1;
        }

        let mut files_written = 0;

        for ((dir, algorithm), mut entries) in groups {
            entries.sort();

            let target_dir = if dir.is_empty() {
                output_dir.to_path_buf()
            } else {
                output_dir.join(PathBuf::from(&dir))
            };

            fs::create_dir_all(&target_dir).map_err(|e| ImprintError::StoreWrite {
                path: target_dir.clone(),
                reason: e.to_string(),
            })?;

            let mut content = String::new();
            for (name, digest) in &entries {
                content.push_str(name);
                content.push(';');
                content.push_str(digest);
                content.push('\n');
            }

            let listing_path = target_dir.join(format!("checksums.{}", algorithm));
            fs::write(&listing_path, content).map_err(|e| ImprintError::StoreWrite {
                path: listing_path.clone(),
                reason: e.to_string(),
            })?;

            files_written += 1;
        }

        Ok(ExportStats {
            files_written,
            records_exported,
        })
    }
}

impl Default for Exporter {
    fn default() -> Self {
        Self::new()
    }
}
