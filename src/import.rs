// Import module
// Parses foreign checksum-file text formats into a fingerprint store

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use super::digest::DigestRegistry;
use super::error::ImprintError;
use super::path_util;
use super::store::{FingerprintRecord, FingerprintStore};

/// Foreign source format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportFormat {
    /// Line-oriented Unix convention: `<hexdigest>  <path>` (two spaces)
    ChecksumList,
    /// File-manager listing: `filename;digest`, one entry per line
    CommanderListing,
}

/// Counts collected during an import
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct ImportStats {
    pub imported: usize,
    pub skipped: usize,
}

/// Parser for foreign checksum files
///
/// Neither supported format self-describes its algorithm, so the caller names
/// it. Malformed lines are skipped with a warning: a partially corrupt file
/// still yields a usable partial store.
pub struct Importer;

impl Importer {
    pub fn new() -> Self {
        Importer
    }

    /// Detect the format of a checksum file by reading its first few lines
    pub fn detect_format(path: &Path) -> Result<ImportFormat, ImprintError> {
        let file = File::open(path).map_err(|e| {
            ImprintError::from_io_error(e, "opening checksum file", Some(path.to_path_buf()))
        })?;
        let reader = BufReader::new(file);

        for line_result in reader.lines().take(10) {
            let line = line_result.map_err(|e| {
                ImprintError::from_io_error(e, "reading checksum file", Some(path.to_path_buf()))
            })?;
            let trimmed = line.trim();

            if trimmed.is_empty() {
                continue;
            }
            if trimmed.contains(';') {
                return Ok(ImportFormat::CommanderListing);
            }
            if trimmed.contains("  ") {
                return Ok(ImportFormat::ChecksumList);
            }
        }

        // Default to the Unix convention if we cannot determine
        Ok(ImportFormat::ChecksumList)
    }

    /// Import a foreign checksum file, auto-detecting its format
    pub fn import(
        &self,
        source: &Path,
        algorithm: &str,
    ) -> Result<(FingerprintStore, ImportStats), ImprintError> {
        let format = Self::detect_format(source)?;
        self.import_as(source, algorithm, format)
    }

    /// Import a foreign checksum file with an explicitly selected format
    pub fn import_as(
        &self,
        source: &Path,
        algorithm: &str,
        format: ImportFormat,
    ) -> Result<(FingerprintStore, ImportStats), ImprintError> {
        // The foreign formats cannot name their algorithm; reject unknown ones
        // before parsing anything
        if !DigestRegistry::is_supported(algorithm) {
            return Err(ImprintError::UnsupportedAlgorithm {
                algorithm: algorithm.to_string(),
            });
        }

        let file = File::open(source).map_err(|e| {
            ImprintError::from_io_error(e, "opening checksum file", Some(source.to_path_buf()))
        })?;
        let reader = BufReader::new(file);

        let mut store = FingerprintStore::new();
        let mut imported = 0;
        let mut skipped = 0;

        for (line_num, line_result) in reader.lines().enumerate() {
            let line = line_result.map_err(|e| {
                ImprintError::from_io_error(e, "reading checksum file", Some(source.to_path_buf()))
            })?;

            if line.trim().is_empty() {
                continue;
            }

            let parsed = match format {
                ImportFormat::ChecksumList => parse_checksum_line(&line),
                ImportFormat::CommanderListing => parse_listing_line(&line),
            };

            match parsed {
                Some((path, digest)) => {
                    store.add(FingerprintRecord::new(path, digest, algorithm));
                    imported += 1;
                }
                None => {
                    eprintln!(
                        "Warning: Skipping malformed line {} in {}: {}",
                        line_num + 1,
                        source.display(),
                        line
                    );
                    skipped += 1;
                }
            }
        }

        Ok((store, ImportStats { imported, skipped }))
    }
}

impl Default for Importer {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse one `<hexdigest>  <path>` line; returns (store path, digest)
///
/// The path may carry the Unix tools' binary-mode `*` marker, which is not part
/// of the name. Returns None if the line is malformed.
pub fn parse_checksum_line(line: &str) -> Option<(String, String)> {
    let (digest, path) = line.split_once("  ")?;
    let digest = digest.trim();
    let path = path.trim().trim_start_matches('*');

    if digest.is_empty() || path.is_empty() {
        return None;
    }
    if !digest.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }

    Some((path_util::normalize(path), digest.to_string()))
}

/// Parse one `filename;digest` listing line; returns (store path, digest)
pub fn parse_listing_line(line: &str) -> Option<(String, String)> {
    let (name, digest) = line.trim().split_once(';')?;
    let name = name.trim();
    let digest = digest.trim();

    if name.is_empty() || digest.is_empty() {
        return None;
    }
    if !digest.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }

    Some((path_util::normalize(name), digest.to_string()))
}
