// Fingerprint store module
// In-memory path-keyed record collection with durable CSV persistence

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use csv::{ReaderBuilder, WriterBuilder};
use xz2::read::XzDecoder;
use xz2::write::XzEncoder;

use super::digest::DigestRegistry;
use super::error::ImprintError;

/// A single fingerprint: path, digest, algorithm
///
/// `path` is a normalized forward-slash relative path and is the unique key
/// within a store. `digest` is opaque hex text, only comparable against digests
/// produced with the same `algorithm`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FingerprintRecord {
    pub path: String,
    pub digest: String,
    pub algorithm: String,
}

impl FingerprintRecord {
    pub fn new(path: impl Into<String>, digest: impl Into<String>, algorithm: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            digest: digest.into(),
            algorithm: algorithm.into(),
        }
    }
}

/// Path-keyed collection of fingerprint records
///
/// Backed by a BTreeMap so iteration (and therefore serialization) is sorted by
/// path and stable across runs.
#[derive(Debug, Default, Clone)]
pub struct FingerprintStore {
    records: BTreeMap<String, FingerprintRecord>,
}

impl FingerprintStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            records: BTreeMap::new(),
        }
    }

    /// Insert or replace the record for its path; always succeeds
    pub fn add(&mut self, record: FingerprintRecord) {
        self.records.insert(record.path.clone(), record);
    }

    /// Look up a record by store path
    pub fn get(&self, path: &str) -> Option<&FingerprintRecord> {
        self.records.get(path)
    }

    /// Check whether a path is already fingerprinted
    pub fn contains(&self, path: &str) -> bool {
        self.records.contains_key(path)
    }

    /// Iterate all records in sorted path order
    pub fn records(&self) -> impl Iterator<Item = &FingerprintRecord> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Check if a path has .xz extension (compressed store)
    pub fn is_compressed(path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext == "xz")
            .unwrap_or(false)
    }

    /// Open a store file, automatically decompressing if it has .xz extension
    fn open_reader(path: &Path) -> Result<Box<dyn Read>, ImprintError> {
        let file = File::open(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ImprintError::StoreNotFound {
                path: path.to_path_buf(),
            },
            _ => ImprintError::from_io_error(e, "opening store", Some(path.to_path_buf())),
        })?;

        if Self::is_compressed(path) {
            Ok(Box::new(XzDecoder::new(file)))
        } else {
            Ok(Box::new(file))
        }
    }

    /// Load a store from its persisted CSV representation
    ///
    /// Each row is `path,digest,algorithm`. A row with the wrong field count is
    /// a fatal `MalformedRecord` error: the native format is strict because the
    /// writer can never produce a bad row.
    pub fn load(path: &Path) -> Result<Self, ImprintError> {
        let reader = Self::open_reader(path)?;
        let mut csv_reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        let mut store = Self::new();
        for (index, result) in csv_reader.records().enumerate() {
            let row = result.map_err(|e| ImprintError::MalformedRecord {
                path: path.to_path_buf(),
                line: index + 1,
                reason: e.to_string(),
            })?;

            if row.len() != 3 {
                return Err(ImprintError::MalformedRecord {
                    path: path.to_path_buf(),
                    line: index + 1,
                    reason: format!("expected 3 fields, found {}", row.len()),
                });
            }

            store.add(FingerprintRecord::new(&row[0], &row[1], &row[2]));
        }

        Ok(store)
    }

    /// Load a store, rejecting records whose algorithm the registry does not know
    pub fn load_checked(path: &Path) -> Result<Self, ImprintError> {
        let store = Self::load(path)?;
        for record in store.records() {
            if !DigestRegistry::is_supported(&record.algorithm) {
                return Err(ImprintError::UnsupportedAlgorithm {
                    algorithm: record.algorithm.clone(),
                });
            }
        }
        Ok(store)
    }

    /// Persist the store as CSV, sorted by path
    ///
    /// Round-trips byte-exactly through `load` for the same content. Targets
    /// with an .xz extension are LZMA compressed.
    pub fn save(&self, path: &Path) -> Result<(), ImprintError> {
        let mut csv_writer = WriterBuilder::new().has_headers(false).from_writer(Vec::new());
        for record in self.records.values() {
            csv_writer
                .write_record([&record.path, &record.digest, &record.algorithm])
                .map_err(|e| ImprintError::StoreWrite {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                })?;
        }
        let buffer = csv_writer
            .into_inner()
            .map_err(|e| ImprintError::StoreWrite {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        let file = File::create(path).map_err(|e| ImprintError::StoreWrite {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let write_result = if Self::is_compressed(path) {
            let mut encoder = XzEncoder::new(file, 6);
            encoder.write_all(&buffer).and_then(|_| encoder.finish().map(|_| ()))
        } else {
            let mut file = file;
            file.write_all(&buffer)
        };

        write_result.map_err(|e| ImprintError::StoreWrite {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}
