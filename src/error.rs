// Centralized error handling module
// Provides error types with context for all fingerprint operations

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Main error type for the fingerprint tool
/// Provides context-rich error messages with file paths and operations
#[derive(Debug)]
pub enum ImprintError {
    /// File system errors with context
    FileNotFound { path: PathBuf },
    DirectoryNotFound { path: PathBuf },
    PermissionDenied { path: PathBuf, operation: String },
    IoError { path: Option<PathBuf>, operation: String, source: io::Error },

    /// Digest computation errors
    UnsupportedAlgorithm { algorithm: String },

    /// Store errors
    StoreNotFound { path: PathBuf },
    MalformedRecord { path: PathBuf, line: usize, reason: String },
    StoreWrite { path: PathBuf, reason: String },

    /// Comparison errors
    AlgorithmMismatch { expected: String, found: String, record: String },

    /// Export errors
    InvalidPattern { pattern: String, reason: String },
}

impl fmt::Display for ImprintError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            // File system errors
            ImprintError::FileNotFound { path } => {
                writeln!(f, "File not found: {}", path.display())?;
                write!(f, "Suggestion: Check that the file path is correct and the file exists")
            }
            ImprintError::DirectoryNotFound { path } => {
                writeln!(f, "Directory not found: {}", path.display())?;
                write!(f, "Suggestion: Check that the directory path is correct and the directory exists")
            }
            ImprintError::PermissionDenied { path, operation } => {
                writeln!(f, "Permission denied while {} file: {}", operation, path.display())?;
                write!(f, "Suggestion: Check file permissions or run with appropriate privileges")
            }
            ImprintError::IoError { path, operation, source } => {
                if let Some(p) = path {
                    writeln!(f, "I/O error while {} file {}: {}", operation, p.display(), source)?;
                } else {
                    writeln!(f, "I/O error while {}: {}", operation, source)?;
                }
                write!(f, "Suggestion: Check file permissions and disk space")
            }

            // Digest computation errors
            ImprintError::UnsupportedAlgorithm { algorithm } => {
                writeln!(f, "Unsupported hash algorithm: {}", algorithm)?;
                write!(f, "Suggestion: Use one of crc32, md5, sha1, sha256, sha512, sha3-256, blake2b, blake3, xxh3")
            }

            // Store errors
            ImprintError::StoreNotFound { path } => {
                writeln!(f, "Fingerprint store file not found: {}", path.display())?;
                write!(f, "Suggestion: Create a store first using the 'calculate' command")
            }
            ImprintError::MalformedRecord { path, line, reason } => {
                writeln!(f, "Error parsing store {} at line {}: {}", path.display(), line, reason)?;
                write!(f, "Suggestion: Check that the store file format is correct (path,digest,algorithm)")
            }
            ImprintError::StoreWrite { path, reason } => {
                writeln!(f, "Failed to write store {}: {}", path.display(), reason)?;
                write!(f, "Suggestion: Check disk space and write permissions")
            }

            // Comparison errors
            ImprintError::AlgorithmMismatch { expected, found, record } => {
                writeln!(
                    f,
                    "Algorithm mismatch: record {} was fingerprinted with {} but {} was requested",
                    record, found, expected
                )?;
                write!(f, "Suggestion: Recalculate the old snapshot with the requested algorithm, or compare with the stored one")
            }

            // Export errors
            ImprintError::InvalidPattern { pattern, reason } => {
                writeln!(f, "Invalid name pattern '{}': {}", pattern, reason)?;
                write!(f, "Suggestion: Use a shell-style glob such as '*.txt' or a plain substring")
            }
        }
    }
}

impl std::error::Error for ImprintError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ImprintError::IoError { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl ImprintError {
    /// Create an IoError with context about the operation and optional path
    pub fn from_io_error(err: io::Error, operation: &str, path: Option<PathBuf>) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => {
                if let Some(p) = path {
                    if operation.contains("directory") || operation.contains("walking") {
                        ImprintError::DirectoryNotFound { path: p }
                    } else {
                        ImprintError::FileNotFound { path: p }
                    }
                } else {
                    ImprintError::IoError {
                        path: None,
                        operation: operation.to_string(),
                        source: err,
                    }
                }
            }
            io::ErrorKind::PermissionDenied => {
                if let Some(p) = path {
                    ImprintError::PermissionDenied {
                        path: p,
                        operation: operation.to_string(),
                    }
                } else {
                    ImprintError::IoError {
                        path: None,
                        operation: operation.to_string(),
                        source: err,
                    }
                }
            }
            _ => ImprintError::IoError {
                path,
                operation: operation.to_string(),
                source: err,
            },
        }
    }
}

impl From<io::Error> for ImprintError {
    fn from(err: io::Error) -> Self {
        ImprintError::from_io_error(err, "unknown operation", None)
    }
}
