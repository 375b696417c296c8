// Library module for imprint
// Re-exports modules for use in integration tests and external crates

pub mod compare;
pub mod digest;
pub mod error;
pub mod export;
pub mod import;
pub mod path_util;
pub mod scan;
pub mod store;
pub mod verify;

// Re-export commonly used types for convenience
pub use compare::{CompareOutcome, Comparer, RenamePair};
pub use digest::{DigestComputer, DigestRegistry, Hasher};
pub use error::ImprintError;
pub use export::{ExportStats, Exporter};
pub use import::{ImportFormat, ImportStats, Importer};
pub use scan::{CalcStats, Calculator, FileFailure};
pub use store::{FingerprintRecord, FingerprintStore};
pub use verify::{VerificationResult, Verifier, VerifyReport, VerifyStatus};
