// Digest computation module
// Provides the hash algorithm registry and per-file digest computation

use std::fs::File;
use std::io::Read;
use std::path::Path;

use super::error::ImprintError;
use memmap2::Mmap;

/// Trait for hash algorithm implementations
pub trait Hasher: Send {
    /// Update the hasher with new data
    fn update(&mut self, data: &[u8]);

    /// Finalize the hash and return the raw digest bytes
    fn finalize(self: Box<Self>) -> Vec<u8>;

    /// Get the output size in bytes
    fn output_size(&self) -> usize;
}

use blake2::{Blake2b512, Digest as Blake2Digest};
use blake3::Hasher as Blake3Hasher;
use md5::{Digest as Md5Digest, Md5};
use sha1::{Digest as Sha1Digest, Sha1};
use sha2::{Digest as Sha2Digest, Sha256, Sha512};
use sha3::{Digest as Sha3Digest, Sha3_256};
use xxhash_rust::xxh3::Xxh3;

// CRC32 wrapper (IEEE polynomial, the classic checksum-file algorithm)
pub struct Crc32Wrapper(crc32fast::Hasher);

impl Hasher for Crc32Wrapper {
    fn update(&mut self, data: &[u8]) {
        self.0.update(data);
    }

    fn finalize(self: Box<Self>) -> Vec<u8> {
        self.0.finalize().to_be_bytes().to_vec()
    }

    fn output_size(&self) -> usize {
        4 // 32 bits
    }
}

// MD5 wrapper
pub struct Md5Wrapper(Md5);

impl Hasher for Md5Wrapper {
    fn update(&mut self, data: &[u8]) {
        Md5Digest::update(&mut self.0, data);
    }

    fn finalize(self: Box<Self>) -> Vec<u8> {
        Md5Digest::finalize(self.0).to_vec()
    }

    fn output_size(&self) -> usize {
        16 // 128 bits
    }
}

// SHA1 wrapper
pub struct Sha1Wrapper(Sha1);

impl Hasher for Sha1Wrapper {
    fn update(&mut self, data: &[u8]) {
        Sha1Digest::update(&mut self.0, data);
    }

    fn finalize(self: Box<Self>) -> Vec<u8> {
        Sha1Digest::finalize(self.0).to_vec()
    }

    fn output_size(&self) -> usize {
        20 // 160 bits
    }
}

// SHA-256 wrapper
pub struct Sha256Wrapper(Sha256);

impl Hasher for Sha256Wrapper {
    fn update(&mut self, data: &[u8]) {
        Sha2Digest::update(&mut self.0, data);
    }

    fn finalize(self: Box<Self>) -> Vec<u8> {
        Sha2Digest::finalize(self.0).to_vec()
    }

    fn output_size(&self) -> usize {
        32 // 256 bits
    }
}

// SHA-512 wrapper
pub struct Sha512Wrapper(Sha512);

impl Hasher for Sha512Wrapper {
    fn update(&mut self, data: &[u8]) {
        Sha2Digest::update(&mut self.0, data);
    }

    fn finalize(self: Box<Self>) -> Vec<u8> {
        Sha2Digest::finalize(self.0).to_vec()
    }

    fn output_size(&self) -> usize {
        64 // 512 bits
    }
}

// SHA3-256 wrapper
pub struct Sha3_256Wrapper(Sha3_256);

impl Hasher for Sha3_256Wrapper {
    fn update(&mut self, data: &[u8]) {
        Sha3Digest::update(&mut self.0, data);
    }

    fn finalize(self: Box<Self>) -> Vec<u8> {
        Sha3Digest::finalize(self.0).to_vec()
    }

    fn output_size(&self) -> usize {
        32 // 256 bits
    }
}

// BLAKE2b wrapper
pub struct Blake2b512Wrapper(Blake2b512);

impl Hasher for Blake2b512Wrapper {
    fn update(&mut self, data: &[u8]) {
        Blake2Digest::update(&mut self.0, data);
    }

    fn finalize(self: Box<Self>) -> Vec<u8> {
        Blake2Digest::finalize(self.0).to_vec()
    }

    fn output_size(&self) -> usize {
        64 // 512 bits
    }
}

// BLAKE3 wrapper
//
// With the rayon feature enabled, update_rayon() parallelizes hashing of large
// inputs across CPU cores.
pub struct Blake3Wrapper(Blake3Hasher);

impl Hasher for Blake3Wrapper {
    fn update(&mut self, data: &[u8]) {
        self.0.update_rayon(data);
    }

    fn finalize(self: Box<Self>) -> Vec<u8> {
        self.0.finalize().as_bytes().to_vec()
    }

    fn output_size(&self) -> usize {
        32 // 256 bits
    }
}

// XXH3 wrapper (64-bit non-cryptographic hash)
pub struct Xxh3Wrapper(Xxh3);

impl Hasher for Xxh3Wrapper {
    fn update(&mut self, data: &[u8]) {
        self.0.update(data);
    }

    fn finalize(self: Box<Self>) -> Vec<u8> {
        self.0.digest().to_be_bytes().to_vec()
    }

    fn output_size(&self) -> usize {
        8 // 64 bits
    }
}

/// Registry for hash algorithms
pub struct DigestRegistry;

impl DigestRegistry {
    /// Get a hasher instance for the specified algorithm
    pub fn get_hasher(algorithm: &str) -> Result<Box<dyn Hasher>, ImprintError> {
        let alg_lower = algorithm.to_lowercase();

        match alg_lower.as_str() {
            "crc32" => Ok(Box::new(Crc32Wrapper(crc32fast::Hasher::new()))),
            "md5" => Ok(Box::new(Md5Wrapper(Md5Digest::new()))),
            "sha1" => Ok(Box::new(Sha1Wrapper(Sha1Digest::new()))),
            "sha256" | "sha-256" => Ok(Box::new(Sha256Wrapper(Sha2Digest::new()))),
            "sha512" | "sha-512" => Ok(Box::new(Sha512Wrapper(Sha2Digest::new()))),
            "sha3-256" => Ok(Box::new(Sha3_256Wrapper(Sha3Digest::new()))),
            "blake2b" | "blake2b-512" => Ok(Box::new(Blake2b512Wrapper(Blake2Digest::new()))),
            "blake3" => Ok(Box::new(Blake3Wrapper(Blake3Hasher::new()))),
            "xxh3" => Ok(Box::new(Xxh3Wrapper(Xxh3::new()))),
            _ => Err(ImprintError::UnsupportedAlgorithm {
                algorithm: algorithm.to_string(),
            }),
        }
    }

    /// Check whether an algorithm name is known to the registry
    pub fn is_supported(algorithm: &str) -> bool {
        Self::get_hasher(algorithm).is_ok()
    }

    /// List all available algorithm names
    pub fn algorithm_names() -> Vec<&'static str> {
        vec![
            "crc32", "md5", "sha1", "sha256", "sha512", "sha3-256", "blake2b", "blake3", "xxh3",
        ]
    }
}

// Constants for memory mapping
const MMAP_THRESHOLD: u64 = 2 * 1024 * 1024 * 1024; // 2GB

/// Digest computer with streaming I/O
pub struct DigestComputer {
    buffer_size: usize,
}

impl DigestComputer {
    /// Create a new DigestComputer with default buffer size (1MB)
    pub fn new() -> Self {
        Self {
            buffer_size: 1024 * 1024,
        }
    }

    /// Create a new DigestComputer with custom buffer size
    pub fn with_buffer_size(buffer_size: usize) -> Self {
        Self { buffer_size }
    }

    /// Compute the hex digest of an in-memory byte slice
    pub fn digest_bytes(&self, data: &[u8], algorithm: &str) -> Result<String, ImprintError> {
        let mut hasher = DigestRegistry::get_hasher(algorithm)?;
        hasher.update(data);
        Ok(bytes_to_hex(&hasher.finalize()))
    }

    /// Compute the hex digest of a file using memory mapping or streaming I/O
    ///
    /// Files smaller than 2GB are memory mapped to avoid kernel-to-userspace copy
    /// overhead; larger and empty files fall back to buffered reads.
    pub fn digest_file(&self, path: &Path, algorithm: &str) -> Result<String, ImprintError> {
        let mut hasher = DigestRegistry::get_hasher(algorithm)?;

        let file = File::open(path)
            .map_err(|e| ImprintError::from_io_error(e, "reading", Some(path.to_path_buf())))?;

        let file_size = file
            .metadata()
            .map_err(|e| {
                ImprintError::from_io_error(e, "reading metadata", Some(path.to_path_buf()))
            })?
            .len();

        if file_size > 0 && file_size < MMAP_THRESHOLD {
            // Mapping can still fail on exotic filesystems; fall back to reads
            match unsafe { Mmap::map(&file) } {
                Ok(mmap) => hasher.update(&mmap[..]),
                Err(_) => self.hash_with_buffered_io(&mut hasher, file, path)?,
            }
        } else {
            self.hash_with_buffered_io(&mut hasher, file, path)?;
        }

        Ok(bytes_to_hex(&hasher.finalize()))
    }

    fn hash_with_buffered_io(
        &self,
        hasher: &mut Box<dyn Hasher>,
        mut file: File,
        path: &Path,
    ) -> Result<(), ImprintError> {
        let mut buffer = vec![0u8; self.buffer_size];

        loop {
            let bytes_read = file.read(&mut buffer).map_err(|e| {
                ImprintError::from_io_error(e, "reading", Some(path.to_path_buf()))
            })?;
            if bytes_read == 0 {
                break;
            }
            hasher.update(&buffer[..bytes_read]);
        }

        Ok(())
    }
}

impl Default for DigestComputer {
    fn default() -> Self {
        Self::new()
    }
}

/// Convert bytes to hexadecimal string
pub fn bytes_to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
