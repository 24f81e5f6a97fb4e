//! Streaming file hasher.
//!
//! # Overview
//!
//! This module provides the [`Hasher`] struct for computing content digests
//! of whole files. Files are read in fixed-size chunks so memory use does not
//! depend on file size.
//!
//! Three algorithms are available:
//! - [`HashAlgorithm::Blake3`] (default)
//! - [`HashAlgorithm::Sha256`]
//! - [`HashAlgorithm::Md5`], fingerprints compatible with the legacy dedupe script
//!
//! # Example
//!
//! ```no_run
//! use dirdedupe::scanner::{HashAlgorithm, Hasher};
//! use std::path::Path;
//!
//! let hasher = Hasher::new(HashAlgorithm::Blake3);
//! match hasher.hash_file(Path::new("photo.jpg")) {
//!     Ok(digest) => println!("{}", digest),
//!     Err(e) => eprintln!("Warning: {}", e),
//! }
//! ```

use std::fmt;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sha2::Digest as _;

use super::HashError;

/// Size of the read buffer used when streaming a file (64 KiB).
pub const HASH_BUFFER_SIZE: usize = 64 * 1024;

/// Largest digest produced by any supported algorithm, in bytes.
const MAX_DIGEST_LEN: usize = 32;

/// Content digest algorithm.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// BLAKE3 (32-byte digest)
    #[default]
    Blake3,
    /// SHA-256 (32-byte digest)
    Sha256,
    /// MD5 (16-byte digest)
    Md5,
}

impl HashAlgorithm {
    /// Length of the digest in bytes.
    #[must_use]
    pub const fn digest_len(self) -> usize {
        match self {
            Self::Blake3 | Self::Sha256 => 32,
            Self::Md5 => 16,
        }
    }

    /// Lowercase algorithm name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Blake3 => "blake3",
            Self::Sha256 => "sha256",
            Self::Md5 => "md5",
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A fixed-length content fingerprint.
///
/// Digests produced by different algorithms never compare equal.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Digest {
    algorithm: HashAlgorithm,
    bytes: [u8; MAX_DIGEST_LEN],
}

impl Digest {
    fn from_slice(algorithm: HashAlgorithm, slice: &[u8]) -> Self {
        let mut bytes = [0u8; MAX_DIGEST_LEN];
        bytes[..slice.len()].copy_from_slice(slice);
        Self { algorithm, bytes }
    }

    /// The algorithm that produced this digest.
    #[must_use]
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// The digest bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.algorithm.digest_len()]
    }

    /// Lowercase hexadecimal rendering.
    #[must_use]
    pub fn to_hex(&self) -> String {
        self.as_bytes().iter().map(|b| format!("{:02x}", b)).collect()
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.to_hex())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self)
    }
}

/// Incremental state for one digest computation.
enum HashState {
    Blake3(Box<blake3::Hasher>),
    Sha256(sha2::Sha256),
    Md5(md5::Md5),
}

impl HashState {
    fn new(algorithm: HashAlgorithm) -> Self {
        match algorithm {
            HashAlgorithm::Blake3 => Self::Blake3(Box::new(blake3::Hasher::new())),
            HashAlgorithm::Sha256 => Self::Sha256(sha2::Sha256::new()),
            HashAlgorithm::Md5 => Self::Md5(md5::Md5::new()),
        }
    }

    fn update(&mut self, chunk: &[u8]) {
        match self {
            Self::Blake3(h) => {
                h.update(chunk);
            }
            Self::Sha256(h) => h.update(chunk),
            Self::Md5(h) => h.update(chunk),
        }
    }

    fn finalize(self) -> Digest {
        match self {
            Self::Blake3(h) => Digest::from_slice(HashAlgorithm::Blake3, h.finalize().as_bytes()),
            Self::Sha256(h) => Digest::from_slice(HashAlgorithm::Sha256, &h.finalize()),
            Self::Md5(h) => Digest::from_slice(HashAlgorithm::Md5, &h.finalize()),
        }
    }
}

/// Streaming content hasher.
///
/// A single `Hasher` is shared by all workers of a scan. It keeps a count of
/// hash attempts so callers can observe how much hashing a phase performed.
#[derive(Debug)]
pub struct Hasher {
    algorithm: HashAlgorithm,
    buffer_size: usize,
    shutdown_flag: Option<Arc<AtomicBool>>,
    calls: AtomicUsize,
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new(HashAlgorithm::default())
    }
}

impl Hasher {
    /// Create a hasher for the given algorithm.
    #[must_use]
    pub fn new(algorithm: HashAlgorithm) -> Self {
        Self {
            algorithm,
            buffer_size: HASH_BUFFER_SIZE,
            shutdown_flag: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Override the read chunk size (minimum 1 byte).
    #[must_use]
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size.max(1);
        self
    }

    /// Set the shutdown flag; hashing stops between chunks once it is set.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// The configured algorithm.
    #[must_use]
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Number of files this hasher has been asked to hash.
    #[must_use]
    pub fn hash_calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Compute the digest of a file's full contents.
    ///
    /// Reads the file in chunks of the configured buffer size. Empty files
    /// hash like any other file.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] if the file cannot be opened or read, or if
    /// shutdown was requested mid-read. The error is the "unreadable" result;
    /// it is never a panic.
    pub fn hash_file(&self, path: &Path) -> Result<Digest, HashError> {
        self.calls.fetch_add(1, Ordering::Relaxed);

        if self.is_shutdown_requested() {
            return Err(HashError::Interrupted(path.to_path_buf()));
        }

        let mut file = File::open(path).map_err(|e| HashError::from_io(path.to_path_buf(), e))?;
        let mut state = HashState::new(self.algorithm);
        let mut buffer = vec![0u8; self.buffer_size];

        loop {
            if self.is_shutdown_requested() {
                return Err(HashError::Interrupted(path.to_path_buf()));
            }
            match file.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => state.update(&buffer[..n]),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(HashError::from_io(path.to_path_buf(), e)),
            }
        }

        let digest = state.finalize();
        log::trace!("Hashed {} -> {}", path.display(), digest);
        Ok(digest)
    }

    /// Compute the digest of an in-memory buffer.
    #[must_use]
    pub fn hash_bytes(&self, data: &[u8]) -> Digest {
        let mut state = HashState::new(self.algorithm);
        state.update(data);
        state.finalize()
    }
}
