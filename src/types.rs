//! Core types and enums for sealpack.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default chunk size for splitting payloads (5 MiB).
pub const DEFAULT_CHUNK_SIZE: usize = 5 * 1024 * 1024;

/// Maximum UTF-8 byte length of a filename embedded in a container header.
pub const MAX_NAME_LEN: usize = 255;

/// Cipher scheme applied to every chunk of a container.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum Scheme {
    /// Password-derived key (Argon2id) with XChaCha20-Poly1305 per chunk.
    #[default]
    Symmetric,
    /// X25519 sealed box per chunk; the password only gates access via its
    /// fingerprint and is never used as key material.
    Asymmetric,
}

/// Direction of a processing task.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Mode {
    Encrypt,
    Decrypt,
}

/// What kind of input a task was fed. Only affects how the calling layer
/// presents the result (file download vs. armored text).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum InputKind {
    File,
    Message,
}

/// Tunable Argon2id parameters (mem_kib in KiB).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct KdfParams {
    pub t_cost: u32,
    pub mem_kib: u32,
    pub parallelism: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            t_cost: 3,
            mem_kib: 64 * 1024,
            parallelism: (num_cpus::get() as u32).clamp(1, 4),
        }
    }
}

/// Options shared by the encrypt and decrypt paths.
#[derive(Debug, Clone)]
pub struct SealOptions {
    pub scheme: Scheme,
    pub kdf_params: KdfParams,
    /// Chunk size in bytes for splitting the payload.
    pub chunk_size: usize,
    /// When `true`, wraps the binary container in an ASCII-armored envelope
    /// (Base64) for copy/paste of short messages.
    pub armor: bool,
    /// When `true`, allow overwriting existing output file paths.
    pub force: bool,
}

impl Default for SealOptions {
    fn default() -> Self {
        Self {
            scheme: Scheme::default(),
            kdf_params: KdfParams::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            armor: false,
            force: false,
        }
    }
}

impl SealOptions {
    /// Enable/disable ASCII armor in a Clippy-friendly way.
    pub fn with_armor(mut self, on: bool) -> Self {
        self.armor = on;
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }
}

/// Metadata the calling layer keeps next to a container. Only `name` is
/// embedded in the container itself.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileMetadata {
    pub name: String,
    pub size: u64,
    pub mime_type: String,
    pub original_extension: Option<String>,
}

/// Library error type (no panics for expected failures).
#[derive(Error, Debug)]
pub enum SealError {
    #[error("I/O error")]
    Io(#[from] std::io::Error),
    /// AEAD tag or sealed-box failure. Deliberately ambiguous between a
    /// wrong key and corrupted ciphertext.
    #[error("encryption/decryption failure")]
    Crypto,
    /// The password fingerprint embedded in the container does not match.
    #[error("password fingerprint mismatch")]
    AuthenticationFailed,
    #[error("malformed container: {0}")]
    InvalidFormat(&'static str),
    #[error("filename too long ({0} bytes, max 255)")]
    FilenameTooLong(usize),
    /// A worker context could not be created for the task.
    #[error("worker context unavailable")]
    WorkerUnavailable,
    /// The remote decrypt endpoint was unreachable or returned a non-2xx.
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("operation cancelled")]
    Cancelled,
    #[error("invalid argument: {0}")]
    Invalid(&'static str),
}
