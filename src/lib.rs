#![forbid(unsafe_code)]
//! # sealpack — chunked encrypted containers for files and messages.
//!
//! `sealpack` encrypts a file or short text message under a user-supplied
//! password into a single self-describing binary container, and decrypts it
//! back. Payloads are processed in bounded-size chunks (5 MiB by default)
//! so peak memory tracks the chunk size, not the input size, and callers
//! see per-chunk progress.
//!
//! ## Schemes
//! - **Symmetric**: Argon2id derives an XChaCha20-Poly1305 key from the
//!   password; each chunk is independently authenticated.
//! - **Asymmetric**: each chunk is sealed to an X25519 recipient key
//!   (ephemeral ECDH + HKDF-SHA256 + XChaCha20-Poly1305). The password is
//!   only fingerprinted (SHA-256) into the header as an access gate.
//!
//! ## Example: encrypt and decrypt a byte payload
//! ```no_run
//! use sealpack::{encrypt_bytes, decrypt_bytes, SealOptions};
//! use secrecy::SecretString;
//!
//! let password = SecretString::new("mypassword".into());
//! let opts = SealOptions::default();
//!
//! let container = encrypt_bytes(b"Hello, world!", "hello.txt", password.clone(), &opts).unwrap();
//! let out = decrypt_bytes(&container, password, &opts).unwrap();
//! assert_eq!(out.plaintext, b"Hello, world!");
//! assert_eq!(out.name, "hello.txt");
//! ```
//!
//! ## Example: drive a task worker
//! ```no_run
//! use sealpack::{spawn_task, Mode, SealOptions, TaskEvent, TaskRequest};
//! use secrecy::SecretString;
//!
//! let handle = spawn_task(TaskRequest {
//!     mode: Mode::Encrypt,
//!     password: SecretString::new("mypassword".into()),
//!     payload: std::fs::read("photo.jpg").unwrap(),
//!     filename: "photo.jpg".into(),
//!     options: SealOptions::default(),
//!     recipient: None,
//!     secret: None,
//! }).unwrap();
//!
//! for event in handle.events.iter() {
//!     match event {
//!         TaskEvent::Progress { percent, stage } => eprintln!("{percent:>3}% {stage}"),
//!         TaskEvent::Completed(output) => { std::fs::write("photo.jpg.enc", &output.bytes).unwrap(); break; }
//!         TaskEvent::Failed(error) => { eprintln!("{error}"); break; }
//!     }
//! }
//! ```
//!
//! Safety notes
//! - The crate is not audited or reviewed! Protects data at rest. Does not defend against compromised hosts/side channels.

mod types;
mod container;
mod kdf;
mod keys;
mod crypto;
mod pipeline;
mod task;
mod armor;
mod file;

// Re-export public API from modules
pub use types::*;
pub use container::{ChunkRecords, Header, decode_header, encode_header};
pub use kdf::{FINGERPRINT_LEN, SALT_LEN, derive_key_argon2id, fingerprint};
pub use keys::{Keypair, load_public, load_secret, public_from_hex, secret_from_hex};
pub use crypto::KeyMaterial;
pub use pipeline::{Decrypted, decrypt_stream, encrypt_stream, validate_chunk_size};
pub use task::{
    ProcessTask, TaskEvent, TaskHandle, TaskOutput, TaskRequest, TaskStatus, spawn_task,
};
pub use armor::{armor_encode, dearmor_decode, looks_armored};
pub use file::{
    decrypt_file_streaming, default_decrypt_output_path, default_out_path, encrypt_file_streaming,
    write_all_atomic,
};

use secrecy::SecretString;

/// Encrypt a byte payload into a container in one call.
///
/// Convenience wrapper over [`encrypt_stream`] with no progress reporting;
/// use the task protocol or the streaming functions for large inputs.
pub fn encrypt_bytes(
    payload: &[u8],
    filename: &str,
    password: SecretString,
    opts: &SealOptions,
) -> Result<Vec<u8>, SealError> {
    let material = KeyMaterial::for_encrypt(opts.scheme, &password, opts.kdf_params, None)?;
    let mut sink = |_: u8, _: &str| true;
    let container = encrypt_stream(
        payload,
        filename,
        &password,
        &material,
        opts.chunk_size,
        &mut sink,
    )?;
    Ok(if opts.armor {
        armor_encode(&container)
    } else {
        container
    })
}

/// Decrypt a container (armored or binary) back into its payload.
pub fn decrypt_bytes(
    data: &[u8],
    password: SecretString,
    opts: &SealOptions,
) -> Result<Decrypted, SealError> {
    let binary;
    let data = if looks_armored(data) {
        binary = dearmor_decode(data)?;
        &binary
    } else {
        data
    };
    let mut sink = |_: u8, _: &str| true;
    decrypt_stream(data, &password, opts.scheme, opts.kdf_params, None, &mut sink)
}
