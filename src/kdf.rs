//! Password fingerprinting and key derivation.
//!
//! Two distinct one-way transforms of the user's password live here:
//!
//! - [`fingerprint`] is a plain SHA-256 digest embedded in every container
//!   header. It only gates access on the asymmetric path and is never used
//!   as key material.
//! - [`derive_key_argon2id`] turns the password into a 32-byte AEAD key via
//!   Argon2id for the symmetric scheme. Same `(password, salt, params)`
//!   always yields the same key, so decrypt can reproduce the encrypt-time
//!   key from the salt carried alongside the ciphertext.
//!
//! # Security Guidelines
//!
//! - Use `SecretString` from the `secrecy` crate for password storage
//! - Derived keys are returned in a `Zeroizing` wrapper; do not copy them out
//! - Salts must be cryptographically random and unique per encryption

use argon2::{Algorithm, Argon2, Params, Version};
use getrandom::fill as getrandom;
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::types::{KdfParams, SealError};

/// Byte length of the password fingerprint (SHA-256).
pub const FINGERPRINT_LEN: usize = 32;

/// Byte length of the Argon2id salt carried with symmetric chunks.
pub const SALT_LEN: usize = 16;

/// Minimum salt length accepted for key derivation (8 bytes).
const MIN_SALT_LENGTH: usize = 8;

/// Compute the SHA-256 fingerprint of a password's UTF-8 bytes.
///
/// This is an access check, not key material: anyone holding the container
/// can attempt to brute-force it offline, so it must never protect the
/// payload on its own.
pub fn fingerprint(password: &SecretString) -> [u8; FINGERPRINT_LEN] {
    let digest = Sha256::digest(password.expose_secret().as_bytes());
    digest.into()
}

/// Generate a fresh random salt for key derivation.
pub fn generate_salt() -> Result<[u8; SALT_LEN], SealError> {
    let mut salt = [0u8; SALT_LEN];
    getrandom(&mut salt).map_err(|_| SealError::Crypto)?;
    Ok(salt)
}

/// Derive a 32-byte key from a password using Argon2id.
///
/// # Errors
///
/// Returns `SealError::Invalid` if the salt is shorter than 8 bytes or the
/// Argon2id parameters are rejected (zero parallelism, out-of-range memory
/// cost); `SealError::Crypto` if the derivation itself fails. Failures are
/// loud so a misconfigured primitive can never silently produce a weak key.
pub fn derive_key_argon2id(
    password: &SecretString,
    salt: &[u8],
    params: KdfParams,
) -> Result<Zeroizing<[u8; 32]>, SealError> {
    if salt.len() < MIN_SALT_LENGTH {
        return Err(SealError::Invalid("kdf: salt must be at least 8 bytes"));
    }

    let argon_params = Params::new(params.mem_kib, params.t_cost, params.parallelism, Some(32))
        .map_err(|_| SealError::Invalid("kdf: invalid Argon2id params"))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon_params);
    let mut out = Zeroizing::new([0u8; 32]);

    argon2
        .hash_password_into(password.expose_secret().as_bytes(), salt, out.as_mut())
        .map_err(|_| SealError::Crypto)?;

    Ok(out)
}
