//! X25519 keypair provisioning for the asymmetric scheme.
//!
//! Key files are lowercase hex, one key per file; the secret half is
//! written with 0600 permissions on Unix.

use std::fs;
use std::path::Path;

use getrandom::fill as getrandom;
use x25519_dalek::{PublicKey, StaticSecret};
use zeroize::Zeroize;

use crate::file::write_all_atomic;
use crate::types::SealError;

/// An X25519 keypair. The secret half is only reachable by reference so it
/// stays inside this struct until the task that needs it clones it.
pub struct Keypair {
    public: PublicKey,
    secret: StaticSecret,
}

impl Keypair {
    /// Generate a fresh keypair from the system RNG.
    pub fn generate() -> Result<Self, SealError> {
        let mut bytes = [0u8; 32];
        getrandom(&mut bytes).map_err(|_| SealError::Crypto)?;
        let secret = StaticSecret::from(bytes);
        bytes.zeroize();
        let public = PublicKey::from(&secret);
        Ok(Self { public, secret })
    }

    pub fn public(&self) -> &PublicKey {
        &self.public
    }

    pub fn secret(&self) -> &StaticSecret {
        &self.secret
    }

    /// Write both halves to disk, the secret with 0600 permissions.
    pub fn save(&self, public_path: &Path, secret_path: &Path) -> Result<(), SealError> {
        write_all_atomic(public_path, hex::encode(self.public.as_bytes()).as_bytes(), false)?;
        write_all_atomic(secret_path, hex::encode(self.secret.to_bytes()).as_bytes(), true)?;
        Ok(())
    }
}

fn decode_key_bytes(hex_str: &str) -> Result<[u8; 32], SealError> {
    let bytes = hex::decode(hex_str.trim()).map_err(|_| SealError::Invalid("key file is not valid hex"))?;
    if bytes.len() != 32 {
        return Err(SealError::Invalid("key must be 32 bytes (64 hex chars)"));
    }
    let mut out = [0u8; 32];
    out.copy_from_slice(&bytes);
    Ok(out)
}

/// Parse a recipient public key from its hex encoding.
pub fn public_from_hex(hex_str: &str) -> Result<PublicKey, SealError> {
    decode_key_bytes(hex_str).map(PublicKey::from)
}

/// Parse a secret key from its hex encoding.
pub fn secret_from_hex(hex_str: &str) -> Result<StaticSecret, SealError> {
    let mut bytes = decode_key_bytes(hex_str)?;
    let secret = StaticSecret::from(bytes);
    bytes.zeroize();
    Ok(secret)
}

/// Load a recipient public key from a hex file.
pub fn load_public(path: &Path) -> Result<PublicKey, SealError> {
    let contents = fs::read_to_string(path)?;
    public_from_hex(&contents)
}

/// Load a secret key from a hex file.
pub fn load_secret(path: &Path) -> Result<StaticSecret, SealError> {
    let mut contents = fs::read_to_string(path)?;
    let secret = secret_from_hex(&contents);
    contents.zeroize();
    secret
}
