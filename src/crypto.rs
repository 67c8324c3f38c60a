//! Per-chunk cipher strategies.
//!
//! Every chunk ciphertext is a self-contained envelope; no state is shared
//! between chunks, so record order only matters for reassembly.
//!
//! Symmetric envelope:
//! ```text
//! [16 bytes: Argon2id salt][24 bytes: random nonce][N bytes: ciphertext + 16-byte tag]
//! ```
//!
//! Asymmetric envelope (sealed box):
//! ```text
//! [32 bytes: ephemeral X25519 public key][24 bytes: random nonce][N bytes: ciphertext + 16-byte tag]
//! ```
//! The sealed-box key is HKDF-SHA256 over the ephemeral ECDH shared secret,
//! salted with both public keys so the ciphertext is bound to the exchange.

use chacha20poly1305::{
    XChaCha20Poly1305, XNonce,
    aead::{Aead, KeyInit},
};
use getrandom::fill as getrandom;
use hkdf::Hkdf;
use secrecy::SecretString;
use sha2::Sha256;
use x25519_dalek::{PublicKey, StaticSecret};
use zeroize::{Zeroize, Zeroizing};

use crate::kdf::{self, SALT_LEN};
use crate::types::{KdfParams, Scheme, SealError};

/// XChaCha20-Poly1305 nonce length.
pub const NONCE_LEN: usize = 24;

/// AEAD authentication tag length.
pub const AEAD_TAG_LEN: usize = 16;

/// X25519 public key length.
pub const PUBLIC_KEY_LEN: usize = 32;

/// Framing bytes a symmetric envelope adds around the AEAD output.
pub const SYMMETRIC_OVERHEAD: usize = SALT_LEN + NONCE_LEN + AEAD_TAG_LEN;

/// Framing bytes an asymmetric envelope adds around the AEAD output.
pub const ASYMMETRIC_OVERHEAD: usize = PUBLIC_KEY_LEN + NONCE_LEN + AEAD_TAG_LEN;

const SEAL_CONTEXT: &[u8] = b"sealpack/x25519-chunk-seal/v1";

/// A password-derived AEAD key together with the salt that produced it.
pub struct SymmetricKey {
    key: Zeroizing<[u8; 32]>,
    salt: [u8; SALT_LEN],
}

impl SymmetricKey {
    /// Derive from `password` under `salt`. Long-running (Argon2id); do this
    /// once per task, not per chunk.
    pub fn derive(
        password: &SecretString,
        salt: [u8; SALT_LEN],
        params: KdfParams,
    ) -> Result<Self, SealError> {
        let key = kdf::derive_key_argon2id(password, &salt, params)?;
        Ok(Self { key, salt })
    }
}

/// Key material for one task, selected once and applied uniformly to every
/// chunk. The three variants cover the symmetric scheme and both directions
/// of the asymmetric scheme.
pub enum KeyMaterial {
    /// Password-derived key; salt travels in each chunk envelope.
    Symmetric(SymmetricKey),
    /// Recipient public key (asymmetric encrypt side).
    Recipient(PublicKey),
    /// Private key (asymmetric decrypt side).
    Keypair(StaticSecret),
}

impl KeyMaterial {
    /// Build encrypt-side material for `scheme`. Symmetric derivation uses a
    /// fresh random salt; asymmetric requires a recipient key.
    pub fn for_encrypt(
        scheme: Scheme,
        password: &SecretString,
        params: KdfParams,
        recipient: Option<&PublicKey>,
    ) -> Result<Self, SealError> {
        match scheme {
            Scheme::Symmetric => {
                let salt = kdf::generate_salt()?;
                Ok(Self::Symmetric(SymmetricKey::derive(password, salt, params)?))
            }
            Scheme::Asymmetric => recipient
                .copied()
                .map(Self::Recipient)
                .ok_or(SealError::Invalid("asymmetric encryption requires a recipient public key")),
        }
    }

    /// Encrypt one chunk, producing a self-contained envelope.
    pub fn cipher_chunk(&self, plaintext: &[u8]) -> Result<Vec<u8>, SealError> {
        match self {
            Self::Symmetric(sym) => {
                let nonce = generate_nonce()?;
                let cipher = XChaCha20Poly1305::new_from_slice(sym.key.as_ref())
                    .map_err(|_| SealError::Crypto)?;
                let ct = cipher
                    .encrypt(XNonce::from_slice(&nonce), plaintext)
                    .map_err(|_| SealError::Crypto)?;

                let mut out = Vec::with_capacity(SALT_LEN + NONCE_LEN + ct.len());
                out.extend_from_slice(&sym.salt);
                out.extend_from_slice(&nonce);
                out.extend_from_slice(&ct);
                Ok(out)
            }
            Self::Recipient(recipient) => seal_to(recipient, plaintext),
            Self::Keypair(_) => Err(SealError::Invalid("key material is decrypt-only")),
        }
    }

    /// Decrypt one chunk envelope.
    ///
    /// Fails with [`SealError::Crypto`] if the tag does not verify — the
    /// caller cannot tell a wrong key from corrupted ciphertext, and the
    /// error deliberately preserves that ambiguity.
    pub fn decipher_chunk(&self, envelope: &[u8]) -> Result<Vec<u8>, SealError> {
        match self {
            Self::Symmetric(sym) => {
                if envelope.len() < SYMMETRIC_OVERHEAD {
                    return Err(SealError::InvalidFormat("chunk envelope too short"));
                }
                let (salt, rest) = envelope.split_at(SALT_LEN);
                if salt != sym.salt {
                    return Err(SealError::Crypto);
                }
                let (nonce, ct) = rest.split_at(NONCE_LEN);
                let cipher = XChaCha20Poly1305::new_from_slice(sym.key.as_ref())
                    .map_err(|_| SealError::Crypto)?;
                cipher
                    .decrypt(XNonce::from_slice(nonce), ct)
                    .map_err(|_| SealError::Crypto)
            }
            Self::Keypair(secret) => open_with(secret, envelope),
            Self::Recipient(_) => Err(SealError::Invalid("key material is encrypt-only")),
        }
    }
}

/// Read the salt out of a symmetric chunk envelope without deciphering it.
/// Decrypt uses this to derive the task key from the first record.
pub fn envelope_salt(envelope: &[u8]) -> Result<[u8; SALT_LEN], SealError> {
    if envelope.len() < SYMMETRIC_OVERHEAD {
        return Err(SealError::InvalidFormat("chunk envelope too short"));
    }
    let mut salt = [0u8; SALT_LEN];
    salt.copy_from_slice(&envelope[..SALT_LEN]);
    Ok(salt)
}

fn generate_nonce() -> Result<[u8; NONCE_LEN], SealError> {
    let mut nonce = [0u8; NONCE_LEN];
    getrandom(&mut nonce).map_err(|_| SealError::Crypto)?;
    Ok(nonce)
}

/// Derive the sealed-box AEAD key from an ECDH shared secret and the two
/// public halves of the exchange.
fn sealed_box_key(
    shared: &x25519_dalek::SharedSecret,
    ephemeral_public: &PublicKey,
    recipient_public: &PublicKey,
) -> Result<Zeroizing<[u8; 32]>, SealError> {
    let mut salt = [0u8; PUBLIC_KEY_LEN * 2];
    salt[..PUBLIC_KEY_LEN].copy_from_slice(ephemeral_public.as_bytes());
    salt[PUBLIC_KEY_LEN..].copy_from_slice(recipient_public.as_bytes());

    let hk = Hkdf::<Sha256>::new(Some(&salt[..]), shared.as_bytes());
    let mut key = Zeroizing::new([0u8; 32]);
    hk.expand(SEAL_CONTEXT, key.as_mut())
        .map_err(|_| SealError::Crypto)?;
    Ok(key)
}

fn seal_to(recipient: &PublicKey, plaintext: &[u8]) -> Result<Vec<u8>, SealError> {
    let mut eph_bytes = [0u8; 32];
    getrandom(&mut eph_bytes).map_err(|_| SealError::Crypto)?;
    let ephemeral = StaticSecret::from(eph_bytes);
    eph_bytes.zeroize();
    let ephemeral_public = PublicKey::from(&ephemeral);

    let shared = ephemeral.diffie_hellman(recipient);
    if !shared.was_contributory() {
        return Err(SealError::Crypto);
    }
    let key = sealed_box_key(&shared, &ephemeral_public, recipient)?;

    let nonce = generate_nonce()?;
    let cipher = XChaCha20Poly1305::new_from_slice(key.as_ref()).map_err(|_| SealError::Crypto)?;
    let ct = cipher
        .encrypt(XNonce::from_slice(&nonce), plaintext)
        .map_err(|_| SealError::Crypto)?;

    let mut out = Vec::with_capacity(PUBLIC_KEY_LEN + NONCE_LEN + ct.len());
    out.extend_from_slice(ephemeral_public.as_bytes());
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&ct);
    Ok(out)
}

fn open_with(secret: &StaticSecret, envelope: &[u8]) -> Result<Vec<u8>, SealError> {
    if envelope.len() < ASYMMETRIC_OVERHEAD {
        return Err(SealError::InvalidFormat("chunk envelope too short"));
    }
    let (epk_bytes, rest) = envelope.split_at(PUBLIC_KEY_LEN);
    let (nonce, ct) = rest.split_at(NONCE_LEN);

    let mut epk = [0u8; PUBLIC_KEY_LEN];
    epk.copy_from_slice(epk_bytes);
    let ephemeral_public = PublicKey::from(epk);
    let recipient_public = PublicKey::from(secret);

    let shared = secret.diffie_hellman(&ephemeral_public);
    if !shared.was_contributory() {
        return Err(SealError::Crypto);
    }
    let key = sealed_box_key(&shared, &ephemeral_public, &recipient_public)?;

    let cipher = XChaCha20Poly1305::new_from_slice(key.as_ref()).map_err(|_| SealError::Crypto)?;
    cipher
        .decrypt(XNonce::from_slice(nonce), ct)
        .map_err(|_| SealError::Crypto)
}
