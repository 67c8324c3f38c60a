//! Streaming orchestration: payload → container and back.
//!
//! The encrypt path splits the payload into fixed-size chunks, ciphers each
//! in input order, and frames the result; the decrypt path parses the
//! header first (failing fast before any chunk work), then deciphers and
//! concatenates records in order. One progress emission per chunk; chunk
//! *i+1* starts only after chunk *i*'s emission returns.

use secrecy::SecretString;
use x25519_dalek::StaticSecret;
use zeroize::Zeroize;

use crate::container::{self, ChunkRecords, CHUNK_PREFIX_LEN};
use crate::crypto::{self, KeyMaterial, SymmetricKey};
use crate::kdf;
use crate::types::{KdfParams, Scheme, SealError};

/// Progress sink: receives `(percent, stage)` after each chunk and returns
/// whether to continue. Returning `false` cancels the stream at the chunk
/// boundary.
pub type ProgressFn<'a> = &'a mut dyn FnMut(u8, &str) -> bool;

/// Output of the decrypt path: the reassembled plaintext plus the filename
/// embedded in the container header.
pub struct Decrypted {
    pub plaintext: Vec<u8>,
    pub name: String,
}

/// Reject chunk sizes that cannot be framed. Each record length is a u32 of
/// *ciphertext* bytes, and the envelope adds at most
/// [`crypto::ASYMMETRIC_OVERHEAD`] on top of the plaintext.
pub fn validate_chunk_size(chunk_size: usize) -> Result<(), SealError> {
    if chunk_size == 0 {
        return Err(SealError::Invalid("chunk_size must be > 0"));
    }
    let max_pt = (u32::MAX as usize).saturating_sub(crypto::ASYMMETRIC_OVERHEAD);
    if chunk_size > max_pt {
        return Err(SealError::Invalid("chunk_size too large for 32-bit frame"));
    }
    Ok(())
}

/// Encrypt `payload` into a container embedding `filename`.
///
/// `material` is applied uniformly to every chunk. A payload at or below
/// one chunk still produces exactly one record; a zero-length payload
/// produces a valid container with zero records. The filename boundary is
/// enforced before any cipher work begins.
pub fn encrypt_stream(
    payload: &[u8],
    filename: &str,
    password: &SecretString,
    material: &KeyMaterial,
    chunk_size: usize,
    on_progress: ProgressFn,
) -> Result<Vec<u8>, SealError> {
    validate_chunk_size(chunk_size)?;

    let fingerprint = kdf::fingerprint(password);
    let mut out = container::encode_header(filename, &fingerprint)?;

    let total = payload.len().div_ceil(chunk_size);
    tracing::debug!(chunks = total, bytes = payload.len(), "encrypting payload");

    for (index, chunk) in payload.chunks(chunk_size).enumerate() {
        let ciphertext = material.cipher_chunk(chunk)?;
        container::encode_chunk_into(&mut out, &ciphertext)?;

        let done = index + 1;
        let percent = (done * 100 / total) as u8;
        let stage = format!("Encrypting chunk {done}/{total}");
        if !on_progress(percent, &stage) {
            out.zeroize();
            return Err(SealError::Cancelled);
        }
    }

    Ok(out)
}

/// Decrypt a container back into its payload.
///
/// The header is parsed once up front. On the asymmetric path the password
/// fingerprint is compared against the embedded one and a mismatch
/// short-circuits with [`SealError::AuthenticationFailed`] before any
/// sealed box is opened. The symmetric path leaves authentication to the
/// per-chunk AEAD tag, so a wrong password surfaces as
/// [`SealError::Crypto`].
pub fn decrypt_stream(
    data: &[u8],
    password: &SecretString,
    scheme: Scheme,
    kdf_params: KdfParams,
    secret: Option<&StaticSecret>,
    on_progress: ProgressFn,
) -> Result<Decrypted, SealError> {
    let (header, offset) = container::decode_header(data)?;

    if scheme == Scheme::Asymmetric && kdf::fingerprint(password) != header.fingerprint {
        return Err(SealError::AuthenticationFailed);
    }

    let records = ChunkRecords::new(data, offset);
    let total = records.clone().count();
    tracing::debug!(chunks = total, name = %header.name, "decrypting container");

    if total == 0 {
        return Ok(Decrypted {
            plaintext: Vec::new(),
            name: header.name,
        });
    }

    let material = material_for_decrypt(data, offset, password, scheme, kdf_params, secret)?;

    let mut plaintext = Vec::with_capacity(data.len().saturating_sub(offset + total * CHUNK_PREFIX_LEN));
    for (index, record) in ChunkRecords::new(data, offset).enumerate() {
        let envelope = record?;
        let mut chunk = material.decipher_chunk(envelope)?;
        plaintext.extend_from_slice(&chunk);
        chunk.zeroize();

        let done = index + 1;
        let percent = (done * 100 / total) as u8;
        let stage = format!("Decrypting chunk {done}/{total}");
        if !on_progress(percent, &stage) {
            plaintext.zeroize();
            return Err(SealError::Cancelled);
        }
    }

    Ok(Decrypted {
        plaintext,
        name: header.name,
    })
}

/// Build decrypt-side key material. The symmetric key is derived once from
/// the salt carried in the first chunk's envelope.
fn material_for_decrypt(
    data: &[u8],
    offset: usize,
    password: &SecretString,
    scheme: Scheme,
    kdf_params: KdfParams,
    secret: Option<&StaticSecret>,
) -> Result<KeyMaterial, SealError> {
    match scheme {
        Scheme::Symmetric => {
            let first = ChunkRecords::new(data, offset)
                .next()
                .ok_or(SealError::InvalidFormat("container has no chunk records"))??;
            let salt = crypto::envelope_salt(first)?;
            Ok(KeyMaterial::Symmetric(SymmetricKey::derive(
                password, salt, kdf_params,
            )?))
        }
        Scheme::Asymmetric => secret
            .cloned()
            .map(KeyMaterial::Keypair)
            .ok_or(SealError::Invalid("asymmetric decryption requires a secret key")),
    }
}
