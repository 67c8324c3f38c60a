//! ASCII armor encoding and decoding for containers.

use base64::{Engine, engine::general_purpose};

use crate::types::SealError;

pub fn armor_encode(binary: &[u8]) -> Vec<u8> {
    let b64 = general_purpose::STANDARD.encode(binary);
    let mut out = Vec::new();
    out.extend_from_slice(b"-----BEGIN SEALPACK-----\n");
    out.extend_from_slice(b64.as_bytes());
    out.extend_from_slice(b"\n-----END SEALPACK-----\n");
    out
}

pub fn dearmor_decode(data: &[u8]) -> Result<Vec<u8>, SealError> {
    let s = std::str::from_utf8(data).map_err(|_| SealError::InvalidFormat("armor is not UTF-8"))?;
    let s = s.trim();
    let body = s
        .strip_prefix("-----BEGIN SEALPACK-----")
        .and_then(|x| x.strip_suffix("-----END SEALPACK-----"))
        .ok_or(SealError::InvalidFormat("missing armor markers"))?;
    let body = body.trim_matches(&['\r', '\n', ' '][..]).trim();
    general_purpose::STANDARD
        .decode(body)
        .map_err(|_| SealError::InvalidFormat("armor body is not valid Base64"))
}

pub fn looks_armored(data: &[u8]) -> bool {
    data.starts_with(b"-----BEGIN SEALPACK-----")
}
