//! File I/O: atomic writes, output-path defaults, and constant-memory
//! streaming of containers to and from disk.

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use secrecy::SecretString;
use tempfile::NamedTempFile;
use x25519_dalek::{PublicKey, StaticSecret};
use zeroize::Zeroize;

use crate::container::{self, CHUNK_PREFIX_LEN};
use crate::crypto::{self, KeyMaterial, SymmetricKey};
use crate::kdf;
use crate::pipeline::{self, ProgressFn};
use crate::types::{Scheme, SealError, SealOptions};

/// Atomically write data to a file using a temporary file.
///
/// A temp file is created in the target's directory, filled, synced, and
/// renamed over the target. With `mode_600` the file is readable only by
/// its owner (Unix).
pub fn write_all_atomic(path: &Path, data: &[u8], mode_600: bool) -> Result<(), SealError> {
    let parent = path
        .parent()
        .ok_or(SealError::Invalid("output path has no parent"))?;
    fs::create_dir_all(parent)?;
    let mut tmp = NamedTempFile::new_in(parent)?;
    if mode_600 {
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(tmp.path(), fs::Permissions::from_mode(0o600))?;
        }
    }
    tmp.write_all(data)?;
    tmp.flush()?;
    tmp.as_file_mut().sync_all()?;
    tmp.persist(path).map_err(|e| SealError::Io(e.error))?;
    Ok(())
}

/// Atomically persist a tempfile to the target path, honoring the force
/// overwrite policy.
pub fn persist_tempfile_atomic(
    tmp: NamedTempFile,
    out: &Path,
    force: bool,
) -> Result<PathBuf, SealError> {
    let tmp_path = tmp.into_temp_path();

    if out.exists() {
        if force {
            fs::remove_file(out)?;
        } else {
            return Err(SealError::Invalid("output exists; use --force to overwrite"));
        }
    }

    tmp_path.persist(out).map_err(|e| SealError::Io(e.error))?;
    Ok(out.to_path_buf())
}

/// Default output path for encryption: append ".enc" (preserving existing
/// extensions), unless an explicit output was given.
pub fn default_out_path(input: &Path, output: Option<&Path>) -> PathBuf {
    output.map(|p| p.to_path_buf()).unwrap_or_else(|| {
        let mut p = input.to_path_buf();
        if let Some(e) = input.extension().and_then(|s| s.to_str()) {
            p.set_extension(format!("{e}.enc"));
        } else {
            p.set_extension("enc");
        }
        p
    })
}

/// Default output path for decryption: strip a ".enc" suffix if present,
/// otherwise append ".dec".
pub fn default_decrypt_output_path(input: &Path, output: Option<&Path>) -> PathBuf {
    output.map(|p| p.to_path_buf()).unwrap_or_else(|| {
        let s = input.to_string_lossy();
        if let Some(stripped) = s.strip_suffix(".enc") {
            PathBuf::from(stripped)
        } else {
            let mut p = input.to_path_buf();
            p.set_extension("dec");
            p
        }
    })
}

fn embedded_name_for(input: &Path) -> Result<&str, SealError> {
    input
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or(SealError::Invalid("input filename is not valid UTF-8"))
}

/// Encrypt a file on disk chunk by chunk, holding at most one chunk in
/// memory at a time. Returns the output path.
pub fn encrypt_file_streaming(
    input: &Path,
    output: Option<&Path>,
    password: SecretString,
    opts: &SealOptions,
    recipient: Option<&PublicKey>,
    on_progress: ProgressFn,
) -> Result<PathBuf, SealError> {
    pipeline::validate_chunk_size(opts.chunk_size)?;

    let out_path = default_out_path(input, output);
    if out_path.exists() && !opts.force {
        return Err(SealError::Invalid("output exists; use --force to overwrite"));
    }

    let name = embedded_name_for(input)?;
    let fingerprint = kdf::fingerprint(&password);
    let header = container::encode_header(name, &fingerprint)?;

    let material =
        KeyMaterial::for_encrypt(opts.scheme, &password, opts.kdf_params, recipient)?;

    let total = (fs::metadata(input)?.len() as usize).div_ceil(opts.chunk_size);
    tracing::debug!(chunks = total, path = %input.display(), "encrypting file");

    let parent = out_path
        .parent()
        .ok_or(SealError::Invalid("output path has no parent"))?;
    fs::create_dir_all(parent)?;
    let mut tmp = NamedTempFile::new_in(parent)?;
    tmp.write_all(&header)?;

    let mut infile = File::open(input)?;
    let mut buf = vec![0u8; opts.chunk_size];
    let mut done = 0usize;

    loop {
        let n = read_up_to(&mut infile, &mut buf)?;
        if n == 0 {
            break;
        }
        let ciphertext = material.cipher_chunk(&buf[..n])?;
        let len = u32::try_from(ciphertext.len())
            .map_err(|_| SealError::Invalid("chunk ciphertext too large for 32-bit frame"))?;
        tmp.write_all(&len.to_le_bytes())?;
        tmp.write_all(&ciphertext)?;

        done += 1;
        let percent = (done * 100 / total.max(1)) as u8;
        let stage = format!("Encrypting chunk {done}/{total}");
        if !on_progress(percent, &stage) {
            buf.zeroize();
            return Err(SealError::Cancelled);
        }
    }

    buf.zeroize();
    tmp.flush()?;
    tmp.as_file_mut().sync_all()?;
    persist_tempfile_atomic(tmp, &out_path, opts.force)
}

/// Decrypt a container file chunk by chunk. Returns the output path and the
/// filename embedded in the container header.
pub fn decrypt_file_streaming(
    input: &Path,
    output: Option<&Path>,
    password: SecretString,
    opts: &SealOptions,
    secret: Option<&StaticSecret>,
    on_progress: ProgressFn,
) -> Result<(PathBuf, String), SealError> {
    let out_path = default_decrypt_output_path(input, output);
    if out_path.exists() && !opts.force {
        return Err(SealError::Invalid("output exists; use --force to overwrite"));
    }

    let file_len = fs::metadata(input)?.len();
    let mut infile = File::open(input)?;

    let header = read_header(&mut infile)?;
    if opts.scheme == Scheme::Asymmetric && kdf::fingerprint(&password) != header.fingerprint {
        return Err(SealError::AuthenticationFailed);
    }

    let mut consumed = (container::HEADER_OVERHEAD + header.name.len()) as u64;
    let mut material: Option<KeyMaterial> = match opts.scheme {
        Scheme::Asymmetric => Some(
            secret
                .cloned()
                .map(KeyMaterial::Keypair)
                .ok_or(SealError::Invalid("asymmetric decryption requires a secret key"))?,
        ),
        // derived lazily from the first record's salt
        Scheme::Symmetric => None,
    };

    let parent = out_path
        .parent()
        .ok_or(SealError::Invalid("output path has no parent"))?;
    fs::create_dir_all(parent)?;
    let mut tmp = NamedTempFile::new_in(parent)?;

    let mut done = 0usize;
    while let Some(envelope) = read_record(&mut infile)? {
        if material.is_none() {
            let salt = crypto::envelope_salt(&envelope)?;
            material = Some(KeyMaterial::Symmetric(SymmetricKey::derive(
                &password,
                salt,
                opts.kdf_params,
            )?));
        }
        let km = material
            .as_ref()
            .ok_or(SealError::Invalid("missing key material"))?;
        let mut plaintext = km.decipher_chunk(&envelope)?;
        tmp.write_all(&plaintext)?;
        plaintext.zeroize();

        done += 1;
        consumed += (CHUNK_PREFIX_LEN + envelope.len()) as u64;
        let percent = (consumed * 100 / file_len.max(1)) as u8;
        let stage = format!("Decrypting chunk {done}");
        if !on_progress(percent, &stage) {
            return Err(SealError::Cancelled);
        }
    }

    tmp.flush()?;
    tmp.as_file_mut().sync_all()?;
    let path = persist_tempfile_atomic(tmp, &out_path, opts.force)?;
    Ok((path, header.name))
}

fn read_up_to(reader: &mut impl Read, buf: &mut [u8]) -> Result<usize, SealError> {
    let mut total = 0;
    while total < buf.len() {
        match reader.read(&mut buf[total..]) {
            Ok(0) => break,
            Ok(n) => total += n,
            Err(ref e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(SealError::Io(e)),
        }
    }
    Ok(total)
}

fn read_header(reader: &mut impl Read) -> Result<container::Header, SealError> {
    let mut name_len = [0u8; 1];
    reader
        .read_exact(&mut name_len)
        .map_err(|_| SealError::InvalidFormat("container is empty"))?;

    let mut rest = vec![0u8; name_len[0] as usize + kdf::FINGERPRINT_LEN];
    reader
        .read_exact(&mut rest)
        .map_err(|_| SealError::InvalidFormat("header truncated"))?;

    let mut bytes = Vec::with_capacity(1 + rest.len());
    bytes.push(name_len[0]);
    bytes.extend_from_slice(&rest);
    let (header, _) = container::decode_header(&bytes)?;
    Ok(header)
}

/// Read one length-prefixed record; `None` at clean end of file.
fn read_record(reader: &mut impl Read) -> Result<Option<Vec<u8>>, SealError> {
    let mut prefix = [0u8; CHUNK_PREFIX_LEN];
    let n = read_up_to(reader, &mut prefix)?;
    if n == 0 {
        return Ok(None);
    }
    if n < CHUNK_PREFIX_LEN {
        return Err(SealError::InvalidFormat("chunk length prefix truncated"));
    }
    let len = u32::from_le_bytes(prefix) as usize;
    let mut envelope = vec![0u8; len];
    reader
        .read_exact(&mut envelope)
        .map_err(|_| SealError::InvalidFormat("chunk overruns container"))?;
    Ok(Some(envelope))
}
