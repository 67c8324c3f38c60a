//! Disk-to-disk streaming round trips and overwrite policy.

use std::fs;

use secrecy::SecretString;
use sealpack::{
    decrypt_file_streaming, encrypt_file_streaming, KdfParams, Keypair, Scheme, SealError,
    SealOptions,
};
use tempfile::tempdir;

const CHUNK: usize = 2048;

fn fast_opts(scheme: Scheme) -> SealOptions {
    SealOptions {
        scheme,
        chunk_size: CHUNK,
        kdf_params: KdfParams {
            t_cost: 1,
            mem_kib: 1024,
            parallelism: 1,
        },
        ..Default::default()
    }
}

fn no_progress() -> impl FnMut(u8, &str) -> bool {
    |_, _| true
}

fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

#[test]
fn symmetric_file_roundtrip() {
    let dir = tempdir().unwrap();
    let in_path = dir.path().join("report.pdf");
    let enc_path = dir.path().join("report.pdf.enc");
    let back_path = dir.path().join("back.pdf");

    let data = pattern(CHUNK * 5 + 123);
    fs::write(&in_path, &data).unwrap();

    let pw = SecretString::new("stream-pw".into());
    let out = encrypt_file_streaming(
        &in_path,
        None,
        pw.clone(),
        &fast_opts(Scheme::Symmetric),
        None,
        &mut no_progress(),
    )
    .unwrap();
    assert_eq!(out, enc_path);

    let (dec_path, name) = decrypt_file_streaming(
        &enc_path,
        Some(&back_path),
        pw,
        &fast_opts(Scheme::Symmetric),
        None,
        &mut no_progress(),
    )
    .unwrap();
    assert_eq!(name, "report.pdf");
    assert_eq!(fs::read(&dec_path).unwrap(), data);
}

#[test]
fn asymmetric_file_roundtrip() {
    let dir = tempdir().unwrap();
    let in_path = dir.path().join("photo.raw");
    let back_path = dir.path().join("photo.out");

    let data = pattern(CHUNK * 2);
    fs::write(&in_path, &data).unwrap();

    let pair = Keypair::generate().unwrap();
    let pw = SecretString::new("gate".into());

    let enc_path = encrypt_file_streaming(
        &in_path,
        None,
        pw.clone(),
        &fast_opts(Scheme::Asymmetric),
        Some(pair.public()),
        &mut no_progress(),
    )
    .unwrap();

    let (dec_path, _) = decrypt_file_streaming(
        &enc_path,
        Some(&back_path),
        pw,
        &fast_opts(Scheme::Asymmetric),
        Some(pair.secret()),
        &mut no_progress(),
    )
    .unwrap();
    assert_eq!(fs::read(&dec_path).unwrap(), data);
}

#[test]
fn empty_file_roundtrip() {
    let dir = tempdir().unwrap();
    let in_path = dir.path().join("empty.bin");
    fs::write(&in_path, b"").unwrap();

    let pw = SecretString::new("pw".into());
    let enc_path = encrypt_file_streaming(
        &in_path,
        None,
        pw.clone(),
        &fast_opts(Scheme::Symmetric),
        None,
        &mut no_progress(),
    )
    .unwrap();

    let (dec_path, name) = decrypt_file_streaming(
        &enc_path,
        Some(&dir.path().join("empty.out")),
        pw,
        &fast_opts(Scheme::Symmetric),
        None,
        &mut no_progress(),
    )
    .unwrap();
    assert_eq!(name, "empty.bin");
    assert_eq!(fs::read(&dec_path).unwrap().len(), 0);
}

#[test]
fn existing_output_requires_force() {
    let dir = tempdir().unwrap();
    let in_path = dir.path().join("a.txt");
    let enc_path = dir.path().join("a.txt.enc");
    fs::write(&in_path, b"data").unwrap();
    fs::write(&enc_path, b"already here").unwrap();

    let pw = SecretString::new("pw".into());
    let result = encrypt_file_streaming(
        &in_path,
        None,
        pw.clone(),
        &fast_opts(Scheme::Symmetric),
        None,
        &mut no_progress(),
    );
    assert!(matches!(result, Err(SealError::Invalid(_))));

    let mut opts = fast_opts(Scheme::Symmetric);
    opts.force = true;
    encrypt_file_streaming(&in_path, None, pw, &opts, None, &mut no_progress()).unwrap();
    assert_ne!(fs::read(&enc_path).unwrap(), b"already here");
}

#[test]
fn streaming_progress_is_monotone() {
    let dir = tempdir().unwrap();
    let in_path = dir.path().join("big.bin");
    fs::write(&in_path, pattern(CHUNK * 9)).unwrap();

    let pw = SecretString::new("pw".into());
    let mut events = Vec::new();
    let mut sink = |percent: u8, _: &str| {
        events.push(percent);
        true
    };
    encrypt_file_streaming(
        &in_path,
        None,
        pw,
        &fast_opts(Scheme::Symmetric),
        None,
        &mut sink,
    )
    .unwrap();

    assert_eq!(events.len(), 9);
    assert!(events.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(*events.last().unwrap(), 100);
}
