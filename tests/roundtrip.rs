//! Round-trip coverage for both schemes across the chunking boundaries.

use secrecy::SecretString;
use sealpack::{
    decrypt_stream, encrypt_stream, KdfParams, KeyMaterial, Keypair, Scheme, SealError,
};

const CHUNK: usize = 4096;

fn fast_params() -> KdfParams {
    KdfParams {
        t_cost: 1,
        mem_kib: 1024,
        parallelism: 1,
    }
}

fn pattern(len: usize) -> Vec<u8> {
    (0..len)
        .map(|i| (i as u32).wrapping_mul(1103515245).wrapping_add(12345) as u8)
        .collect()
}

fn no_progress() -> impl FnMut(u8, &str) -> bool {
    |_, _| true
}

#[test]
fn symmetric_roundtrip_boundary_sizes() {
    let pw = SecretString::new("boundary".into());
    let material =
        KeyMaterial::for_encrypt(Scheme::Symmetric, &pw, fast_params(), None).unwrap();

    for size in [0, CHUNK - 1, CHUNK, CHUNK + 1, 3 * CHUNK] {
        let payload = pattern(size);
        let ct = encrypt_stream(&payload, "data.bin", &pw, &material, CHUNK, &mut no_progress())
            .unwrap();
        let out = decrypt_stream(
            &ct,
            &pw,
            Scheme::Symmetric,
            fast_params(),
            None,
            &mut no_progress(),
        )
        .unwrap();
        assert_eq!(out.plaintext, payload, "size={size}");
        assert_eq!(out.name, "data.bin");
    }
}

#[test]
fn asymmetric_roundtrip_boundary_sizes() {
    let pw = SecretString::new("boundary".into());
    let pair = Keypair::generate().unwrap();
    let seal =
        KeyMaterial::for_encrypt(Scheme::Asymmetric, &pw, fast_params(), Some(pair.public()))
            .unwrap();

    for size in [0, CHUNK - 1, CHUNK, CHUNK + 1, 3 * CHUNK] {
        let payload = pattern(size);
        let ct =
            encrypt_stream(&payload, "data.bin", &pw, &seal, CHUNK, &mut no_progress()).unwrap();
        let out = decrypt_stream(
            &ct,
            &pw,
            Scheme::Asymmetric,
            fast_params(),
            Some(pair.secret()),
            &mut no_progress(),
        )
        .unwrap();
        assert_eq!(out.plaintext, payload, "size={size}");
    }
}

#[test]
fn wrong_password_symmetric_is_crypto_failure() {
    let pw = SecretString::new("pw1".into());
    let material =
        KeyMaterial::for_encrypt(Scheme::Symmetric, &pw, fast_params(), None).unwrap();
    let ct = encrypt_stream(b"payload", "p.bin", &pw, &material, CHUNK, &mut no_progress())
        .unwrap();

    let bad = SecretString::new("pw2".into());
    let result = decrypt_stream(
        &ct,
        &bad,
        Scheme::Symmetric,
        fast_params(),
        None,
        &mut no_progress(),
    );
    assert!(matches!(result, Err(SealError::Crypto)));
}

#[test]
fn wrong_password_asymmetric_gates_before_any_decrypt() {
    let pw = SecretString::new("pw1".into());
    let pair = Keypair::generate().unwrap();
    let seal =
        KeyMaterial::for_encrypt(Scheme::Asymmetric, &pw, fast_params(), Some(pair.public()))
            .unwrap();
    let ct = encrypt_stream(b"payload", "p.bin", &pw, &seal, CHUNK, &mut no_progress()).unwrap();

    // No secret key supplied: if the fingerprint gate did not short-circuit
    // first, this would fail with Invalid("...requires a secret key").
    let bad = SecretString::new("pw2".into());
    let result = decrypt_stream(
        &ct,
        &bad,
        Scheme::Asymmetric,
        fast_params(),
        None,
        &mut no_progress(),
    );
    assert!(matches!(result, Err(SealError::AuthenticationFailed)));
}

#[test]
fn asymmetric_requires_secret_key_when_password_matches() {
    let pw = SecretString::new("pw1".into());
    let pair = Keypair::generate().unwrap();
    let seal =
        KeyMaterial::for_encrypt(Scheme::Asymmetric, &pw, fast_params(), Some(pair.public()))
            .unwrap();
    let ct = encrypt_stream(b"payload", "p.bin", &pw, &seal, CHUNK, &mut no_progress()).unwrap();

    let result = decrypt_stream(
        &ct,
        &pw,
        Scheme::Asymmetric,
        fast_params(),
        None,
        &mut no_progress(),
    );
    assert!(matches!(result, Err(SealError::Invalid(_))));
}
