//! Property-based round trips for *both* schemes.

use proptest::prelude::*;
use secrecy::SecretString;
use sealpack::{decrypt_stream, encrypt_stream, KdfParams, KeyMaterial, Keypair, Scheme};

const CHUNK: usize = 4096;

fn fast_params() -> KdfParams {
    KdfParams {
        t_cost: 1,
        mem_kib: 1024,
        parallelism: 1,
    }
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 16,
        timeout: 60_000,
        failure_persistence: None,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_round_trip_symmetric(
        payload in proptest::collection::vec(any::<u8>(), 0..3 * CHUNK),
        password in "[a-zA-Z0-9 ]{1,24}",
    ) {
        let pw = SecretString::new(password.into_boxed_str());
        let material = KeyMaterial::for_encrypt(Scheme::Symmetric, &pw, fast_params(), None).unwrap();

        let mut sink = |_: u8, _: &str| true;
        let ct = encrypt_stream(&payload, "prop.bin", &pw, &material, CHUNK, &mut sink).unwrap();
        let out = decrypt_stream(&ct, &pw, Scheme::Symmetric, fast_params(), None, &mut sink).unwrap();

        prop_assert_eq!(out.plaintext, payload);
    }

    #[test]
    fn prop_round_trip_asymmetric(
        payload in proptest::collection::vec(any::<u8>(), 0..3 * CHUNK),
    ) {
        let pw = SecretString::new("prop-gate".into());
        let pair = Keypair::generate().unwrap();
        let seal = KeyMaterial::for_encrypt(
            Scheme::Asymmetric, &pw, fast_params(), Some(pair.public()),
        ).unwrap();

        let mut sink = |_: u8, _: &str| true;
        let ct = encrypt_stream(&payload, "prop.bin", &pw, &seal, CHUNK, &mut sink).unwrap();
        let out = decrypt_stream(
            &ct, &pw, Scheme::Asymmetric, fast_params(), Some(pair.secret()), &mut sink,
        ).unwrap();

        prop_assert_eq!(out.plaintext, payload);
    }
}
