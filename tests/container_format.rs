//! Container layout checks: header boundaries, the documented byte layout,
//! and zero-length payloads.

use secrecy::SecretString;
use sealpack::{
    decode_header, decrypt_bytes, encrypt_bytes, fingerprint, ChunkRecords, KdfParams, SealError,
    SealOptions, FINGERPRINT_LEN,
};

fn fast_opts() -> SealOptions {
    SealOptions {
        kdf_params: KdfParams {
            t_cost: 1,
            mem_kib: 1024,
            parallelism: 1,
        },
        ..Default::default()
    }
}

/// Encrypting the 3-byte message "hi!" with password "correct" yields a
/// 1+7+32 byte header followed by exactly one length-prefixed record.
#[test]
fn three_byte_message_layout() {
    let pw = SecretString::new("correct".into());
    let ct = encrypt_bytes(b"hi!", "msg.txt", pw.clone(), &fast_opts()).unwrap();

    assert_eq!(ct[0], 7, "name length byte");
    assert_eq!(&ct[1..8], b"msg.txt");
    assert_eq!(&ct[8..40], &fingerprint(&pw), "embedded fingerprint");

    let (header, offset) = decode_header(&ct).unwrap();
    assert_eq!(header.name, "msg.txt");
    assert_eq!(offset, 1 + 7 + FINGERPRINT_LEN);

    let records: Vec<_> = ChunkRecords::new(&ct, offset)
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(records.len(), 1);

    let declared = u32::from_le_bytes([ct[40], ct[41], ct[42], ct[43]]) as usize;
    assert_eq!(declared, records[0].len());
    assert_eq!(offset + 4 + declared, ct.len());

    let out = decrypt_bytes(&ct, pw, &fast_opts()).unwrap();
    assert_eq!(out.plaintext, b"hi!");

    let wrong = SecretString::new("wrong".into());
    assert!(matches!(
        decrypt_bytes(&ct, wrong, &fast_opts()),
        Err(SealError::Crypto)
    ));
}

#[test]
fn filename_boundary_255_accepted_256_rejected() {
    let pw = SecretString::new("pw".into());

    let name_255 = "n".repeat(255);
    let ct = encrypt_bytes(b"x", &name_255, pw.clone(), &fast_opts()).unwrap();
    let out = decrypt_bytes(&ct, pw.clone(), &fast_opts()).unwrap();
    assert_eq!(out.name, name_255);

    let name_256 = "n".repeat(256);
    assert!(matches!(
        encrypt_bytes(b"x", &name_256, pw, &fast_opts()),
        Err(SealError::FilenameTooLong(256))
    ));
}

#[test]
fn multibyte_filename_measured_in_bytes() {
    let pw = SecretString::new("pw".into());
    // 86 three-byte chars = 258 bytes, over the limit despite 86 chars
    let name = "\u{65e5}".repeat(86);
    assert!(matches!(
        encrypt_bytes(b"x", &name, pw, &fast_opts()),
        Err(SealError::FilenameTooLong(258))
    ));
}

#[test]
fn zero_length_payload_yields_header_only_container() {
    let pw = SecretString::new("pw".into());
    let ct = encrypt_bytes(b"", "empty", pw.clone(), &fast_opts()).unwrap();

    let (header, offset) = decode_header(&ct).unwrap();
    assert_eq!(header.name, "empty");
    assert_eq!(offset, ct.len(), "no chunk records");
    assert_eq!(ChunkRecords::new(&ct, offset).count(), 0);

    let out = decrypt_bytes(&ct, pw, &fast_opts()).unwrap();
    assert!(out.plaintext.is_empty());
}

#[test]
fn garbage_input_is_invalid_format() {
    let pw = SecretString::new("pw".into());
    assert!(matches!(
        decrypt_bytes(&[], pw.clone(), &fast_opts()),
        Err(SealError::InvalidFormat(_))
    ));
    // name length byte claims more than the buffer holds
    assert!(matches!(
        decrypt_bytes(&[200, 1, 2, 3], pw, &fast_opts()),
        Err(SealError::InvalidFormat(_))
    ));
}
