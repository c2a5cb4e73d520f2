use bye::cli::{decrypt_file, encrypt_file, seal_bytes, unlock, DecryptOptions, EncryptOptions};
use bye::pipeline::{derive_keys, open};
use bye::store::{ciphertext_path, read_sidecar, sidecar_path};
use bye::{ByeError, MetadataBundle, ScriptedPrompter};
use proptest::prelude::*;
use std::error::Error;
use std::fs;
use std::num::NonZeroU32;
use tempfile::tempdir;

#[test]
fn library_roundtrip_scenario() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let source = dir.path().join("notes.txt");
    fs::write(&source, b"hello world")?;

    let mut answers = ScriptedPrompter::new(["correct-horse", "stable animal"]);
    let sealed = encrypt_file(&source, &mut answers, &EncryptOptions::default())?;
    assert_eq!(sealed, ciphertext_path(&source));
    assert!(!source.exists());

    let mut answers = ScriptedPrompter::new(["wrong", "correct-horse"]);
    let restored = decrypt_file(&sealed, &mut answers, &DecryptOptions::default())?;
    assert_eq!(restored, source);
    assert_eq!(answers.notices, vec!["Incorrect passphrase. Hint: stable animal"]);
    assert_eq!(fs::read(&restored)?, b"hello world");
    assert!(!sealed.exists());
    assert!(!sidecar_path(&sealed)?.exists());

    Ok(())
}

#[test]
fn repeated_encryptions_never_share_salts_or_nonce() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let mut bundles: Vec<MetadataBundle> = Vec::new();

    for name in ["one.txt", "two.txt"] {
        let source = dir.path().join(name);
        fs::write(&source, b"identical contents")?;
        let mut answers = ScriptedPrompter::new(["same passphrase", "same hint"]);
        let sealed = encrypt_file(&source, &mut answers, &EncryptOptions::default())?;
        bundles.push(read_sidecar(&sidecar_path(&sealed)?)?);
    }

    assert_ne!(bundles[0].salt1, bundles[1].salt1);
    assert_ne!(bundles[0].salt2, bundles[1].salt2);
    assert_ne!(bundles[0].nonce, bundles[1].nonce);
    assert_ne!(bundles[0].token, bundles[1].token);
    Ok(())
}

#[test]
fn flipped_ciphertext_byte_fails_authentication() -> Result<(), Box<dyn Error>> {
    let (bundle, ciphertext) = seal_bytes(b"authenticated payload", "pw", "h")?;
    let mut answers = ScriptedPrompter::new(["pw"]);
    let key = unlock(&bundle, &mut answers, NonZeroU32::new(1))?;

    for i in [0, ciphertext.len() / 2, ciphertext.len() - 1] {
        let mut tampered = ciphertext.clone();
        tampered[i] ^= 0x40;
        let err = open(&key, &bundle.nonce, &tampered).expect_err("tampering must be detected");
        assert!(matches!(err, ByeError::AuthFailure), "unexpected error: {err:?}");
    }
    Ok(())
}

#[test]
fn truncated_sidecar_is_malformed() -> Result<(), Box<dyn Error>> {
    let (bundle, _) = seal_bytes(b"x", "pw", "h")?;
    let encoded = bundle.encode();
    let cut = encoded
        .iter()
        .position(|&b| b == b'\n')
        .ok_or("no delimiter")?;

    match MetadataBundle::decode(&encoded[..cut]) {
        Err(ByeError::MalformedMetadata(_)) => Ok(()),
        other => panic!("unexpected result: {other:?}"),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(12))]

    #[test]
    fn prop_seal_then_unlock_recovers_plaintext(
        plaintext in proptest::collection::vec(any::<u8>(), 0..512),
        passphrase in "[ -~]{0,24}",
        hint in "[ -~]{0,24}",
    ) {
        let (bundle, ciphertext) = seal_bytes(&plaintext, &passphrase, &hint).unwrap();
        let decoded = MetadataBundle::decode(&bundle.encode()).unwrap();
        prop_assert_eq!(&decoded, &bundle);

        let (key, token) = derive_keys(passphrase.as_bytes(), &decoded.salt1, &decoded.salt2);
        prop_assert!(token.matches(&decoded.token));
        prop_assert_eq!(open(&key, &decoded.nonce, &ciphertext).unwrap(), plaintext);
    }

    #[test]
    fn prop_other_passphrase_is_rejected(
        passphrase in "[a-z]{1,16}",
        suffix in "[0-9]{1,4}",
    ) {
        let (bundle, _) = seal_bytes(b"payload", &passphrase, "h").unwrap();
        let wrong = format!("{}{}", passphrase, suffix);
        let (_, token) = derive_keys(wrong.as_bytes(), &bundle.salt1, &bundle.salt2);
        prop_assert!(!token.matches(&bundle.token));
    }

    #[test]
    fn prop_file_roundtrip(contents in proptest::collection::vec(any::<u8>(), 0..2048)) {
        let dir = tempdir().unwrap();
        let source = dir.path().join("payload.bin");
        fs::write(&source, &contents).unwrap();

        let mut answers = ScriptedPrompter::new(["pw", "hint"]);
        let sealed = encrypt_file(&source, &mut answers, &EncryptOptions::default()).unwrap();
        let mut answers = ScriptedPrompter::new(["pw"]);
        let restored = decrypt_file(&sealed, &mut answers, &DecryptOptions::default()).unwrap();

        prop_assert_eq!(fs::read(&restored).unwrap(), contents);
        prop_assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
