use pbkdf2::pbkdf2_hmac;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;
use tracing::debug;
use zeroize::Zeroize;

use crate::pipeline::aead::NONCE_SIZE;

/// PBKDF2 iteration count for both derivations
pub const ITERATIONS: u32 = 4096;
/// Size of the derived cipher key and verification token
pub const KEY_SIZE: usize = 32;
/// Size of each random salt
pub const SALT_SIZE: usize = 8;

pub type Salt = [u8; SALT_SIZE];

/// Stretch `secret` with PBKDF2-HMAC-SHA256 at the fixed iteration count
pub fn derive(secret: &[u8], salt: &[u8]) -> [u8; KEY_SIZE] {
    derive_with_iterations(secret, salt, ITERATIONS)
}

/// Stretch `secret` with an explicit iteration count.
///
/// Panics on an empty salt or a zero iteration count: both are caller bugs,
/// never user input.
pub fn derive_with_iterations(secret: &[u8], salt: &[u8], iterations: u32) -> [u8; KEY_SIZE] {
    assert!(!salt.is_empty(), "PBKDF2 salt must not be empty");
    assert!(iterations > 0, "PBKDF2 iteration count must be positive");

    let mut out = [0u8; KEY_SIZE];
    pbkdf2_hmac::<Sha256>(secret, salt, iterations, &mut out);
    out
}

/// Symmetric key for the file cipher. Never persisted; zeroized on drop.
pub struct CipherKey {
    bytes: [u8; KEY_SIZE],
}

impl CipherKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl Drop for CipherKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for CipherKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CipherKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// One-way proxy of the cipher key, stored in the sidecar so a candidate
/// passphrase can be checked without touching the ciphertext
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerificationToken([u8; KEY_SIZE]);

impl VerificationToken {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }

    /// Derive the token for `key` under `salt2`
    pub fn for_key(key: &CipherKey, salt2: &Salt) -> Self {
        Self(derive(key.as_bytes(), salt2))
    }

    /// Constant-time equality; every byte is examined
    pub fn matches(&self, other: &VerificationToken) -> bool {
        tokens_equal(&self.0, &other.0)
    }
}

/// Derive the cipher key from (passphrase, salt1) and its token from
/// (cipher key, salt2)
pub fn derive_keys(
    passphrase: &[u8],
    salt1: &Salt,
    salt2: &Salt,
) -> (CipherKey, VerificationToken) {
    let started = std::time::Instant::now();
    let key = CipherKey::from_bytes(derive(passphrase, salt1));
    let token = VerificationToken::for_key(&key, salt2);
    debug!(elapsed = ?started.elapsed(), iterations = ITERATIONS, "derived key material");
    (key, token)
}

/// Fresh per-encryption randomness: both salts and the cipher nonce
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyMaterial {
    pub salt1: Salt,
    pub salt2: Salt,
    pub nonce: [u8; NONCE_SIZE],
}

impl KeyMaterial {
    /// Draw salts and nonce from the OS CSPRNG
    pub fn generate() -> Self {
        let mut rng = OsRng;
        let mut material = Self {
            salt1: [0u8; SALT_SIZE],
            salt2: [0u8; SALT_SIZE],
            nonce: [0u8; NONCE_SIZE],
        };
        rng.fill_bytes(&mut material.salt1);
        rng.fill_bytes(&mut material.salt2);
        rng.fill_bytes(&mut material.nonce);
        material
    }
}

/// OR of the XOR of every byte pair, folded without an early exit.
/// `black_box` stops the optimizer from turning the fold into a
/// short-circuiting compare.
fn tokens_equal(a: &[u8; KEY_SIZE], b: &[u8; KEY_SIZE]) -> bool {
    let diff = a
        .iter()
        .zip(b)
        .fold(0u8, |acc, (x, y)| std::hint::black_box(acc | (x ^ y)));
    std::hint::black_box(diff) == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_derive_is_deterministic() {
        let a = derive(b"correct-horse", b"saltsalt");
        let b = derive(b"correct-horse", b"saltsalt");
        assert_eq!(a, b);
        assert_eq!(a.len(), KEY_SIZE);
    }

    #[test]
    fn test_derive_matches_pbkdf2_vector() {
        // RFC 7914 section 11 PBKDF2-HMAC-SHA256 vector, first 32 bytes
        let out = derive_with_iterations(b"passwd", b"salt", 1);
        assert_eq!(
            hex::encode(out),
            "55ac046e56e3089fec1691c22544b605f94185216dde0465e68b9d57c20dacbc"
        );
    }

    #[test]
    fn test_derive_one_bit_changes_output() {
        let base = derive(b"secret", &[0u8; SALT_SIZE]);
        let mut flipped_salt = [0u8; SALT_SIZE];
        flipped_salt[7] ^= 0x01;
        assert_ne!(base, derive(b"secret", &flipped_salt));
        assert_ne!(base, derive(b"secres", &[0u8; SALT_SIZE]));
    }

    #[test]
    #[should_panic(expected = "salt must not be empty")]
    fn test_empty_salt_is_contract_violation() {
        derive(b"secret", &[]);
    }

    #[test]
    #[should_panic(expected = "iteration count must be positive")]
    fn test_zero_iterations_is_contract_violation() {
        derive_with_iterations(b"secret", b"salt", 0);
    }

    #[test]
    fn test_token_differs_from_key() {
        let (key, token) = derive_keys(b"pass", &[1u8; SALT_SIZE], &[2u8; SALT_SIZE]);
        assert_ne!(key.as_bytes(), token.as_bytes());
    }

    #[test]
    fn test_token_rejects_wrong_passphrase() {
        let salt1 = [3u8; SALT_SIZE];
        let salt2 = [4u8; SALT_SIZE];
        let (_, stored) = derive_keys(b"correct-horse", &salt1, &salt2);
        let (_, candidate) = derive_keys(b"wrong", &salt1, &salt2);
        let (_, again) = derive_keys(b"correct-horse", &salt1, &salt2);
        assert!(!stored.matches(&candidate));
        assert!(stored.matches(&again));
    }

    #[test]
    fn test_cipher_key_debug_is_redacted() {
        let key = CipherKey::from_bytes([0xAB; KEY_SIZE]);
        let printed = format!("{:?}", key);
        assert!(printed.contains("REDACTED"));
        assert!(!printed.contains("171"));
    }

    #[test]
    fn test_key_material_is_fresh() {
        let a = KeyMaterial::generate();
        let b = KeyMaterial::generate();
        assert_ne!(a.salt1, b.salt1);
        assert_ne!(a.salt2, b.salt2);
        assert_ne!(a.nonce, b.nonce);
        assert_ne!(a.salt1, a.salt2);
    }

    #[test]
    fn test_tokens_equal_checks_every_byte() {
        let base = [0x5Au8; KEY_SIZE];
        assert!(tokens_equal(&base, &base));
        for i in [0, KEY_SIZE / 2, KEY_SIZE - 1] {
            let mut other = base;
            other[i] ^= 0x01;
            assert!(!tokens_equal(&base, &other), "difference at byte {i} missed");
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn prop_derive_deterministic(secret in proptest::collection::vec(any::<u8>(), 0..64),
                                     salt in any::<[u8; SALT_SIZE]>()) {
            prop_assert_eq!(derive(&secret, &salt), derive(&secret, &salt));
        }
    }
}
