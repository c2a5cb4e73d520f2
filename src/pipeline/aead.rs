use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};

use crate::error::{ByeError, Result};
use crate::pipeline::kdf::CipherKey;

/// AES-GCM nonce size (96 bits)
pub const NONCE_SIZE: usize = 12;
/// GCM authentication tag appended to every ciphertext
pub const TAG_SIZE: usize = 16;

/// Largest plaintext GCM can seal under one nonce: (2^32 - 2) blocks
const MAX_PLAINTEXT: u64 = ((1u64 << 32) - 2) * 16;

fn cipher_for(key: &CipherKey) -> Aes256Gcm {
    Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()))
}

/// Encrypt and authenticate `plaintext`; output is ciphertext || tag
pub fn seal(key: &CipherKey, nonce: &[u8; NONCE_SIZE], plaintext: &[u8]) -> Result<Vec<u8>> {
    if plaintext.len() as u64 > MAX_PLAINTEXT {
        return Err(ByeError::PayloadTooLarge(plaintext.len()));
    }

    cipher_for(key)
        .encrypt(Nonce::from_slice(nonce), plaintext)
        .map_err(|_| ByeError::PayloadTooLarge(plaintext.len()))
}

/// Verify the tag and decrypt. A wrong key, wrong nonce or any modified
/// byte yields `AuthFailure`.
pub fn open(key: &CipherKey, nonce: &[u8; NONCE_SIZE], ciphertext: &[u8]) -> Result<Vec<u8>> {
    if ciphertext.len() < TAG_SIZE {
        return Err(ByeError::AuthFailure);
    }

    cipher_for(key)
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| ByeError::AuthFailure)
}
