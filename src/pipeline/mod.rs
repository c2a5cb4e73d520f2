pub mod aead;
pub mod kdf;

pub use aead::{open, seal, NONCE_SIZE, TAG_SIZE};
pub use kdf::{
    derive, derive_keys, derive_with_iterations, CipherKey, KeyMaterial, Salt, VerificationToken,
    ITERATIONS, KEY_SIZE, SALT_SIZE,
};
