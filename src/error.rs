use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ByeError {
    #[error("{0}")]
    Usage(String),

    #[error("File does not exist: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Authentication failed: ciphertext or metadata is corrupted")]
    AuthFailure,

    #[error("Malformed metadata: {0}")]
    MalformedMetadata(String),

    #[error("Refusing to overwrite existing file: {} (use --force)", .0.display())]
    OutputExists(PathBuf),

    #[error("Incorrect passphrase after {0} attempts")]
    TooManyAttempts(u32),

    #[error("Input closed before a passphrase was entered")]
    InputClosed,

    #[error("Payload too large to encrypt: {0} bytes")]
    PayloadTooLarge(usize),
}

pub type Result<T> = std::result::Result<T, ByeError>;
