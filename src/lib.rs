//! bye - passphrase file encryption with a hint sidecar
//!
//! Encrypting `notes.txt` replaces it with two files: the sealed contents in
//! `notes.txt.bye` and a metadata sidecar `.notes.txt.bye` holding what is
//! needed to check a passphrase and reopen the ciphertext.
//!
//! ## Key Schedule
//!
//! ```text
//! passphrase ─PBKDF2(salt1)→ cipher key ─PBKDF2(salt2)→ verification token
//!                                 │
//!                                 └→ AES-256-GCM(nonce) seals the file
//! ```
//!
//! - **Cipher key**: never written anywhere
//! - **Verification token**: stored; a candidate passphrase is accepted only
//!   when it reproduces the token, so a wrong passphrase is caught before
//!   the ciphertext is opened
//! - **Salts and nonce**: fresh from the OS CSPRNG on every encryption
//! - **Hint**: stored in plaintext and shown after each wrong attempt
//!
//! ## Example
//!
//! ```no_run
//! use bye::cli::{decrypt_file, encrypt_file, DecryptOptions, EncryptOptions};
//! use bye::prompt::ScriptedPrompter;
//! use std::path::Path;
//!
//! let mut answers = ScriptedPrompter::new(["correct-horse", "stable animal"]);
//! let sealed = encrypt_file(Path::new("notes.txt"), &mut answers, &EncryptOptions::default())?;
//!
//! let mut answers = ScriptedPrompter::new(["correct-horse"]);
//! decrypt_file(&sealed, &mut answers, &DecryptOptions::default())?;
//! # Ok::<(), bye::ByeError>(())
//! ```

pub mod cli;
pub mod error;
pub mod metadata;
pub mod pipeline;
pub mod prompt;
pub mod store;

pub use error::{ByeError, Result};
pub use metadata::MetadataBundle;
pub use prompt::{ConsolePrompter, Prompter, ScriptedPrompter};
