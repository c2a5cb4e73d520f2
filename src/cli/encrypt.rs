use crate::error::{ByeError, Result};
use crate::metadata::MetadataBundle;
use crate::pipeline::{derive_keys, seal, KeyMaterial};
use crate::prompt::Prompter;
use crate::store::{self, Commit};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

pub const PASSPHRASE_PROMPT: &str = "Passphrase: ";
pub const HINT_PROMPT: &str = "Hint: ";

/// Options for the encrypt command
#[derive(Debug, Clone, Default)]
pub struct EncryptOptions {
    /// Replace existing `.bye` outputs
    pub force: bool,
}

/// Encrypt `plaintext` under fresh salts and nonce.
/// Returns the sidecar record and ciphertext || tag.
pub fn seal_bytes(
    plaintext: &[u8],
    passphrase: &str,
    hint: &str,
) -> Result<(MetadataBundle, Vec<u8>)> {
    let material = KeyMaterial::generate();
    let (key, token) = derive_keys(passphrase.as_bytes(), &material.salt1, &material.salt2);
    let ciphertext = seal(&key, &material.nonce, plaintext)?;

    let bundle = MetadataBundle {
        token,
        salt1: material.salt1,
        salt2: material.salt2,
        nonce: material.nonce,
        hint: hint.to_string(),
    };
    Ok((bundle, ciphertext))
}

/// Encrypt `path` in place: writes `<path>.bye` and `.<path>.bye`, then
/// removes `<path>`. Returns the ciphertext path.
///
/// The sidecar is renamed into place before the ciphertext, so a crash can
/// leave an orphaned sidecar next to the intact original but never a
/// ciphertext without its metadata. The source is removed last.
pub fn encrypt_file(
    path: &Path,
    prompter: &mut dyn Prompter,
    options: &EncryptOptions,
) -> Result<PathBuf> {
    store::require_file(path)?;
    let ciphertext_path = store::ciphertext_path(path);
    let sidecar_path = store::sidecar_path(&ciphertext_path)?;
    store::ensure_absent(&ciphertext_path, options.force)?;
    store::ensure_absent(&sidecar_path, options.force)?;

    let passphrase = prompter
        .read_secret(PASSPHRASE_PROMPT)?
        .map(Zeroizing::new)
        .ok_or(ByeError::InputClosed)?;
    if passphrase.is_empty() {
        warn!("encrypting with an empty passphrase");
    }
    let hint = prompter
        .read_line(HINT_PROMPT)?
        .ok_or(ByeError::InputClosed)?;

    let plaintext = Zeroizing::new(std::fs::read(path)?);
    debug!(path = %path.display(), bytes = plaintext.len(), "read source");

    let (bundle, ciphertext) = seal_bytes(&plaintext, &passphrase, &hint)?;

    let mut commit = Commit::new(options.force);
    commit.stage(&sidecar_path, &bundle.encode())?;
    commit.stage(&ciphertext_path, &ciphertext)?;
    commit.commit()?;

    store::remove(path)?;

    info!(
        source = %path.display(),
        output = %ciphertext_path.display(),
        "encrypted"
    );
    Ok(ciphertext_path)
}
