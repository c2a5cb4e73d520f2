use crate::cli::encrypt::PASSPHRASE_PROMPT;
use crate::error::{ByeError, Result};
use crate::metadata::MetadataBundle;
use crate::pipeline::{derive_keys, open, CipherKey};
use crate::prompt::Prompter;
use crate::store::{self, Commit};
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

/// Options for the decrypt command
#[derive(Debug, Clone, Default)]
pub struct DecryptOptions {
    /// Give up after this many wrong passphrases. `None` retries forever,
    /// which leaves online guessing unthrottled apart from the KDF cost.
    pub max_attempts: Option<NonZeroU32>,
    /// Replace an existing plaintext file
    pub force: bool,
}

/// Prompt until a passphrase reproduces the stored verification token and
/// return its cipher key. The ciphertext is never touched here.
pub fn unlock(
    bundle: &MetadataBundle,
    prompter: &mut dyn Prompter,
    max_attempts: Option<NonZeroU32>,
) -> Result<CipherKey> {
    let mut attempts: u32 = 0;

    loop {
        if let Some(max) = max_attempts {
            if attempts >= max.get() {
                return Err(ByeError::TooManyAttempts(attempts));
            }
        }

        let candidate = prompter
            .read_secret(PASSPHRASE_PROMPT)?
            .map(Zeroizing::new)
            .ok_or(ByeError::InputClosed)?;
        attempts += 1;

        let (key, token) = derive_keys(candidate.as_bytes(), &bundle.salt1, &bundle.salt2);
        if token.matches(&bundle.token) {
            debug!(attempts, "passphrase verified");
            return Ok(key);
        }

        warn!(attempt = attempts, "incorrect passphrase");
        prompter.notify(&format!("Incorrect passphrase. Hint: {}", bundle.hint));
    }
}

/// Decrypt a `.bye` file: verifies the passphrase against the sidecar,
/// writes the plaintext beside it, then removes the ciphertext and sidecar.
/// Returns the plaintext path.
pub fn decrypt_file(
    path: &Path,
    prompter: &mut dyn Prompter,
    options: &DecryptOptions,
) -> Result<PathBuf> {
    let plaintext_path = store::plaintext_path(path)?;
    let sidecar_path = store::sidecar_path(path)?;
    store::require_file(path)?;
    store::require_file(&sidecar_path)?;
    store::ensure_absent(&plaintext_path, options.force)?;

    let bundle = store::read_sidecar(&sidecar_path)?;
    let key = unlock(&bundle, prompter, options.max_attempts)?;

    let ciphertext = std::fs::read(path)?;
    let plaintext = Zeroizing::new(open(&key, &bundle.nonce, &ciphertext)?);
    debug!(bytes = plaintext.len(), "opened ciphertext");

    let mut commit = Commit::new(options.force);
    commit.stage(&plaintext_path, &plaintext)?;
    commit.commit()?;

    store::remove(path)?;
    store::remove(&sidecar_path)?;

    info!(
        source = %path.display(),
        output = %plaintext_path.display(),
        "decrypted"
    );
    Ok(plaintext_path)
}
