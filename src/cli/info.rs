use crate::error::Result;
use crate::pipeline::{ITERATIONS, KEY_SIZE, TAG_SIZE};
use crate::store;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// What can be learned about an encrypted file without its passphrase
#[derive(Debug, Clone, Serialize)]
pub struct EnvelopeInfo {
    pub ciphertext: String,
    pub sidecar: String,
    pub restores_to: String,
    pub ciphertext_bytes: u64,
    pub plaintext_bytes: u64,
    pub hint: String,
    pub kdf: String,
    pub iterations: u32,
    pub salt1: String,
    pub salt2: String,
    pub cipher: String,
    pub nonce: String,
}

/// Read the sidecar of a `.bye` file
pub fn inspect(path: &Path) -> Result<EnvelopeInfo> {
    let restores_to = store::plaintext_path(path)?;
    let sidecar = store::sidecar_path(path)?;
    store::require_file(path)?;
    store::require_file(&sidecar)?;

    let bundle = store::read_sidecar(&sidecar)?;
    let ciphertext_bytes = fs::metadata(path)?.len();

    Ok(EnvelopeInfo {
        ciphertext: path.display().to_string(),
        sidecar: sidecar.display().to_string(),
        restores_to: restores_to.display().to_string(),
        ciphertext_bytes,
        plaintext_bytes: ciphertext_bytes.saturating_sub(TAG_SIZE as u64),
        hint: bundle.hint,
        kdf: "PBKDF2-HMAC-SHA256".into(),
        iterations: ITERATIONS,
        salt1: hex::encode(bundle.salt1),
        salt2: hex::encode(bundle.salt2),
        cipher: format!("AES-{}-GCM", KEY_SIZE * 8),
        nonce: hex::encode(bundle.nonce),
    })
}

/// Render information about a `.bye` file as text or JSON
pub fn show_info(path: &Path, json: bool) -> Result<String> {
    let info = inspect(path)?;

    if json {
        let mut out = serde_json::to_string_pretty(&info)?;
        out.push('\n');
        return Ok(out);
    }

    let mut output = String::new();
    output.push_str("Encrypted File Information\n");
    output.push_str("==========================\n\n");

    output.push_str(&format!("File: {}\n", info.ciphertext));
    output.push_str(&format!("Sidecar: {}\n", info.sidecar));
    output.push_str(&format!("Restores to: {}\n", info.restores_to));
    output.push_str(&format!(
        "Size: {} (plaintext {})\n",
        format_size(info.ciphertext_bytes),
        format_size(info.plaintext_bytes)
    ));
    output.push_str(&format!("Hint: {}\n\n", info.hint));

    output.push_str("Key Derivation:\n");
    output.push_str(&format!("  Function: {}\n", info.kdf));
    output.push_str(&format!("  Iterations: {}\n", info.iterations));
    output.push_str(&format!("  Salt 1: {}\n", info.salt1));
    output.push_str(&format!("  Salt 2: {}\n\n", info.salt2));

    output.push_str("Cipher:\n");
    output.push_str(&format!("  Algorithm: {}\n", info.cipher));
    output.push_str(&format!("  Nonce: {}\n", info.nonce));

    Ok(output)
}

/// Human-readable byte count in binary units, one decimal above bytes
fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];

    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit + 1 < UNITS.len() {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}
