use crate::error::{ByeError, Result};
use crate::pipeline::{Salt, VerificationToken, KEY_SIZE, NONCE_SIZE, SALT_SIZE};

/// Field separator in the sidecar record
const DELIMITER: char = '\n';
/// Number of fields: token, salt1, salt2, nonce, hint
const FIELD_COUNT: usize = 5;

/// Everything needed to verify a passphrase and open the matching ciphertext.
///
/// Sidecar layout (UTF-8 text, one field per line):
///
/// ```text
/// <token hex>\n<salt1 hex>\n<salt2 hex>\n<nonce hex>\n<hint>\n
/// ```
///
/// Binary fields are hex so they never contain the delimiter. The hint is
/// everything after the fourth newline, minus one trailing line ending
/// (`\r\n` when the record uses CRLF throughout).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataBundle {
    pub token: VerificationToken,
    pub salt1: Salt,
    pub salt2: Salt,
    pub nonce: [u8; NONCE_SIZE],
    pub hint: String,
}

impl MetadataBundle {
    pub fn encode(&self) -> Vec<u8> {
        let hex_len = 2 * (KEY_SIZE + 2 * SALT_SIZE + NONCE_SIZE);
        let mut out = String::with_capacity(hex_len + self.hint.len() + FIELD_COUNT);
        for field in [
            hex::encode(self.token.as_bytes()),
            hex::encode(self.salt1),
            hex::encode(self.salt2),
            hex::encode(self.nonce),
        ] {
            out.push_str(&field);
            out.push(DELIMITER);
        }
        out.push_str(&self.hint);
        out.push(DELIMITER);
        out.into_bytes()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(bytes)
            .map_err(|_| ByeError::MalformedMetadata("record is not valid UTF-8".into()))?;

        let fields: Vec<&str> = text.splitn(FIELD_COUNT, DELIMITER).collect();
        if fields.len() < FIELD_COUNT {
            return Err(ByeError::MalformedMetadata(format!(
                "expected {} fields, found {}",
                FIELD_COUNT,
                fields.len()
            )));
        }

        let token = decode_field::<KEY_SIZE>(fields[0], "verification token")?;
        let salt1 = decode_field::<SALT_SIZE>(fields[1], "salt1")?;
        let salt2 = decode_field::<SALT_SIZE>(fields[2], "salt2")?;
        let nonce = decode_field::<NONCE_SIZE>(fields[3], "nonce")?;
        // a record rewritten with CRLF endings carries '\r' on every line
        let terminator = if fields[0].ends_with('\r') { "\r\n" } else { "\n" };
        let hint = fields[4].strip_suffix(terminator).unwrap_or(fields[4]);

        Ok(Self {
            token: VerificationToken::from_bytes(token),
            salt1,
            salt2,
            nonce,
            hint: hint.to_string(),
        })
    }
}

fn decode_field<const N: usize>(field: &str, name: &str) -> Result<[u8; N]> {
    let mut out = [0u8; N];
    hex::decode_to_slice(field.trim_end_matches('\r'), &mut out).map_err(|e| {
        ByeError::MalformedMetadata(format!("{} ({} bytes expected): {}", name, N, e))
    })?;
    Ok(out)
}
