//! The line-oriented backup format.
//!
//! ```text
//! # credvault-backup v1 encoding=sealed
//! Service: github, Username: alice, Password: <sealed blob or plaintext>
//! ```
//!
//! - The optional header line names how every `Password:` value in the
//!   file is encoded.  Files without it fall back to guessing per line.
//! - Lines starting with `#` and blank lines are not records.
//! - The `Password:` field runs to the end of the line, so passwords may
//!   contain `, `.  No field may contain a line break, and service and
//!   username may not contain a field separator.

use std::fmt;

use zeroize::Zeroizing;

use crate::errors::{Result, VaultError};

const HEADER_PREFIX: &str = "# credvault-backup v1 encoding=";
const SERVICE_TAG: &str = "Service: ";
const USERNAME_SEP: &str = ", Username: ";
const PASSWORD_SEP: &str = ", Password: ";

/// True if `value` contains `, Username: ` or `, Password: `.
///
/// Such a service or username would be split in the wrong place on import.
pub fn contains_separator(value: &str) -> bool {
    [USERNAME_SEP, PASSWORD_SEP].iter().any(|sep| value.contains(sep))
}

/// How the password column of a backup is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordEncoding {
    /// Sealed blobs exactly as stored in the vault.
    Sealed,
    /// Decrypted plaintext (explicit user-requested downgrade).
    Plain,
}

impl PasswordEncoding {
    fn as_str(self) -> &'static str {
        match self {
            Self::Sealed => "sealed",
            Self::Plain => "plain",
        }
    }
}

impl fmt::Display for PasswordEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One parsed record line.
pub struct BackupLine {
    pub service: String,
    pub username: String,
    pub password: Zeroizing<String>,
}

/// The header line for `encoding` (without trailing newline).
pub fn header_line(encoding: PasswordEncoding) -> String {
    format!("{HEADER_PREFIX}{encoding}")
}

/// Read the encoding from a header line, if `line` is one.
pub fn parse_header(line: &str) -> Option<PasswordEncoding> {
    match line.trim().strip_prefix(HEADER_PREFIX)? {
        "sealed" => Some(PasswordEncoding::Sealed),
        "plain" => Some(PasswordEncoding::Plain),
        _ => None,
    }
}

/// Is this line a comment or blank (i.e. not a record)?
pub fn is_ignorable(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty() || trimmed.starts_with('#')
}

/// Render one record line (without trailing newline).
pub fn render_line(service: &str, username: &str, password: &str) -> Result<String> {
    for (name, value) in [("service", service), ("username", username), ("password", password)] {
        if value.contains(['\n', '\r']) {
            return Err(VaultError::InvalidInput(format!(
                "{name} of '{service}' contains a line break and cannot be exported"
            )));
        }
    }
    for (name, value) in [("service", service), ("username", username)] {
        if contains_separator(value) {
            return Err(VaultError::InvalidInput(format!(
                "{name} of '{service}' contains a field separator and cannot be exported"
            )));
        }
    }
    Ok(format!(
        "{SERVICE_TAG}{service}{USERNAME_SEP}{username}{PASSWORD_SEP}{password}"
    ))
}

/// Parse one record line, or say why it is malformed.
pub fn parse_line(line: &str) -> std::result::Result<BackupLine, String> {
    let line = line.trim_end_matches(['\r', '\n']);

    let rest = line
        .strip_prefix(SERVICE_TAG)
        .ok_or_else(|| "missing 'Service:' field".to_string())?;
    let (service, rest) = rest
        .split_once(USERNAME_SEP)
        .ok_or_else(|| "missing 'Username:' field".to_string())?;
    let (username, password) = rest
        .split_once(PASSWORD_SEP)
        .ok_or_else(|| "missing 'Password:' field".to_string())?;

    if service.trim().is_empty() {
        return Err("empty service name".into());
    }
    if username.trim().is_empty() {
        return Err("empty username".into());
    }
    if password.is_empty() {
        return Err("empty password".into());
    }

    Ok(BackupLine {
        service: service.to_string(),
        username: username.to_string(),
        password: Zeroizing::new(strip_bytes_literal(password).to_string()),
    })
}

/// Older exports wrote sealed values as `b'...'`; unwrap those.
fn strip_bytes_literal(value: &str) -> &str {
    value
        .strip_prefix("b'")
        .and_then(|v| v.strip_suffix('\''))
        .filter(|inner| crate::crypto::looks_sealed(inner))
        .unwrap_or(value)
}
