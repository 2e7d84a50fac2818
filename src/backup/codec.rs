//! Bulk export and import of credential records.
//!
//! Export writes one line per record (see `format`), optionally decrypting
//! passwords first, and optionally seals the whole file content as a
//! single blob.  With whole-file sealing the plaintext listing only ever
//! exists in memory; what reaches disk is the blob.
//!
//! Import reverses this and keeps going past bad lines: each one is
//! reported individually and the caller gets an aggregate report.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tracing::{info, warn};
use zeroize::{Zeroize, Zeroizing};

use crate::atomic;
use crate::crypto::{self, SealedBlob};
use crate::errors::{Result, VaultError};
use crate::vault::{
    reveal_password, CredentialRecord, CredentialStore, CredentialVault, VaultSession,
};

use super::format::{self, PasswordEncoding};

/// Export settings.
#[derive(Default)]
pub struct ExportOptions<'a> {
    /// Decrypt passwords with this session and write them in plaintext.
    pub reveal_with: Option<&'a VaultSession>,
    /// Seal the whole file under this key.
    pub file_key: Option<&'a [u8]>,
}

/// One reported problem line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIssue {
    /// 1-based line number in the (unwrapped) backup text.
    pub line: usize,
    pub reason: String,
}

/// Outcome of an import run.
#[derive(Debug, Default)]
pub struct ImportReport {
    /// Entries added to the vault.
    pub imported: usize,
    /// Entries that already existed and were left alone.
    pub skipped: usize,
    /// Lines that did not match the record format.
    pub invalid: Vec<LineIssue>,
    /// Well-formed lines that could not be decrypted or stored.
    pub failed: Vec<LineIssue>,
}

impl fmt::Display for ImportReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} imported, {} skipped, {} invalid",
            self.imported,
            self.skipped,
            self.invalid.len()
        )?;
        if !self.failed.is_empty() {
            write!(f, ", {} failed", self.failed.len())?;
        }
        Ok(())
    }
}

/// Default export location: `<dir>/<YYYY-MM-DD-HHMMSS>.txt`.
pub fn default_backup_path(dir: &Path, now: DateTime<Local>) -> PathBuf {
    dir.join(format!("{}.txt", now.format("%Y-%m-%d-%H%M%S")))
}

/// Render `records` into backup text (header plus one line per record).
pub fn render_backup(
    records: &[CredentialRecord],
    reveal_with: Option<&VaultSession>,
) -> Result<Zeroizing<String>> {
    let encoding = if reveal_with.is_some() {
        PasswordEncoding::Plain
    } else {
        PasswordEncoding::Sealed
    };

    let mut out = Zeroizing::new(format::header_line(encoding));
    out.push('\n');

    for record in records {
        let line = match reveal_with {
            Some(session) => {
                let password = reveal_password(session, record)?;
                Zeroizing::new(format::render_line(
                    &record.service_name,
                    &record.username,
                    &password,
                )?)
            }
            None => Zeroizing::new(format::render_line(
                &record.service_name,
                &record.username,
                record.sealed_password.as_str(),
            )?),
        };
        out.push_str(&line);
        out.push('\n');
    }

    Ok(out)
}

/// Write `records` to `dest` and return the path written.
pub fn export_all(
    records: &[CredentialRecord],
    options: &ExportOptions<'_>,
    dest: &Path,
) -> Result<PathBuf> {
    let text = render_backup(records, options.reveal_with)?;

    let persist = |bytes: &[u8]| {
        atomic::write_private(dest, bytes).map_err(|e| {
            VaultError::PersistenceError(format!("cannot write {}: {e}", dest.display()))
        })
    };

    match options.file_key {
        Some(key) => {
            let blob = crypto::seal(text.as_bytes(), key)?;
            persist(format!("{blob}\n").as_bytes())?;
        }
        None => persist(text.as_bytes())?,
    }

    info!(
        path = %dest.display(),
        count = records.len(),
        plaintext = options.reveal_with.is_some(),
        sealed_file = options.file_key.is_some(),
        "backup exported"
    );
    Ok(dest.to_path_buf())
}

/// Is `content` a whole-file sealed backup rather than record lines?
pub fn is_wrapped(content: &str) -> bool {
    let trimmed = content.trim();
    !trimmed.is_empty()
        && !trimmed.contains('\n')
        && !trimmed.starts_with('#')
        && !trimmed.starts_with("Service:")
        && crypto::looks_sealed(trimmed)
}

/// Read a backup file into its record text, unsealing it if needed.
pub fn read_backup(path: &Path, file_key: Option<&[u8]>) -> Result<Zeroizing<String>> {
    let raw = fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => {
            VaultError::NotFound(format!("backup file {}", path.display()))
        }
        _ => VaultError::Io(e),
    })?;
    let content = Zeroizing::new(
        String::from_utf8(raw)
            .map_err(|_| VaultError::InvalidInput("backup file is not valid UTF-8".into()))?,
    );

    if !is_wrapped(&content) {
        return Ok(content);
    }

    let key = file_key.ok_or_else(|| {
        VaultError::InvalidInput("backup file is encrypted; a file key is required".into())
    })?;
    let mut opened = crypto::open(&SealedBlob::from_text(content.trim()), key)?;
    let plaintext = std::mem::take(&mut *opened);
    String::from_utf8(plaintext).map(Zeroizing::new).map_err(|e| {
        e.into_bytes().zeroize();
        VaultError::MalformedBlob("sealed backup is not valid UTF-8".into())
    })
}

/// Import the backup at `path` into the session owner's vault.
pub fn import_all<S: CredentialStore>(
    path: &Path,
    vault: &mut CredentialVault<S>,
    session: &VaultSession,
    file_key: Option<&[u8]>,
) -> Result<ImportReport> {
    let text = read_backup(path, file_key)?;
    let report = import_text(&text, vault, session);
    info!(path = %path.display(), %report, "backup imported");
    Ok(report)
}

/// Import already-unwrapped backup text.
pub fn import_text<S: CredentialStore>(
    text: &str,
    vault: &mut CredentialVault<S>,
    session: &VaultSession,
) -> ImportReport {
    let mut report = ImportReport::default();
    let mut encoding = None;

    for (index, line) in text.lines().enumerate() {
        let line_no = index + 1;

        if let Some(declared) = format::parse_header(line) {
            encoding = Some(declared);
            continue;
        }
        if format::is_ignorable(line) {
            continue;
        }

        let entry = match format::parse_line(line) {
            Ok(entry) => entry,
            Err(reason) => {
                warn!(line = line_no, %reason, "skipping malformed backup line");
                report.invalid.push(LineIssue { line: line_no, reason });
                continue;
            }
        };

        let password = match resolve_password(&entry.password, encoding, session) {
            Ok(password) => password,
            Err(e) => {
                warn!(
                    line = line_no,
                    service = %entry.service,
                    error = %e,
                    "cannot decrypt backup line"
                );
                report.failed.push(LineIssue {
                    line: line_no,
                    reason: e.to_string(),
                });
                continue;
            }
        };

        match vault.add_entry(session, &entry.service, &entry.username, &password) {
            Ok(_) => report.imported += 1,
            Err(VaultError::DuplicateEntry { .. }) => {
                info!(line = line_no, service = %entry.service, "entry exists, skipped");
                report.skipped += 1;
            }
            Err(e) => {
                warn!(
                    line = line_no,
                    service = %entry.service,
                    error = %e,
                    "cannot store backup line"
                );
                report.failed.push(LineIssue {
                    line: line_no,
                    reason: e.to_string(),
                });
            }
        }
    }

    report
}

/// Turn a password field into plaintext according to the file encoding.
///
/// Without a header, a field that decodes as a sealed blob is treated as
/// one; this guess is wrong for plaintext that happens to be long base64.
fn resolve_password(
    field: &str,
    encoding: Option<PasswordEncoding>,
    session: &VaultSession,
) -> Result<Zeroizing<String>> {
    let sealed = match encoding {
        Some(PasswordEncoding::Sealed) => true,
        Some(PasswordEncoding::Plain) => false,
        None => crypto::looks_sealed(field),
    };

    if !sealed {
        return Ok(Zeroizing::new(field.to_string()));
    }

    let mut opened = crypto::open(&SealedBlob::from_text(field), session.secret())?;
    let plaintext = std::mem::take(&mut *opened);
    String::from_utf8(plaintext).map(Zeroizing::new).map_err(|e| {
        e.into_bytes().zeroize();
        VaultError::MalformedBlob("sealed password is not valid UTF-8".into())
    })
}
