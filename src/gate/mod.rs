//! Master-secret gate: the application unlock check.
//!
//! The master secret is sealed under the installation's [`AppKey`] and
//! written as one base64 line to the gate file.  Unlocking opens that
//! record and compares the plaintext with the candidate.
//!
//! Because the record is encrypted rather than hashed, anyone holding the
//! app key can recover the master secret itself, not just check guesses.
//! The gate is therefore only as strong as the secrecy of the app key.

use std::fs;
use std::path::{Path, PathBuf};

use subtle::ConstantTimeEq;
use tracing::{info, warn};

use crate::atomic;
use crate::crypto::{self, AppKey, SealedBlob};
use crate::errors::{Result, VaultError};

/// The persisted master-secret record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MasterSecretRecord {
    pub blob: SealedBlob,
}

/// Whether a master secret has been set for this installation.
#[derive(Debug)]
pub enum GateState {
    Unset,
    Set(MasterSecretRecord),
}

/// File-backed master-secret gate.
pub struct MasterSecretGate {
    path: PathBuf,
}

impl MasterSecretGate {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Inspect the gate file.
    pub fn state(&self) -> Result<GateState> {
        if !self.path.exists() {
            return Ok(GateState::Unset);
        }
        let text = fs::read_to_string(&self.path)
            .map_err(|e| VaultError::PersistenceError(format!("cannot read gate file: {e}")))?;
        let text = text.trim();
        if text.is_empty() {
            return Ok(GateState::Unset);
        }
        Ok(GateState::Set(MasterSecretRecord {
            blob: SealedBlob::from_text(text),
        }))
    }

    /// Seal `candidate` under `app_key` and persist it.
    ///
    /// Only valid from the `Unset` state; changing an existing master
    /// secret is not supported.
    pub fn create(&self, candidate: &str, app_key: &AppKey) -> Result<MasterSecretRecord> {
        if candidate.trim().is_empty() {
            return Err(VaultError::InvalidInput(
                "master secret cannot be empty".into(),
            ));
        }
        if let GateState::Set(_) = self.state()? {
            return Err(VaultError::InvalidInput(format!(
                "a master secret is already set in {}",
                self.path.display()
            )));
        }

        let blob = crypto::seal(candidate.as_bytes(), app_key.as_bytes())?;
        atomic::write_private(&self.path, format!("{blob}\n").as_bytes()).map_err(|e| {
            VaultError::PersistenceError(format!("cannot write {}: {e}", self.path.display()))
        })?;

        info!(path = %self.path.display(), "master secret created");
        Ok(MasterSecretRecord { blob })
    }

    /// Load the record and check `candidate` against it.
    ///
    /// Fails with `NotFound` while the gate is unset.
    pub fn unlock(&self, candidate: &str, app_key: &AppKey) -> Result<bool> {
        match self.state()? {
            GateState::Unset => Err(VaultError::NotFound(
                "master secret (run `credvault init` first)".into(),
            )),
            GateState::Set(record) => verify(candidate, &record, app_key),
        }
    }
}

/// Check `candidate` against `record`.
///
/// `Ok(false)` means the record is fine and the candidate is wrong.
/// `GateCorrupted` means the record itself could not be opened with
/// `app_key`, so no candidate can ever match.
pub fn verify(candidate: &str, record: &MasterSecretRecord, app_key: &AppKey) -> Result<bool> {
    let stored = match crypto::open(&record.blob, app_key.as_bytes()) {
        Ok(plaintext) => plaintext,
        Err(VaultError::AuthenticationFailed | VaultError::MalformedBlob(_)) => {
            warn!("master secret record failed authentication");
            return Err(VaultError::GateCorrupted);
        }
        Err(e) => return Err(e),
    };

    Ok(stored.as_slice().ct_eq(candidate.as_bytes()).into())
}
