//! High-level credential operations.
//!
//! `CredentialVault` wraps a `CredentialStore` and the crypto layer so the
//! rest of the application can work with calls like
//! `vault.add_entry(&session, "github", "alice", "p@ss1")`.  Plaintext
//! passwords only exist between the caller and `seal`/`open`.

use chrono::Utc;
use tracing::{debug, info};
use zeroize::{Zeroize, Zeroizing};

use crate::backup::format::contains_separator;
use crate::crypto;
use crate::errors::{Result, VaultError};

use super::record::{CredentialRecord, EntrySummary, RetrievedCredential};
use super::session::VaultSession;
use super::store::CredentialStore;

/// Credential operations on top of a storage collaborator.
pub struct CredentialVault<S> {
    store: S,
}

impl<S: CredentialStore> CredentialVault<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Seal `password` and store a new entry.
    ///
    /// An existing `(owner, service, username)` is never overwritten: the
    /// call fails with `DuplicateEntry` and the caller must delete first.
    pub fn add_entry(
        &mut self,
        session: &VaultSession,
        service: &str,
        username: &str,
        password: &str,
    ) -> Result<CredentialRecord> {
        validate_field("service", service)?;
        validate_field("username", username)?;
        validate_password(password)?;

        let owner = session.owner();
        if self.store.select_one(owner, service, username)?.is_some() {
            return Err(VaultError::DuplicateEntry {
                service: service.to_string(),
                username: username.to_string(),
            });
        }

        let sealed_password = crypto::seal(password.as_bytes(), session.secret())?;

        let record = CredentialRecord {
            owner_id: owner.clone(),
            service_name: service.to_string(),
            username: username.to_string(),
            sealed_password,
            created_at: Utc::now(),
        };
        self.store.insert(&record)?;

        info!(owner = %owner, service, username, "entry added");
        Ok(record)
    }

    /// Decrypt the password stored for `service`.
    ///
    /// With several usernames under one service the first by username
    /// wins; use [`Self::retrieve_exact`] to pick one.
    pub fn retrieve_entry(
        &self,
        session: &VaultSession,
        service: &str,
    ) -> Result<RetrievedCredential> {
        let record = self
            .store
            .select_by_service(session.owner(), service)?
            .into_iter()
            .next()
            .ok_or_else(|| VaultError::NotFound(format!("entry for service '{service}'")))?;
        self.decrypt_record(session, record)
    }

    /// Decrypt the password stored for exactly `(service, username)`.
    pub fn retrieve_exact(
        &self,
        session: &VaultSession,
        service: &str,
        username: &str,
    ) -> Result<RetrievedCredential> {
        let record = self
            .store
            .select_one(session.owner(), service, username)?
            .ok_or_else(|| {
                VaultError::NotFound(format!("entry for '{service}' with username '{username}'"))
            })?;
        self.decrypt_record(session, record)
    }

    /// Service and username of every entry, without any password.
    ///
    /// Runs a fresh query on each call; no entries is an empty iterator.
    pub fn list_entries(
        &self,
        session: &VaultSession,
    ) -> Result<impl Iterator<Item = EntrySummary>> {
        let records = self.store.select_all(session.owner())?;
        Ok(records.into_iter().map(|r| r.summary()))
    }

    /// All sealed records of the session owner (used by backup export).
    pub fn records(&self, session: &VaultSession) -> Result<Vec<CredentialRecord>> {
        self.store.select_all(session.owner())
    }

    /// Remove one entry.
    pub fn delete_entry(
        &mut self,
        session: &VaultSession,
        service: &str,
        username: &str,
    ) -> Result<()> {
        if !self.store.delete(session.owner(), service, username)? {
            return Err(VaultError::NotFound(format!(
                "entry for '{service}' with username '{username}'"
            )));
        }
        info!(owner = %session.owner(), service, username, "entry deleted");
        Ok(())
    }

    fn decrypt_record(
        &self,
        session: &VaultSession,
        record: CredentialRecord,
    ) -> Result<RetrievedCredential> {
        let password = reveal_password(session, &record)?;
        debug!(service = %record.service_name, "entry decrypted");
        Ok(RetrievedCredential {
            service_name: record.service_name,
            username: record.username,
            password,
        })
    }
}

/// Open a record's sealed password with the session secret.
pub fn reveal_password(
    session: &VaultSession,
    record: &CredentialRecord,
) -> Result<Zeroizing<String>> {
    let mut bytes = crypto::open(&record.sealed_password, session.secret())?;

    // Take the bytes out of the zeroizing buffer; a UTF-8 failure hands
    // them back inside the error, which is wiped before discarding.
    let plaintext = std::mem::take(&mut *bytes);
    String::from_utf8(plaintext)
        .map(Zeroizing::new)
        .map_err(|e| {
            let mut bad_bytes = e.into_bytes();
            bad_bytes.zeroize();
            VaultError::MalformedBlob("sealed password is not valid UTF-8".into())
        })
}

fn validate_field(name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(VaultError::InvalidInput(format!("{name} cannot be empty")));
    }
    if value.contains(['\n', '\r']) {
        return Err(VaultError::InvalidInput(format!(
            "{name} cannot contain line breaks"
        )));
    }
    if contains_separator(value) {
        return Err(VaultError::InvalidInput(format!(
            "{name} cannot contain ', Username: ' or ', Password: '"
        )));
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<()> {
    if password.is_empty() {
        return Err(VaultError::InvalidInput("password cannot be empty".into()));
    }
    if password.contains(['\n', '\r']) {
        return Err(VaultError::InvalidInput(
            "password cannot contain line breaks".into(),
        ));
    }
    Ok(())
}
