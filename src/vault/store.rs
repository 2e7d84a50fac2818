//! The storage collaborator.
//!
//! `CredentialStore` is the row store behind the vault: credential rows
//! keyed by owner and service, plus one per-user salt per owner.  The
//! vault never retries a failed call; whatever the store returns is
//! surfaced to the caller as-is.
//!
//! `MemoryStore` keeps everything in process memory and is what tests
//! and embedders without a database use.

use std::collections::HashMap;

use crate::crypto::SALT_LEN;
use crate::errors::{Result, VaultError};

use super::record::{CredentialRecord, OwnerId};

/// Row store for credential records and per-user salts.
pub trait CredentialStore {
    /// Insert a new record.  Fails with `DuplicateEntry` when a record
    /// with the same owner, service and username already exists.
    fn insert(&mut self, record: &CredentialRecord) -> Result<()>;

    /// All records of `owner` for `service`, ordered by username.
    fn select_by_service(&self, owner: &OwnerId, service: &str) -> Result<Vec<CredentialRecord>>;

    /// The record for exactly `(owner, service, username)`, if any.
    fn select_one(
        &self,
        owner: &OwnerId,
        service: &str,
        username: &str,
    ) -> Result<Option<CredentialRecord>>;

    /// All records of `owner`, ordered by service then username.
    fn select_all(&self, owner: &OwnerId) -> Result<Vec<CredentialRecord>>;

    /// Remove one record.  Returns whether anything was deleted.
    fn delete(&mut self, owner: &OwnerId, service: &str, username: &str) -> Result<bool>;

    /// The per-user salt of `owner`, if one was ever stored.
    fn get_salt(&self, owner: &OwnerId) -> Result<Option<[u8; SALT_LEN]>>;

    /// Store the per-user salt of `owner`.  Refuses to replace an existing
    /// salt, which would orphan every record sealed under it.
    fn set_salt(&mut self, owner: &OwnerId, salt: &[u8; SALT_LEN]) -> Result<()>;
}

/// In-memory `CredentialStore`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Vec<CredentialRecord>,
    salts: HashMap<OwnerId, [u8; SALT_LEN]>,
    offline: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with `UpstreamUnavailable`.
    pub fn set_offline(&mut self, offline: bool) {
        self.offline = offline;
    }

    fn check_online(&self) -> Result<()> {
        if self.offline {
            return Err(VaultError::UpstreamUnavailable(
                "memory store is offline".into(),
            ));
        }
        Ok(())
    }

    fn sorted(mut records: Vec<CredentialRecord>) -> Vec<CredentialRecord> {
        records.sort_by(|a, b| {
            (a.service_name.as_str(), a.username.as_str())
                .cmp(&(b.service_name.as_str(), b.username.as_str()))
        });
        records
    }
}

impl CredentialStore for MemoryStore {
    fn insert(&mut self, record: &CredentialRecord) -> Result<()> {
        self.check_online()?;
        if self
            .records
            .iter()
            .any(|r| r.same_entry(&record.owner_id, &record.service_name, &record.username))
        {
            return Err(VaultError::DuplicateEntry {
                service: record.service_name.clone(),
                username: record.username.clone(),
            });
        }
        self.records.push(record.clone());
        Ok(())
    }

    fn select_by_service(&self, owner: &OwnerId, service: &str) -> Result<Vec<CredentialRecord>> {
        self.check_online()?;
        let matching = self
            .records
            .iter()
            .filter(|r| &r.owner_id == owner && r.service_name == service)
            .cloned()
            .collect();
        Ok(Self::sorted(matching))
    }

    fn select_one(
        &self,
        owner: &OwnerId,
        service: &str,
        username: &str,
    ) -> Result<Option<CredentialRecord>> {
        self.check_online()?;
        Ok(self
            .records
            .iter()
            .find(|r| r.same_entry(owner, service, username))
            .cloned())
    }

    fn select_all(&self, owner: &OwnerId) -> Result<Vec<CredentialRecord>> {
        self.check_online()?;
        let owned = self
            .records
            .iter()
            .filter(|r| &r.owner_id == owner)
            .cloned()
            .collect();
        Ok(Self::sorted(owned))
    }

    fn delete(&mut self, owner: &OwnerId, service: &str, username: &str) -> Result<bool> {
        self.check_online()?;
        let before = self.records.len();
        self.records
            .retain(|r| !r.same_entry(owner, service, username));
        Ok(self.records.len() != before)
    }

    fn get_salt(&self, owner: &OwnerId) -> Result<Option<[u8; SALT_LEN]>> {
        self.check_online()?;
        Ok(self.salts.get(owner).copied())
    }

    fn set_salt(&mut self, owner: &OwnerId, salt: &[u8; SALT_LEN]) -> Result<()> {
        self.check_online()?;
        if self.salts.contains_key(owner) {
            return Err(VaultError::InvalidInput(format!(
                "a salt is already stored for user {owner}"
            )));
        }
        self.salts.insert(owner.clone(), *salt);
        Ok(())
    }
}
