//! Credential record types.
//!
//! A `CredentialRecord` holds the non-secret fields of one entry in the
//! clear and the password only as a [`SealedBlob`].  `EntrySummary` is the
//! listing view and never carries the password in any form.

use std::fmt;

use chrono::{DateTime, Utc};
use zeroize::Zeroizing;

use crate::crypto::SealedBlob;

/// Identifier handed out by the identity provider for one user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OwnerId(String);

impl OwnerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One stored credential.
///
/// Unique per `(owner_id, service_name, username)`.
#[derive(Debug, Clone)]
pub struct CredentialRecord {
    pub owner_id: OwnerId,
    pub service_name: String,
    pub username: String,
    /// The password, sealed under the owner's session secret.
    pub sealed_password: SealedBlob,
    pub created_at: DateTime<Utc>,
}

impl CredentialRecord {
    /// Does this record share the duplicate-detection key with the given one?
    pub fn same_entry(&self, owner: &OwnerId, service: &str, username: &str) -> bool {
        &self.owner_id == owner && self.service_name == service && self.username == username
    }

    pub fn summary(&self) -> EntrySummary {
        EntrySummary {
            service_name: self.service_name.clone(),
            username: self.username.clone(),
            created_at: self.created_at,
        }
    }
}

/// Listing view of a record (no password).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntrySummary {
    pub service_name: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

/// A decrypted credential, wiped from memory on drop.
pub struct RetrievedCredential {
    pub service_name: String,
    pub username: String,
    pub password: Zeroizing<String>,
}

impl fmt::Debug for RetrievedCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetrievedCredential")
            .field("service_name", &self.service_name)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}
