//! Vault module: encrypted credential storage.
//!
//! This module provides:
//! - `CredentialRecord` and friends (`record`)
//! - The storage collaborator trait and an in-memory store (`store`)
//! - A SQLite implementation of that trait (`sqlite`)
//! - Unlocked `VaultSession` capabilities (`session`)
//! - High-level `CredentialVault` add/retrieve/list/delete (`credentials`)

pub mod credentials;
pub mod record;
pub mod session;
pub mod sqlite;
pub mod store;

// Re-export the most commonly used items.
pub use credentials::{reveal_password, CredentialVault};
pub use record::{CredentialRecord, EntrySummary, OwnerId, RetrievedCredential};
pub use session::{sign_up, VaultSession};
pub use sqlite::SqliteStore;
pub use store::{CredentialStore, MemoryStore};
