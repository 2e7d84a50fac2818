//! Cryptographic primitives for CredVault.
//!
//! This module provides:
//! - PBKDF2-HMAC-SHA256 key derivation (`kdf`)
//! - AES-256-GCM sealing of single values into base64 blobs (`aead`)
//! - Self-wiping key types and application-key files (`keys`)

pub mod aead;
pub mod kdf;
pub mod keys;

// Re-export the most commonly used items so callers can write:
//   use crate::crypto::{seal, open, derive, ...};
pub use aead::{looks_sealed, open, seal, SealedBlob};
pub use kdf::{derive, generate_salt, SALT_LEN};
pub use keys::{generate_app_key_file, load_app_key_file, AppKey, DerivedKey};
