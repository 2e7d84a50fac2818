//! Key material types that wipe themselves on drop.
//!
//! - [`DerivedKey`]: the 32-byte output of PBKDF2, never persisted.
//! - [`AppKey`]: the long-lived application key that protects the
//!   master-secret record and, by default, whole-file backups.
//!
//! The application key lives in a 32-byte file next to the database,
//! written with owner-only permissions.

use std::fmt;
use std::fs;
use std::path::Path;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::errors::{Result, VaultError};

/// Length of derived keys and of the application key (256 bits).
pub const KEY_LEN: usize = 32;

/// A 32-byte symmetric key that is zeroed when dropped.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey {
    bytes: [u8; KEY_LEN],
}

impl DerivedKey {
    /// Wrap raw key bytes.
    pub fn new(bytes: [u8; KEY_LEN]) -> Self {
        Self { bytes }
    }

    pub(crate) fn zeroed() -> Self {
        Self {
            bytes: [0u8; KEY_LEN],
        }
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }

    pub(crate) fn as_mut_bytes(&mut self) -> &mut [u8; KEY_LEN] {
        &mut self.bytes
    }
}

impl fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DerivedKey([REDACTED])")
    }
}

/// The installation's application key.
///
/// Provisioned once by `credvault init`; passed explicitly to the master
/// gate and the backup codec, never cached in a global.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct AppKey {
    bytes: [u8; KEY_LEN],
}

impl AppKey {
    pub fn new(bytes: [u8; KEY_LEN]) -> Self {
        Self { bytes }
    }

    /// Generate a fresh random application key.
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_LEN];
        rand::rng().fill_bytes(&mut bytes);
        Self { bytes }
    }

    /// Parse a base64-encoded key (as found in `CREDVAULT_APP_KEY`).
    pub fn from_base64(encoded: &str) -> Result<Self> {
        let mut decoded = BASE64
            .decode(encoded.trim())
            .map_err(|e| VaultError::Config(format!("app key is not valid base64: {e}")))?;
        let key = Self::from_slice(&decoded);
        decoded.zeroize();
        key
    }

    fn from_slice(data: &[u8]) -> Result<Self> {
        if data.len() != KEY_LEN {
            return Err(VaultError::Config(format!(
                "app key must be exactly {KEY_LEN} bytes, got {}",
                data.len()
            )));
        }
        let mut bytes = [0u8; KEY_LEN];
        bytes.copy_from_slice(data);
        Ok(Self { bytes })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Debug for AppKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AppKey([REDACTED])")
    }
}

/// Generate a new application key and write it to `path`.
///
/// Refuses to overwrite an existing file: replacing the key would make
/// the master-secret record and every app-key backup unreadable.
pub fn generate_app_key_file(path: &Path) -> Result<AppKey> {
    if path.exists() {
        return Err(VaultError::InvalidInput(format!(
            "app key already exists at {}",
            path.display()
        )));
    }

    let key = AppKey::generate();

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| {
                VaultError::PersistenceError(format!("cannot create key directory: {e}"))
            })?;
        }
    }

    fs::write(path, key.as_bytes())
        .map_err(|e| VaultError::PersistenceError(format!("failed to write app key: {e}")))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = fs::Permissions::from_mode(0o600);
        fs::set_permissions(path, perms).map_err(|e| {
            VaultError::PersistenceError(format!("failed to set app key permissions: {e}"))
        })?;
    }

    Ok(key)
}

/// Load the application key from disk and validate its length.
pub fn load_app_key_file(path: &Path) -> Result<AppKey> {
    if !path.exists() {
        return Err(VaultError::NotFound(format!(
            "app key at {} (run `credvault init` first)",
            path.display()
        )));
    }

    let mut data = fs::read(path)?;
    let key = AppKey::from_slice(&data);
    data.zeroize();
    key
}
