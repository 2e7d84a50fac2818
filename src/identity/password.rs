//! Login-password hashing with Argon2id.
//!
//! Hashes are stored as PHC strings, so the parameters used at sign-up
//! travel with each hash and verification never depends on the current
//! configuration.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::RngCore;

use crate::errors::{Result, VaultError};

/// Minimum safe memory cost in KiB (8 MB).
const MIN_MEMORY_KIB: u32 = 8_192;

/// Configurable Argon2id parameters.
///
/// These map 1:1 to the `argon2_*` fields of `AppConfig`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Argon2Params {
    /// Memory cost in KiB (default: 65 536 = 64 MB).
    pub memory_kib: u32,
    /// Number of iterations (default: 3).
    pub iterations: u32,
    /// Parallelism lanes (default: 4).
    pub parallelism: u32,
}

impl Default for Argon2Params {
    fn default() -> Self {
        Self {
            memory_kib: 65_536,
            iterations: 3,
            parallelism: 4,
        }
    }
}

impl Argon2Params {
    /// Reject dangerously weak settings.
    pub fn validate(&self) -> Result<()> {
        if self.memory_kib < MIN_MEMORY_KIB {
            return Err(VaultError::Config(format!(
                "argon2_memory_kib must be at least {MIN_MEMORY_KIB} (got {})",
                self.memory_kib
            )));
        }
        if self.iterations < 1 {
            return Err(VaultError::Config(
                "argon2_iterations must be at least 1".into(),
            ));
        }
        if self.parallelism < 1 {
            return Err(VaultError::Config(
                "argon2_parallelism must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Hash `password` into a PHC string.
pub fn hash_password(password: &str, params: &Argon2Params) -> Result<String> {
    params.validate()?;

    let argon2_params = Params::new(params.memory_kib, params.iterations, params.parallelism, None)
        .map_err(|e| VaultError::Config(format!("invalid Argon2 params: {e}")))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon2_params);

    let mut salt_bytes = [0u8; 16];
    rand::rng().fill_bytes(&mut salt_bytes);
    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|e| VaultError::InvalidInput(format!("password salt: {e}")))?;

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| VaultError::InvalidInput(format!("password hashing failed: {e}")))?;
    Ok(hash.to_string())
}

/// Check `password` against a stored PHC string.
///
/// Any mismatch, including an unparsable stored hash, is reported as
/// `AuthenticationFailed`.
pub fn verify_password(password: &str, stored: &str) -> Result<()> {
    let parsed = PasswordHash::new(stored).map_err(|_| VaultError::AuthenticationFailed)?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| VaultError::AuthenticationFailed)
}
