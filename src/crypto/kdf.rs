//! Password-based key derivation using PBKDF2-HMAC-SHA256.
//!
//! The hash, iteration count and output length form one versioned
//! parameter set.  They are not configurable: every record sealed under
//! the current version must stay decryptable by every later run.

use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha256;

use super::keys::DerivedKey;
use crate::errors::{Result, VaultError};

/// Length of every salt in bytes (128 bits).
pub const SALT_LEN: usize = 16;

/// A versioned set of KDF parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfVersion {
    pub version: u8,
    pub iterations: u32,
}

/// The parameters used for everything written today.
pub const CURRENT_KDF: KdfVersion = KdfVersion {
    version: 1,
    iterations: 100_000,
};

/// Derive a 32-byte key from `secret` and a 16-byte `salt`.
///
/// The same secret + salt always produce the same key.  A salt of any
/// other length is rejected rather than truncated or padded.
pub fn derive(secret: &[u8], salt: &[u8]) -> Result<DerivedKey> {
    if salt.len() != SALT_LEN {
        return Err(VaultError::InvalidInput(format!(
            "salt must be exactly {SALT_LEN} bytes (got {})",
            salt.len()
        )));
    }

    let mut key = DerivedKey::zeroed();
    pbkdf2_hmac::<Sha256>(secret, salt, CURRENT_KDF.iterations, key.as_mut_bytes());
    Ok(key)
}

/// Generate a cryptographically random 16-byte salt.
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    rand::rng().fill_bytes(&mut salt);
    salt
}
