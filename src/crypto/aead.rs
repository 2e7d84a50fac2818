//! AES-256-GCM authenticated encryption of single values.
//!
//! Every call to [`seal`] picks a fresh random salt, derives a key from the
//! caller's secret, picks a fresh random 16-byte nonce, and packs the lot
//! into one self-describing blob:
//!
//! ```text
//! [ salt: 16 | nonce: 16 | tag: 16 | ciphertext: n ]   -> base64
//! ```
//!
//! [`open`] splits the blob at fixed offsets, re-derives the key from the
//! embedded salt and verifies the tag before releasing any plaintext.
//! This is the only module that touches the cipher; everything else goes
//! through `seal`/`open`.

use std::fmt;

use aes_gcm::aead::consts::U16;
use aes_gcm::aead::{AeadCore, AeadInPlace, KeyInit, OsRng};
use aes_gcm::aes::Aes256;
use aes_gcm::{AesGcm, Nonce, Tag};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use zeroize::Zeroizing;

use super::kdf::{self, SALT_LEN};
use super::keys::DerivedKey;
use crate::errors::{Result, VaultError};

/// AES-256-GCM with a 128-bit nonce.
type Cipher = AesGcm<Aes256, U16>;

/// Nonce length in bytes.
pub const NONCE_LEN: usize = 16;

/// Authentication tag length in bytes.
pub const TAG_LEN: usize = 16;

/// Smallest valid decoded blob: salt + nonce + tag with empty ciphertext.
pub const MIN_BLOB_LEN: usize = SALT_LEN + NONCE_LEN + TAG_LEN;

/// The base64 text form of one sealed value.
#[derive(Clone, PartialEq, Eq)]
pub struct SealedBlob(String);

/// A decoded blob split into its four fields.
#[derive(Debug, Clone)]
pub struct SealedParts {
    pub salt: [u8; SALT_LEN],
    pub nonce: [u8; NONCE_LEN],
    pub tag: [u8; TAG_LEN],
    pub ciphertext: Vec<u8>,
}

impl SealedBlob {
    /// Wrap stored text without validating it; [`open`] does the checks.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Decode and split the blob, rejecting anything shorter than 48 bytes.
    pub fn parts(&self) -> Result<SealedParts> {
        let data = BASE64
            .decode(self.0.trim())
            .map_err(|e| VaultError::MalformedBlob(format!("not valid base64: {e}")))?;

        if data.len() < MIN_BLOB_LEN {
            return Err(VaultError::MalformedBlob(format!(
                "decoded length {} is below the {MIN_BLOB_LEN}-byte minimum",
                data.len()
            )));
        }

        let (salt, rest) = data.split_at(SALT_LEN);
        let (nonce, rest) = rest.split_at(NONCE_LEN);
        let (tag, ciphertext) = rest.split_at(TAG_LEN);

        let mut parts = SealedParts {
            salt: [0u8; SALT_LEN],
            nonce: [0u8; NONCE_LEN],
            tag: [0u8; TAG_LEN],
            ciphertext: ciphertext.to_vec(),
        };
        parts.salt.copy_from_slice(salt);
        parts.nonce.copy_from_slice(nonce);
        parts.tag.copy_from_slice(tag);
        Ok(parts)
    }
}

impl fmt::Debug for SealedBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SealedBlob({} chars)", self.0.len())
    }
}

impl fmt::Display for SealedBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Heuristic: does `text` decode as base64 to at least [`MIN_BLOB_LEN`] bytes?
///
/// A plaintext password that happens to be long valid base64 also passes,
/// so only use this where nothing better is known.
pub fn looks_sealed(text: &str) -> bool {
    SealedBlob::from_text(text).parts().is_ok()
}

/// Seal `plaintext` under a key derived from `secret` and a fresh salt.
pub fn seal(plaintext: &[u8], secret: &[u8]) -> Result<SealedBlob> {
    let salt = kdf::generate_salt();
    let key = kdf::derive(secret, &salt)?;
    seal_with_key(plaintext, &key, &salt)
}

/// Seal `plaintext` under an already-derived key.
///
/// `salt` is recorded in the blob verbatim and must be the salt `key` was
/// derived from, otherwise [`open`] cannot re-derive it.
pub fn seal_with_key(
    plaintext: &[u8],
    key: &DerivedKey,
    salt: &[u8; SALT_LEN],
) -> Result<SealedBlob> {
    let cipher = Cipher::new_from_slice(key.as_bytes())
        .map_err(|e| VaultError::InvalidInput(format!("invalid key length: {e}")))?;

    // Random per call, never derived from the plaintext.
    let nonce = Cipher::generate_nonce(&mut OsRng);

    let mut buffer = plaintext.to_vec();
    let tag = cipher
        .encrypt_in_place_detached(&nonce, b"", &mut buffer)
        .map_err(|_| VaultError::InvalidInput("plaintext too large to seal".into()))?;

    let mut packed = Vec::with_capacity(MIN_BLOB_LEN + buffer.len());
    packed.extend_from_slice(salt);
    packed.extend_from_slice(&nonce);
    packed.extend_from_slice(&tag);
    packed.extend_from_slice(&buffer);

    Ok(SealedBlob(BASE64.encode(packed)))
}

/// Open a blob produced by [`seal`] with the same `secret`.
///
/// Returns `MalformedBlob` when the blob cannot even be split, and
/// `AuthenticationFailed` for every cipher-level failure, whether the
/// secret is wrong or the data was altered.
pub fn open(blob: &SealedBlob, secret: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
    let parts = blob.parts()?;
    let key = kdf::derive(secret, &parts.salt)?;
    open_parts(&parts, &key)
}

/// Open a blob with an already-derived key, ignoring its embedded salt.
pub fn open_with_key(blob: &SealedBlob, key: &DerivedKey) -> Result<Zeroizing<Vec<u8>>> {
    let parts = blob.parts()?;
    open_parts(&parts, key)
}

fn open_parts(parts: &SealedParts, key: &DerivedKey) -> Result<Zeroizing<Vec<u8>>> {
    let cipher =
        Cipher::new_from_slice(key.as_bytes()).map_err(|_| VaultError::AuthenticationFailed)?;

    let nonce = Nonce::<U16>::from_slice(&parts.nonce);
    let tag = Tag::<U16>::from_slice(&parts.tag);

    let mut buffer = Zeroizing::new(parts.ciphertext.clone());
    cipher
        .decrypt_in_place_detached(nonce, b"", &mut buffer, tag)
        .map_err(|_| VaultError::AuthenticationFailed)?;

    Ok(buffer)
}
