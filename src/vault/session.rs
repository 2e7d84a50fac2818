//! Unlocked vault sessions.
//!
//! Signing in turns a login password plus the per-user salt into the
//! session secret: `derive(password, user_salt)`.  That secret is what
//! every record of the owner is sealed under (each record then adds its
//! own per-record salt inside the blob).  The session holds it only until
//! it is closed or dropped.

use tracing::{debug, info, warn};

use crate::crypto::{self, DerivedKey};
use crate::errors::{Result, VaultError};
use crate::identity::IdentityProvider;

use super::record::OwnerId;
use super::store::CredentialStore;

/// Capability to read and write one owner's entries.
pub struct VaultSession {
    owner: OwnerId,
    secret: DerivedKey,
}

impl std::fmt::Debug for VaultSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultSession")
            .field("owner", &self.owner)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

impl VaultSession {
    /// Build a session from an owner and an already-derived secret.
    pub fn new(owner: OwnerId, secret: DerivedKey) -> Self {
        Self { owner, secret }
    }

    /// Derive the session secret from a login password and the owner's
    /// stored per-user salt.
    pub fn unlock<S: CredentialStore>(store: &S, owner: OwnerId, password: &str) -> Result<Self> {
        let salt = store
            .get_salt(&owner)?
            .ok_or_else(|| VaultError::NotFound(format!("encryption salt for user {owner}")))?;
        let secret = crypto::derive(password.as_bytes(), &salt)?;
        debug!(owner = %owner, "vault session unlocked");
        Ok(Self { owner, secret })
    }

    /// Sign in through the identity provider, then unlock.
    pub fn sign_in<I, S>(identity: &mut I, store: &S, email: &str, password: &str) -> Result<Self>
    where
        I: IdentityProvider,
        S: CredentialStore,
    {
        let owner = identity.sign_in(email, password)?;
        let session = Self::unlock(store, owner, password)?;
        info!(owner = %session.owner, "signed in");
        Ok(session)
    }

    pub fn owner(&self) -> &OwnerId {
        &self.owner
    }

    pub(crate) fn secret(&self) -> &[u8] {
        self.secret.as_bytes()
    }

    /// End the session: sign out and wipe the secret.
    pub fn close<I: IdentityProvider>(self, identity: &mut I) -> Result<()> {
        let owner = self.owner.clone();
        drop(self);
        identity.sign_out()?;
        info!(owner = %owner, "signed out");
        Ok(())
    }
}

/// Register a new user and provision their per-user salt.
///
/// The salt is generated exactly once here; the store refuses to replace
/// it later.  If the salt cannot be stored the new account is removed
/// again, so the email stays free for a retry.
pub fn sign_up<I, S>(
    identity: &mut I,
    store: &mut S,
    email: &str,
    password: &str,
) -> Result<OwnerId>
where
    I: IdentityProvider,
    S: CredentialStore,
{
    let owner = identity.sign_up(email, password)?;
    let salt = crypto::generate_salt();
    if let Err(e) = store.set_salt(&owner, &salt) {
        warn!(owner = %owner, error = %e, "salt not stored, rolling back sign-up");
        identity.remove_account(&owner)?;
        return Err(e);
    }
    info!(owner = %owner, "user registered");
    Ok(owner)
}
