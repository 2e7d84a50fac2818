//! The identity collaborator.
//!
//! The vault only needs two things from identity: a stable user id after
//! sign-in, and an account lifecycle (sign-up, sign-out, OTP reset).
//! `IdentityProvider` is that seam; `LocalIdentity` implements it on the
//! same SQLite file as the credential store.

pub mod local;
pub mod password;

pub use local::LocalIdentity;
pub use password::{hash_password, verify_password, Argon2Params};

use crate::errors::Result;
use crate::vault::OwnerId;

/// Account operations the vault consumes.
pub trait IdentityProvider {
    /// Register a new account and return its user id.
    fn sign_up(&mut self, email: &str, password: &str) -> Result<OwnerId>;

    /// Check credentials and return the user id.
    fn sign_in(&mut self, email: &str, password: &str) -> Result<OwnerId>;

    /// Forget the signed-in user.
    fn sign_out(&mut self) -> Result<()>;

    /// Delete an account outright (rolls back a half-finished sign-up).
    fn remove_account(&mut self, owner: &OwnerId) -> Result<()>;

    /// Send a one-time reset code to `email`.
    fn request_password_reset(&mut self, email: &str) -> Result<()>;

    /// Replace the login password if `otp` is the current reset code.
    fn verify_otp_and_reset(&mut self, email: &str, otp: &str, new_password: &str) -> Result<()>;
}

/// Where one-time reset codes go (mail, terminal, a test buffer).
pub trait OtpDelivery {
    fn deliver(&mut self, email: &str, otp: &str) -> Result<()>;
}

impl<F> OtpDelivery for F
where
    F: FnMut(&str, &str) -> Result<()>,
{
    fn deliver(&mut self, email: &str, otp: &str) -> Result<()> {
        self(email, otp)
    }
}
