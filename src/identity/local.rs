//! SQLite-backed identity provider.
//!
//! Accounts live in `users` (Argon2id PHC hash of the login password);
//! pending resets live in `password_resets` as a SHA-256 hash of the
//! six-digit code plus an expiry.  Codes are single-use, and a pending
//! code is dropped after `MAX_OTP_ATTEMPTS` wrong guesses.

use std::path::Path;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use rusqlite::{params, Connection, OptionalExtension};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use crate::errors::{Result, VaultError};
use crate::vault::sqlite::{is_constraint_violation, read_err, write_err};
use crate::vault::OwnerId;

use super::password::{hash_password, verify_password, Argon2Params};
use super::{IdentityProvider, OtpDelivery};

/// Minimum login-password length.
pub const MIN_PASSWORD_LEN: usize = 8;

/// How long a reset code stays valid.
const OTP_TTL_MINUTES: i64 = 10;

/// Wrong guesses allowed before a pending reset code is discarded.
pub const MAX_OTP_ATTEMPTS: u32 = 5;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS users (
        id            TEXT PRIMARY KEY,
        email         TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        created_at    TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS password_resets (
        email      TEXT PRIMARY KEY,
        otp_hash   TEXT NOT NULL,
        expires_at TEXT NOT NULL,
        attempts   INTEGER NOT NULL DEFAULT 0
    );";

/// Identity provider for single-machine installs.
pub struct LocalIdentity {
    conn: Connection,
    params: Argon2Params,
    delivery: Box<dyn OtpDelivery>,
    current: Option<OwnerId>,
}

impl LocalIdentity {
    /// Open (or create) the identity tables in the database at `path`.
    pub fn open(path: &Path, params: Argon2Params, delivery: Box<dyn OtpDelivery>) -> Result<Self> {
        let conn = Connection::open(path).map_err(|e| {
            VaultError::UpstreamUnavailable(format!("cannot open {}: {e}", path.display()))
        })?;
        Self::with_connection(conn, params, delivery)
    }

    pub fn open_in_memory(params: Argon2Params, delivery: Box<dyn OtpDelivery>) -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| VaultError::UpstreamUnavailable(format!("in-memory database: {e}")))?;
        Self::with_connection(conn, params, delivery)
    }

    fn with_connection(
        conn: Connection,
        params: Argon2Params,
        delivery: Box<dyn OtpDelivery>,
    ) -> Result<Self> {
        params.validate()?;
        conn.execute_batch(SCHEMA)
            .map_err(|e| VaultError::PersistenceError(format!("schema setup: {e}")))?;
        Ok(Self {
            conn,
            params,
            delivery,
            current: None,
        })
    }

    /// The signed-in user, if any.
    pub fn current_user(&self) -> Option<&OwnerId> {
        self.current.as_ref()
    }

    fn discard_reset(&self, email: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM password_resets WHERE email = ?1", params![email])
            .map_err(write_err)?;
        Ok(())
    }

    fn find_user(&self, email: &str) -> Result<Option<(String, String)>> {
        self.conn
            .query_row(
                "SELECT id, password_hash FROM users WHERE email = ?1",
                params![email],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(read_err)
    }
}

impl IdentityProvider for LocalIdentity {
    fn sign_up(&mut self, email: &str, password: &str) -> Result<OwnerId> {
        let email = normalize_email(email)?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(VaultError::InvalidInput(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        let hash = hash_password(password, &self.params)?;
        let id = uuid::Uuid::new_v4().to_string();

        self.conn
            .execute(
                "INSERT INTO users (id, email, password_hash, created_at) VALUES (?1, ?2, ?3, ?4)",
                params![id, email, hash, Utc::now().to_rfc3339()],
            )
            .map_err(|e| {
                if is_constraint_violation(&e) {
                    VaultError::InvalidInput(format!("an account already exists for {email}"))
                } else {
                    write_err(e)
                }
            })?;

        info!(owner = %id, "account created");
        Ok(OwnerId::new(id))
    }

    fn sign_in(&mut self, email: &str, password: &str) -> Result<OwnerId> {
        let email = normalize_email(email)?;

        // Unknown email and wrong password look the same to the caller.
        let (id, hash) = self
            .find_user(&email)?
            .ok_or(VaultError::AuthenticationFailed)?;
        verify_password(password, &hash)?;

        let owner = OwnerId::new(id);
        self.current = Some(owner.clone());
        Ok(owner)
    }

    fn sign_out(&mut self) -> Result<()> {
        self.current = None;
        Ok(())
    }

    fn remove_account(&mut self, owner: &OwnerId) -> Result<()> {
        self.conn
            .execute("DELETE FROM users WHERE id = ?1", params![owner.as_str()])
            .map_err(write_err)?;
        if self.current.as_ref() == Some(owner) {
            self.current = None;
        }
        warn!(owner = %owner, "account removed");
        Ok(())
    }

    fn request_password_reset(&mut self, email: &str) -> Result<()> {
        let email = normalize_email(email)?;
        if self.find_user(&email)?.is_none() {
            return Err(VaultError::NotFound(format!("account for {email}")));
        }

        let otp = Zeroizing::new(format!("{:06}", rand::rng().random_range(0..1_000_000u32)));
        let expires_at = Utc::now() + Duration::minutes(OTP_TTL_MINUTES);

        self.conn
            .execute(
                "INSERT OR REPLACE INTO password_resets (email, otp_hash, expires_at)
                 VALUES (?1, ?2, ?3)",
                params![email, hash_otp(&otp), expires_at.to_rfc3339()],
            )
            .map_err(write_err)?;

        self.delivery.deliver(&email, &otp)?;
        debug!("password reset code issued");
        Ok(())
    }

    fn verify_otp_and_reset(&mut self, email: &str, otp: &str, new_password: &str) -> Result<()> {
        let email = normalize_email(email)?;
        if new_password.chars().count() < MIN_PASSWORD_LEN {
            return Err(VaultError::InvalidInput(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        let pending: Option<(String, String, u32)> = self
            .conn
            .query_row(
                "SELECT otp_hash, expires_at, attempts FROM password_resets WHERE email = ?1",
                params![email],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()
            .map_err(read_err)?;

        let (stored_hash, expires_at, attempts) =
            pending.ok_or(VaultError::AuthenticationFailed)?;
        let expired = DateTime::parse_from_rfc3339(&expires_at)
            .map(|dt| Utc::now() > dt.with_timezone(&Utc))
            .unwrap_or(true);
        if expired || attempts >= MAX_OTP_ATTEMPTS {
            warn!("password reset rejected: code expired or exhausted");
            self.discard_reset(&email)?;
            return Err(VaultError::AuthenticationFailed);
        }

        let matches: bool = hash_otp(otp.trim())
            .as_bytes()
            .ct_eq(stored_hash.as_bytes())
            .into();
        if !matches {
            let attempts = attempts + 1;
            if attempts >= MAX_OTP_ATTEMPTS {
                self.discard_reset(&email)?;
            } else {
                self.conn
                    .execute(
                        "UPDATE password_resets SET attempts = ?1 WHERE email = ?2",
                        params![attempts, email],
                    )
                    .map_err(write_err)?;
            }
            warn!(attempts, "password reset rejected");
            return Err(VaultError::AuthenticationFailed);
        }

        let hash = hash_password(new_password, &self.params)?;
        self.conn
            .execute(
                "UPDATE users SET password_hash = ?1 WHERE email = ?2",
                params![hash, email],
            )
            .map_err(write_err)?;
        self.discard_reset(&email)?;

        info!("login password reset");
        Ok(())
    }
}

fn normalize_email(email: &str) -> Result<String> {
    let email = email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(VaultError::InvalidInput(format!(
            "'{email}' is not a valid email address"
        )));
    }
    Ok(email)
}

fn hash_otp(otp: &str) -> String {
    BASE64.encode(Sha256::digest(otp.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn fast() -> Argon2Params {
        Argon2Params {
            memory_kib: 8_192,
            iterations: 1,
            parallelism: 1,
        }
    }

    fn identity_with_inbox() -> (LocalIdentity, Rc<RefCell<Option<String>>>) {
        let inbox = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&inbox);
        let delivery = move |_email: &str, otp: &str| -> Result<()> {
            *sink.borrow_mut() = Some(otp.to_string());
            Ok(())
        };
        let identity = LocalIdentity::open_in_memory(fast(), Box::new(delivery)).unwrap();
        (identity, inbox)
    }

    #[test]
    fn sign_up_then_sign_in() {
        let (mut id, _) = identity_with_inbox();
        let owner = id.sign_up("Alice@Example.com", "sesame-123").unwrap();

        let signed_in = id.sign_in("alice@example.com", "sesame-123").unwrap();
        assert_eq!(owner, signed_in);
        assert_eq!(id.current_user(), Some(&owner));

        id.sign_out().unwrap();
        assert!(id.current_user().is_none());
    }

    #[test]
    fn sign_in_failures_are_indistinguishable() {
        let (mut id, _) = identity_with_inbox();
        id.sign_up("alice@example.com", "sesame-123").unwrap();

        assert!(matches!(
            id.sign_in("alice@example.com", "wrong-password"),
            Err(VaultError::AuthenticationFailed)
        ));
        assert!(matches!(
            id.sign_in("nobody@example.com", "sesame-123"),
            Err(VaultError::AuthenticationFailed)
        ));
    }

    #[test]
    fn sign_up_validates_input() {
        let (mut id, _) = identity_with_inbox();
        assert!(id.sign_up("not-an-email", "sesame-123").is_err());
        assert!(id.sign_up("a@b.c", "short").is_err());

        id.sign_up("a@b.c", "long-enough").unwrap();
        assert!(matches!(
            id.sign_up("A@B.C", "long-enough"),
            Err(VaultError::InvalidInput(_))
        ));
    }

    #[test]
    fn otp_reset_flow() {
        let (mut id, inbox) = identity_with_inbox();
        id.sign_up("alice@example.com", "old-password").unwrap();

        id.request_password_reset("alice@example.com").unwrap();
        let otp = inbox.borrow().clone().unwrap();
        assert_eq!(otp.len(), 6);

        id.verify_otp_and_reset("alice@example.com", &otp, "new-password")
            .unwrap();
        assert!(id.sign_in("alice@example.com", "old-password").is_err());
        id.sign_in("alice@example.com", "new-password").unwrap();

        // Single use.
        assert!(matches!(
            id.verify_otp_and_reset("alice@example.com", &otp, "third-password"),
            Err(VaultError::AuthenticationFailed)
        ));
    }

    #[test]
    fn wrong_otp_is_rejected() {
        let (mut id, inbox) = identity_with_inbox();
        id.sign_up("alice@example.com", "old-password").unwrap();
        id.request_password_reset("alice@example.com").unwrap();

        let real = inbox.borrow().clone().unwrap();
        let wrong = if real == "000000" { "000001" } else { "000000" };
        assert!(matches!(
            id.verify_otp_and_reset("alice@example.com", wrong, "new-password"),
            Err(VaultError::AuthenticationFailed)
        ));
    }

    #[test]
    fn one_typo_still_allows_the_real_code() {
        let (mut id, inbox) = identity_with_inbox();
        id.sign_up("alice@example.com", "old-password").unwrap();
        id.request_password_reset("alice@example.com").unwrap();

        let real = inbox.borrow().clone().unwrap();
        let wrong = if real == "000000" { "000001" } else { "000000" };
        assert!(id
            .verify_otp_and_reset("alice@example.com", wrong, "new-password")
            .is_err());
        id.verify_otp_and_reset("alice@example.com", &real, "new-password")
            .unwrap();
    }

    #[test]
    fn repeated_wrong_codes_burn_the_reset() {
        let (mut id, inbox) = identity_with_inbox();
        id.sign_up("alice@example.com", "old-password").unwrap();
        id.request_password_reset("alice@example.com").unwrap();

        let real = inbox.borrow().clone().unwrap();
        let guesses = (0..1_000_000u32)
            .map(|n| format!("{n:06}"))
            .filter(|guess| *guess != real)
            .take(MAX_OTP_ATTEMPTS as usize);
        for guess in guesses {
            assert!(matches!(
                id.verify_otp_and_reset("alice@example.com", &guess, "new-password"),
                Err(VaultError::AuthenticationFailed)
            ));
        }

        assert!(matches!(
            id.verify_otp_and_reset("alice@example.com", &real, "new-password"),
            Err(VaultError::AuthenticationFailed)
        ));
        id.sign_in("alice@example.com", "old-password").unwrap();

        // A fresh code works again.
        id.request_password_reset("alice@example.com").unwrap();
        let fresh = inbox.borrow().clone().unwrap();
        id.verify_otp_and_reset("alice@example.com", &fresh, "new-password")
            .unwrap();
    }

    #[test]
    fn removed_account_can_sign_up_again() {
        let (mut id, _) = identity_with_inbox();
        let owner = id.sign_up("alice@example.com", "sesame-123").unwrap();
        id.remove_account(&owner).unwrap();

        assert!(id.sign_in("alice@example.com", "sesame-123").is_err());
        id.sign_up("alice@example.com", "sesame-123").unwrap();
    }

    #[test]
    fn reset_for_unknown_email_is_not_found() {
        let (mut id, _) = identity_with_inbox();
        assert!(matches!(
            id.request_password_reset("ghost@example.com"),
            Err(VaultError::NotFound(_))
        ));
    }
}
