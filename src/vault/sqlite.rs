//! SQLite-backed credential store.
//!
//! Credentials live in `credentials`, per-user salts in `user_salts`, both
//! inside the database file configured as `database_file`.  Salts are
//! stored base64-encoded; sealed passwords are already text.

use std::path::Path;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};

use crate::crypto::{SealedBlob, SALT_LEN};
use crate::errors::{Result, VaultError};

use super::record::{CredentialRecord, OwnerId};
use super::store::CredentialStore;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS credentials (
        id              INTEGER PRIMARY KEY AUTOINCREMENT,
        owner_id        TEXT NOT NULL,
        service_name    TEXT NOT NULL,
        username        TEXT NOT NULL,
        sealed_password TEXT NOT NULL,
        created_at      TEXT NOT NULL,
        UNIQUE (owner_id, service_name, username)
    );
    CREATE TABLE IF NOT EXISTS user_salts (
        owner_id TEXT PRIMARY KEY,
        salt     TEXT NOT NULL
    );";

const SELECT_COLUMNS: &str =
    "SELECT owner_id, service_name, username, sealed_password, created_at FROM credentials";

/// `CredentialStore` on top of a SQLite database.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) the database at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|e| {
            VaultError::UpstreamUnavailable(format!("cannot open {}: {e}", path.display()))
        })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            let _ = std::fs::set_permissions(path, perms);
        }

        Self::with_connection(conn)
    }

    /// A private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| VaultError::UpstreamUnavailable(format!("in-memory database: {e}")))?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)
            .map_err(|e| VaultError::PersistenceError(format!("schema setup: {e}")))?;
        Ok(Self { conn })
    }

    fn query_records(
        &self,
        sql: &str,
        args: &[&dyn rusqlite::ToSql],
    ) -> Result<Vec<CredentialRecord>> {
        let mut stmt = self.conn.prepare(sql).map_err(read_err)?;

        let rows = stmt
            .query_map(args, |row| {
                let ts: String = row.get(4)?;
                let created_at = DateTime::parse_from_rfc3339(&ts)
                    .map_or_else(|_| Utc::now(), |dt| dt.with_timezone(&Utc));
                Ok(CredentialRecord {
                    owner_id: OwnerId::new(row.get::<_, String>(0)?),
                    service_name: row.get(1)?,
                    username: row.get(2)?,
                    sealed_password: SealedBlob::from_text(row.get::<_, String>(3)?),
                    created_at,
                })
            })
            .map_err(read_err)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row.map_err(read_err)?);
        }
        Ok(records)
    }
}

impl CredentialStore for SqliteStore {
    fn insert(&mut self, record: &CredentialRecord) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO credentials
                     (owner_id, service_name, username, sealed_password, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    record.owner_id.as_str(),
                    record.service_name,
                    record.username,
                    record.sealed_password.as_str(),
                    record.created_at.to_rfc3339(),
                ],
            )
            .map_err(|e| {
                if is_constraint_violation(&e) {
                    VaultError::DuplicateEntry {
                        service: record.service_name.clone(),
                        username: record.username.clone(),
                    }
                } else {
                    write_err(e)
                }
            })?;
        Ok(())
    }

    fn select_by_service(&self, owner: &OwnerId, service: &str) -> Result<Vec<CredentialRecord>> {
        let sql = format!(
            "{SELECT_COLUMNS} WHERE owner_id = ?1 AND service_name = ?2 ORDER BY username"
        );
        self.query_records(&sql, params![owner.as_str(), service])
    }

    fn select_one(
        &self,
        owner: &OwnerId,
        service: &str,
        username: &str,
    ) -> Result<Option<CredentialRecord>> {
        let sql = format!(
            "{SELECT_COLUMNS} WHERE owner_id = ?1 AND service_name = ?2 AND username = ?3"
        );
        let mut found = self.query_records(&sql, params![owner.as_str(), service, username])?;
        Ok(found.pop())
    }

    fn select_all(&self, owner: &OwnerId) -> Result<Vec<CredentialRecord>> {
        let sql = format!("{SELECT_COLUMNS} WHERE owner_id = ?1 ORDER BY service_name, username");
        self.query_records(&sql, params![owner.as_str()])
    }

    fn delete(&mut self, owner: &OwnerId, service: &str, username: &str) -> Result<bool> {
        let removed = self
            .conn
            .execute(
                "DELETE FROM credentials
                 WHERE owner_id = ?1 AND service_name = ?2 AND username = ?3",
                params![owner.as_str(), service, username],
            )
            .map_err(write_err)?;
        Ok(removed > 0)
    }

    fn get_salt(&self, owner: &OwnerId) -> Result<Option<[u8; SALT_LEN]>> {
        let encoded: Option<String> = self
            .conn
            .query_row(
                "SELECT salt FROM user_salts WHERE owner_id = ?1",
                params![owner.as_str()],
                |row| row.get(0),
            )
            .optional()
            .map_err(read_err)?;

        let Some(encoded) = encoded else {
            return Ok(None);
        };

        let bytes = BASE64
            .decode(encoded)
            .map_err(|e| VaultError::PersistenceError(format!("stored salt is not base64: {e}")))?;
        let salt: [u8; SALT_LEN] = bytes.try_into().map_err(|_| {
            VaultError::PersistenceError(format!("stored salt for {owner} has the wrong length"))
        })?;
        Ok(Some(salt))
    }

    fn set_salt(&mut self, owner: &OwnerId, salt: &[u8; SALT_LEN]) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO user_salts (owner_id, salt) VALUES (?1, ?2)",
                params![owner.as_str(), BASE64.encode(salt)],
            )
            .map_err(|e| {
                if is_constraint_violation(&e) {
                    VaultError::InvalidInput(format!("a salt is already stored for user {owner}"))
                } else {
                    write_err(e)
                }
            })?;
        Ok(())
    }
}

pub(crate) fn is_constraint_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _) if err.code == ErrorCode::ConstraintViolation
    )
}

fn is_unreachable(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _)
            if matches!(
                err.code,
                ErrorCode::CannotOpen | ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked
            )
    )
}

pub(crate) fn read_err(e: rusqlite::Error) -> VaultError {
    VaultError::UpstreamUnavailable(format!("query failed: {e}"))
}

pub(crate) fn write_err(e: rusqlite::Error) -> VaultError {
    if is_unreachable(&e) {
        VaultError::UpstreamUnavailable(format!("write failed: {e}"))
    } else {
        VaultError::PersistenceError(format!("write failed: {e}"))
    }
}
