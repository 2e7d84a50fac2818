use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::crypto::{load_app_key_file, AppKey};
use crate::errors::{Result, VaultError};
use crate::identity::Argon2Params;

/// Environment variable holding a base64 application key.
pub const APP_KEY_ENV: &str = "CREDVAULT_APP_KEY";

/// Installation configuration, loaded from `<data_dir>/credvault.toml`.
///
/// Every field has a default, so a fresh data directory works without
/// any config file at all.  File names are relative to the data directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// SQLite database holding credentials, salts and accounts.
    #[serde(default = "default_database_file")]
    pub database_file: String,

    /// Master-secret record.
    #[serde(default = "default_gate_file")]
    pub gate_file: String,

    /// Application key (32 raw bytes).
    #[serde(default = "default_app_key_file")]
    pub app_key_file: String,

    /// Default export directory.
    #[serde(default = "default_backup_dir")]
    pub backup_dir: String,

    /// Tracing filter used when `CREDVAULT_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Argon2 memory cost in KiB for login-password hashes (default: 64 MB).
    #[serde(default = "default_argon2_memory_kib")]
    pub argon2_memory_kib: u32,

    #[serde(default = "default_argon2_iterations")]
    pub argon2_iterations: u32,

    #[serde(default = "default_argon2_parallelism")]
    pub argon2_parallelism: u32,

    #[serde(skip)]
    data_dir: PathBuf,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_database_file() -> String {
    "credvault.db".to_string()
}

fn default_gate_file() -> String {
    "master.gate".to_string()
}

fn default_app_key_file() -> String {
    "app.key".to_string()
}

fn default_backup_dir() -> String {
    "backup".to_string()
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_argon2_memory_kib() -> u32 {
    65_536
}

fn default_argon2_iterations() -> u32 {
    3
}

fn default_argon2_parallelism() -> u32 {
    4
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_file: default_database_file(),
            gate_file: default_gate_file(),
            app_key_file: default_app_key_file(),
            backup_dir: default_backup_dir(),
            log_level: default_log_level(),
            argon2_memory_kib: default_argon2_memory_kib(),
            argon2_iterations: default_argon2_iterations(),
            argon2_parallelism: default_argon2_parallelism(),
            data_dir: PathBuf::from(".credvault"),
        }
    }
}

impl AppConfig {
    /// Name of the config file inside the data directory.
    pub const FILE_NAME: &'static str = "credvault.toml";

    /// Load `<data_dir>/credvault.toml`, or defaults if it does not exist.
    ///
    /// A file that exists but does not parse is an error.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let config_path = data_dir.join(Self::FILE_NAME);

        let mut config = if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)?;
            toml::from_str::<AppConfig>(&contents).map_err(|e| {
                VaultError::Config(format!("Failed to parse {}: {e}", config_path.display()))
            })?
        } else {
            Self::default()
        };

        config.data_dir = data_dir.to_path_buf();
        config.argon2_params().validate()?;
        Ok(config)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(&self.database_file)
    }

    pub fn gate_path(&self) -> PathBuf {
        self.data_dir.join(&self.gate_file)
    }

    pub fn app_key_path(&self) -> PathBuf {
        self.data_dir.join(&self.app_key_file)
    }

    pub fn backup_dir(&self) -> PathBuf {
        self.data_dir.join(&self.backup_dir)
    }

    /// Convert the Argon2 settings into identity-layer params.
    pub fn argon2_params(&self) -> Argon2Params {
        Argon2Params {
            memory_kib: self.argon2_memory_kib,
            iterations: self.argon2_iterations,
            parallelism: self.argon2_parallelism,
        }
    }

    /// Resolve the application key: `CREDVAULT_APP_KEY`, then the key file.
    pub fn app_key(&self) -> Result<AppKey> {
        match std::env::var(APP_KEY_ENV) {
            Ok(encoded) if !encoded.trim().is_empty() => AppKey::from_base64(encoded.trim()),
            _ => load_app_key_file(&self.app_key_path()),
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────
