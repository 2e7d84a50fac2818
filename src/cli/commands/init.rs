//! `credvault init`: provision the application key, database and master password.

use std::fs;

use crate::cli::{load_config, open_identity, output, prompt_new_secret, Cli, MASTER_ENV};
use crate::config::{AppConfig, APP_KEY_ENV};
use crate::crypto::{generate_app_key_file, AppKey};
use crate::errors::{Result, VaultError};
use crate::gate::{GateState, MasterSecretGate};
use crate::vault::SqliteStore;

/// Minimum master password length.
const MIN_MASTER_LEN: usize = 8;

/// Execute the `init` command.
pub fn execute(cli: &Cli) -> Result<()> {
    // 1. Create the data directory if it doesn't exist.
    if !cli.data_dir.exists() {
        fs::create_dir_all(&cli.data_dir)?;
        output::info(&format!("Created data directory: {}", cli.data_dir.display()));
    }

    let config = load_config(cli)?;
    let gate = MasterSecretGate::new(config.gate_path());

    // 2. Refuse to run twice.
    if let GateState::Set(_) = gate.state()? {
        output::tip(
            "The master password is already set; use `credvault signup` to add an account.",
        );
        return Err(VaultError::InvalidInput(format!(
            "{} is already initialised",
            cli.data_dir.display()
        )));
    }

    // 3. Application key: environment, an existing key file, or a new one.
    let app_key = provision_app_key(&config)?;

    // 4. Master password.
    let master = prompt_new_secret(MASTER_ENV, "master password", MIN_MASTER_LEN)?;
    gate.create(&master, &app_key)?;

    // 5. Create the database tables and write a default config file.
    SqliteStore::open(&config.database_path())?;
    open_identity(&config)?;
    write_default_config(&config)?;

    output::success(&format!("Vault initialised in {}", cli.data_dir.display()));
    output::warning(&format!(
        "Back up {} safely: without it the master password and app-key backups cannot be opened.",
        config.app_key_path().display()
    ));
    output::tip("Run `credvault signup` to create your account.");
    Ok(())
}

fn provision_app_key(config: &AppConfig) -> Result<AppKey> {
    if std::env::var(APP_KEY_ENV).is_ok_and(|v| !v.trim().is_empty()) {
        output::info(&format!("Using application key from {APP_KEY_ENV}"));
        return config.app_key();
    }

    let path = config.app_key_path();
    if path.exists() {
        output::info(&format!("Using existing application key {}", path.display()));
        return config.app_key();
    }

    let key = generate_app_key_file(&path)?;
    output::info(&format!("Generated application key {}", path.display()));
    Ok(key)
}

fn write_default_config(config: &AppConfig) -> Result<()> {
    let path = config.data_dir().join(AppConfig::FILE_NAME);
    if path.exists() {
        return Ok(());
    }
    let text = toml::to_string_pretty(config)
        .map_err(|e| VaultError::Config(format!("cannot serialise config: {e}")))?;
    fs::write(&path, text)?;
    Ok(())
}
