//! CLI module: clap argument parser, prompts, output helpers and commands.

pub mod commands;
pub mod output;

use std::path::PathBuf;

use clap::Parser;
use tracing::debug;
use zeroize::Zeroizing;

use crate::config::AppConfig;
use crate::crypto::AppKey;
use crate::errors::{Result, VaultError};
use crate::gate::MasterSecretGate;
use crate::generator::DEFAULT_LENGTH;
use crate::identity::local::MIN_PASSWORD_LEN;
use crate::identity::LocalIdentity;
use crate::vault::{CredentialVault, SqliteStore, VaultSession};

/// Environment variable for the master secret (scripted use).
pub const MASTER_ENV: &str = "CREDVAULT_MASTER";
/// Environment variable for the account login password (scripted use).
pub const PASSWORD_ENV: &str = "CREDVAULT_PASSWORD";
/// Environment variable for a backup passphrase (scripted use).
pub const PASSPHRASE_ENV: &str = "CREDVAULT_BACKUP_PASSPHRASE";

/// CredVault CLI: personal encrypted credential vault.
#[derive(Parser)]
#[command(
    name = "credvault",
    about = "Personal encrypted credential vault",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Data directory (default: .credvault)
    #[arg(long, default_value = ".credvault", global = true, env = "CREDVAULT_DIR")]
    pub data_dir: PathBuf,

    /// Account email (prompted for if omitted)
    #[arg(long, global = true, env = "CREDVAULT_EMAIL")]
    pub email: Option<String>,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Create the application key and set the master password
    Init,

    /// Create an account
    Signup,

    /// Add a credential
    Add {
        /// Service name (e.g. github)
        service: String,
        /// Username for the service
        username: String,
        /// Generate a random password instead of prompting
        #[arg(short, long)]
        generate: bool,
        /// Length of the generated password
        #[arg(long, default_value_t = DEFAULT_LENGTH)]
        length: usize,
    },

    /// Print a credential's password
    Get {
        /// Service name
        service: String,
        /// Pick a specific username when a service has several
        #[arg(short, long)]
        username: Option<String>,
    },

    /// List stored credentials (no passwords)
    List,

    /// Delete a credential
    Delete {
        /// Service name
        service: String,
        /// Username
        username: String,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Export all credentials to a backup file
    Export {
        /// Write decrypted passwords instead of sealed blobs
        #[arg(long)]
        plaintext: bool,
        /// Seal the whole file (under the app key unless --passphrase)
        #[arg(long)]
        encrypt_file: bool,
        /// Seal the whole file under a separate backup passphrase
        #[arg(long)]
        passphrase: bool,
        /// Output file (default: <backup_dir>/<timestamp>.txt)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Import credentials from a backup file
    Import {
        /// Path to the backup file
        file: PathBuf,
        /// The file is sealed under a backup passphrase, not the app key
        #[arg(long)]
        passphrase: bool,
    },

    /// Reset the account password with an emailed one-time code
    ResetPassword,

    /// Print a random password
    Generate {
        /// Password length (4-128)
        #[arg(short, long, default_value_t = DEFAULT_LENGTH)]
        length: usize,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for (bash, zsh, fish, powershell)
        shell: String,
    },
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// Everything a vault command needs once the gate is passed and the user
/// is signed in.
pub struct Unlocked {
    pub config: AppConfig,
    pub app_key: AppKey,
    pub identity: LocalIdentity,
    pub vault: CredentialVault<SqliteStore>,
    pub session: VaultSession,
}

impl Unlocked {
    /// Sign out and drop the session secret.
    pub fn close(mut self) -> Result<()> {
        self.session.close(&mut self.identity)
    }
}

/// Load `credvault.toml` from the data directory.
pub fn load_config(cli: &Cli) -> Result<AppConfig> {
    AppConfig::load(&cli.data_dir)
}

/// Check the master password against the gate.
pub fn pass_gate(config: &AppConfig) -> Result<AppKey> {
    let app_key = config.app_key()?;
    let gate = MasterSecretGate::new(config.gate_path());
    let master = prompt_secret(MASTER_ENV, "Enter master password")?;
    if !gate.unlock(&master, &app_key)? {
        return Err(VaultError::AuthenticationFailed);
    }
    debug!("master gate passed");
    Ok(app_key)
}

/// Open the identity provider on the configured database.
pub fn open_identity(config: &AppConfig) -> Result<LocalIdentity> {
    LocalIdentity::open(
        &config.database_path(),
        config.argon2_params(),
        Box::new(print_otp),
    )
}

/// Pass the gate, sign in, and open the credential vault.
pub fn unlock(cli: &Cli) -> Result<Unlocked> {
    let config = load_config(cli)?;
    let app_key = pass_gate(&config)?;

    let email = prompt_email(cli)?;
    let password = prompt_secret(PASSWORD_ENV, "Enter account password")?;

    let store = SqliteStore::open(&config.database_path())?;
    let mut identity = open_identity(&config)?;
    let session = VaultSession::sign_in(&mut identity, &store, &email, &password)?;

    Ok(Unlocked {
        config,
        app_key,
        identity,
        vault: CredentialVault::new(store),
        session,
    })
}

/// OTP sink for the local install: there is no mail server, so the code
/// is shown on the terminal.
fn print_otp(email: &str, otp: &str) -> Result<()> {
    output::info(&format!("One-time reset code for {email}: {otp}"));
    Ok(())
}

/// The account email from `--email` / `CREDVAULT_EMAIL`, or a prompt.
pub fn prompt_email(cli: &Cli) -> Result<String> {
    if let Some(email) = &cli.email {
        return Ok(email.clone());
    }
    dialoguer::Input::<String>::new()
        .with_prompt("Email")
        .interact_text()
        .map_err(|e| VaultError::CommandFailed(format!("email prompt: {e}")))
}

/// Read a secret from `env_var`, falling back to a hidden prompt.
///
/// Returns `Zeroizing<String>` so the secret is wiped from memory on drop.
pub fn prompt_secret(env_var: &str, prompt: &str) -> Result<Zeroizing<String>> {
    if let Ok(value) = std::env::var(env_var) {
        if !value.is_empty() {
            return Ok(Zeroizing::new(value));
        }
    }

    let value = dialoguer::Password::new()
        .with_prompt(prompt)
        .interact()
        .map_err(|e| VaultError::CommandFailed(format!("password prompt: {e}")))?;
    Ok(Zeroizing::new(value))
}

/// Prompt for a new secret with confirmation, enforcing `min_len`.
///
/// Also respects `env_var` for scripted use.
pub fn prompt_new_secret(env_var: &str, what: &str, min_len: usize) -> Result<Zeroizing<String>> {
    if let Ok(value) = std::env::var(env_var) {
        if !value.is_empty() {
            if value.chars().count() < min_len {
                return Err(VaultError::InvalidInput(format!(
                    "{what} must be at least {min_len} characters"
                )));
            }
            return Ok(Zeroizing::new(value));
        }
    }

    loop {
        let value = Zeroizing::new(
            dialoguer::Password::new()
                .with_prompt(format!("Choose {what}"))
                .with_confirmation(format!("Confirm {what}"), "Entries do not match, try again")
                .interact()
                .map_err(|e| VaultError::CommandFailed(format!("password prompt: {e}")))?,
        );

        if value.chars().count() < min_len {
            output::warning(&format!(
                "The {what} must be at least {min_len} characters. Try again."
            ));
            continue;
        }

        return Ok(value);
    }
}

/// Prompt for a new account password.
pub fn prompt_new_password() -> Result<Zeroizing<String>> {
    prompt_new_secret(PASSWORD_ENV, "account password", MIN_PASSWORD_LEN)
}
