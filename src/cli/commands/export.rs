//! `credvault export`: write all credentials to a backup file.
//!
//! By default passwords stay sealed.  `--plaintext` decrypts them first;
//! `--encrypt-file` seals the whole file under the application key and
//! `--passphrase` under a separate backup passphrase instead.

use std::fs;
use std::path::PathBuf;

use chrono::Local;

use crate::backup::{default_backup_path, export_all, ExportOptions};
use crate::cli::{output, prompt_new_secret, unlock, Cli, PASSPHRASE_ENV};
use crate::errors::Result;

/// Minimum backup passphrase length.
const MIN_PASSPHRASE_LEN: usize = 8;

/// Execute the `export` command.
pub fn execute(
    cli: &Cli,
    plaintext: bool,
    encrypt_file: bool,
    passphrase: bool,
    output_path: Option<PathBuf>,
) -> Result<()> {
    let unlocked = unlock(cli)?;

    let passphrase = if passphrase {
        Some(prompt_new_secret(PASSPHRASE_ENV, "backup passphrase", MIN_PASSPHRASE_LEN)?)
    } else {
        None
    };
    let file_key: Option<&[u8]> = match &passphrase {
        Some(p) => Some(p.as_bytes()),
        None if encrypt_file => Some(unlocked.app_key.as_bytes()),
        None => None,
    };

    if plaintext && file_key.is_none() {
        output::warning(
            "Writing passwords in plaintext. Delete the file when you no longer need it.",
        );
    }

    let dest = match output_path {
        Some(path) => path,
        None => {
            let dir = unlocked.config.backup_dir();
            fs::create_dir_all(&dir)?;
            default_backup_path(&dir, Local::now())
        }
    };

    let records = unlocked.vault.records(&unlocked.session)?;
    let options = ExportOptions {
        reveal_with: plaintext.then_some(&unlocked.session),
        file_key,
    };
    let written = export_all(&records, &options, &dest)?;

    output::success(&format!(
        "Exported {} credential(s) to {}",
        records.len(),
        written.display()
    ));
    if passphrase.is_some() {
        output::tip("Import it with `credvault import <FILE> --passphrase`.");
    }

    unlocked.close()
}
