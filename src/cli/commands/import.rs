//! `credvault import`: load credentials from a backup file.

use std::path::Path;

use crate::backup::import_all;
use crate::cli::{output, prompt_secret, unlock, Cli, PASSPHRASE_ENV};
use crate::errors::Result;

/// Execute the `import` command.
pub fn execute(cli: &Cli, file: &Path, passphrase: bool) -> Result<()> {
    let mut unlocked = unlock(cli)?;

    let passphrase = if passphrase {
        Some(prompt_secret(PASSPHRASE_ENV, "Enter backup passphrase")?)
    } else {
        None
    };
    let file_key: &[u8] = match &passphrase {
        Some(p) => p.as_bytes(),
        None => unlocked.app_key.as_bytes(),
    };

    let report = import_all(file, &mut unlocked.vault, &unlocked.session, Some(file_key))?;
    output::print_import_report(&report);

    unlocked.close()
}
