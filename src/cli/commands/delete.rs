//! `credvault delete`: remove one credential.

use dialoguer::Confirm;

use crate::cli::{output, unlock, Cli};
use crate::errors::{Result, VaultError};

/// Execute the `delete` command.
pub fn execute(cli: &Cli, service: &str, username: &str, force: bool) -> Result<()> {
    // Unless --force is set, ask for confirmation before deleting.
    if !force {
        let confirmed = Confirm::new()
            .with_prompt(format!("Delete '{username}' for '{service}'?"))
            .default(false)
            .interact()
            .map_err(|e| VaultError::CommandFailed(format!("confirm prompt: {e}")))?;

        if !confirmed {
            output::info("Cancelled.");
            return Ok(());
        }
    }

    let mut unlocked = unlock(cli)?;
    unlocked
        .vault
        .delete_entry(&unlocked.session, service, username)?;
    output::success(&format!("Deleted '{username}' for '{service}'"));

    unlocked.close()
}
