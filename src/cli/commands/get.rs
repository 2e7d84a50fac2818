//! `credvault get`: decrypt and print one credential's password.

use crate::cli::{output, unlock, Cli};
use crate::errors::Result;

/// Execute the `get` command.
pub fn execute(cli: &Cli, service: &str, username: Option<&str>) -> Result<()> {
    let unlocked = unlock(cli)?;

    let entry = match username {
        Some(user) => unlocked.vault.retrieve_exact(&unlocked.session, service, user)?,
        None => unlocked.vault.retrieve_entry(&unlocked.session, service)?,
    };

    output::info(&format!("{} / {}", entry.service_name, entry.username));
    println!("{}", entry.password.as_str());

    unlocked.close()
}
