//! `credvault add`: store a new credential.

use crate::cli::{output, prompt_new_secret, unlock, Cli};
use crate::errors::Result;
use crate::generator::generate_password;

/// Environment variable for the entry password (scripted use).
pub const ENTRY_ENV: &str = "CREDVAULT_ENTRY_PASSWORD";

/// Execute the `add` command.
pub fn execute(
    cli: &Cli,
    service: &str,
    username: &str,
    generate: bool,
    length: usize,
) -> Result<()> {
    // Generate before unlocking so a bad --length fails without prompts.
    let generated = if generate {
        Some(generate_password(length)?)
    } else {
        None
    };

    let mut unlocked = unlock(cli)?;

    let password = match generated {
        Some(password) => password,
        None => prompt_new_secret(ENTRY_ENV, &format!("password for {service}"), 1)?,
    };

    unlocked
        .vault
        .add_entry(&unlocked.session, service, username, &password)?;
    output::success(&format!("Added '{username}' for '{service}'"));
    if generate {
        output::info(&format!("Generated password: {}", password.as_str()));
    }

    unlocked.close()
}
