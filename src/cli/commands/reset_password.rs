//! `credvault reset-password`: replace the account password with a one-time code.
//!
//! Entries are sealed under a secret derived from the old password, so
//! after a reset they can no longer be decrypted.  Export a plaintext
//! backup first if the old password is still known.

use dialoguer::{Confirm, Input};

use crate::cli::{
    load_config, open_identity, output, pass_gate, prompt_email, prompt_new_password, Cli,
};
use crate::errors::{Result, VaultError};
use crate::identity::IdentityProvider;

/// Execute the `reset-password` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let config = load_config(cli)?;
    pass_gate(&config)?;
    let email = prompt_email(cli)?;

    output::warning(
        "Credentials stored under the old password cannot be decrypted after a reset.",
    );
    let confirmed = Confirm::new()
        .with_prompt("Reset the account password anyway?")
        .default(false)
        .interact()
        .map_err(|e| VaultError::CommandFailed(format!("confirm prompt: {e}")))?;
    if !confirmed {
        return Err(VaultError::UserCancelled);
    }

    let mut identity = open_identity(&config)?;
    identity.request_password_reset(&email)?;

    let otp: String = Input::new()
        .with_prompt("One-time code")
        .interact_text()
        .map_err(|e| VaultError::CommandFailed(format!("code prompt: {e}")))?;
    let new_password = prompt_new_password()?;

    identity.verify_otp_and_reset(&email, &otp, &new_password)?;
    output::success("Account password reset.");
    Ok(())
}
