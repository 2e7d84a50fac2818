//! `credvault signup`: create an account and its encryption salt.

use crate::cli::{
    load_config, open_identity, output, pass_gate, prompt_email, prompt_new_password, Cli,
};
use crate::errors::Result;
use crate::vault::{self, SqliteStore};

/// Execute the `signup` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let config = load_config(cli)?;
    pass_gate(&config)?;

    let email = prompt_email(cli)?;
    let password = prompt_new_password()?;

    let mut store = SqliteStore::open(&config.database_path())?;
    let mut identity = open_identity(&config)?;
    vault::sign_up(&mut identity, &mut store, &email, &password)?;

    output::success(&format!("Account created for {email}"));
    output::tip("Run `credvault add <SERVICE> <USERNAME>` to store your first credential.");
    Ok(())
}
