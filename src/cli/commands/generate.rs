//! `credvault generate`: print a random password.

use crate::errors::Result;
use crate::generator::generate_password;

/// Execute the `generate` command.
pub fn execute(length: usize) -> Result<()> {
    let password = generate_password(length)?;
    println!("{}", password.as_str());
    Ok(())
}
