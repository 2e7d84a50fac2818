//! `credvault list`: show stored entries in a table.

use crate::cli::{output, unlock, Cli};
use crate::errors::Result;
use crate::vault::EntrySummary;

/// Execute the `list` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let unlocked = unlock(cli)?;

    let entries: Vec<EntrySummary> = unlocked.vault.list_entries(&unlocked.session)?.collect();
    output::info(&format!("{} credential(s)", entries.len()));
    output::print_entries_table(&entries);

    unlocked.close()
}
