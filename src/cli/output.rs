//! Colored terminal output helpers.
//!
//! All user-facing output goes through these functions so we get
//! consistent styling across every command.

use comfy_table::{ContentArrangement, Table};
use console::style;

use crate::backup::ImportReport;
use crate::vault::EntrySummary;

/// Print a green success message: "check_mark {msg}"
pub fn success(msg: &str) {
    println!("{} {}", style("\u{2713}").green().bold(), msg);
}

/// Print a red error message: "x_mark {msg}"
pub fn error(msg: &str) {
    eprintln!("{} {}", style("\u{2717}").red().bold(), msg);
}

/// Print a yellow warning: "warning_sign {msg}"
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("\u{26a0}").yellow().bold(), msg);
}

/// Print a blue info message: "info_sign {msg}"
pub fn info(msg: &str) {
    println!("{} {}", style("\u{2139}").blue().bold(), msg);
}

/// Print a dim tip/hint: "arrow {msg}"
pub fn tip(msg: &str) {
    println!("{} {}", style("\u{2192}").dim(), style(msg).dim());
}

/// Print a table of stored entries (Service, Username, Added).
pub fn print_entries_table(entries: &[EntrySummary]) {
    if entries.is_empty() {
        info("No credentials in this vault yet.");
        tip("Run `credvault add <SERVICE> <USERNAME>` to add your first one.");
        return;
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Service", "Username", "Added"]);

    for e in entries {
        table.add_row(vec![
            e.service_name.clone(),
            e.username.clone(),
            e.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        ]);
    }

    println!("{table}");
}

/// Print the outcome of an import, listing every rejected line.
pub fn print_import_report(report: &ImportReport) {
    if report.invalid.is_empty() && report.failed.is_empty() {
        success(&format!("Import finished: {report}"));
    } else {
        warning(&format!("Import finished with problems: {report}"));
    }

    for issue in &report.invalid {
        warning(&format!("line {}: {}", issue.line, issue.reason));
    }
    for issue in &report.failed {
        error(&format!("line {}: {}", issue.line, issue.reason));
    }
}
