//! Backup module: bulk export/import of credential records.
//!
//! - Line format, header and parsing (`format`)
//! - Export/import with optional whole-file sealing (`codec`)

pub mod codec;
pub mod format;

pub use codec::{
    default_backup_path, export_all, import_all, import_text, ExportOptions, ImportReport,
    LineIssue,
};
pub use format::PasswordEncoding;
