//! Owner-only atomic file writes.
//!
//! Data goes to a hidden temp file in the target directory, gets `0600`
//! permissions on Unix, and is renamed over the target.  Readers see
//! either the old file or the complete new one.  On failure the temp file
//! is removed.

use std::fs;
use std::io;
use std::path::Path;

pub(crate) fn write_private(path: &Path, contents: &[u8]) -> io::Result<()> {
    let parent = path.parent().unwrap_or(Path::new("."));
    let tmp_path = parent.join(format!(
        ".{}.tmp",
        path.file_name().unwrap_or_default().to_string_lossy()
    ));

    let result = (|| {
        fs::write(&tmp_path, contents)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&tmp_path, fs::Permissions::from_mode(0o600))?;
        }
        fs::rename(&tmp_path, path)
    })();

    if result.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    result
}
