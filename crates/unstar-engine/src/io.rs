//! File helpers: reading and writing models, backups and diffs

use similar::TextDiff;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Default suffix for backup files
pub const DEFAULT_BACKUP_SUFFIX: &str = ".bak";

pub fn read_text(path: &Path) -> io::Result<String> {
    fs::read_to_string(path)
}

/// Write `content`, creating missing parent directories
pub fn write_text(path: &Path, content: &str) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)
}

/// Sibling backup path: `orders.sql` + `.bak` = `orders.sql.bak`
pub fn backup_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

/// Copy `path` to its backup unless a backup already exists
///
/// Returns the backup path when one was written. An existing backup keeps
/// the oldest pre-image and is never overwritten.
pub fn ensure_backup(path: &Path, suffix: &str) -> io::Result<Option<PathBuf>> {
    let backup = backup_path(path, suffix);
    if backup.exists() || !path.exists() {
        return Ok(None);
    }

    fs::copy(path, &backup)?;
    tracing::debug!(backup = %backup.display(), "backup written");
    Ok(Some(backup))
}

/// Unified diff between two texts
pub fn unified_diff(a_label: &str, a_text: &str, b_label: &str, b_text: &str) -> String {
    TextDiff::from_lines(a_text, b_text)
        .unified_diff()
        .header(a_label, b_label)
        .to_string()
}
