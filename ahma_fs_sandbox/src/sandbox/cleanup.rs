//! Best-effort recursive removal of a sandbox tree.
//!
//! Unlike `std::fs::remove_dir_all`, this never stops at the first entry it
//! cannot inspect or delete. Directories whose permission bits forbid listing
//! are opened up for the owner first; anything still inaccessible is skipped
//! and reported through `tracing` instead of being returned as an error.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Outcome of a best-effort removal, for logging only.
#[derive(Debug, Default)]
pub(crate) struct CleanupReport {
    pub removed: usize,
    pub skipped: Vec<PathBuf>,
}

impl CleanupReport {
    fn skip(&mut self, path: &Path, action: &str, err: &std::io::Error) {
        debug!(path = %path.display(), action, error = %err, "cleanup skipped entry");
        self.skipped.push(path.to_path_buf());
    }
}

/// Remove `root` and everything beneath it, ignoring entries that cannot be
/// inspected or removed. A missing `root` is not an error.
///
/// When `root` itself is a symlink to a directory, the directory it points at
/// is emptied before the link is removed. Symlinks below the root are never
/// followed.
pub(crate) fn remove_tree_best_effort(root: &Path) -> CleanupReport {
    let mut report = CleanupReport::default();
    if is_symlink_to_dir(root) {
        remove_children(root, &mut report);
    }
    remove_entry(root, &mut report);
    if !report.skipped.is_empty() {
        warn!(
            root = %root.display(),
            skipped = report.skipped.len(),
            "cleanup left entries behind"
        );
    }
    report
}

fn remove_entry(path: &Path, report: &mut CleanupReport) {
    let meta = match fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == ErrorKind::NotFound => return,
        Err(e) => return report.skip(path, "stat", &e),
    };

    if meta.is_dir() {
        remove_children(path, report);
        match fs::remove_dir(path) {
            Ok(()) => report.removed += 1,
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => report.skip(path, "remove_dir", &e),
        }
    } else {
        match remove_file(path, &meta) {
            Ok(()) => report.removed += 1,
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => report.skip(path, "remove_file", &e),
        }
    }
}

fn is_symlink_to_dir(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok_and(|m| m.file_type().is_symlink())
        && fs::metadata(path).is_ok_and(|m| m.is_dir())
}

/// Remove everything inside the directory at `dir`, leaving `dir` itself.
fn remove_children(dir: &Path, report: &mut CleanupReport) {
    if let Ok(meta) = fs::metadata(dir) {
        ensure_owner_access(dir, &meta);
    }
    match fs::read_dir(dir) {
        Ok(entries) => {
            for entry in entries {
                match entry {
                    Ok(entry) => remove_entry(&entry.path(), report),
                    Err(e) => report.skip(dir, "read_dir", &e),
                }
            }
        }
        Err(e) => report.skip(dir, "read_dir", &e),
    }
}

#[cfg(unix)]
fn ensure_owner_access(path: &Path, meta: &fs::Metadata) {
    use std::os::unix::fs::PermissionsExt;

    let mode = meta.permissions().mode();
    if mode & 0o700 != 0o700
        && let Err(e) = fs::set_permissions(path, fs::Permissions::from_mode(mode | 0o700))
    {
        debug!(path = %path.display(), error = %e, "could not open up directory for cleanup");
    }
}

#[cfg(not(unix))]
fn ensure_owner_access(_path: &Path, _meta: &fs::Metadata) {}

#[cfg(unix)]
fn remove_file(path: &Path, _meta: &fs::Metadata) -> std::io::Result<()> {
    fs::remove_file(path)
}

// Read-only files cannot be deleted on Windows until the attribute is cleared.
#[cfg(windows)]
fn remove_file(path: &Path, meta: &fs::Metadata) -> std::io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() == ErrorKind::PermissionDenied && meta.permissions().readonly() => {
            let mut perms = meta.permissions();
            perms.set_readonly(false);
            fs::set_permissions(path, perms)?;
            fs::remove_file(path)
        }
        other => other,
    }
}

#[cfg(not(any(unix, windows)))]
fn remove_file(path: &Path, _meta: &fs::Metadata) -> std::io::Result<()> {
    fs::remove_file(path)
}
