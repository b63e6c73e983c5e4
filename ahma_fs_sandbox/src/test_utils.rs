//! Filesystem assertions for tests that use a [`Sandbox`](crate::Sandbox).

use anyhow::Result;
use std::path::Path;

/// Verify that a path exists and is a file
pub fn file_exists(path: &Path) -> bool {
    std::fs::metadata(path).map(|m| m.is_file()).unwrap_or(false)
}

/// Verify that a path exists and is a directory
pub fn dir_exists(path: &Path) -> bool {
    std::fs::metadata(path).map(|m| m.is_dir()).unwrap_or(false)
}

/// Verify that a path is a symbolic link, without following it
pub fn is_symlink(path: &Path) -> bool {
    std::fs::symlink_metadata(path)
        .map(|m| m.file_type().is_symlink())
        .unwrap_or(false)
}

/// Whether anything (including a dangling symlink) exists at `path`
pub fn path_exists(path: &Path) -> bool {
    std::fs::symlink_metadata(path).is_ok()
}

/// Read a file and return its contents as a string
pub fn read_file_contents(path: &Path) -> Result<String> {
    Ok(std::fs::read_to_string(path)?)
}

/// Permission bits of `path`, without following symlinks
#[cfg(unix)]
pub fn mode_of(path: &Path) -> Result<u32> {
    use std::os::unix::fs::PermissionsExt;
    Ok(std::fs::symlink_metadata(path)?.permissions().mode() & 0o7777)
}
