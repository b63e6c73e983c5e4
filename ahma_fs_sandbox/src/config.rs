//! # Sandbox Configuration
//!
//! `SandboxConfig` controls how a sandbox root is allocated and when it is
//! removed implicitly. It can be built in code with the `with_*` methods,
//! deserialized from a harness config file, or seeded from the environment:
//!
//! - `AHMA_FS_SANDBOX_KEEP=1` keeps trees on disk after drop/exit so a failing
//!   test can be inspected. Explicit `cleanup()` calls still remove them.
//! - `AHMA_FS_SANDBOX_TMPDIR=/some/dir` allocates generated roots under that
//!   directory instead of the system temp area.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const KEEP_ENV_VAR: &str = "AHMA_FS_SANDBOX_KEEP";
pub const TMPDIR_ENV_VAR: &str = "AHMA_FS_SANDBOX_TMPDIR";

/// Default prefix for generated sandbox roots. The process id is appended.
pub const DEFAULT_PREFIX: &str = "ahma_fs_sandbox_";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SandboxConfig {
    /// Name prefix for generated roots.
    pub prefix: String,
    /// Parent directory for generated roots; the system temp area when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temp_dir: Option<PathBuf>,
    /// Remove the tree when the `Sandbox` is dropped.
    pub cleanup_on_drop: bool,
    /// Remove the tree when the process is terminated.
    pub register_exit_hook: bool,
    /// Leave the tree behind on implicit cleanup (drop and exit hook).
    pub keep_files: bool,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            temp_dir: None,
            cleanup_on_drop: true,
            register_exit_hook: true,
            keep_files: false,
        }
    }
}

impl SandboxConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden by `AHMA_FS_SANDBOX_KEEP` and `AHMA_FS_SANDBOX_TMPDIR`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if std::env::var(KEEP_ENV_VAR)
            .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
            .unwrap_or(false)
        {
            config.keep_files = true;
        }
        if let Some(dir) = std::env::var_os(TMPDIR_ENV_VAR).filter(|v| !v.is_empty()) {
            config.temp_dir = Some(PathBuf::from(dir));
        }
        config
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    pub fn with_cleanup_on_drop(mut self, enabled: bool) -> Self {
        self.cleanup_on_drop = enabled;
        self
    }

    pub fn with_exit_hook(mut self, enabled: bool) -> Self {
        self.register_exit_hook = enabled;
        self
    }

    pub fn with_keep_files(mut self, keep: bool) -> Self {
        self.keep_files = keep;
        self
    }

    /// Whether dropping the sandbox should remove its tree.
    pub(crate) fn removes_on_drop(&self) -> bool {
        self.cleanup_on_drop && !self.keep_files
    }

    /// Whether an exit hook should be registered.
    pub(crate) fn removes_on_exit(&self) -> bool {
        self.register_exit_hook && !self.keep_files
    }
}
