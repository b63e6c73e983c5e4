//! # Logging Initialization
//!
//! Sandbox operations emit `tracing` events (`info` for creation and cleanup,
//! `debug` for each created entry, `warn` for entries cleanup had to leave
//! behind). Nothing is printed unless a subscriber is installed; this module
//! provides one.
//!
//! - **`init_logging()`**: call once at startup. Guarded by `std::sync::Once`,
//!   so repeated calls are harmless.
//! - **Environment filter**: `RUST_LOG` wins; otherwise the given level applies
//!   globally with `debug` for `ahma_fs_sandbox`.
//! - **Stderr (default)**: ANSI-colored output on stderr.
//! - **File (opt-in)**: `log_to_file = true` writes a daily rolling log in the
//!   user cache directory (via `directories`), falling back to stderr when that
//!   directory cannot be determined or written.

use anyhow::Result;
use directories::ProjectDirs;
use std::{io::stderr, path::Path, sync::Once};
use tracing_subscriber::{EnvFilter, fmt::layer, prelude::*};

static INIT: Once = Once::new();

/// Initialize verbose logging for tests.
///
/// This configures a `trace`-level subscriber that logs to stderr.
pub fn init_test_logging() {
    let _ = init_logging("trace", false);
}

/// Initializes the logging system.
///
/// # Errors
///
/// Currently infallible; a failure to set up file logging falls back to stderr.
pub fn init_logging(log_level: &str, log_to_file: bool) -> Result<()> {
    INIT.call_once(|| {
        let env_filter = || {
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("{log_level},ahma_fs_sandbox=debug")))
        };

        if log_to_file
            && let Some(proj_dirs) = ProjectDirs::from("com", "AhmaMcp", "ahma_fs_sandbox")
        {
            let log_dir = proj_dirs.cache_dir();

            // tracing_appender::rolling::daily panics on permission errors.
            if can_write_to(log_dir) {
                let file_appender =
                    tracing_appender::rolling::daily(log_dir, "ahma_fs_sandbox.log");
                let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

                let installed = tracing_subscriber::registry()
                    .with(env_filter())
                    .with(layer().with_writer(non_blocking).with_ansi(false))
                    .try_init()
                    .is_ok();
                if installed {
                    // Keep the writer alive so buffered lines are flushed on exit.
                    Box::leak(Box::new(guard));
                    return;
                }
            }
        }

        // Another subscriber may already be installed (e.g. by the host test harness).
        let _ = tracing_subscriber::registry()
            .with(env_filter())
            .with(layer().with_writer(stderr).with_ansi(true))
            .try_init();
    });

    Ok(())
}

/// Create `dir` if needed and check that a file can be written into it.
fn can_write_to(dir: &Path) -> bool {
    if std::fs::create_dir_all(dir).is_err() {
        return false;
    }

    let probe = dir.join(".ahma_fs_sandbox_log_test");
    match std::fs::write(&probe, "test") {
        Ok(()) => {
            let _ = std::fs::remove_file(&probe);
            true
        }
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_init_logging_is_idempotent() {
        assert!(init_logging("info", false).is_ok());
        assert!(init_logging("debug", false).is_ok());
        init_test_logging();
    }

    #[test]
    fn test_can_write_to_creates_directory() {
        let temp = tempdir().unwrap();
        let nested = temp.path().join("logs/nested");
        assert!(can_write_to(&nested));
        assert!(nested.is_dir());
        assert!(!nested.join(".ahma_fs_sandbox_log_test").exists());
    }
}
