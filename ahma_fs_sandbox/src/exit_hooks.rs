//! # Exit-Time Cleanup
//!
//! Every [`Sandbox`](crate::Sandbox) registers its root here when it is
//! created. The registry is drained by [`run_exit_hooks`], which is invoked:
//!
//! - at normal process exit (returning from `main` or `std::process::exit`)
//!   through an `atexit` callback, so sandboxes that were leaked, forgotten or
//!   held in a `static` are still removed;
//! - from a Ctrl-C / SIGTERM handler installed (once per process) through `ctrlc`.
//!   The handler cannot tell the signals apart, so the process always
//!   terminates with status 130;
//! - by callers that want to simulate process termination, e.g. at the end of
//!   a custom test harness.
//!
//! Normal scope exit is covered by `Drop` on the sandbox itself. Each hook is
//! idempotent: a root that was already removed is skipped, and a drained hook
//! never fires twice. Nothing runs on `SIGKILL` or `std::process::abort`.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, Once, OnceLock, PoisonError};
use tracing::{debug, info};

use crate::sandbox::cleanup::remove_tree_best_effort;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);
static PROCESS_HOOKS: Once = Once::new();

fn registry() -> MutexGuard<'static, HashMap<u64, PathBuf>> {
    static REGISTRY: OnceLock<Mutex<HashMap<u64, PathBuf>>> = OnceLock::new();
    REGISTRY
        .get_or_init(|| Mutex::new(HashMap::new()))
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}

/// Identifies one registered hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct HookId(u64);

/// Register `root` for removal at process exit.
pub(crate) fn register(root: PathBuf) -> HookId {
    install_process_hooks();
    let id = HookId(NEXT_ID.fetch_add(1, Ordering::Relaxed));
    debug!(root = %root.display(), id = id.0, "registered exit hook");
    registry().insert(id.0, root);
    id
}

/// Drop a hook without running it. Unknown ids are ignored.
pub(crate) fn unregister(id: HookId) {
    registry().remove(&id.0);
}

/// Number of hooks that have not fired yet.
pub fn pending_exit_hooks() -> usize {
    registry().len()
}

/// Run every pending hook, removing each registered sandbox root.
///
/// Never panics and never returns an error; returns the number of hooks fired.
pub fn run_exit_hooks() -> usize {
    let roots: Vec<PathBuf> = registry().drain().map(|(_, root)| root).collect();
    for root in &roots {
        remove_tree_best_effort(root);
    }
    if !roots.is_empty() {
        info!(count = roots.len(), "exit hooks removed sandbox roots");
    }
    roots.len()
}

/// Exit status used when the termination handler ends the process.
const INTERRUPTED_STATUS: i32 = 130;

fn install_process_hooks() {
    PROCESS_HOOKS.call_once(|| {
        install_atexit();

        let result = ctrlc::set_handler(|| {
            run_exit_hooks();
            std::process::exit(INTERRUPTED_STATUS);
        });
        // The host application may own the handler already; its own shutdown
        // path can still call `run_exit_hooks`.
        if let Err(e) = result {
            debug!(error = %e, "termination handler not installed");
        }
    });
}

#[cfg(any(unix, windows))]
fn install_atexit() {
    extern "C" fn on_exit() {
        run_exit_hooks();
    }

    // SAFETY: `on_exit` is a plain `extern "C"` function with no captured state
    // and does not unwind.
    if unsafe { libc::atexit(on_exit) } != 0 {
        debug!("atexit callback not registered");
    }
}

#[cfg(not(any(unix, windows)))]
fn install_atexit() {
    debug!("no atexit support on this platform");
}
