//! # Disposable Filesystem Sandboxes
//!
//! A [`Sandbox`] owns one root directory and confines every write, `mkdir`,
//! symlink and manifest operation to it. Paths are resolved lexically against
//! the root, and containment is checked segment by segment, so a sibling
//! directory that merely shares the root's name as a prefix is never accepted.
//!
//! ## Lifecycle
//!
//! - **Creation**: either a fresh unique directory under the system temp area
//!   (created immediately) or a caller-supplied root (created lazily).
//! - **Growth**: `write`, `mkdir`, `symlink` and `create_files_from_manifest`.
//! - **Removal**: explicit `cleanup()`, `Drop`, or the process exit hooks in
//!   [`crate::exit_hooks`]. Removal is best-effort and never fails.

pub(crate) mod cleanup;
mod core;
mod error;
mod paths;

pub use self::core::Sandbox;
pub use error::{SandboxError, SandboxResult};
pub use paths::normalize_path_lexically;
