//! # Ahma FS Sandbox
//!
//! Isolated, disposable filesystem workspaces for tests and tooling.
//!
//! ```rust,no_run
//! use ahma_fs_sandbox::{Manifest, Sandbox};
//!
//! # fn main() -> Result<(), ahma_fs_sandbox::SandboxError> {
//! let mut sandbox = Sandbox::new()?;
//! sandbox.write("a/b/sample.txt", "asdf")?;
//! sandbox.create_files_from_manifest(
//!     &Manifest::new()
//!         .file("hello.txt", "world!")
//!         .symlink("link", "/usr/bin/env"),
//!     None,
//! )?;
//! assert_eq!(sandbox.read_to_string("hello.txt")?, "world!");
//! sandbox.cleanup();
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod exit_hooks;
pub mod manifest;
pub mod random_data;
pub mod sandbox;
pub mod test_utils;
pub mod utils;

pub use config::SandboxConfig;
pub use exit_hooks::run_exit_hooks;
pub use manifest::{EntryKind, EntrySpec, Manifest, ManifestNode};
pub use random_data::{RandomDataOptions, generate_random_data};
pub use sandbox::{Sandbox, SandboxError, SandboxResult};
