use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, trace};

use super::cleanup::remove_tree_best_effort;
use super::error::{SandboxError, SandboxResult};
use super::paths;
use crate::config::SandboxConfig;
use crate::exit_hooks::{self, HookId};
use crate::manifest::{EntryKind, Manifest, ManifestNode};
use crate::random_data::{RandomDataOptions, generate_random_data};

/// A disposable directory tree rooted at one absolute path.
///
/// All relative paths given to a `Sandbox` resolve against its root, and
/// every mutating operation refuses paths that normalize to somewhere outside
/// it. The tree is removed by [`Sandbox::cleanup`], when the value is dropped,
/// or when the process is terminated, whichever comes first.
#[derive(Debug)]
pub struct Sandbox {
    root: PathBuf,
    config: SandboxConfig,
    hook: Option<HookId>,
    cleaned_up: bool,
}

impl Sandbox {
    /// Create a sandbox in a fresh, uniquely named temporary directory.
    ///
    /// Configuration is read from the environment, see [`SandboxConfig::from_env`].
    pub fn new() -> SandboxResult<Self> {
        Self::with_config(None, SandboxConfig::from_env())
    }

    /// Create a sandbox over a caller-supplied root.
    ///
    /// The directory is not created until something is written into it, and it
    /// is removed on cleanup like a generated root.
    pub fn with_root(root: impl AsRef<Path>) -> SandboxResult<Self> {
        Self::with_config(Some(root.as_ref().to_path_buf()), SandboxConfig::from_env())
    }

    pub fn with_config(root: Option<PathBuf>, config: SandboxConfig) -> SandboxResult<Self> {
        let root = match root {
            Some(root) => {
                paths::absolutize_root(&root).map_err(|e| SandboxError::io(&root, e))?
            }
            None => create_unique_root(&config)?,
        };

        let hook = config
            .removes_on_exit()
            .then(|| exit_hooks::register(root.clone()));

        info!(root = %root.display(), "sandbox created");
        Ok(Self {
            root,
            config,
            hook,
            cleaned_up: false,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &SandboxConfig {
        &self.config
    }

    /// True once [`Sandbox::cleanup`] has run.
    pub fn is_cleaned_up(&self) -> bool {
        self.cleaned_up
    }

    /// Absolute, lexically normalized form of `path`, resolving relative
    /// paths against the root. Idempotent and free of filesystem access.
    pub fn normalize(&self, path: impl AsRef<Path>) -> PathBuf {
        let normalized = paths::resolve_against(&self.root, path.as_ref());
        trace!(
            input = %path.as_ref().display(),
            normalized = %normalized.display(),
            "normalized path"
        );
        normalized
    }

    /// Whether `path` normalizes to the root or one of its descendants.
    ///
    /// Relative paths resolve against the root, so they are sandboxed unless
    /// `..` segments climb out of it: `"a/b.txt"` is, `"../b.txt"` is not.
    pub fn is_sandboxed(&self, path: impl AsRef<Path>) -> bool {
        paths::is_within(&self.normalize(path), &self.root)
    }

    /// Write `data` as the full content of `path`, creating missing parents.
    pub fn write(
        &self,
        path: impl AsRef<Path>,
        data: impl AsRef<[u8]>,
    ) -> SandboxResult<PathBuf> {
        let path = self.checked(path.as_ref())?;
        ensure_parent(&path)?;
        fs::write(&path, data.as_ref()).map_err(|e| SandboxError::io(&path, e))?;
        debug!(path = %path.display(), bytes = data.as_ref().len(), "wrote file");
        Ok(path)
    }

    pub fn read(&self, path: impl AsRef<Path>) -> SandboxResult<Vec<u8>> {
        let path = self.normalize(path);
        fs::read(&path).map_err(|e| SandboxError::io(&path, e))
    }

    pub fn read_to_string(&self, path: impl AsRef<Path>) -> SandboxResult<String> {
        let path = self.normalize(path);
        fs::read_to_string(&path).map_err(|e| SandboxError::io(&path, e))
    }

    /// Create `path` and any missing ancestors. Existing directories are fine.
    pub fn mkdir(&self, path: impl AsRef<Path>) -> SandboxResult<PathBuf> {
        let path = self.checked(path.as_ref())?;
        fs::create_dir_all(&path).map_err(|e| SandboxError::io(&path, e))?;
        debug!(path = %path.display(), "created directory");
        Ok(path)
    }

    /// Create a symbolic link at `link` pointing at `target`.
    ///
    /// The target is stored verbatim; it is neither resolved against the root
    /// nor required to exist. An existing symlink at `link` is replaced.
    pub fn symlink(
        &self,
        target: impl AsRef<Path>,
        link: impl AsRef<Path>,
    ) -> SandboxResult<PathBuf> {
        let link = self.checked(link.as_ref())?;
        ensure_parent(&link)?;
        if fs::symlink_metadata(&link).is_ok_and(|m| m.file_type().is_symlink()) {
            fs::remove_file(&link).map_err(|e| SandboxError::io(&link, e))?;
        }
        create_symlink(target.as_ref(), &link).map_err(|e| SandboxError::io(&link, e))?;
        debug!(link = %link.display(), target = %target.as_ref().display(), "created symlink");
        Ok(link)
    }

    /// Apply Unix permission bits to an existing entry.
    pub fn set_permissions(&self, path: impl AsRef<Path>, mode: u32) -> SandboxResult<()> {
        let path = self.checked(path.as_ref())?;
        apply_mode(&path, mode).map_err(|e| SandboxError::io(&path, e))?;
        debug!(path = %path.display(), mode = %format_args!("{mode:o}"), "set permissions");
        Ok(())
    }

    /// Write a random payload to `path`, returning the path and payload size.
    pub fn write_random(
        &self,
        path: impl AsRef<Path>,
        options: &RandomDataOptions,
    ) -> SandboxResult<(PathBuf, usize)> {
        let data = generate_random_data(options);
        let path = self.write(path, &data)?;
        Ok((path, data.len()))
    }

    /// Materialize `manifest` under the root, or under `root/prefix`.
    ///
    /// Entries are created depth-first, so every parent exists before its
    /// children. The first failure aborts the walk; entries created before it
    /// stay on disk.
    pub fn create_files_from_manifest(
        &self,
        manifest: &Manifest,
        prefix: Option<&Path>,
    ) -> SandboxResult<()> {
        let base = self.mkdir(prefix.unwrap_or(Path::new("")))?;
        let entries = self.materialize(manifest, &base)?;
        info!(base = %base.display(), entries, "materialized manifest");
        Ok(())
    }

    /// Parse a JSON manifest and materialize it. Nothing is written unless the
    /// whole manifest is valid.
    pub fn create_files_from_json(
        &self,
        manifest: &Value,
        prefix: Option<&Path>,
    ) -> SandboxResult<()> {
        let manifest = Manifest::from_json(manifest)?;
        self.create_files_from_manifest(&manifest, prefix)
    }

    /// Returns the number of entries created, nested ones included.
    fn materialize(&self, manifest: &Manifest, dir: &Path) -> SandboxResult<usize> {
        let mut created = 0;
        for (name, node) in manifest.iter() {
            created += 1;
            let path = dir.join(name);
            match node {
                ManifestNode::File(contents) => {
                    self.write(&path, contents)?;
                }
                ManifestNode::Symlink(target) => {
                    self.symlink(target, &path)?;
                }
                ManifestNode::Entry(entry) => {
                    match entry.kind {
                        EntryKind::File => self.write(&path, &entry.contents)?,
                        EntryKind::Directory => self.mkdir(&path)?,
                    };
                    if let Some(mode) = entry.permissions {
                        self.set_permissions(&path, mode)?;
                    }
                }
                ManifestNode::Directory(children) => {
                    self.mkdir(&path)?;
                    created += self.materialize(children, &path)?;
                }
            }
        }
        Ok(created)
    }

    /// Remove the root and everything beneath it.
    ///
    /// Entries that cannot be inspected or removed are skipped silently; a
    /// missing root or a second call is a no-op. Afterwards every mutating
    /// operation fails with [`SandboxError::CleanedUp`].
    pub fn cleanup(&mut self) {
        if let Some(hook) = self.hook.take() {
            exit_hooks::unregister(hook);
        }
        if self.cleaned_up {
            return;
        }
        let report = remove_tree_best_effort(&self.root);
        self.cleaned_up = true;
        info!(
            root = %self.root.display(),
            removed = report.removed,
            skipped = report.skipped.len(),
            "sandbox cleaned up"
        );
    }

    fn checked(&self, path: &Path) -> SandboxResult<PathBuf> {
        if self.cleaned_up {
            return Err(SandboxError::CleanedUp {
                root: self.root.clone(),
            });
        }
        let normalized = self.normalize(path);
        if paths::is_within(&normalized, &self.root) {
            Ok(normalized)
        } else {
            Err(SandboxError::PathOutsideSandbox {
                path: path.to_path_buf(),
                root: self.root.clone(),
            })
        }
    }
}

impl Drop for Sandbox {
    fn drop(&mut self) {
        if self.config.removes_on_drop() {
            self.cleanup();
        }
    }
}

fn create_unique_root(config: &SandboxConfig) -> SandboxResult<PathBuf> {
    let prefix = format!("{}{}_", config.prefix, std::process::id());
    let mut builder = tempfile::Builder::new();
    builder.prefix(&prefix);

    let dir = match &config.temp_dir {
        Some(parent) => {
            fs::create_dir_all(parent).map_err(SandboxError::TempDirCreation)?;
            builder.tempdir_in(parent)
        }
        None => builder.tempdir(),
    }
    .map_err(SandboxError::TempDirCreation)?;

    // Lifetime is managed by the sandbox, not by `TempDir`.
    let path = dir.keep();
    paths::absolutize_root(&path).map_err(|e| SandboxError::io(&path, e))
}

fn ensure_parent(path: &Path) -> SandboxResult<()> {
    match path.parent() {
        Some(parent) => fs::create_dir_all(parent).map_err(|e| SandboxError::io(parent, e)),
        None => Ok(()),
    }
}

#[cfg(unix)]
fn create_symlink(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn create_symlink(target: &Path, link: &Path) -> std::io::Result<()> {
    let resolved = link.parent().map_or_else(|| target.to_path_buf(), |p| p.join(target));
    if resolved.is_dir() {
        std::os::windows::fs::symlink_dir(target, link)
    } else {
        std::os::windows::fs::symlink_file(target, link)
    }
}

#[cfg(unix)]
fn apply_mode(path: &Path, mode: u32) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn apply_mode(path: &Path, mode: u32) -> std::io::Result<()> {
    debug!(
        path = %path.display(),
        mode = %format_args!("{mode:o}"),
        "permission bits ignored on this platform"
    );
    Ok(())
}
