use std::path::PathBuf;

/// Errors specific to sandbox operations
#[derive(Debug, thiserror::Error)]
pub enum SandboxError {
    #[error("Path '{path:?}' is outside the sandbox root '{}'", root.display())]
    PathOutsideSandbox { path: PathBuf, root: PathBuf },

    #[error("Malformed manifest at '{}': {reason}", path.display())]
    MalformedManifest { path: PathBuf, reason: String },

    #[error("Unknown path type '{kind}' at '{}'", path.display())]
    UnknownPathType { path: PathBuf, kind: String },

    #[error("Invalid permissions '{value}' for '{}'", path.display())]
    InvalidPermissions { path: PathBuf, value: String },

    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create a unique sandbox directory: {0}")]
    TempDirCreation(#[source] std::io::Error),

    #[error("Sandbox rooted at '{}' has already been cleaned up", root.display())]
    CleanedUp { root: PathBuf },

    #[error("Manifest is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

impl SandboxError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// The underlying I/O error kind, if this is an I/O failure.
    pub fn io_kind(&self) -> Option<std::io::ErrorKind> {
        match self {
            Self::Io { source, .. } | Self::TempDirCreation(source) => Some(source.kind()),
            _ => None,
        }
    }
}

pub type SandboxResult<T> = Result<T, SandboxError>;
