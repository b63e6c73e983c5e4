//! # Manifest Model
//!
//! A manifest is a literal description of a file tree that a [`Sandbox`](crate::Sandbox)
//! materializes in one call. Each entry is keyed by a relative path segment and
//! holds one of four node shapes:
//!
//! - **`File`**: plain file with text content and default permissions.
//! - **`Symlink`**: symbolic link; the target is used exactly as given.
//! - **`Entry`**: typed file or directory with optional permission bits.
//! - **`Directory`**: nested manifest, materialized recursively.
//!
//! ## JSON Form
//!
//! Manifests are usually written as JSON object literals:
//!
//! ```json
//! {
//!   "sample_dir": {
//!     "dir": { "anotherDir": { "sampleFile": "Some text" } },
//!     "fileUsingObject": { "contents": "Some more text", "type": "file", "permissions": "666" },
//!     "dirUsingObject": { "type": "directory", "permissions": "700" },
//!     "sampleLink": ["/usr/bin/env"]
//!   }
//! }
//! ```
//!
//! A string is a `File`, a one-element array is a `Symlink`, an object with a
//! `type` or `contents` key is an `Entry`, and any other object is a
//! `Directory`. Everything else (including `null`) is rejected while parsing,
//! so a manifest that parses never fails validation halfway through a walk.

use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::sandbox::{SandboxError, SandboxResult};

/// A mapping of relative names to manifest nodes, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    entries: Vec<(String, ManifestNode)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestNode {
    File(String),
    Symlink(PathBuf),
    Entry(EntrySpec),
    Directory(Manifest),
}

/// Kind of a typed entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EntryKind {
    #[default]
    File,
    Directory,
}

impl EntryKind {
    fn parse(kind: &str, path: &Path) -> SandboxResult<Self> {
        match kind {
            "file" => Ok(Self::File),
            "directory" => Ok(Self::Directory),
            other => Err(SandboxError::UnknownPathType {
                path: path.to_path_buf(),
                kind: other.to_string(),
            }),
        }
    }
}

/// A typed file or directory. `contents` is ignored for directories.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntrySpec {
    pub kind: EntryKind,
    pub contents: String,
    pub permissions: Option<u32>,
}

impl EntrySpec {
    pub fn file(contents: impl Into<String>) -> Self {
        Self {
            kind: EntryKind::File,
            contents: contents.into(),
            permissions: None,
        }
    }

    pub fn directory() -> Self {
        Self {
            kind: EntryKind::Directory,
            ..Self::default()
        }
    }

    pub fn with_permissions(mut self, mode: u32) -> Self {
        self.permissions = Some(mode);
        self
    }
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a plain text file.
    pub fn file(self, name: impl Into<String>, contents: impl Into<String>) -> Self {
        self.node(name, ManifestNode::File(contents.into()))
    }

    /// Add a symbolic link pointing at `target`.
    pub fn symlink(self, name: impl Into<String>, target: impl Into<PathBuf>) -> Self {
        self.node(name, ManifestNode::Symlink(target.into()))
    }

    /// Add a typed file or directory.
    pub fn entry(self, name: impl Into<String>, spec: EntrySpec) -> Self {
        self.node(name, ManifestNode::Entry(spec))
    }

    /// Add a nested directory.
    pub fn dir(self, name: impl Into<String>, children: Manifest) -> Self {
        self.node(name, ManifestNode::Directory(children))
    }

    pub fn node(mut self, name: impl Into<String>, node: ManifestNode) -> Self {
        self.entries.push((name.into(), node));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ManifestNode)> {
        self.entries.iter().map(|(name, node)| (name.as_str(), node))
    }

    /// Every node paired with its path relative to the manifest root,
    /// depth-first with parents before children.
    pub fn walk(&self) -> Vec<(PathBuf, &ManifestNode)> {
        let mut out = Vec::new();
        self.walk_into(Path::new(""), &mut out);
        out
    }

    fn walk_into<'a>(&'a self, base: &Path, out: &mut Vec<(PathBuf, &'a ManifestNode)>) {
        for (name, node) in &self.entries {
            let path = base.join(name);
            out.push((path.clone(), node));
            if let ManifestNode::Directory(children) = node {
                children.walk_into(&path, out);
            }
        }
    }

    /// Parse a manifest from a JSON object.
    pub fn from_json(value: &Value) -> SandboxResult<Self> {
        match value {
            Value::Object(map) => parse_mapping(map, Path::new("")),
            other => Err(malformed(
                Path::new(""),
                format!("manifest root must be an object, got {}", type_name(other)),
            )),
        }
    }
}

impl FromStr for Manifest {
    type Err = SandboxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: Value = serde_json::from_str(s)?;
        Self::from_json(&value)
    }
}

impl TryFrom<&Value> for Manifest {
    type Error = SandboxError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        Self::from_json(value)
    }
}

fn parse_mapping(map: &Map<String, Value>, base: &Path) -> SandboxResult<Manifest> {
    let mut entries = Vec::with_capacity(map.len());
    for (name, value) in map {
        let path = base.join(name);
        if name.is_empty() {
            return Err(malformed(&path, "entry name is empty"));
        }
        entries.push((name.clone(), parse_node(value, &path)?));
    }
    Ok(Manifest { entries })
}

fn parse_node(value: &Value, path: &Path) -> SandboxResult<ManifestNode> {
    match value {
        Value::String(contents) => Ok(ManifestNode::File(contents.clone())),
        Value::Array(items) => match items.as_slice() {
            [Value::String(target)] => Ok(ManifestNode::Symlink(PathBuf::from(target))),
            _ => Err(malformed(
                path,
                "symlink must be an array holding exactly one target string",
            )),
        },
        Value::Object(map) if map.contains_key("type") || map.contains_key("contents") => {
            parse_entry(map, path).map(ManifestNode::Entry)
        }
        Value::Object(map) => parse_mapping(map, path).map(ManifestNode::Directory),
        other => Err(malformed(path, format!("unexpected {}", type_name(other)))),
    }
}

fn parse_entry(map: &Map<String, Value>, path: &Path) -> SandboxResult<EntrySpec> {
    let kind = match map.get("type") {
        None | Some(Value::Null) => EntryKind::File,
        Some(Value::String(kind)) => EntryKind::parse(kind, path)?,
        Some(other) => {
            return Err(SandboxError::UnknownPathType {
                path: path.to_path_buf(),
                kind: other.to_string(),
            });
        }
    };

    let contents = match map.get("contents") {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(contents)) => contents.clone(),
        Some(other) => {
            return Err(malformed(
                path,
                format!("contents must be a string, got {}", type_name(other)),
            ));
        }
    };

    let permissions = match map.get("permissions") {
        None | Some(Value::Null) => None,
        Some(value) => Some(parse_permissions(value, path)?),
    };

    Ok(EntrySpec {
        kind,
        contents,
        permissions,
    })
}

/// Strings are octal (`"700"`, `"0o644"`); integers are raw mode bits.
fn parse_permissions(value: &Value, path: &Path) -> SandboxResult<u32> {
    let mode = match value {
        Value::String(s) => {
            let digits = s.trim().trim_start_matches("0o");
            u32::from_str_radix(digits, 8).ok()
        }
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        _ => None,
    };

    mode.filter(|m| *m <= 0o7777)
        .ok_or_else(|| SandboxError::InvalidPermissions {
            path: path.to_path_buf(),
            value: value.to_string(),
        })
}

fn malformed(path: &Path, reason: impl Into<String>) -> SandboxError {
    SandboxError::MalformedManifest {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
