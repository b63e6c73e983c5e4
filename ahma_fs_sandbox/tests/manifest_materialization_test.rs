//! Integration tests for manifest-driven tree creation.

use ahma_fs_sandbox::test_utils::{dir_exists, file_exists, is_symlink, path_exists};
use ahma_fs_sandbox::{EntrySpec, Manifest, ManifestNode, Sandbox, SandboxError};
use anyhow::Result;
use serde_json::{Value, json};
use std::path::{Path, PathBuf};

fn test_manifest() -> Result<Value> {
    let exe = std::env::current_exe()?;
    Ok(json!({
        "sample_dir": {
            "dir": {
                "anotherDir": {
                    "sampleFile": "Some text"
                }
            },
            "fileUsingObject": {"contents": "Some more text", "type": "file", "permissions": "666"},
            "dirUsingObject": {"type": "directory", "permissions": "700"},
            "test.txt": "echo Line 1\nsleep 0.2\nLine 2\nsleep 0.2\nLine 3",
            "sampleFile": "Hello World!",
            "sampleLink": [exe.to_string_lossy()]
        }
    }))
}

/// Walk the manifest and check every entry landed on disk with the right kind.
fn check_files(sb: &Sandbox, manifest: &Manifest, prefix: Option<&Path>) {
    let base = match prefix {
        Some(prefix) => sb.root().join(prefix),
        None => sb.root().to_path_buf(),
    };
    for (relative, node) in manifest.walk() {
        let path = base.join(&relative);
        assert!(path_exists(&path), "missing: {}", path.display());
        match node {
            ManifestNode::File(contents) => {
                assert!(file_exists(&path));
                assert_eq!(&std::fs::read_to_string(&path).unwrap(), contents);
            }
            ManifestNode::Symlink(target) => {
                assert!(is_symlink(&path), "not a symlink: {}", path.display());
                assert_eq!(&std::fs::read_link(&path).unwrap(), target);
            }
            ManifestNode::Entry(_) => {}
            ManifestNode::Directory(_) => assert!(dir_exists(&path)),
        }
    }
}

#[cfg(unix)]
#[test]
fn test_create_files_tree_following_a_provided_hash() -> Result<()> {
    let sb = Sandbox::new()?;
    let value = test_manifest()?;
    sb.create_files_from_json(&value, None)?;
    check_files(&sb, &Manifest::from_json(&value)?, None);

    assert!(file_exists(&sb.root().join("sample_dir/fileUsingObject")));
    assert!(dir_exists(&sb.root().join("sample_dir/dirUsingObject")));
    assert_eq!(
        sb.read_to_string("sample_dir/dir/anotherDir/sampleFile")?,
        "Some text"
    );
    Ok(())
}

#[cfg(unix)]
#[test]
fn test_create_files_tree_using_a_specified_prefix() -> Result<()> {
    let sb = Sandbox::new()?;
    let prefix = Path::new("subdir");
    let value = test_manifest()?;
    sb.create_files_from_json(&value, Some(prefix))?;
    check_files(&sb, &Manifest::from_json(&value)?, Some(prefix));
    assert!(!path_exists(&sb.root().join("sample_dir")));
    Ok(())
}

#[cfg(unix)]
#[test]
fn test_typed_entries_apply_permissions() -> Result<()> {
    use ahma_fs_sandbox::test_utils::mode_of;

    let sb = Sandbox::new()?;
    sb.create_files_from_json(&test_manifest()?, None)?;
    assert_eq!(mode_of(&sb.root().join("sample_dir/fileUsingObject"))?, 0o666);
    assert_eq!(mode_of(&sb.root().join("sample_dir/dirUsingObject"))?, 0o700);
    assert_eq!(
        sb.read_to_string("sample_dir/fileUsingObject")?,
        "Some more text"
    );
    Ok(())
}

#[test]
fn test_builder_manifest_matches_json_manifest() -> Result<()> {
    let sb = Sandbox::new()?;
    let manifest = Manifest::new()
        .dir("config", Manifest::new().file("app.toml", "name = \"demo\"\n"))
        .entry("empty.log", EntrySpec::file(""))
        .entry("cache", EntrySpec::directory())
        .file("README.md", "# demo\n");
    sb.create_files_from_manifest(&manifest, None)?;

    check_files(&sb, &manifest, None);
    assert!(file_exists(&sb.root().join("empty.log")));
    assert!(dir_exists(&sb.root().join("cache")));
    Ok(())
}

#[test]
fn test_throws_an_error_when_the_manifest_is_not_correct() -> Result<()> {
    let sb = Sandbox::new()?;

    let err = sb.create_files_from_json(&json!({"dir": null}), None).unwrap_err();
    assert!(matches!(err, SandboxError::MalformedManifest { .. }));
    assert!(err.to_string().contains("Malformed manifest"));

    let wrong_type = json!({"file": {"contents": "Text", "type": "wrong type"}});
    let err = sb.create_files_from_json(&wrong_type, None).unwrap_err();
    assert!(matches!(err, SandboxError::UnknownPathType { .. }));
    assert!(err.to_string().contains("Unknown path type"));
    assert!(err.to_string().contains("wrong type"));
    Ok(())
}

#[test]
fn test_invalid_json_manifest_writes_nothing() -> Result<()> {
    let sb = Sandbox::new()?;
    let result = sb.create_files_from_json(
        &json!({
            "first.txt": "valid",
            "second": {"nested": null}
        }),
        None,
    );
    assert!(result.is_err());
    assert_eq!(std::fs::read_dir(sb.root())?.count(), 0);
    Ok(())
}

#[test]
fn test_failure_mid_walk_keeps_earlier_entries() -> Result<()> {
    let sb = Sandbox::new()?;
    let manifest = Manifest::new()
        .file("first.txt", "kept")
        .file("../escape.txt", "rejected")
        .file("never.txt", "not reached");

    let err = sb.create_files_from_manifest(&manifest, None).unwrap_err();
    assert!(matches!(err, SandboxError::PathOutsideSandbox { .. }));
    assert_eq!(sb.read_to_string("first.txt")?, "kept");
    assert!(!path_exists(&sb.root().join("never.txt")));
    assert!(!path_exists(&sb.root().parent().unwrap().join("escape.txt")));
    Ok(())
}

#[cfg(unix)]
#[test]
fn test_manifest_from_json_text() -> Result<()> {
    let sb = Sandbox::new()?;
    let manifest: Manifest = r#"{"a": {"b": {"c.txt": "deep"}}, "link": ["a/b/c.txt"]}"#.parse()?;
    sb.create_files_from_manifest(&manifest, Some(Path::new("from_text")))?;

    assert_eq!(sb.read_to_string("from_text/a/b/c.txt")?, "deep");
    let link = sb.root().join("from_text/link");
    assert!(is_symlink(&link));
    assert_eq!(std::fs::read_link(link)?, PathBuf::from("a/b/c.txt"));
    Ok(())
}

#[cfg(unix)]
#[test]
fn test_rematerializing_a_manifest_is_allowed() -> Result<()> {
    let sb = Sandbox::new()?;
    let manifest = Manifest::new()
        .file("f.txt", "one")
        .symlink("l", "f.txt")
        .dir("d", Manifest::new());
    sb.create_files_from_manifest(&manifest, None)?;
    sb.create_files_from_manifest(&manifest, None)?;
    check_files(&sb, &manifest, None);
    Ok(())
}
