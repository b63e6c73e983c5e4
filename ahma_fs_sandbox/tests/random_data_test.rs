//! Tests for random payload generation.

use ahma_fs_sandbox::random_data::{DEFAULT_MAX_BYTES, DEFAULT_MIN_BYTES};
use ahma_fs_sandbox::{RandomDataOptions, Sandbox, generate_random_data};
use anyhow::Result;
use std::collections::HashSet;

/// Generate `n` payloads, failing on the first duplicate, and return their lengths.
fn distinct_payload_lengths(n: usize, options: &RandomDataOptions) -> Vec<usize> {
    let mut seen = HashSet::new();
    let mut lengths = Vec::with_capacity(n);
    for _ in 0..n {
        let data = generate_random_data(options);
        lengths.push(data.len());
        assert!(seen.insert(data), "got duplicated element");
    }
    lengths
}

#[test]
fn test_by_default_generates_data_between_5k_and_2mb() {
    let lengths = distinct_payload_lengths(20, &RandomDataOptions::default());
    assert_eq!(lengths.len(), 20);
    for len in lengths {
        assert!((5 * 1024..=2000 * 1024).contains(&len), "len {len} out of range");
    }
    assert_eq!(DEFAULT_MIN_BYTES, 5 * 1024);
    assert_eq!(DEFAULT_MAX_BYTES, 2000 * 1024);
}

#[test]
fn test_allows_controlling_the_data_size() {
    let size = 1024;
    let lengths = distinct_payload_lengths(20, &RandomDataOptions::exact(size));
    assert_eq!(lengths.len(), 20);
    assert!(lengths.iter().all(|len| *len == size));
}

#[test]
fn test_write_random_into_sandbox() -> Result<()> {
    let sb = Sandbox::new()?;
    let options = RandomDataOptions::default()
        .with_min_bytes(100)
        .with_max_bytes(200);
    let (path, len) = sb.write_random("payloads/blob.bin", &options)?;

    assert_eq!(path, sb.root().join("payloads/blob.bin"));
    assert!((100..=200).contains(&len));
    assert_eq!(sb.read(&path)?.len(), len);
    Ok(())
}
