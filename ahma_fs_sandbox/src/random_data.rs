//! Random payloads for synthetic file contents.

use rand::Rng;
use serde::{Deserialize, Serialize};

pub const DEFAULT_MIN_BYTES: usize = 5 * 1024;
pub const DEFAULT_MAX_BYTES: usize = 2000 * 1024;

/// Inclusive size bounds for [`generate_random_data`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RandomDataOptions {
    pub min_bytes: usize,
    pub max_bytes: usize,
}

impl Default for RandomDataOptions {
    fn default() -> Self {
        Self {
            min_bytes: DEFAULT_MIN_BYTES,
            max_bytes: DEFAULT_MAX_BYTES,
        }
    }
}

impl RandomDataOptions {
    /// Payloads of exactly `len` bytes.
    pub fn exact(len: usize) -> Self {
        Self {
            min_bytes: len,
            max_bytes: len,
        }
    }

    pub fn with_min_bytes(mut self, min_bytes: usize) -> Self {
        self.min_bytes = min_bytes;
        self
    }

    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }
}

/// Random bytes whose length is drawn uniformly from `[min_bytes, max_bytes]`.
///
/// Inverted bounds are swapped rather than rejected.
pub fn generate_random_data(options: &RandomDataOptions) -> Vec<u8> {
    let low = options.min_bytes.min(options.max_bytes);
    let high = options.min_bytes.max(options.max_bytes);

    let mut rng = rand::rng();
    let len = rng.random_range(low..=high);
    let mut data = vec![0u8; len];
    rng.fill(data.as_mut_slice());
    data
}
