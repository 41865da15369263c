//! State carried from one line to the next.

use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// FNV-1a over raw bytes.
pub(crate) fn hash_bytes(bytes: &[u8]) -> u64 {
    let mut hash = FNV_OFFSET;
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Deterministic FNV-1a [`Hasher`], so fingerprints are stable across processes.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FnvHasher(u64);

impl Default for FnvHasher {
    fn default() -> Self {
        Self(FNV_OFFSET)
    }
}

impl Hasher for FnvHasher {
    fn finish(&self) -> u64 {
        self.0
    }

    fn write(&mut self, bytes: &[u8]) {
        for byte in bytes {
            self.0 ^= u64::from(*byte);
            self.0 = self.0.wrapping_mul(FNV_PRIME);
        }
    }
}

/// Opening fence of the block currently being read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fence {
    /// `` ` `` or `~`.
    pub marker: char,
    /// Length of the opening run (at least 3).
    pub len: usize,
}

impl Fence {
    /// Whether a run of `len` `marker` characters closes this fence.
    pub fn is_closed_by(&self, marker: char, len: usize) -> bool {
        self.marker == marker && len >= self.len
    }
}

/// The only state passed from line *i* to line *i + 1*.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ParserContext {
    /// Inside a fenced code block.
    pub in_code_block: bool,
    /// Language named by the opening fence.
    pub code_block_language: Option<String>,
    /// The opening fence, when inside a block.
    pub fence: Option<Fence>,
}

impl ParserContext {
    /// Context of a line outside any block.
    pub fn new() -> Self {
        Self::default()
    }

    /// Context of a line inside a block opened by `fence`.
    pub fn in_code_block(fence: Fence, language: Option<String>) -> Self {
        Self {
            in_code_block: true,
            code_block_language: language,
            fence: Some(fence),
        }
    }

    /// Stable fingerprint of this context.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = FnvHasher::default();
        self.hash(&mut hasher);
        hasher.finish()
    }
}
