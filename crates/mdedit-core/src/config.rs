//! Editor configuration.

use crate::history::{DEFAULT_COALESCE_WINDOW, DEFAULT_MAX_HISTORY};
use crate::tokenizer::{
    DEFAULT_CACHE_CAPACITY, DEFAULT_LONG_LINE_THRESHOLD, DEFAULT_MAX_INLINE_DEPTH, EvictionPolicy,
    TokenizerOptions,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tunables of an [`EditorSession`](crate::session::EditorSession).
///
/// Missing JSON fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Maximum entries per history stack.
    pub history_max_size: usize,
    /// History coalescing window in milliseconds.
    pub coalesce_window_ms: u64,
    /// Token cache capacity (lines).
    pub cache_capacity: usize,
    /// Token cache eviction policy.
    pub eviction_policy: EvictionPolicy,
    /// Inline nesting bound.
    pub max_inline_depth: usize,
    /// Lines longer than this many bytes are cached by hash.
    pub long_line_threshold: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_max_size: DEFAULT_MAX_HISTORY,
            coalesce_window_ms: DEFAULT_COALESCE_WINDOW.as_millis() as u64,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            eviction_policy: EvictionPolicy::default(),
            max_inline_depth: DEFAULT_MAX_INLINE_DEPTH,
            long_line_threshold: DEFAULT_LONG_LINE_THRESHOLD,
        }
    }
}

impl EditorConfig {
    /// Load from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Set `history_max_size`.
    pub fn with_history_max_size(mut self, size: usize) -> Self {
        self.history_max_size = size;
        self
    }

    /// Set the coalescing window.
    pub fn with_coalesce_window(mut self, window: Duration) -> Self {
        self.coalesce_window_ms = u64::try_from(window.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Set the cache capacity.
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    /// Set the eviction policy.
    pub fn with_eviction_policy(mut self, policy: EvictionPolicy) -> Self {
        self.eviction_policy = policy;
        self
    }

    /// Set the inline nesting bound.
    pub fn with_max_inline_depth(mut self, depth: usize) -> Self {
        self.max_inline_depth = depth;
        self
    }

    /// Set the long-line threshold.
    pub fn with_long_line_threshold(mut self, bytes: usize) -> Self {
        self.long_line_threshold = bytes;
        self
    }

    /// Coalescing window as a `Duration`.
    pub fn coalesce_window(&self) -> Duration {
        Duration::from_millis(self.coalesce_window_ms)
    }

    /// Parser options derived from this config.
    pub fn tokenizer_options(&self) -> TokenizerOptions {
        TokenizerOptions {
            max_inline_depth: self.max_inline_depth,
            long_line_threshold: self.long_line_threshold,
        }
    }
}
