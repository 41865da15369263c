//! Incremental, context-carrying Markdown tokenizer.
//!
//! Parsing is a fold over lines: each line is parsed from its text plus the [`ParserContext`]
//! left by the previous line, producing tokens and the context for the next line. The
//! [`IncrementalTokenizer`] memoizes that fold:
//!
//! - the known context at the start of each line is kept in a prefix vector that is truncated
//!   at the first edited line, so re-validation restarts from the nearest correct context;
//! - token lists are cached under (line index, context fingerprint, text fingerprint);
//! - lines marked dirty bypass the cache until the next render pass clears the marks.

pub mod background;
mod block;
pub mod cache;
pub mod context;
mod inline;
pub mod token;

pub use background::{LineResult, TokenizeBatch, TokenizeResult};
pub use cache::{BoundedCache, EvictionPolicy};
pub use context::{Fence, ParserContext};
pub use token::{Emphasis, Token, TokenKind, TokenMeta, UnknownTokenKind};

use crate::buffer::TextBuffer;
use crate::events::LineRange;
use context::hash_bytes;
use std::collections::BTreeSet;
use std::ops::Range;
use std::sync::Arc;
use token::{Span, finish_spans};

/// Default bound on inline nesting.
pub const DEFAULT_MAX_INLINE_DEPTH: usize = 8;

/// Lines longer than this many bytes are fingerprinted by hash.
pub const DEFAULT_LONG_LINE_THRESHOLD: usize = 256;

/// Default token cache capacity.
pub const DEFAULT_CACHE_CAPACITY: usize = 1500;

/// Parser options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenizerOptions {
    /// Inline nesting bound.
    pub max_inline_depth: usize,
    /// Byte length above which lines are fingerprinted by hash.
    pub long_line_threshold: usize,
}

impl Default for TokenizerOptions {
    fn default() -> Self {
        Self {
            max_inline_depth: DEFAULT_MAX_INLINE_DEPTH,
            long_line_threshold: DEFAULT_LONG_LINE_THRESHOLD,
        }
    }
}

/// Identity of a line's text inside a cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LineFingerprint {
    /// Short lines are keyed by their full text.
    Full(Box<str>),
    /// Long lines are keyed by hash and byte length.
    Hashed {
        /// FNV-1a hash of the text.
        hash: u64,
        /// Byte length of the text.
        len: usize,
    },
}

impl LineFingerprint {
    /// Fingerprint `text`, hashing it when longer than `threshold` bytes.
    pub fn of(text: &str, threshold: usize) -> Self {
        if text.len() > threshold {
            Self::Hashed {
                hash: hash_bytes(text.as_bytes()),
                len: text.len(),
            }
        } else {
            Self::Full(text.into())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    line: usize,
    context: u64,
    text: LineFingerprint,
}

/// Tokens of one line plus the context it leaves behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineTokens {
    /// Gap-free tokens covering the line.
    pub tokens: Arc<[Token]>,
    /// Context carried into the next line.
    pub next_context: ParserContext,
}

/// Parse a single line.
///
/// Never fails: if the produced tokens do not tile the line exactly, the whole line becomes one
/// plain-text token.
pub fn parse_line(text: &str, context: &ParserContext, options: &TokenizerOptions) -> LineTokens {
    let (spans, next_context) = block::tokenize_line(text, context, options.max_inline_depth);
    LineTokens {
        tokens: tokens_or_plain(text, spans).into(),
        next_context,
    }
}

fn tokens_or_plain(text: &str, spans: Vec<Span>) -> Vec<Token> {
    finish_spans(text, spans).unwrap_or_else(|| {
        tracing::trace!(
            target: "mdedit_core::tokenizer",
            len = text.len(),
            "token spans did not tile the line, using plain text"
        );
        plain_line(text)
    })
}

fn plain_line(text: &str) -> Vec<Token> {
    if text.is_empty() {
        return Vec::new();
    }
    vec![Token {
        kind: TokenKind::Text,
        start: 0,
        end: text.chars().count(),
        text: text.to_string(),
        meta: TokenMeta::default(),
    }]
}

/// Cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenizerStats {
    /// Lookups answered from the cache.
    pub hits: u64,
    /// Lines parsed.
    pub misses: u64,
    /// Entries evicted.
    pub evictions: u64,
}

/// Memoizing line tokenizer bound to one buffer.
///
/// The tokenizer does not observe the buffer; callers report every mutation through
/// [`invalidate`](Self::invalidate) with the range returned by the buffer.
#[derive(Debug, Clone)]
pub struct IncrementalTokenizer {
    options: TokenizerOptions,
    cache: BoundedCache<CacheKey, LineTokens>,
    dirty: BTreeSet<usize>,
    /// `contexts[i]` is the known context at the start of line `i`. Never empty.
    contexts: Vec<ParserContext>,
    hits: u64,
    misses: u64,
}

impl IncrementalTokenizer {
    /// Create a tokenizer with the given cache bounds.
    pub fn new(options: TokenizerOptions, cache_capacity: usize, policy: EvictionPolicy) -> Self {
        Self {
            options,
            cache: BoundedCache::new(cache_capacity, policy),
            dirty: BTreeSet::new(),
            contexts: vec![ParserContext::new()],
            hits: 0,
            misses: 0,
        }
    }

    /// Parser options.
    pub fn options(&self) -> &TokenizerOptions {
        &self.options
    }

    /// Tokens of `line`, from the cache when possible.
    ///
    /// Out-of-range lines have no tokens.
    pub fn tokenize_line(&mut self, buffer: &TextBuffer, line: usize) -> Arc<[Token]> {
        if !buffer.contains_line(line) {
            return Arc::from(Vec::new());
        }
        let context = self.context_at(buffer, line);
        let text = buffer.get_line(line);
        let key = CacheKey {
            line,
            context: context.fingerprint(),
            text: LineFingerprint::of(&text, self.options.long_line_threshold),
        };

        if !self.dirty.contains(&line)
            && let Some(cached) = self.cache.get(&key)
        {
            self.hits += 1;
            return Arc::clone(&cached.tokens);
        }

        self.misses += 1;
        let parsed = parse_line(&text, &context, &self.options);
        if self.contexts.len() == line + 1 {
            self.contexts.push(parsed.next_context.clone());
        }
        let tokens = Arc::clone(&parsed.tokens);
        self.store(key, parsed);
        tokens
    }

    /// Tokens for each line of `range`, clamped to the buffer.
    pub fn tokenize_range(&mut self, buffer: &TextBuffer, range: Range<usize>) -> Vec<Arc<[Token]>> {
        let end = range.end.min(buffer.line_count());
        (range.start.min(end)..end)
            .map(|line| self.tokenize_line(buffer, line))
            .collect()
    }

    /// Context at the start of `line`, folding forward from the nearest known context.
    ///
    /// `line` is clamped to `line_count`, the context after the last line.
    pub fn context_at(&mut self, buffer: &TextBuffer, line: usize) -> ParserContext {
        let line = line.min(buffer.line_count());
        while self.contexts.len() <= line {
            let previous = self.contexts.len() - 1;
            let next = block::next_context(&buffer.get_line(previous), &self.contexts[previous]);
            self.contexts.push(next);
        }
        self.contexts[line].clone()
    }

    /// Mark `range` dirty and forget every context past its first line.
    pub fn invalidate(&mut self, range: LineRange) {
        self.dirty.extend(range.lines());
        self.contexts.truncate(range.start + 1);
        tracing::trace!(
            target: "mdedit_core::tokenizer",
            start = range.start,
            end = range.end,
            "invalidated lines"
        );
    }

    /// Force `line` to be reparsed until the next [`clear_dirty_marks`](Self::clear_dirty_marks).
    pub fn mark_dirty(&mut self, line: usize) {
        self.dirty.insert(line);
    }

    /// Whether `line` bypasses the cache.
    pub fn is_dirty(&self, line: usize) -> bool {
        self.dirty.contains(&line)
    }

    /// Dirty line indices, ascending.
    pub fn dirty_lines(&self) -> impl Iterator<Item = usize> + '_ {
        self.dirty.iter().copied()
    }

    /// End of a render pass: every visible line has been reparsed.
    pub fn clear_dirty_marks(&mut self) {
        self.dirty.clear();
    }

    /// Drop all cached tokens, contexts and dirty marks.
    pub fn clear_cache(&mut self) {
        tracing::trace!(
            target: "mdedit_core::tokenizer",
            entries = self.cache.len(),
            "token cache cleared"
        );
        self.cache.clear();
        self.dirty.clear();
        self.contexts.clear();
        self.contexts.push(ParserContext::new());
    }

    /// Number of cached lines.
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Cache counters.
    pub fn stats(&self) -> TokenizerStats {
        TokenizerStats {
            hits: self.hits,
            misses: self.misses,
            evictions: self.cache.evictions(),
        }
    }

    /// Cut a batch covering `range` (clamped) for off-thread tokenization.
    pub fn background_batch(&mut self, buffer: &TextBuffer, range: Range<usize>) -> TokenizeBatch {
        let end = range.end.min(buffer.line_count());
        let start = range.start.min(end);
        TokenizeBatch {
            version: buffer.version(),
            start_line: start,
            context: self.context_at(buffer, start),
            lines: (start..end).map(|line| buffer.get_line(line)).collect(),
            options: self.options,
        }
    }

    /// Merge a background result computed at `current_version`.
    ///
    /// Stale results are dropped and `false` is returned. Applied lines are cached, lose their
    /// dirty mark, and extend the known context prefix where it connects.
    pub fn apply_background_result(&mut self, result: TokenizeResult, current_version: u64) -> bool {
        if !result.is_current(current_version) {
            tracing::debug!(
                target: "mdedit_core::tokenizer",
                result_version = result.version,
                current_version,
                "dropped stale tokenize result"
            );
            return false;
        }

        for line in result.lines {
            let index = line.line_index;
            if self.contexts.len() == index + 1 && self.contexts[index] == line.context {
                self.contexts.push(line.next_context.clone());
            }
            self.dirty.remove(&index);
            let key = CacheKey {
                line: index,
                context: line.context.fingerprint(),
                text: line.fingerprint,
            };
            self.store(
                key,
                LineTokens {
                    tokens: line.tokens,
                    next_context: line.next_context,
                },
            );
        }
        true
    }

    fn store(&mut self, key: CacheKey, value: LineTokens) {
        if let Some(evicted) = self.cache.insert(key, value) {
            tracing::trace!(
                target: "mdedit_core::tokenizer",
                line = evicted.line,
                "evicted cached line"
            );
        }
    }
}

impl Default for IncrementalTokenizer {
    fn default() -> Self {
        Self::new(
            TokenizerOptions::default(),
            DEFAULT_CACHE_CAPACITY,
            EvictionPolicy::default(),
        )
    }
}
