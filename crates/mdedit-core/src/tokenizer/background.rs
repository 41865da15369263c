//! Messages for off-thread tokenization.
//!
//! A [`TokenizeBatch`] owns copies of the lines it covers plus the context carried into its
//! first line, so it can be parsed anywhere without touching the buffer. Every batch is stamped
//! with the buffer version it was cut from; a [`TokenizeResult`] whose stamp differs from the
//! buffer's current version is stale and must be dropped.

use super::context::ParserContext;
use super::token::Token;
use super::{LineFingerprint, TokenizerOptions, parse_line};
use std::ops::Range;
use std::sync::Arc;

/// A run of consecutive lines to tokenize.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenizeBatch {
    /// Buffer version the lines were copied from.
    pub version: u64,
    /// Index of the first line.
    pub start_line: usize,
    /// Context carried into the first line.
    pub context: ParserContext,
    /// Line texts, without line breaks.
    pub lines: Vec<String>,
    /// Parser options.
    pub options: TokenizerOptions,
}

impl TokenizeBatch {
    /// Number of lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the batch covers no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Line indices covered.
    pub fn line_range(&self) -> Range<usize> {
        self.start_line..self.start_line + self.lines.len()
    }

    /// Parse every line, folding the context from one line into the next.
    pub fn run(&self) -> TokenizeResult {
        let mut context = self.context.clone();
        let mut lines = Vec::with_capacity(self.lines.len());
        for (offset, text) in self.lines.iter().enumerate() {
            let parsed = parse_line(text, &context, &self.options);
            let next_context = parsed.next_context.clone();
            lines.push(LineResult {
                line_index: self.start_line + offset,
                fingerprint: LineFingerprint::of(text, self.options.long_line_threshold),
                context: std::mem::replace(&mut context, next_context),
                tokens: parsed.tokens,
                next_context: parsed.next_context,
            });
        }
        TokenizeResult {
            version: self.version,
            lines,
        }
    }
}

/// Tokens of one line of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineResult {
    /// Line index in the buffer.
    pub line_index: usize,
    /// Context the line was parsed with.
    pub context: ParserContext,
    /// Fingerprint of the parsed text.
    pub fingerprint: LineFingerprint,
    /// Tokens covering the line.
    pub tokens: Arc<[Token]>,
    /// Context carried into the next line.
    pub next_context: ParserContext,
}

/// Outcome of a [`TokenizeBatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenizeResult {
    /// Version of the batch this result answers.
    pub version: u64,
    /// One entry per batch line, in order.
    pub lines: Vec<LineResult>,
}

impl TokenizeResult {
    /// Whether the result still matches a buffer at `version`.
    pub fn is_current(&self, version: u64) -> bool {
        self.version == version
    }
}
