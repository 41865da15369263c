//! Token types produced by the tokenizer.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;
use std::str::FromStr;

/// Token kind tag.
///
/// Every kind has a stable kebab-case tag (see [`TokenKind::as_str`]) used by theme tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TokenKind {
    /// Plain text.
    Text,
    /// `#`..`######` plus the following space.
    HeadingMarker,
    /// Text of a heading line.
    HeadingText,
    /// Opening or closing fence line of a fenced code block.
    CodeFence,
    /// Info string after an opening fence.
    CodeLanguage,
    /// A line inside a fenced code block.
    CodeBlock,
    /// Bullet or ordered list marker with its indentation and trailing space.
    ListMarker,
    /// Bullet of a task list item.
    TaskMarker,
    /// `[ ]` / `[x]` checkbox.
    TaskCheckbox,
    /// One or more `>` markers.
    BlockquoteMarker,
    /// A thematic break line.
    HorizontalRule,
    /// A `|` cell separator.
    TableDelimiter,
    /// A table alignment row such as `| :-- | --: |`.
    TableAlignment,
    /// `[^label]:` at the start of a footnote definition.
    FootnoteDefinition,
    /// Inline `[^label]` footnote reference.
    FootnoteReference,
    /// Backtick run around a code span.
    CodeDelimiter,
    /// Content of a code span.
    CodeText,
    /// `**` or `__`.
    BoldDelimiter,
    /// Text inside bold delimiters.
    BoldText,
    /// `*` or `_`.
    ItalicDelimiter,
    /// Text inside italic delimiters.
    ItalicText,
    /// `~~`.
    StrikethroughDelimiter,
    /// Text inside strikethrough delimiters.
    StrikethroughText,
    /// `[`, `](` or `)` of a link.
    LinkDelimiter,
    /// Link label.
    LinkText,
    /// Link destination.
    LinkUrl,
    /// `![`, `](` or `)` of an image.
    ImageDelimiter,
    /// Image alt text.
    ImageAlt,
    /// Image source.
    ImageUrl,
    /// `$` or `$$`.
    MathDelimiter,
    /// Inline math content.
    MathText,
}

impl TokenKind {
    /// All kinds, in declaration order.
    pub const ALL: [TokenKind; 31] = [
        TokenKind::Text,
        TokenKind::HeadingMarker,
        TokenKind::HeadingText,
        TokenKind::CodeFence,
        TokenKind::CodeLanguage,
        TokenKind::CodeBlock,
        TokenKind::ListMarker,
        TokenKind::TaskMarker,
        TokenKind::TaskCheckbox,
        TokenKind::BlockquoteMarker,
        TokenKind::HorizontalRule,
        TokenKind::TableDelimiter,
        TokenKind::TableAlignment,
        TokenKind::FootnoteDefinition,
        TokenKind::FootnoteReference,
        TokenKind::CodeDelimiter,
        TokenKind::CodeText,
        TokenKind::BoldDelimiter,
        TokenKind::BoldText,
        TokenKind::ItalicDelimiter,
        TokenKind::ItalicText,
        TokenKind::StrikethroughDelimiter,
        TokenKind::StrikethroughText,
        TokenKind::LinkDelimiter,
        TokenKind::LinkText,
        TokenKind::LinkUrl,
        TokenKind::ImageDelimiter,
        TokenKind::ImageAlt,
        TokenKind::ImageUrl,
        TokenKind::MathDelimiter,
        TokenKind::MathText,
    ];

    /// Stable tag used in theme tables.
    pub const fn as_str(self) -> &'static str {
        match self {
            TokenKind::Text => "text",
            TokenKind::HeadingMarker => "heading-marker",
            TokenKind::HeadingText => "heading-text",
            TokenKind::CodeFence => "code-fence",
            TokenKind::CodeLanguage => "code-language",
            TokenKind::CodeBlock => "code-block",
            TokenKind::ListMarker => "list-marker",
            TokenKind::TaskMarker => "task-marker",
            TokenKind::TaskCheckbox => "task-checkbox",
            TokenKind::BlockquoteMarker => "blockquote-marker",
            TokenKind::HorizontalRule => "horizontal-rule",
            TokenKind::TableDelimiter => "table-delimiter",
            TokenKind::TableAlignment => "table-alignment",
            TokenKind::FootnoteDefinition => "footnote-definition",
            TokenKind::FootnoteReference => "footnote-reference",
            TokenKind::CodeDelimiter => "code-delimiter",
            TokenKind::CodeText => "code-text",
            TokenKind::BoldDelimiter => "bold-delimiter",
            TokenKind::BoldText => "bold-text",
            TokenKind::ItalicDelimiter => "italic-delimiter",
            TokenKind::ItalicText => "italic-text",
            TokenKind::StrikethroughDelimiter => "strikethrough-delimiter",
            TokenKind::StrikethroughText => "strikethrough-text",
            TokenKind::LinkDelimiter => "link-delimiter",
            TokenKind::LinkText => "link-text",
            TokenKind::LinkUrl => "link-url",
            TokenKind::ImageDelimiter => "image-delimiter",
            TokenKind::ImageAlt => "image-alt",
            TokenKind::ImageUrl => "image-url",
            TokenKind::MathDelimiter => "math-delimiter",
            TokenKind::MathText => "math-text",
        }
    }

    /// Kinds whose adjacent runs are merged into one token.
    pub(crate) fn is_content(self) -> bool {
        matches!(
            self,
            TokenKind::Text
                | TokenKind::HeadingText
                | TokenKind::BoldText
                | TokenKind::ItalicText
                | TokenKind::StrikethroughText
                | TokenKind::LinkText
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown token tag.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown token kind '{0}'")]
pub struct UnknownTokenKind(pub String);

impl FromStr for TokenKind {
    type Err = UnknownTokenKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TokenKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownTokenKind(s.to_string()))
    }
}

/// Emphasis inherited from enclosing inline constructs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Emphasis {
    /// Inside `**`/`__`.
    pub bold: bool,
    /// Inside `*`/`_`.
    pub italic: bool,
    /// Inside `~~`.
    pub strikethrough: bool,
}

/// Optional per-token metadata.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TokenMeta {
    /// Heading level (1-6) or blockquote depth.
    pub level: Option<u8>,
    /// Checkbox state of a task item.
    pub checked: Option<bool>,
    /// Language of a fenced code block.
    pub language: Option<String>,
    /// `true` for a `\x` escape; the token text keeps the backslash.
    pub escaped: bool,
    /// Emphasis of enclosing constructs.
    pub emphasis: Emphasis,
}

/// A token over one line.
///
/// `start`/`end` are character offsets into the line; `text` is exactly that slice.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
    /// Kind tag.
    pub kind: TokenKind,
    /// Start character offset (inclusive).
    pub start: usize,
    /// End character offset (exclusive).
    pub end: usize,
    /// The covered text.
    pub text: String,
    /// Metadata.
    pub meta: TokenMeta,
}

impl Token {
    /// Length in characters.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Whether the token covers nothing.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Character range of the token.
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// A token under construction, addressed by byte range.
#[derive(Debug, Clone)]
pub(crate) struct Span {
    pub kind: TokenKind,
    pub range: Range<usize>,
    pub meta: TokenMeta,
}

impl Span {
    pub fn new(kind: TokenKind, range: Range<usize>, meta: TokenMeta) -> Self {
        Self { kind, range, meta }
    }
}

/// Convert byte spans to tokens.
///
/// Returns `None` unless the spans exactly tile `text` on character boundaries. Empty spans are
/// dropped; adjacent plain spans with identical metadata are merged.
pub(crate) fn finish_spans(text: &str, spans: Vec<Span>) -> Option<Vec<Token>> {
    let mut merged: Vec<Span> = Vec::with_capacity(spans.len());
    let mut cursor = 0usize;
    for span in spans {
        if span.range.start != cursor || span.range.end < span.range.start {
            return None;
        }
        cursor = span.range.end;
        if span.range.is_empty() {
            continue;
        }
        if let Some(last) = merged.last_mut()
            && last.kind == span.kind
            && span.kind.is_content()
            && !last.meta.escaped
            && !span.meta.escaped
            && last.meta == span.meta
        {
            last.range.end = span.range.end;
            continue;
        }
        merged.push(span);
    }
    if cursor != text.len() {
        return None;
    }

    let mut tokens = Vec::with_capacity(merged.len());
    let mut column = 0usize;
    for span in merged {
        let slice = text.get(span.range.clone())?;
        let len = slice.chars().count();
        tokens.push(Token {
            kind: span.kind,
            start: column,
            end: column + len,
            text: slice.to_string(),
            meta: span.meta,
        });
        column += len;
    }
    Some(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_round_trip_through_from_str() {
        for kind in TokenKind::ALL {
            assert_eq!(kind.as_str().parse::<TokenKind>(), Ok(kind));
        }
        assert!("no-such-kind".parse::<TokenKind>().is_err());
    }

    #[test]
    fn test_serde_uses_tags() {
        let json = serde_json::to_string(&TokenKind::BoldDelimiter).unwrap();
        assert_eq!(json, "\"bold-delimiter\"");
    }

    #[test]
    fn test_finish_spans_merges_plain_runs() {
        let text = "ab*c";
        let spans = vec![
            Span::new(TokenKind::Text, 0..2, TokenMeta::default()),
            Span::new(TokenKind::Text, 2..3, TokenMeta::default()),
            Span::new(TokenKind::Text, 3..4, TokenMeta::default()),
        ];
        let tokens = finish_spans(text, spans).unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].text, "ab*c");
    }

    #[test]
    fn test_finish_spans_rejects_gaps_and_bad_boundaries() {
        let gap = vec![Span::new(TokenKind::Text, 1..2, TokenMeta::default())];
        assert!(finish_spans("ab", gap).is_none());

        let split_char = vec![
            Span::new(TokenKind::Text, 0..1, TokenMeta::default()),
            Span::new(TokenKind::CodeText, 1..3, TokenMeta::default()),
        ];
        assert!(finish_spans("é", split_char).is_none());
    }

    #[test]
    fn test_finish_spans_uses_char_offsets() {
        let text = "你好x";
        let spans = vec![
            Span::new(TokenKind::Text, 0..6, TokenMeta::default()),
            Span::new(TokenKind::CodeText, 6..7, TokenMeta::default()),
        ];
        let tokens = finish_spans(text, spans).unwrap();
        assert_eq!(tokens[1].start, 2);
        assert_eq!(tokens[1].end, 3);
    }
}
