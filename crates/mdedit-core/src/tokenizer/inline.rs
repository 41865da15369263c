//! Inline Markdown parsing.
//!
//! Scans left to right for trigger characters (`` ` `` `*` `_` `~` `[` `!` `$`) and `\` escapes.
//! Each trigger tries one construct by searching for its closer. On success it emits
//! delimiter/content/delimiter spans and recursively parses the content (emphasis and link
//! labels); on failure the trigger character stays plain text and scanning resumes at the next
//! character.
//!
//! All ranges are absolute byte offsets into the line, so recursive calls need no re-basing.
//! At most `max_depth` levels are parsed; content of a construct at the last level becomes one
//! plain span.

use super::token::{Emphasis, Span, TokenKind, TokenMeta};
use std::ops::Range;

/// How plain text is tagged at the current nesting level.
#[derive(Debug, Clone)]
pub(crate) struct InlineStyle {
    pub text_kind: TokenKind,
    pub meta: TokenMeta,
}

impl InlineStyle {
    pub fn new(text_kind: TokenKind, meta: TokenMeta) -> Self {
        Self { text_kind, meta }
    }

    pub fn plain() -> Self {
        Self::new(TokenKind::Text, TokenMeta::default())
    }

    fn nested(&self, text_kind: TokenKind, emphasize: impl FnOnce(&mut Emphasis)) -> Self {
        let mut meta = self.meta.clone();
        emphasize(&mut meta.emphasis);
        Self { text_kind, meta }
    }

    fn span(&self, kind: TokenKind, range: Range<usize>) -> Span {
        Span::new(kind, range, self.meta.clone())
    }

    fn text(&self, range: Range<usize>) -> Span {
        self.span(self.text_kind, range)
    }
}

enum Scan {
    /// A construct was emitted; continue after it.
    Matched(usize),
    /// No construct; the trigger stays plain and scanning continues here.
    Plain(usize),
}

#[derive(Clone, Copy)]
struct Delimited {
    delimiter: TokenKind,
    content: TokenKind,
    emphasize: fn(&mut Emphasis),
}

const BOLD: Delimited = Delimited {
    delimiter: TokenKind::BoldDelimiter,
    content: TokenKind::BoldText,
    emphasize: |e| e.bold = true,
};

const ITALIC: Delimited = Delimited {
    delimiter: TokenKind::ItalicDelimiter,
    content: TokenKind::ItalicText,
    emphasize: |e| e.italic = true,
};

const STRIKETHROUGH: Delimited = Delimited {
    delimiter: TokenKind::StrikethroughDelimiter,
    content: TokenKind::StrikethroughText,
    emphasize: |e| e.strikethrough = true,
};

fn is_space(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t')
}

fn run_len(bytes: &[u8], start: usize, end: usize, byte: u8) -> usize {
    bytes[start..end].iter().take_while(|b| **b == byte).count()
}

/// Parse `line[range]` into `out`.
pub(crate) fn parse_inline(
    line: &str,
    range: Range<usize>,
    style: &InlineStyle,
    max_depth: usize,
    out: &mut Vec<Span>,
) {
    let parser = InlineParser {
        line,
        bytes: line.as_bytes(),
        max_depth,
    };
    parser.parse(range.start, range.end, style, 0, out);
}

struct InlineParser<'a> {
    line: &'a str,
    bytes: &'a [u8],
    max_depth: usize,
}

impl InlineParser<'_> {
    fn parse(&self, start: usize, end: usize, style: &InlineStyle, depth: usize, out: &mut Vec<Span>) {
        let b = self.bytes;
        let mut i = start;
        let mut plain = start;

        while i < end {
            if !matches!(b[i], b'\\' | b'`' | b'*' | b'_' | b'~' | b'[' | b'!' | b'$') {
                i += 1;
                continue;
            }

            // Flush pending text; adjacent plain spans are merged later.
            out.push(style.text(plain..i));
            plain = i;

            let scan = match b[i] {
                b'\\' => self.escape(i, end, style, out),
                b'`' => self.code_span(i, end, style, out),
                b'*' | b'_' | b'~' => self.emphasis(i, end, style, depth, out),
                b'[' => self.bracket(i, end, style, depth, out),
                b'!' => self.image(i, end, style, out),
                _ => self.math(i, end, style, out),
            };

            match scan {
                Scan::Matched(next) => {
                    i = next;
                    plain = next;
                }
                Scan::Plain(next) => i = next,
            }
        }

        out.push(style.text(plain..end));
    }

    fn nested(&self, start: usize, end: usize, style: &InlineStyle, depth: usize, out: &mut Vec<Span>) {
        if depth + 1 >= self.max_depth {
            out.push(style.text(start..end));
        } else {
            self.parse(start, end, style, depth + 1, out);
        }
    }

    fn escape(&self, i: usize, end: usize, style: &InlineStyle, out: &mut Vec<Span>) -> Scan {
        let Some(escaped) = self.line.get(i + 1..end).and_then(|rest| rest.chars().next()) else {
            return Scan::Plain(i + 1);
        };
        let next = i + 1 + escaped.len_utf8();
        let mut span = style.text(i..next);
        span.meta.escaped = true;
        out.push(span);
        Scan::Matched(next)
    }

    fn code_span(&self, i: usize, end: usize, style: &InlineStyle, out: &mut Vec<Span>) -> Scan {
        let b = self.bytes;
        let n = run_len(b, i, end, b'`');
        let mut j = i + n;
        while j < end {
            if b[j] != b'`' {
                j += 1;
                continue;
            }
            let m = run_len(b, j, end, b'`');
            if m == n {
                out.push(style.span(TokenKind::CodeDelimiter, i..i + n));
                out.push(style.span(TokenKind::CodeText, i + n..j));
                out.push(style.span(TokenKind::CodeDelimiter, j..j + n));
                return Scan::Matched(j + n);
            }
            j += m;
        }
        // An unmatched run is literal as a whole.
        Scan::Plain(i + n)
    }

    fn emphasis(
        &self,
        i: usize,
        end: usize,
        style: &InlineStyle,
        depth: usize,
        out: &mut Vec<Span>,
    ) -> Scan {
        let b = self.bytes;
        let run = run_len(b, i, end, b[i]);
        if b[i] == b'~' {
            if run >= 2
                && let Some(next) = self.delimited(i, end, 2, STRIKETHROUGH, style, depth, out)
            {
                return Scan::Matched(next);
            }
            return Scan::Plain(i + 1);
        }
        if run >= 2
            && let Some(next) = self.delimited(i, end, 2, BOLD, style, depth, out)
        {
            return Scan::Matched(next);
        }
        match self.delimited(i, end, 1, ITALIC, style, depth, out) {
            Some(next) => Scan::Matched(next),
            None => Scan::Plain(i + 1),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn delimited(
        &self,
        i: usize,
        end: usize,
        n: usize,
        construct: Delimited,
        style: &InlineStyle,
        depth: usize,
        out: &mut Vec<Span>,
    ) -> Option<usize> {
        let b = self.bytes;
        let open_end = i + n;
        if open_end >= end || is_space(b[open_end]) {
            return None;
        }
        let close = self.find_closer(open_end + 1, end, b[i], n)?;
        if is_space(b[close - 1]) {
            return None;
        }

        out.push(style.span(construct.delimiter, i..open_end));
        let inner = style.nested(construct.content, construct.emphasize);
        self.nested(open_end, close, &inner, depth, out);
        out.push(style.span(construct.delimiter, close..close + n));
        Some(close + n)
    }

    /// First run of exactly `n` copies of `byte` at or after `from`, skipping escapes.
    fn find_closer(&self, from: usize, end: usize, byte: u8, n: usize) -> Option<usize> {
        let b = self.bytes;
        let mut j = from;
        while j + n <= end {
            if b[j] == b'\\' {
                j += 2;
                continue;
            }
            if b[j..j + n].iter().all(|c| *c == byte)
                && (j + n == end || b[j + n] != byte)
                && (n > 1 || b[j - 1] != byte)
            {
                return Some(j);
            }
            j += 1;
        }
        None
    }

    fn bracket(
        &self,
        i: usize,
        end: usize,
        style: &InlineStyle,
        depth: usize,
        out: &mut Vec<Span>,
    ) -> Scan {
        let b = self.bytes;
        if i + 1 < end && b[i + 1] == b'^' {
            return match self.footnote_reference(i, end) {
                Some(close) => {
                    out.push(style.span(TokenKind::FootnoteReference, i..close + 1));
                    Scan::Matched(close + 1)
                }
                None => Scan::Plain(i + 1),
            };
        }

        let Some((close, paren)) = self.link_tail(i, end) else {
            return Scan::Plain(i + 1);
        };
        out.push(style.span(TokenKind::LinkDelimiter, i..i + 1));
        let label = style.nested(TokenKind::LinkText, |_| {});
        self.nested(i + 1, close, &label, depth, out);
        out.push(style.span(TokenKind::LinkDelimiter, close..close + 2));
        out.push(style.span(TokenKind::LinkUrl, close + 2..paren));
        out.push(style.span(TokenKind::LinkDelimiter, paren..paren + 1));
        Scan::Matched(paren + 1)
    }

    fn image(&self, i: usize, end: usize, style: &InlineStyle, out: &mut Vec<Span>) -> Scan {
        if i + 1 >= end || self.bytes[i + 1] != b'[' {
            return Scan::Plain(i + 1);
        }
        let Some((close, paren)) = self.link_tail(i + 1, end) else {
            return Scan::Plain(i + 1);
        };
        out.push(style.span(TokenKind::ImageDelimiter, i..i + 2));
        out.push(style.span(TokenKind::ImageAlt, i + 2..close));
        out.push(style.span(TokenKind::ImageDelimiter, close..close + 2));
        out.push(style.span(TokenKind::ImageUrl, close + 2..paren));
        out.push(style.span(TokenKind::ImageDelimiter, paren..paren + 1));
        Scan::Matched(paren + 1)
    }

    fn math(&self, i: usize, end: usize, style: &InlineStyle, out: &mut Vec<Span>) -> Scan {
        let b = self.bytes;
        let n = if run_len(b, i, end, b'$') >= 2 { 2 } else { 1 };
        let open_end = i + n;
        if open_end >= end || (n == 1 && is_space(b[open_end])) {
            return Scan::Plain(i + 1);
        }
        let Some(close) = self.find_closer(open_end + 1, end, b'$', n) else {
            return Scan::Plain(i + 1);
        };
        if n == 1 && is_space(b[close - 1]) {
            return Scan::Plain(i + 1);
        }
        out.push(style.span(TokenKind::MathDelimiter, i..open_end));
        out.push(style.span(TokenKind::MathText, open_end..close));
        out.push(style.span(TokenKind::MathDelimiter, close..close + n));
        Scan::Matched(close + n)
    }

    /// `[^label]` with a non-empty label free of whitespace and brackets.
    fn footnote_reference(&self, i: usize, end: usize) -> Option<usize> {
        let b = self.bytes;
        let label_start = i + 2;
        let mut j = label_start;
        while j < end {
            match b[j] {
                b']' if j > label_start => return Some(j),
                b']' | b'[' | b' ' | b'\t' => return None,
                _ => j += 1,
            }
        }
        None
    }

    /// For `[` at `open`, the matching `]` (immediately followed by `(`) and the matching `)`.
    fn link_tail(&self, open: usize, end: usize) -> Option<(usize, usize)> {
        let close = self.matching(open, end, b'[', b']')?;
        if close + 1 >= end || self.bytes[close + 1] != b'(' {
            return None;
        }
        let paren = self.matching(close + 1, end, b'(', b')')?;
        Some((close, paren))
    }

    fn matching(&self, open: usize, end: usize, opener: u8, closer: u8) -> Option<usize> {
        let b = self.bytes;
        let mut depth = 0usize;
        let mut j = open;
        while j < end {
            let c = b[j];
            if c == b'\\' {
                j += 2;
                continue;
            }
            if c == opener {
                depth += 1;
            } else if c == closer {
                depth -= 1;
                if depth == 0 {
                    return Some(j);
                }
            }
            j += 1;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::token::{Token, finish_spans};

    fn parse(line: &str, max_depth: usize) -> Vec<Token> {
        let mut spans = Vec::new();
        parse_inline(line, 0..line.len(), &InlineStyle::plain(), max_depth, &mut spans);
        finish_spans(line, spans).expect("inline spans tile the line")
    }

    fn kinds(tokens: &[Token]) -> Vec<(TokenKind, &str)> {
        tokens.iter().map(|t| (t.kind, t.text.as_str())).collect()
    }

    #[test]
    fn test_bold_in_text() {
        let tokens = parse("body **bold** text", 8);
        assert_eq!(
            kinds(&tokens),
            vec![
                (TokenKind::Text, "body "),
                (TokenKind::BoldDelimiter, "**"),
                (TokenKind::BoldText, "bold"),
                (TokenKind::BoldDelimiter, "**"),
                (TokenKind::Text, " text"),
            ]
        );
        assert!(tokens[2].meta.emphasis.bold);
    }

    #[test]
    fn test_unterminated_delimiters_stay_plain() {
        assert_eq!(kinds(&parse("**", 8)), vec![(TokenKind::Text, "**")]);
        assert_eq!(kinds(&parse("a *b", 8)), vec![(TokenKind::Text, "a *b")]);
        assert_eq!(kinds(&parse("`code", 8)), vec![(TokenKind::Text, "`code")]);
        assert_eq!(kinds(&parse("[x](y", 8)), vec![(TokenKind::Text, "[x](y")]);
    }

    #[test]
    fn test_nested_bold_italic() {
        let tokens = parse("***a***", 8);
        assert_eq!(
            kinds(&tokens),
            vec![
                (TokenKind::BoldDelimiter, "**"),
                (TokenKind::ItalicDelimiter, "*"),
                (TokenKind::ItalicText, "a"),
                (TokenKind::ItalicDelimiter, "*"),
                (TokenKind::BoldDelimiter, "**"),
            ]
        );
        let inner = &tokens[2].meta.emphasis;
        assert!(inner.bold && inner.italic);
    }

    #[test]
    fn test_depth_bound_flattens_content() {
        let tokens = parse("**a *b* c**", 1);
        assert_eq!(
            kinds(&tokens),
            vec![
                (TokenKind::BoldDelimiter, "**"),
                (TokenKind::BoldText, "a *b* c"),
                (TokenKind::BoldDelimiter, "**"),
            ]
        );
        let tokens = parse("**a *b* c**", 0);
        assert_eq!(tokens.len(), 3);
    }

    #[test]
    fn test_escape_keeps_backslash_in_text() {
        let tokens = parse(r"a\*b*", 8);
        assert_eq!(
            kinds(&tokens),
            vec![
                (TokenKind::Text, "a"),
                (TokenKind::Text, r"\*"),
                (TokenKind::Text, "b*"),
            ]
        );
        assert!(tokens[1].meta.escaped);
    }

    #[test]
    fn test_code_span_content_is_literal() {
        let tokens = parse("x `a*b*` y", 8);
        assert_eq!(
            kinds(&tokens),
            vec![
                (TokenKind::Text, "x "),
                (TokenKind::CodeDelimiter, "`"),
                (TokenKind::CodeText, "a*b*"),
                (TokenKind::CodeDelimiter, "`"),
                (TokenKind::Text, " y"),
            ]
        );
    }

    #[test]
    fn test_link_image_and_footnote() {
        let tokens = parse("[see **docs**](http://x) ![logo](l.png)[^1]", 8);
        assert_eq!(
            kinds(&tokens),
            vec![
                (TokenKind::LinkDelimiter, "["),
                (TokenKind::LinkText, "see "),
                (TokenKind::BoldDelimiter, "**"),
                (TokenKind::BoldText, "docs"),
                (TokenKind::BoldDelimiter, "**"),
                (TokenKind::LinkDelimiter, "]("),
                (TokenKind::LinkUrl, "http://x"),
                (TokenKind::LinkDelimiter, ")"),
                (TokenKind::Text, " "),
                (TokenKind::ImageDelimiter, "!["),
                (TokenKind::ImageAlt, "logo"),
                (TokenKind::ImageDelimiter, "]("),
                (TokenKind::ImageUrl, "l.png"),
                (TokenKind::ImageDelimiter, ")"),
                (TokenKind::FootnoteReference, "[^1]"),
            ]
        );
    }

    #[test]
    fn test_strikethrough_and_math() {
        let tokens = parse("~~old~~ $x^2$ costs $5", 8);
        assert_eq!(
            kinds(&tokens),
            vec![
                (TokenKind::StrikethroughDelimiter, "~~"),
                (TokenKind::StrikethroughText, "old"),
                (TokenKind::StrikethroughDelimiter, "~~"),
                (TokenKind::Text, " "),
                (TokenKind::MathDelimiter, "$"),
                (TokenKind::MathText, "x^2"),
                (TokenKind::MathDelimiter, "$"),
                (TokenKind::Text, " costs $5"),
            ]
        );
    }

    #[test]
    fn test_non_ascii_text_around_constructs() {
        let tokens = parse("héllo *wörld* ✓", 8);
        assert_eq!(tokens[2].text, "wörld");
        assert_eq!(tokens[2].start, 7);
        assert_eq!(tokens.last().unwrap().text, " ✓");
    }
}
