//! Block-level line classification.
//!
//! Each line is classified in priority order: fenced code (inside or opening), heading,
//! task item, list item, blockquote, thematic break, table row, footnote definition, paragraph.
//! The block construct emits its marker spans and hands the remainder to the inline parser.

use super::context::{Fence, ParserContext};
use super::inline::{InlineStyle, parse_inline};
use super::token::{Span, TokenKind, TokenMeta};
use regex::Regex;
use std::sync::LazyLock;

static FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[ \t]{0,3}(`{3,}|~{3,})(.*)$").expect("static regex"));
static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{1,6}) ").expect("static regex"));
static TASK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([ \t]*[-*+][ \t]+)(\[[ xX]\])(?:[ \t]|$)").expect("static regex")
});
static LIST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[ \t]*(?:[-*+]|[0-9]{1,9}[.)])(?:[ \t]+|$)").expect("static regex")
});
static BLOCKQUOTE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:[ \t]*>)+[ \t]?").expect("static regex"));
static RULE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^ {0,3}(?:(?:-[ \t]*){3,}|(?:\*[ \t]*){3,}|(?:_[ \t]*){3,})$")
        .expect("static regex")
});
static TABLE_ALIGNMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[ \t]*\|(?:[ \t]*:?-+:?[ \t]*\|)*[ \t]*:?-+:?[ \t]*\|?[ \t]*$")
        .expect("static regex")
});
static FOOTNOTE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[\^[^\]\s]+\]:").expect("static regex"));

enum FenceLine {
    Open {
        fence: Fence,
        marker_end: usize,
        has_info: bool,
        language: Option<String>,
    },
    Close,
}

fn fence_line(line: &str, ctx: &ParserContext) -> Option<FenceLine> {
    let caps = FENCE.captures(line)?;
    let run = caps.get(1)?;
    let info = caps.get(2).map_or("", |m| m.as_str());
    let marker = if run.as_str().starts_with('`') { '`' } else { '~' };
    let len = run.as_str().len();

    if ctx.in_code_block {
        let closes = ctx.fence.is_none_or(|fence| fence.is_closed_by(marker, len));
        return (closes && info.trim().is_empty()).then_some(FenceLine::Close);
    }
    if marker == '`' && info.contains('`') {
        return None;
    }
    Some(FenceLine::Open {
        fence: Fence { marker, len },
        marker_end: run.end(),
        has_info: !info.trim().is_empty(),
        language: info.split_whitespace().next().map(str::to_string),
    })
}

/// Context after `line`, looking only at fences.
///
/// Agrees with [`tokenize_line`] on the resulting context without producing tokens.
pub(crate) fn next_context(line: &str, ctx: &ParserContext) -> ParserContext {
    match fence_line(line, ctx) {
        Some(FenceLine::Open {
            fence, language, ..
        }) => ParserContext::in_code_block(fence, language),
        Some(FenceLine::Close) => ParserContext::new(),
        None => ctx.clone(),
    }
}

/// Spans for `line` given the incoming context, plus the outgoing context.
pub(crate) fn tokenize_line(
    line: &str,
    ctx: &ParserContext,
    max_depth: usize,
) -> (Vec<Span>, ParserContext) {
    let mut spans = Vec::new();
    let whole = 0..line.len();

    if ctx.in_code_block {
        let meta = TokenMeta {
            language: ctx.code_block_language.clone(),
            ..TokenMeta::default()
        };
        return match fence_line(line, ctx) {
            Some(FenceLine::Close) => {
                spans.push(Span::new(TokenKind::CodeFence, whole, meta));
                (spans, ParserContext::new())
            }
            _ => {
                spans.push(Span::new(TokenKind::CodeBlock, whole, meta));
                (spans, ctx.clone())
            }
        };
    }

    if let Some(FenceLine::Open {
        fence,
        marker_end,
        has_info,
        language,
    }) = fence_line(line, ctx)
    {
        let meta = TokenMeta {
            language: language.clone(),
            ..TokenMeta::default()
        };
        if has_info {
            spans.push(Span::new(TokenKind::CodeFence, 0..marker_end, meta.clone()));
            spans.push(Span::new(TokenKind::CodeLanguage, marker_end..line.len(), meta));
        } else {
            spans.push(Span::new(TokenKind::CodeFence, whole, meta));
        }
        return (spans, ParserContext::in_code_block(fence, language));
    }

    let plain = InlineStyle::plain();

    if let Some(caps) = HEADING.captures(line)
        && let Some(hashes) = caps.get(1)
    {
        let meta = TokenMeta {
            level: u8::try_from(hashes.len()).ok(),
            ..TokenMeta::default()
        };
        let marker_end = caps.get(0).map_or(hashes.end(), |m| m.end());
        spans.push(Span::new(TokenKind::HeadingMarker, 0..marker_end, meta.clone()));
        let style = InlineStyle::new(TokenKind::HeadingText, meta);
        parse_inline(line, marker_end..line.len(), &style, max_depth, &mut spans);
    } else if let Some(caps) = TASK.captures(line)
        && let (Some(marker), Some(checkbox)) = (caps.get(1), caps.get(2))
    {
        let checked = checkbox.as_str().contains(['x', 'X']);
        spans.push(Span::new(TokenKind::TaskMarker, 0..marker.end(), TokenMeta::default()));
        spans.push(Span::new(
            TokenKind::TaskCheckbox,
            checkbox.range(),
            TokenMeta {
                checked: Some(checked),
                ..TokenMeta::default()
            },
        ));
        parse_inline(line, checkbox.end()..line.len(), &plain, max_depth, &mut spans);
    } else if let Some(marker) = LIST.find(line) {
        spans.push(Span::new(TokenKind::ListMarker, 0..marker.end(), TokenMeta::default()));
        parse_inline(line, marker.end()..line.len(), &plain, max_depth, &mut spans);
    } else if let Some(marker) = BLOCKQUOTE.find(line) {
        let depth = marker.as_str().matches('>').count();
        let meta = TokenMeta {
            level: u8::try_from(depth).ok(),
            ..TokenMeta::default()
        };
        spans.push(Span::new(TokenKind::BlockquoteMarker, 0..marker.end(), meta));
        parse_inline(line, marker.end()..line.len(), &plain, max_depth, &mut spans);
    } else if RULE.is_match(line) {
        spans.push(Span::new(TokenKind::HorizontalRule, whole, TokenMeta::default()));
    } else if line.trim_start().starts_with('|') {
        table_row(line, max_depth, &mut spans);
    } else if let Some(label) = FOOTNOTE.find(line) {
        spans.push(Span::new(
            TokenKind::FootnoteDefinition,
            0..label.end(),
            TokenMeta::default(),
        ));
        parse_inline(line, label.end()..line.len(), &plain, max_depth, &mut spans);
    } else {
        parse_inline(line, whole, &plain, max_depth, &mut spans);
    }

    (spans, ctx.clone())
}

fn table_row(line: &str, max_depth: usize, spans: &mut Vec<Span>) {
    if TABLE_ALIGNMENT.is_match(line) {
        spans.push(Span::new(
            TokenKind::TableAlignment,
            0..line.len(),
            TokenMeta::default(),
        ));
        return;
    }

    let plain = InlineStyle::plain();
    let bytes = line.as_bytes();
    let mut cell_start = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'|' => {
                parse_inline(line, cell_start..i, &plain, max_depth, spans);
                spans.push(Span::new(TokenKind::TableDelimiter, i..i + 1, TokenMeta::default()));
                cell_start = i + 1;
                i += 1;
            }
            _ => i += 1,
        }
    }
    parse_inline(line, cell_start..line.len(), &plain, max_depth, spans);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::token::{Token, finish_spans};

    fn run(line: &str, ctx: &ParserContext) -> (Vec<Token>, ParserContext) {
        let (spans, next) = tokenize_line(line, ctx, 8);
        (finish_spans(line, spans).expect("block spans tile the line"), next)
    }

    fn kinds(tokens: &[Token]) -> Vec<(TokenKind, &str)> {
        tokens.iter().map(|t| (t.kind, t.text.as_str())).collect()
    }

    #[test]
    fn test_heading_marker_and_text() {
        let (tokens, _) = run("## Sub *title*", &ParserContext::new());
        assert_eq!(tokens[0].kind, TokenKind::HeadingMarker);
        assert_eq!(tokens[0].range(), 0..3);
        assert_eq!(tokens[0].meta.level, Some(2));
        assert_eq!(tokens[1].kind, TokenKind::HeadingText);
        assert_eq!(tokens[2].kind, TokenKind::ItalicDelimiter);

        let (tokens, _) = run("#hashtag", &ParserContext::new());
        assert_eq!(kinds(&tokens), vec![(TokenKind::Text, "#hashtag")]);
    }

    #[test]
    fn test_fence_opens_and_closes() {
        let (tokens, ctx) = run("```rust", &ParserContext::new());
        assert_eq!(
            kinds(&tokens),
            vec![(TokenKind::CodeFence, "```"), (TokenKind::CodeLanguage, "rust")]
        );
        assert!(ctx.in_code_block);
        assert_eq!(ctx.code_block_language.as_deref(), Some("rust"));

        let (tokens, inside) = run("let x = **1**;", &ctx);
        assert_eq!(kinds(&tokens), vec![(TokenKind::CodeBlock, "let x = **1**;")]);
        assert_eq!(tokens[0].meta.language.as_deref(), Some("rust"));
        assert_eq!(inside, ctx);

        let (tokens, inside) = run("", &ctx);
        assert!(tokens.is_empty());
        assert!(inside.in_code_block);

        let (tokens, after) = run("```", &ctx);
        assert_eq!(kinds(&tokens), vec![(TokenKind::CodeFence, "```")]);
        assert_eq!(after, ParserContext::new());
    }

    #[test]
    fn test_fence_needs_matching_marker_and_length() {
        let (_, ctx) = run("````", &ParserContext::new());
        assert!(run("```", &ctx).1.in_code_block);
        assert!(run("~~~~", &ctx).1.in_code_block);
        assert!(!run("`````", &ctx).1.in_code_block);

        let (_, tilde) = run("~~~ python", &ParserContext::new());
        assert!(!run("~~~", &tilde).1.in_code_block);
    }

    #[test]
    fn test_next_context_matches_tokenize_line() {
        let lines = ["text", "```js", "code", "~~~", "```", "# h", "~~~", "x"];
        let mut full = ParserContext::new();
        let mut cheap = ParserContext::new();
        for line in lines {
            full = tokenize_line(line, &full, 8).1;
            cheap = next_context(line, &cheap);
            assert_eq!(full, cheap, "diverged after {line:?}");
        }
    }

    #[test]
    fn test_list_task_and_quote_markers() {
        let (tokens, _) = run("- [x] done", &ParserContext::new());
        assert_eq!(
            kinds(&tokens),
            vec![
                (TokenKind::TaskMarker, "- "),
                (TokenKind::TaskCheckbox, "[x]"),
                (TokenKind::Text, " done"),
            ]
        );
        assert_eq!(tokens[1].meta.checked, Some(true));

        let (tokens, _) = run("  12. item", &ParserContext::new());
        assert_eq!(tokens[0].kind, TokenKind::ListMarker);
        assert_eq!(tokens[0].text, "  12. ");

        let (tokens, _) = run("> > quoted", &ParserContext::new());
        assert_eq!(tokens[0].kind, TokenKind::BlockquoteMarker);
        assert_eq!(tokens[0].meta.level, Some(2));
        assert_eq!(tokens[1].text, "quoted");
    }

    #[test]
    fn test_list_marker_beats_rule() {
        let (tokens, _) = run("- - -", &ParserContext::new());
        assert_eq!(
            kinds(&tokens),
            vec![(TokenKind::ListMarker, "- "), (TokenKind::Text, "- -")]
        );
        let (tokens, _) = run("* * *", &ParserContext::new());
        assert_eq!(tokens[0].kind, TokenKind::ListMarker);
        assert_eq!(tokens[0].text, "* ");

        for rule in ["***", "---", "___", "-- -"] {
            let (tokens, _) = run(rule, &ParserContext::new());
            assert_eq!(tokens[0].kind, TokenKind::HorizontalRule, "{rule:?}");
        }
    }

    #[test]
    fn test_table_rows() {
        let (tokens, _) = run("| a | **b** |", &ParserContext::new());
        let delimiters = tokens
            .iter()
            .filter(|t| t.kind == TokenKind::TableDelimiter)
            .count();
        assert_eq!(delimiters, 3);
        assert!(tokens.iter().any(|t| t.kind == TokenKind::BoldText));

        let (tokens, _) = run("| :-- | --: |", &ParserContext::new());
        assert_eq!(kinds(&tokens), vec![(TokenKind::TableAlignment, "| :-- | --: |")]);
    }

    #[test]
    fn test_footnote_definition() {
        let (tokens, _) = run("[^note]: see *this*", &ParserContext::new());
        assert_eq!(tokens[0].kind, TokenKind::FootnoteDefinition);
        assert_eq!(tokens[0].text, "[^note]:");
        assert_eq!(tokens[1].text, " see ");
    }
}
