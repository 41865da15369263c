use mdedit_core::{ParserContext, Token, TokenKind, TokenizerOptions, parse_line};
use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn tokens(line: &str) -> Vec<Token> {
    parse_line(line, &ParserContext::new(), &TokenizerOptions::default())
        .tokens
        .to_vec()
}

fn assert_covers(line: &str, tokens: &[Token]) {
    let joined: String = tokens.iter().map(|t| t.text.as_str()).collect();
    assert_eq!(joined, line, "tokens must reproduce {line:?}");

    let mut column = 0;
    for token in tokens {
        assert_eq!(token.start, column, "gap or overlap in {line:?}");
        assert!(!token.is_empty(), "empty token in {line:?}");
        assert_eq!(token.len(), token.text.chars().count());
        column = token.end;
    }
    assert_eq!(column, line.chars().count());
}

#[test]
fn test_edge_inputs_are_covered() {
    for line in ["", "**", "```", "***a***", "`", "[", "![", "$$", "\\", "~~", "[^", "| |"] {
        assert_covers(line, &tokens(line));
    }
    assert!(tokens("").is_empty());
}

#[test]
fn test_heading_and_bold_scenario() {
    let heading = tokens("# Title");
    assert_eq!(heading[0].kind, TokenKind::HeadingMarker);
    assert_eq!(heading[0].range(), 0..2);
    assert_eq!(heading[0].meta.level, Some(1));
    assert_eq!(heading[1].kind, TokenKind::HeadingText);
    assert_eq!(heading[1].text, "Title");

    let body = tokens("body **bold** text");
    let summary: Vec<(TokenKind, &str)> = body.iter().map(|t| (t.kind, t.text.as_str())).collect();
    assert_eq!(
        summary,
        vec![
            (TokenKind::Text, "body "),
            (TokenKind::BoldDelimiter, "**"),
            (TokenKind::BoldText, "bold"),
            (TokenKind::BoldDelimiter, "**"),
            (TokenKind::Text, " text"),
        ]
    );
}

#[test]
fn test_nested_emphasis_carries_both_flags() {
    let line = "***a***";
    let tokens = tokens(line);
    assert_covers(line, &tokens);
    let inner = tokens.iter().find(|t| t.text == "a").unwrap();
    assert!(inner.meta.emphasis.bold);
    assert!(inner.meta.emphasis.italic);
}

#[test]
fn test_deep_nesting_is_bounded() {
    let depth = 5_000;
    let mut line = String::new();
    for i in 0..depth {
        line.push_str(if i % 2 == 0 { "**" } else { "*" });
        line.push('x');
    }
    for i in (0..depth).rev() {
        line.push('x');
        line.push_str(if i % 2 == 0 { "**" } else { "*" });
    }
    let options = TokenizerOptions {
        max_inline_depth: 4,
        ..TokenizerOptions::default()
    };
    let tokens = parse_line(&line, &ParserContext::new(), &options).tokens;
    assert_covers(&line, &tokens);
}

#[test]
fn test_links_in_table_cells() {
    let line = "| [a](b) | `c|d` |";
    let tokens = tokens(line);
    assert_covers(line, &tokens);
    assert!(tokens.iter().any(|t| t.kind == TokenKind::LinkUrl && t.text == "b"));
}

#[test]
fn test_random_markdown_soup_is_always_covered() {
    const ALPHABET: &[&str] = &[
        "*", "**", "_", "~~", "`", "```", "[", "]", "(", ")", "!", "$", "$$", "\\", "#", "# ",
        "> ", "- ", "1. ", "|", "[^", "a", "b", " ", "\t", "é", "你", "🎉",
    ];
    let mut rng = StdRng::seed_from_u64(0x6d64_6564);
    for _ in 0..2_000 {
        let pieces = rng.gen_range(0..24);
        let line: String = (0..pieces)
            .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())])
            .collect();
        for context in [
            ParserContext::new(),
            parse_line("~~~", &ParserContext::new(), &TokenizerOptions::default()).next_context,
        ] {
            let parsed = parse_line(&line, &context, &TokenizerOptions::default());
            assert_covers(&line, &parsed.tokens);
        }
    }
}
