//! Integration tests for the CSS scanner.

use ampopt_css::{Scanner, Settings, SourceError, Until};

fn scanner(input: &str) -> Scanner {
    Scanner::new(input, Settings::create(), 1)
}

fn strict(input: &str) -> Scanner {
    Scanner::new(input, Settings::create().be_strict(), 1)
}

#[test]
fn test_peek_and_comes() {
    let s = scanner("Hello world");
    assert_eq!(s.peek(5, 0), "Hello");
    assert_eq!(s.peek(5, 6), "world");
    assert_eq!(s.peek(3, 20), "");
    assert_eq!(s.peek(1, -1), "");
    assert!(s.comes("hello", true));
    assert!(!s.comes("hello", false));
    assert!(!s.comes("Hello world!", false));
}

#[test]
fn test_consume_literal_and_count() {
    let mut s = scanner("@import url(x);");
    assert_eq!(s.consume("@").unwrap(), "@");
    assert_eq!(s.consume_count(6).unwrap(), "import");
    let error = s.consume(";").unwrap_err();
    assert!(error.is_unexpected_token());
    assert!(matches!(error, SourceError::UnexpectedToken { .. }));
    assert_eq!(s.position(), 7);
}

#[test]
fn test_consume_count_past_end_is_eof() {
    let mut s = scanner("ab");
    let error = s.consume_count(3).unwrap_err();
    assert!(matches!(error, SourceError::UnexpectedEof { .. }));
    assert_eq!(s.position(), 0);
}

#[test]
fn test_consume_whitespace_collects_comments() {
    let mut s = scanner("  /* one */\n /*two*/ a");
    let comments = s.consume_whitespace().unwrap();
    assert_eq!(comments.len(), 2);
    assert_eq!(comments[0].text, " one ");
    assert_eq!(comments[0].line_no, 1);
    assert_eq!(comments[1].text, "two");
    assert_eq!(comments[1].line_no, 2);
    assert!(s.comes("a", false));
    assert_eq!(s.current_line(), 2);
}

#[test]
fn test_unterminated_comment() {
    let mut lenient = scanner("/* never closed");
    assert!(lenient.consume_whitespace().unwrap().is_empty());
    assert!(lenient.is_end());

    let mut strict = strict("/* never closed");
    assert!(strict.consume_whitespace().is_err());
}

#[test]
fn test_consume_until_variants() {
    let mut s = scanner("abc;def;");
    assert_eq!(s.consume_until_char(&[';'], Until::new()).unwrap(), "abc");
    assert!(s.comes(";", false));
    assert_eq!(s.consume_until_char(&[';'], Until::new().include_end()).unwrap(), ";");
    assert_eq!(s.consume_until_char(&[';'], Until::new().consume_end()).unwrap(), "def");
    assert!(s.is_end());
}

#[test]
fn test_consume_until_missing_stop() {
    let mut s = scanner("abc");
    let error = s.consume_until_char(&['}'], Until::new()).unwrap_err();
    assert!(matches!(error, SourceError::UnexpectedEof { .. }));
    assert_eq!(s.position(), 0);

    assert_eq!(s.consume_until_char(&['}'], Until::new().or_eof()).unwrap(), "abc");
    assert!(s.is_end());
}

#[test]
fn test_consume_until_strips_comments() {
    let mut s = scanner("a/* c */b{");
    let mut comments = Vec::new();
    let text = s.consume_until(&['{'], Until::new(), &mut comments).unwrap();
    assert_eq!(text, "ab");
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].text, " c ");
}

#[test]
fn test_backtrack_restores_line() {
    let mut s = scanner("a\nb");
    let _ = s.consume_count(3).unwrap();
    assert_eq!(s.current_line(), 2);
    s.backtrack(2);
    assert_eq!(s.current_line(), 1);
    assert!(s.comes("\nb", false));
}

// ========== Identifiers ==========

#[test]
fn test_parse_identifier() {
    let mut s = scanner("Background-Color:");
    assert_eq!(s.parse_identifier(true).unwrap(), "background-color");
    assert!(s.comes(":", false));

    let mut s = scanner("--MyVar");
    assert_eq!(s.parse_identifier(false).unwrap(), "--MyVar");
}

#[test]
fn test_parse_identifier_requires_identifier_char() {
    let mut s = scanner(":root");
    let error = s.parse_identifier(true).unwrap_err();
    assert!(error.is_unexpected_token());
    assert_eq!(s.position(), 0);
}

#[test]
fn test_identifier_keeps_escaped_punctuation_escaped() {
    let mut s = scanner("a\\:b c");
    assert_eq!(s.parse_identifier(false).unwrap(), "a\\:b");
}

#[test]
fn test_hex_escape() {
    let mut s = scanner("\\41 b");
    assert_eq!(s.parse_character(false).unwrap().as_deref(), Some("A"));
    assert!(s.comes("b", false));
}

#[test]
fn test_zero_escape_is_replacement_character() {
    let mut s = scanner("\\0 ");
    let strict_result = Scanner::new("\\0 ", Settings::create().be_strict(), 1).parse_character(true);
    assert_eq!(strict_result.unwrap().as_deref(), Some("\u{fffd}"));
    // Lenient identifiers treat \0 as an IE hack and stop.
    assert_eq!(s.parse_character(true).unwrap(), None);
}

#[test]
fn test_escaped_newline_is_line_continuation() {
    let mut s = scanner("\\\nx");
    assert_eq!(s.parse_character(false).unwrap().as_deref(), Some(""));
    assert_eq!(s.current_line(), 2);
}

#[test]
fn test_backslash_at_end_of_input() {
    let mut s = scanner("\\");
    assert!(s.parse_character(false).is_err());
}
