//! [§ 5 Parsing](https://www.w3.org/TR/css-syntax-3/#parsing)
//!
//! Recursive-descent parser from CSS text to a [`Document`].
//!
//! Recovery: with lenient settings, an [`SourceError::UnexpectedToken`]
//! raised while parsing one list item discards that item and parsing resumes
//! after it. [`SourceError::Source`] always aborts.

use crate::error::{MatchType, SourceError};
use crate::list::{AtRuleBlockList, Charset, CssList, Document, Import, KeyFrame, ListItem, Namespace};
use crate::rule_set::{AtRuleSet, DeclarationBlock};
use crate::scanner::{Scanner, Until};
use crate::settings::Settings;
use crate::value::{CssString, CssUrl, Value};

/// At-rules whose block holds a nested rule list rather than declarations.
const BLOCK_RULES: &[&str] = &["media", "document", "supports", "region-style", "font-feature-values"];

/// Where a list being parsed sits in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListContext {
    Root,
    Block,
    KeyFrame,
}

/// Result of parsing one list item.
enum ItemOutcome {
    Item(ListItem),
    /// Discarded by lenient recovery.
    Skip,
    /// A `}` closing the enclosing block.
    EndOfList,
}

/// CSS parser over one source text.
#[derive(Debug, Clone)]
pub struct Parser {
    scanner: Scanner,
}

impl Parser {
    /// A lenient parser numbering lines from 1.
    #[must_use]
    pub fn new(text: &str) -> Self {
        Self::with_settings(text, Settings::create(), 1)
    }

    /// A parser with explicit settings and starting line.
    #[must_use]
    pub fn with_settings(text: &str, settings: Settings, line_no: usize) -> Self {
        Self {
            scanner: Scanner::new(text, settings, line_no),
        }
    }

    /// Parse the whole input.
    ///
    /// # Errors
    ///
    /// In strict mode, the first syntax error. In lenient mode, only
    /// [`SourceError::Source`] failures such as an unterminated string.
    pub fn parse(mut self) -> Result<Document, SourceError> {
        let mut list = CssList::new(self.scanner.current_line());
        parse_list(&mut self.scanner, &mut list, ListContext::Root)?;
        Ok(Document::from_list(list))
    }
}

fn parse_list(scanner: &mut Scanner, list: &mut CssList, context: ListContext) -> Result<(), SourceError> {
    while !scanner.is_end() {
        let comments = scanner.consume_whitespace()?;
        if scanner.is_end() {
            break;
        }
        let start = scanner.position();
        let outcome = match parse_list_item(scanner, list, context) {
            Ok(outcome) => outcome,
            Err(error) if scanner.is_lenient() && error.is_unexpected_token() => {
                tracing::debug!(%error, "discarding malformed CSS rule");
                if scanner.position() == start {
                    let _ = scanner.consume_count(1)?;
                }
                ItemOutcome::Skip
            }
            Err(error) => return Err(error),
        };
        match outcome {
            ItemOutcome::EndOfList => return Ok(()),
            ItemOutcome::Item(mut item) => {
                item.add_comments(comments);
                list.append(item);
            }
            ItemOutcome::Skip => {}
        }
        let _ = scanner.consume_whitespace()?;
    }
    if context != ListContext::Root && !scanner.is_lenient() {
        return Err(SourceError::source("Unexpected end of document", scanner.current_line()));
    }
    Ok(())
}

fn parse_list_item(scanner: &mut Scanner, list: &CssList, context: ListContext) -> Result<ItemOutcome, SourceError> {
    let is_root = context == ListContext::Root;

    if scanner.comes("@", false) {
        let outcome = parse_at_rule(scanner)?;
        if let ItemOutcome::Item(ListItem::Charset(charset)) = &outcome {
            if !is_root {
                return Err(SourceError::unexpected_token(
                    "@charset may only occur in root document",
                    "",
                    MatchType::Custom,
                    charset.line_no,
                ));
            }
            if !list.contents.is_empty() {
                return Err(SourceError::unexpected_token(
                    "@charset must be the first parseable token in a document",
                    "",
                    MatchType::Custom,
                    charset.line_no,
                ));
            }
        }
        return Ok(outcome);
    }

    if scanner.comes("}", false) {
        if !is_root {
            return Ok(ItemOutcome::EndOfList);
        }
        if !scanner.is_lenient() {
            return Err(SourceError::source("Unopened {", scanner.current_line()));
        }
    }

    Ok(match DeclarationBlock::parse(scanner, context == ListContext::KeyFrame)? {
        Some(block) => ItemOutcome::Item(ListItem::DeclarationBlock(block)),
        None => ItemOutcome::Skip,
    })
}

fn parse_at_rule(scanner: &mut Scanner) -> Result<ItemOutcome, SourceError> {
    let _ = scanner.consume("@")?;
    let identifier = scanner.parse_identifier(true)?;
    let line_no = scanner.current_line();
    let _ = scanner.consume_whitespace()?;

    if identifier == "import" {
        let location = CssUrl::parse(scanner)?;
        let _ = scanner.consume_whitespace()?;
        let mut media_query = None;
        if !scanner.comes(";", false) {
            let media = scanner.consume_until_char(&[';'], Until::new().or_eof())?;
            let media = media.trim();
            if !media.is_empty() {
                media_query = Some(media.to_string());
            }
        }
        let _ = scanner.consume_until_char(&[';'], Until::new().include_end().or_eof())?;
        return Ok(ItemOutcome::Item(ListItem::Import(Import {
            location,
            media_query,
            line_no,
            comments: Vec::new(),
        })));
    }

    if identifier == "charset" {
        let charset = CssString::parse(scanner)?;
        let _ = scanner.consume_whitespace()?;
        let _ = scanner.consume_until_char(&[';'], Until::new().include_end().or_eof())?;
        return Ok(ItemOutcome::Item(ListItem::Charset(Charset {
            charset,
            line_no,
            comments: Vec::new(),
        })));
    }

    if identifier_is(&identifier, "keyframes") {
        let mut keyframe = KeyFrame::new(line_no);
        keyframe.vendor_key_frame = identifier;
        keyframe.animation_name = scanner
            .consume_until_char(&['{'], Until::new().consume_end())?
            .trim()
            .to_string();
        parse_list(scanner, &mut keyframe.list, ListContext::KeyFrame)?;
        if scanner.comes("}", false) {
            let _ = scanner.consume("}")?;
        }
        return Ok(ItemOutcome::Item(ListItem::KeyFrame(keyframe)));
    }

    if identifier == "namespace" {
        return parse_namespace(scanner, line_no).map(|namespace| ItemOutcome::Item(ListItem::Namespace(namespace)));
    }

    let args = scanner.consume_until_char(&['{'], Until::new().consume_end())?;
    let args = args.trim().to_string();
    if args.matches('(').count() != args.matches(')').count() {
        if !scanner.is_lenient() {
            return Err(SourceError::source("Unmatched brace count in media query", line_no));
        }
        tracing::debug!(at_rule = %identifier, %args, "skipping at-rule with unbalanced prelude");
        skip_block(scanner)?;
        return Ok(ItemOutcome::Skip);
    }

    if BLOCK_RULES.iter().any(|name| identifier_is(&identifier, name)) {
        let mut block = AtRuleBlockList::new(identifier, args, line_no);
        parse_list(scanner, &mut block.list, ListContext::Block)?;
        if scanner.comes("}", false) {
            let _ = scanner.consume("}")?;
        }
        Ok(ItemOutcome::Item(ListItem::AtRuleBlockList(block)))
    } else {
        let mut at_rule = AtRuleSet::new(identifier, args, line_no);
        at_rule.rule_set.parse_rule_set(scanner)?;
        Ok(ItemOutcome::Item(ListItem::AtRuleSet(at_rule)))
    }
}

/// [§ 2 Declaring Namespaces](https://www.w3.org/TR/css-namespaces-3/#syntax)
///
/// "@namespace <namespace-prefix>? [ <string> | <url> ] ;"
fn parse_namespace(scanner: &mut Scanner, line_no: usize) -> Result<Namespace, SourceError> {
    let first = Value::parse_primitive_value(scanner)?;
    let (prefix, url) = if scanner.comes(";", false) {
        (None, first)
    } else {
        (Some(first), Value::parse_primitive_value(scanner)?)
    };
    let _ = scanner.consume_until_char(&[';'], Until::new().include_end().or_eof())?;

    let prefix = match prefix {
        None => None,
        Some(Value::Ident(prefix)) => Some(prefix),
        Some(_) => {
            return Err(SourceError::unexpected_token(
                "Wrong namespace prefix",
                "",
                MatchType::Custom,
                line_no,
            ));
        }
    };
    if !matches!(url, Value::String(_) | Value::Url(_)) {
        return Err(SourceError::unexpected_token(
            "Wrong namespace url of invalid type",
            "",
            MatchType::Custom,
            line_no,
        ));
    }
    Ok(Namespace {
        prefix,
        url,
        line_no,
        comments: Vec::new(),
    })
}

/// Consume up to and including the `}` matching an already consumed `{`.
fn skip_block(scanner: &mut Scanner) -> Result<(), SourceError> {
    let mut depth = 1usize;
    while let Some(c) = scanner.peek_char() {
        let _ = scanner.consume_count(1)?;
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    break;
                }
            }
            _ => {}
        }
    }
    Ok(())
}

/// Whether `identifier` is `name`, optionally with a vendor prefix such as
/// `-webkit-`. Case-insensitive.
fn identifier_is(identifier: &str, name: &str) -> bool {
    if identifier.eq_ignore_ascii_case(name) {
        return true;
    }
    identifier
        .strip_prefix('-')
        .and_then(|rest| rest.split_once('-'))
        .is_some_and(|(vendor, rest)| {
            !vendor.is_empty()
                && vendor.chars().all(|c| c.is_alphanumeric() || c == '_')
                && rest.eq_ignore_ascii_case(name)
        })
}
