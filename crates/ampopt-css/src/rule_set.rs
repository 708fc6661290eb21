//! [§ 5.4.5 Consume a list of declarations](https://www.w3.org/TR/css-syntax-3/#consume-list-of-declarations)
//!
//! Rule sets are the `{ … }` bodies of style rules and of at-rules such as
//! `@font-face` and `@page`.

use std::ops::{Deref, DerefMut};

use crate::error::{MatchType, OutputError, SourceError};
use crate::format::{OutputFormat, Renderable};
use crate::rule::Rule;
use crate::scanner::{Comment, Scanner, Until};
use crate::selector::Selector;

/// An ordered sequence of declarations.
///
/// Declarations keep their source order; two declarations of the same
/// property are both kept, as the later one may be a fallback-aware override.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleSet {
    rules: Vec<Rule>,
    /// Source line of the block.
    pub line_no: usize,
}

/// Whether property `name` matches `pattern`. A pattern ending in `-`
/// matches the whole family, e.g. `font-` matches `font`, `font-size` and
/// `font-family`.
fn matches_pattern(name: &str, pattern: &str) -> bool {
    match pattern.strip_suffix('-') {
        Some(family) => name.starts_with(pattern) || name == family,
        None => name == pattern,
    }
}

impl RuleSet {
    /// An empty rule set.
    #[must_use]
    pub const fn new(line_no: usize) -> Self {
        Self {
            rules: Vec::new(),
            line_no,
        }
    }

    /// Parse declarations up to and including the closing `}`.
    ///
    /// In lenient mode a malformed declaration is skipped up to the next
    /// newline, `;` or `}`.
    ///
    /// # Errors
    ///
    /// The first declaration error in strict mode, or a missing `}`.
    pub fn parse_rule_set(&mut self, scanner: &mut Scanner) -> Result<(), SourceError> {
        while scanner.comes(";", false) {
            let _ = scanner.consume(";")?;
        }
        loop {
            let comments = scanner.consume_whitespace()?;
            if scanner.comes("}", false) {
                break;
            }
            match Rule::parse(scanner) {
                Ok(mut rule) => {
                    if !comments.is_empty() {
                        let _ = rule.comments.splice(0..0, comments);
                    }
                    self.rules.push(rule);
                }
                Err(error) if scanner.is_lenient() && error.is_unexpected_token() => {
                    tracing::trace!(%error, "skipping malformed declaration");
                    let skipped = scanner.consume_until_char(&['\n', ';', '}'], Until::new().include_end());
                    match skipped {
                        Ok(skipped) if skipped.ends_with('}') => scanner.backtrack(1),
                        Ok(_) => {
                            while scanner.comes(";", false) {
                                let _ = scanner.consume(";")?;
                            }
                        }
                        // End of input: close the block as it stands.
                        Err(_) => return Ok(()),
                    }
                }
                Err(error) => return Err(error),
            }
        }
        let _ = scanner.consume("}")?;
        Ok(())
    }

    /// Declarations whose name matches `pattern`, or all of them.
    #[must_use]
    pub fn rules(&self, pattern: Option<&str>) -> Vec<&Rule> {
        self.rules
            .iter()
            .filter(|rule| pattern.is_none_or(|p| matches_pattern(&rule.name, p)))
            .collect()
    }

    /// Mutable counterpart of [`Self::rules`].
    pub fn rules_mut(&mut self, pattern: Option<&str>) -> Vec<&mut Rule> {
        self.rules
            .iter_mut()
            .filter(|rule| pattern.is_none_or(|p| matches_pattern(&rule.name, p)))
            .collect()
    }

    /// Append a declaration.
    pub fn add_rule(&mut self, rule: Rule) {
        self.rules.push(rule);
    }

    /// Replace all declarations.
    pub fn set_rules(&mut self, rules: Vec<Rule>) {
        self.rules = rules;
    }

    /// Remove the first declaration equal to `rule`.
    pub fn remove_rule(&mut self, rule: &Rule) -> bool {
        match self.rules.iter().position(|r| r == rule) {
            Some(index) => {
                let _ = self.rules.remove(index);
                true
            }
            None => false,
        }
    }

    /// Remove every declaration whose name matches `pattern`. Returns the
    /// number removed.
    pub fn remove_matching_rules(&mut self, pattern: &str) -> usize {
        let before = self.rules.len();
        self.rules.retain(|rule| !matches_pattern(&rule.name, pattern));
        before - self.rules.len()
    }

    /// Whether the set has no declarations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Render the declarations without braces.
    ///
    /// # Errors
    ///
    /// A declaration's [`OutputError`] when `ignore_exceptions` is unset.
    pub fn render_rules(&self, format: &OutputFormat) -> Result<String, OutputError> {
        let next = format.next_level();
        let mut out = String::new();
        let mut first = true;
        for rule in &self.rules {
            let Some(rendered) = next.safely(|| rule.render(&next))? else {
                continue;
            };
            if first {
                first = false;
                out.push_str(&next.space_before_rules());
            } else {
                out.push_str(&next.space_between_rules());
            }
            out.push_str(&rendered);
        }
        if !first {
            out.push_str(&format.space_after_rules());
        }
        Ok(format.remove_last_semicolon(out))
    }
}

/// [§ 5.4.3 Consume a qualified rule](https://www.w3.org/TR/css-syntax-3/#consume-qualified-rule)
///
/// A style rule: selectors followed by a declaration block.
#[derive(Debug, Clone, PartialEq)]
pub struct DeclarationBlock {
    /// Selectors in source order.
    pub selectors: Vec<Selector>,
    /// The declarations.
    pub rule_set: RuleSet,
    /// Comments preceding the block.
    pub comments: Vec<Comment>,
}

impl DeclarationBlock {
    /// An empty block with no selectors.
    #[must_use]
    pub const fn new(line_no: usize) -> Self {
        Self {
            selectors: Vec::new(),
            rule_set: RuleSet::new(line_no),
            comments: Vec::new(),
        }
    }

    /// Parse selectors and the following block. Inside `@keyframes`,
    /// selectors are keyframe selectors (`from`, `to`, percentages).
    ///
    /// Returns `None` when lenient parsing discarded a block with invalid
    /// selectors.
    ///
    /// # Errors
    ///
    /// Invalid selectors in strict mode, or any error of the block body.
    pub fn parse(scanner: &mut Scanner, in_keyframe: bool) -> Result<Option<Self>, SourceError> {
        let mut block = Self::new(scanner.current_line());
        match block.parse_prelude(scanner, in_keyframe) {
            Ok(()) => {}
            Err(error) if scanner.is_lenient() && error.is_unexpected_token() => {
                tracing::trace!(%error, "skipping block with invalid selectors");
                if !scanner.comes("}", false) {
                    let _ = scanner.consume_until_char(&['}'], Until::new().consume_end())?;
                }
                return Ok(None);
            }
            Err(error) => return Err(error),
        }
        block.rule_set.parse_rule_set(scanner)?;
        Ok(Some(block))
    }

    fn parse_prelude(&mut self, scanner: &mut Scanner, in_keyframe: bool) -> Result<(), SourceError> {
        let mut text = String::new();
        let mut quote: Option<char> = None;
        loop {
            text.push_str(&scanner.consume_count(1)?);
            text.push_str(&scanner.consume_until(
                &['{', '}', '\'', '"'],
                Until::new(),
                &mut self.comments,
            )?);
            let next = scanner.peek_char();
            match (quote, next) {
                (None, Some(c @ ('\'' | '"'))) => quote = Some(c),
                (Some(q), Some(c)) if q == c => quote = None,
                _ => {}
            }
            if quote.is_none() && matches!(next, Some('{' | '}')) {
                break;
            }
        }
        self.set_selectors(&text, in_keyframe)
            .map_err(|message| SourceError::unexpected_token(&message, "", MatchType::Custom, scanner.current_line()))?;
        if scanner.comes("{", false) {
            let _ = scanner.consume("{")?;
        }
        Ok(())
    }

    /// Replace the selectors with the comma-separated list in `text`.
    ///
    /// # Errors
    ///
    /// A description of the first selector that is not valid. The block is
    /// left unchanged.
    pub fn set_selectors(&mut self, text: &str, in_keyframe: bool) -> Result<(), String> {
        let mut selectors = Vec::new();
        for part in split_selectors(text) {
            let part = part.trim();
            let valid = if in_keyframe {
                Selector::is_valid_keyframe(part)
            } else {
                Selector::is_valid(part)
            };
            if !valid {
                return Err(format!("Selector did not match \u{201c}{part}\u{201d}."));
            }
            selectors.push(Selector::new(part));
        }
        self.selectors = selectors;
        Ok(())
    }

    /// Remove the selector with text `text`. Returns whether one was found.
    pub fn remove_selector(&mut self, text: &str) -> bool {
        let text = text.trim();
        match self.selectors.iter().position(|s| s.text() == text) {
            Some(index) => {
                let _ = self.selectors.remove(index);
                true
            }
            None => false,
        }
    }
}

/// Split on commas that are not inside quotes, brackets or parentheses.
pub(crate) fn split_selectors(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut start = 0;
    for (index, c) in text.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match (quote, c) {
            (_, '\\') => escaped = true,
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, '(' | '[') => depth += 1,
            (None, ')' | ']') => depth = depth.saturating_sub(1),
            (None, ',') if depth == 0 => {
                parts.push(&text[start..index]);
                start = index + 1;
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

impl Deref for DeclarationBlock {
    type Target = RuleSet;

    fn deref(&self) -> &RuleSet {
        &self.rule_set
    }
}

impl DerefMut for DeclarationBlock {
    fn deref_mut(&mut self) -> &mut RuleSet {
        &mut self.rule_set
    }
}

impl Renderable for DeclarationBlock {
    fn render(&self, format: &OutputFormat) -> Result<String, OutputError> {
        if self.selectors.is_empty() {
            return Err(OutputError::new(
                "Attempt to print declaration block with missing selector",
                self.rule_set.line_no,
            ));
        }
        let selectors: Vec<&str> = self.selectors.iter().map(Selector::text).collect();
        Ok(format!(
            "{}{}{{{}}}",
            selectors.join(&format.selector_separator()),
            format.space_before_opening_brace(),
            self.rule_set.render_rules(format)?
        ))
    }
}

/// [§ 9.2 At-rules](https://www.w3.org/TR/css-syntax-3/#at-rules)
///
/// An at-rule whose block holds declarations, e.g. `@font-face` or `@page`.
#[derive(Debug, Clone, PartialEq)]
pub struct AtRuleSet {
    /// Name without the `@`.
    pub name: String,
    /// Prelude text, possibly empty.
    pub args: String,
    /// The declarations.
    pub rule_set: RuleSet,
    /// Comments preceding the at-rule.
    pub comments: Vec<Comment>,
}

impl AtRuleSet {
    /// An empty at-rule.
    pub fn new(name: impl Into<String>, args: impl Into<String>, line_no: usize) -> Self {
        Self {
            name: name.into(),
            args: args.into(),
            rule_set: RuleSet::new(line_no),
            comments: Vec::new(),
        }
    }
}

impl Deref for AtRuleSet {
    type Target = RuleSet;

    fn deref(&self) -> &RuleSet {
        &self.rule_set
    }
}

impl DerefMut for AtRuleSet {
    fn deref_mut(&mut self) -> &mut RuleSet {
        &mut self.rule_set
    }
}

impl Renderable for AtRuleSet {
    fn render(&self, format: &OutputFormat) -> Result<String, OutputError> {
        let args = if self.args.is_empty() {
            String::new()
        } else {
            format!(" {}", self.args)
        };
        Ok(format!(
            "@{}{args}{}{{{}}}",
            self.name,
            format.space_before_opening_brace(),
            self.rule_set.render_rules(format)?
        ))
    }
}
