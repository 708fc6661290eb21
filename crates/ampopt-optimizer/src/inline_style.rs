//! Reading and editing `style` attributes through the CSS parser.
//!
//! [CSS Style Attributes](https://www.w3.org/TR/css-style-attr/)
//!
//! "The value of the style attribute must match the syntax of the contents
//! of a CSS declaration block (excluding the delimiting braces)"

use ampopt_css::{MatchType, OutputFormat, Rule, RuleSet, Scanner, Settings, SourceError, Value};

/// Parse the declarations of a `style` attribute, dropping malformed ones.
#[must_use]
pub fn parse_declarations(style: &str) -> RuleSet {
    let mut rules = RuleSet::new(1);
    let mut scanner = Scanner::new(&format!("{style}}}"), Settings::create(), 1);
    if let Err(error) = rules.parse_rule_set(&mut scanner) {
        tracing::debug!(%error, style, "unreadable inline style");
    }
    rules
}

/// Render declarations back into `style` attribute form.
#[must_use]
pub fn render_declarations(rules: &RuleSet) -> String {
    let mut format = OutputFormat::create_compact();
    format.semicolon_after_last_rule = false;
    rules.render_rules(&format).unwrap_or_default()
}

/// Parse a single `name: value` declaration, rejecting anything that is not
/// exactly one well-formed value.
///
/// # Errors
///
/// The [`SourceError`] of the first syntax error, or of trailing input.
pub fn parse_declaration(name: &str, value: &str) -> Result<Rule, SourceError> {
    let mut scanner = Scanner::new(value, Settings::create().be_strict(), 1);
    let _ = scanner.consume_whitespace()?;
    let value = Value::parse_value(&mut scanner, &[",", " ", "/"])?;
    let _ = scanner.consume_whitespace()?;
    if !scanner.is_end() {
        let rest = scanner.peek(1, 0);
        return Err(SourceError::unexpected_token(
            "end of value",
            &rest,
            MatchType::Literal,
            scanner.current_line(),
        ));
    }
    Ok(Rule::new(name, value))
}

/// Append `rule` to the declarations in `style`.
#[must_use]
pub fn add_declaration(style: &str, rule: Rule) -> String {
    let mut rules = parse_declarations(style);
    rules.add_rule(rule);
    render_declarations(&rules)
}

/// The first URL of the `background-image` declaration in `style`.
#[must_use]
pub fn background_image_url(style: &str) -> Option<String> {
    let rules = parse_declarations(style);
    let rule = rules.rules(Some("background-image")).into_iter().next()?;
    first_url(&rule.value)
}

fn first_url(value: &Value) -> Option<String> {
    match value {
        Value::Url(url) => Some(url.url.value.trim().to_string()),
        Value::List(list) => list.components.iter().find_map(first_url),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_background_image_url() {
        assert_eq!(
            background_image_url("color: red; background-image: url('hero.jpg')").as_deref(),
            Some("hero.jpg")
        );
        assert_eq!(
            background_image_url("BACKGROUND-IMAGE:url(a.png), url(b.png)").as_deref(),
            Some("a.png")
        );
        assert_eq!(background_image_url("background: url(a.png)"), None);
        assert_eq!(background_image_url(""), None);
    }

    #[test]
    fn test_add_declaration_keeps_existing_rules() {
        let rule = parse_declaration("object-fit", "cover").unwrap();
        assert_eq!(add_declaration("color:red", rule), "color:red;object-fit:cover");
        let rule = parse_declaration("object-position", "50% 10px").unwrap();
        assert_eq!(add_declaration("", rule), "object-position:50% 10px");
    }

    #[test]
    fn test_parse_declaration_rejects_trailing_input() {
        assert!(parse_declaration("object-fit", "cover; color: red").is_err());
        assert!(parse_declaration("object-fit", "").is_err());
    }
}
