//! [§ 5.4 Declarations](https://www.w3.org/TR/css-syntax-3/#declaration)
//!
//! "A declaration has a name, a value consisting of a list of component
//! values, and an important flag which is initially unset."

use crate::error::{MatchType, OutputError, SourceError};
use crate::format::{OutputFormat, Renderable};
use crate::scanner::{Comment, Scanner};
use crate::value::Value;

/// A single `name: value` declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    /// Property name. Lowercased unless it is a custom property (`--x`).
    pub name: String,
    /// The declared value.
    pub value: Value,
    /// Whether the declaration ends with `!important`.
    pub is_important: bool,
    /// IE hack suffixes such as the `9` of `\9`.
    pub ie_hacks: Vec<String>,
    /// Source line.
    pub line_no: usize,
    /// Comments preceding the declaration.
    pub comments: Vec<Comment>,
}

impl Rule {
    /// Create a declaration.
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            value,
            is_important: false,
            ie_hacks: Vec::new(),
            line_no: 0,
            comments: Vec::new(),
        }
    }

    /// Parse one declaration including any trailing `;`s.
    ///
    /// # Errors
    ///
    /// [`SourceError::UnexpectedToken`] when the name, the `:`, the value or
    /// the `important` keyword is malformed.
    pub fn parse(scanner: &mut Scanner) -> Result<Self, SourceError> {
        let comments = scanner.consume_whitespace()?;
        let line_no = scanner.current_line();
        let custom_property = scanner.comes("--", false);
        let name = scanner.parse_identifier(!custom_property)?;
        let _ = scanner.consume_whitespace()?;
        let _ = scanner.consume(":")?;
        let value = Value::parse_value(scanner, list_delimiters_for(&name))?;

        let mut rule = Self {
            name,
            value,
            is_important: false,
            ie_hacks: Vec::new(),
            line_no,
            comments,
        };

        if scanner.is_lenient() {
            while scanner.comes("\\", false) {
                let _ = scanner.consume("\\")?;
                rule.ie_hacks.push(scanner.consume_count(1)?);
                let _ = scanner.consume_whitespace()?;
            }
        }
        let _ = scanner.consume_whitespace()?;
        if scanner.comes("!", false) {
            let _ = scanner.consume("!")?;
            let _ = scanner.consume_whitespace()?;
            if !scanner.comes("important", true) {
                return Err(SourceError::unexpected_token(
                    "important",
                    &scanner.peek(9, 0),
                    MatchType::Literal,
                    scanner.current_line(),
                ));
            }
            let _ = scanner.consume_count(9)?;
            rule.is_important = true;
        }
        let _ = scanner.consume_whitespace()?;
        while scanner.comes(";", false) {
            let _ = scanner.consume(";")?;
            let _ = scanner.consume_whitespace()?;
        }
        Ok(rule)
    }
}

/// "The font shorthand… `font-size/line-height` binds tighter than spaces."
fn list_delimiters_for(name: &str) -> &'static [&'static str] {
    if name == "font" || name.starts_with("font-") {
        &[",", "/", " "]
    } else {
        &[",", " ", "/"]
    }
}

impl Renderable for Rule {
    fn render(&self, format: &OutputFormat) -> Result<String, OutputError> {
        let mut out = format!(
            "{}:{}{}",
            self.name,
            format.space_after_rule_name(),
            self.value.render(format)?
        );
        if !self.ie_hacks.is_empty() {
            out.push_str(" \\");
            out.push_str(&self.ie_hacks.join("\\"));
        }
        if self.is_important {
            out.push_str(" !important");
        }
        out.push(';');
        Ok(out)
    }
}
