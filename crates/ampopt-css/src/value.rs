//! [§ 2 Value Definition Syntax](https://www.w3.org/TR/css-values-4/#value-defs)
//!
//! Rule values. A value is either a primitive (size, color, string, url,
//! identifier, function, `calc()`, grid line names) or a list of values joined
//! by a separator such as `,` or ` `.

use std::fmt::Write;

use crate::error::{MatchType, OutputError, SourceError};
use crate::format::{OutputFormat, Renderable};
use crate::scanner::{Scanner, Until};

/// Units recognized after a number, matched case-insensitively, longest first.
const SIZE_UNITS: &[&str] = &[
    "mozmm", "vmin", "vmax", "turn", "rem", "deg", "rad", "khz", "grad", "px", "cm", "mm", "in",
    "pt", "pc", "vh", "vw", "em", "ex", "ch", "fr", "ms", "hz", "%", "s",
];

/// Angle, time and frequency units.
const NON_SIZE_UNITS: &[&str] = &["deg", "grad", "rad", "s", "ms", "turn", "hz", "khz"];

/// A rule value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A quoted or unquoted string.
    String(CssString),
    /// `url(…)`.
    Url(CssUrl),
    /// A number with an optional unit.
    Size(Size),
    /// `#rrggbb`, `rgb(…)`, `hsl(…)` and friends.
    Color(Color),
    /// A bare keyword, e.g. `auto` or `sans-serif`.
    Ident(String),
    /// Values joined by a separator.
    List(ValueList),
    /// `name(args)`.
    Function(CssFunction),
    /// `calc(…)` and its vendor-prefixed spellings.
    Calc(CalcFunction),
    /// `[name name]` grid line names.
    LineName(LineName),
}

enum StackEntry {
    Value(Value),
    Delimiter(String),
}

impl StackEntry {
    fn is_delimiter(&self, delimiter: &str) -> bool {
        matches!(self, Self::Delimiter(d) if d == delimiter)
    }

    fn into_value(self) -> Option<Value> {
        match self {
            Self::Value(value) => Some(value),
            Self::Delimiter(_) => None,
        }
    }
}

impl Value {
    /// Parse a value up to the next `}`, `;`, `!`, `)`, `\` or the end of
    /// input.
    ///
    /// Components separated by one of `list_delimiters` (or by whitespace)
    /// are grouped into [`ValueList`]s. Delimiters listed first bind
    /// tightest.
    ///
    /// # Errors
    ///
    /// [`SourceError::UnexpectedToken`] when no value is present, or any
    /// error from parsing a component.
    pub fn parse_value(scanner: &mut Scanner, list_delimiters: &[&str]) -> Result<Self, SourceError> {
        let line_no = scanner.current_line();
        let mut stack: Vec<StackEntry> = Vec::new();
        let _ = scanner.consume_whitespace()?;

        while !scanner.is_end()
            && !["}", ";", "!", ")", "\\"]
                .iter()
                .any(|stop| scanner.comes(stop, false))
        {
            if !stack.is_empty() {
                match list_delimiters.iter().find(|d| scanner.comes(d, false)) {
                    Some(delimiter) => {
                        stack.push(StackEntry::Delimiter(scanner.consume(delimiter)?));
                        let _ = scanner.consume_whitespace()?;
                    }
                    None => stack.push(StackEntry::Delimiter(" ".to_string())),
                }
            }
            stack.push(StackEntry::Value(Self::parse_primitive_value(scanner)?));
            let _ = scanner.consume_whitespace()?;
        }

        for delimiter in list_delimiters {
            if stack.len() == 1 {
                break;
            }
            while let Some(start) = stack.iter().position(|e| e.is_delimiter(delimiter)) {
                let mut length = 2;
                let mut next = start + 2;
                while stack.get(next).is_some_and(|e| e.is_delimiter(delimiter)) {
                    next += 2;
                    length += 1;
                }
                let first = start - 1;
                let components: Vec<Self> = stack
                    .drain(first..first + length * 2 - 1)
                    .filter_map(StackEntry::into_value)
                    .collect();
                stack.insert(
                    first,
                    StackEntry::Value(Self::List(ValueList {
                        components,
                        separator: (*delimiter).to_string(),
                        line_no,
                    })),
                );
            }
        }

        let found = format!("{}{}", scanner.peek(1, -1), scanner.peek(2, 0));
        if stack.len() != 1 {
            return Err(SourceError::unexpected_token(
                &format!(" {} ", scanner.peek(1, 0)),
                &found,
                MatchType::Literal,
                scanner.current_line(),
            ));
        }
        match stack.pop().and_then(StackEntry::into_value) {
            Some(value) => Ok(value),
            None => Err(SourceError::unexpected_token(
                "value",
                &found,
                MatchType::Custom,
                scanner.current_line(),
            )),
        }
    }

    /// Parse a single component value. Trailing whitespace is consumed.
    ///
    /// # Errors
    ///
    /// Whatever the component's own parser reports.
    pub fn parse_primitive_value(scanner: &mut Scanner) -> Result<Self, SourceError> {
        let _ = scanner.consume_whitespace()?;
        let value = if starts_number(scanner) {
            Self::Size(Size::parse(scanner, false)?)
        } else if scanner.comes("#", false) || scanner.comes("rgb", true) || scanner.comes("hsl", true) {
            Color::parse(scanner)?
        } else if scanner.comes("url", true) {
            Self::Url(CssUrl::parse(scanner)?)
        } else if scanner.comes("calc", true)
            || scanner.comes("-webkit-calc", true)
            || scanner.comes("-moz-calc", true)
        {
            Self::Calc(CalcFunction::parse(scanner)?)
        } else if scanner.comes("'", false) || scanner.comes("\"", false) {
            Self::String(CssString::parse(scanner)?)
        } else if scanner.is_lenient() && scanner.comes("progid:", false) {
            parse_microsoft_filter(scanner)?
        } else if scanner.comes("[", false) {
            Self::LineName(LineName::parse(scanner)?)
        } else if scanner.comes("U+", false) {
            Self::Ident(parse_unicode_range(scanner)?)
        } else {
            Self::parse_identifier_or_function(scanner, false)?
        };
        let _ = scanner.consume_whitespace()?;
        Ok(value)
    }

    /// An identifier, or a function call when the identifier is followed by
    /// `(`.
    ///
    /// # Errors
    ///
    /// [`SourceError::UnexpectedToken`] when no identifier starts at the
    /// cursor or the argument list is malformed.
    pub fn parse_identifier_or_function(scanner: &mut Scanner, ignore_case: bool) -> Result<Self, SourceError> {
        let name = scanner.parse_identifier(ignore_case)?;
        if !scanner.comes("(", false) {
            return Ok(Self::Ident(name));
        }
        let line_no = scanner.current_line();
        let _ = scanner.consume("(")?;
        let arguments = Self::parse_value(scanner, &["=", " ", ","])?;
        let _ = scanner.consume(")")?;
        Ok(Self::Function(CssFunction::new(name, arguments, line_no)))
    }

    /// Direct children: list components and function arguments.
    #[must_use]
    pub fn components(&self) -> Vec<&Self> {
        match self {
            Self::List(list) => list.components.iter().collect(),
            Self::Function(function) => function.arguments.iter().collect(),
            Self::Calc(calc) => calc
                .components
                .iter()
                .filter_map(|c| match c {
                    CalcComponent::Operand(value) => Some(value),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Mutable counterpart of [`Self::components`] for lists and functions.
    pub fn components_mut(&mut self) -> Option<&mut Vec<Self>> {
        match self {
            Self::List(list) => Some(&mut list.components),
            Self::Function(function) => Some(&mut function.arguments),
            _ => None,
        }
    }

    /// Whether this value is a list or function with children.
    #[must_use]
    pub const fn is_list(&self) -> bool {
        matches!(self, Self::List(_))
    }

    /// Whether this value is a function-like value (`name(…)`).
    #[must_use]
    pub const fn is_function(&self) -> bool {
        matches!(self, Self::Function(_) | Self::Calc(_))
    }
}

impl Renderable for Value {
    fn render(&self, format: &OutputFormat) -> Result<String, OutputError> {
        match self {
            Self::String(string) => string.render(format),
            Self::Url(url) => url.render(format),
            Self::Size(size) => size.render(format),
            Self::Color(color) => color.render(format),
            Self::Ident(ident) => Ok(ident.clone()),
            Self::List(list) => list.render(format),
            Self::Function(function) => function.render(format),
            Self::Calc(calc) => calc.render(format),
            Self::LineName(names) => names.render(format),
        }
    }
}

/// "A number… optionally preceded by a sign."
fn starts_number(scanner: &Scanner) -> bool {
    let is_digit = |s: String| s.chars().next().is_some_and(|c| c.is_ascii_digit());
    if is_digit(scanner.peek(1, 0)) {
        return true;
    }
    if scanner.comes("-.", false) {
        return is_digit(scanner.peek(1, 2));
    }
    (scanner.comes("-", false) || scanner.comes("+", false) || scanner.comes(".", false))
        && is_digit(scanner.peek(1, 1))
}

/// `progid:DXImageTransform.Microsoft.gradient(startColorstr=…)`
fn parse_microsoft_filter(scanner: &mut Scanner) -> Result<Value, SourceError> {
    let line_no = scanner.current_line();
    let name = scanner.consume_until_char(&['('], Until::new().consume_end())?;
    let arguments = Value::parse_value(scanner, &[",", "="])?;
    if scanner.comes(")", false) {
        let _ = scanner.consume(")")?;
    }
    Ok(Value::Function(CssFunction::new(name, arguments, line_no)))
}

/// [§ 4.5 `unicode-range`](https://www.w3.org/TR/css-fonts-4/#unicode-range-desc)
fn parse_unicode_range(scanner: &mut Scanner) -> Result<String, SourceError> {
    let mut range = scanner.consume("U+")?;
    let mut max_length = 6;
    let mut consumed = 0;
    loop {
        if scanner.comes("-", false) {
            max_length = 13;
        }
        range.push_str(&scanner.consume_count(1)?);
        consumed += 1;
        let continues = scanner
            .peek_char()
            .is_some_and(|c| c.is_ascii_hexdigit() || c == '?' || c == '-');
        if consumed >= max_length || !continues {
            break;
        }
    }
    Ok(range)
}

/// [§ 4.3 Quoted Strings](https://www.w3.org/TR/css-values-4/#strings)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CssString {
    /// Unescaped contents.
    pub value: String,
    /// Source line.
    pub line_no: usize,
}

impl CssString {
    /// Create a string value.
    pub fn new(value: impl Into<String>, line_no: usize) -> Self {
        Self {
            value: value.into(),
            line_no,
        }
    }

    /// Parse a quoted string, or an unquoted run of characters ending at
    /// whitespace or a bracket.
    ///
    /// # Errors
    ///
    /// [`SourceError::Source`] for a quoted string that is never closed,
    /// [`SourceError::UnexpectedEof`] when input ends before an unquoted
    /// string is terminated.
    pub fn parse(scanner: &mut Scanner) -> Result<Self, SourceError> {
        let line_no = scanner.current_line();
        let quote = match scanner.peek_char() {
            Some(q @ ('\'' | '"')) => Some(q),
            _ => None,
        };
        let mut value = String::new();

        let Some(quote) = quote else {
            loop {
                match scanner.peek_char() {
                    None => {
                        return Err(SourceError::unexpected_eof(
                            "end of string",
                            "",
                            MatchType::Custom,
                            scanner.current_line(),
                        ));
                    }
                    Some(c) if c.is_whitespace() || "{}()<>[]".contains(c) => break,
                    Some(_) => match scanner.parse_character(false)? {
                        Some(c) => value.push_str(&c),
                        None => break,
                    },
                }
            }
            return Ok(Self { value, line_no });
        };

        let quote = quote.to_string();
        let _ = scanner.consume(&quote)?;
        while !scanner.comes(&quote, false) {
            let Some(c) = scanner.parse_character(false)? else {
                return Err(SourceError::source(
                    format!("Non-well-formed quoted string {}", scanner.peek(3, 0)),
                    scanner.current_line(),
                ));
            };
            value.push_str(&c);
        }
        let _ = scanner.consume(&quote)?;
        Ok(Self { value, line_no })
    }
}

impl Renderable for CssString {
    fn render(&self, format: &OutputFormat) -> Result<String, OutputError> {
        let mut escaped = String::with_capacity(self.value.len() + 2);
        escaped.push(format.string_quoting_type);
        for c in self.value.chars() {
            match c {
                '\'' | '"' | '\\' => {
                    escaped.push('\\');
                    escaped.push(c);
                }
                // The trailing space ends the escape so a following hex digit
                // or space is not taken into it.
                '\n' | '\r' | '\u{c}' => {
                    let _ = write!(escaped, "\\{:X} ", u32::from(c));
                }
                // NUL stays raw: a `\0` escape reads back as U+FFFD.
                _ => escaped.push(c),
            }
        }
        escaped.push(format.string_quoting_type);
        Ok(escaped)
    }
}

/// [§ 4.5 Resource Locators](https://www.w3.org/TR/css-values-4/#urls)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CssUrl {
    /// The location, as a string value.
    pub url: CssString,
    /// Source line.
    pub line_no: usize,
}

impl CssUrl {
    /// Create a url value.
    pub fn new(url: impl Into<String>, line_no: usize) -> Self {
        Self {
            url: CssString::new(url, line_no),
            line_no,
        }
    }

    /// Parse `url(…)` or a bare string, as accepted by `@import`.
    ///
    /// # Errors
    ///
    /// [`SourceError::UnexpectedToken`] when the parentheses do not match.
    pub fn parse(scanner: &mut Scanner) -> Result<Self, SourceError> {
        let line_no = scanner.current_line();
        let functional = scanner.comes("url", true);
        if functional {
            let _ = scanner.consume_count(3)?;
            let _ = scanner.consume_whitespace()?;
            let _ = scanner.consume("(")?;
        }
        let _ = scanner.consume_whitespace()?;
        let url = CssString::parse(scanner)?;
        if functional {
            let _ = scanner.consume_whitespace()?;
            let _ = scanner.consume(")")?;
        }
        Ok(Self { url, line_no })
    }
}

impl Renderable for CssUrl {
    fn render(&self, format: &OutputFormat) -> Result<String, OutputError> {
        Ok(format!("url({})", self.url.render(format)?))
    }
}

/// [§ 5 Numeric Data Types](https://www.w3.org/TR/css-values-4/#numeric-types)
#[derive(Debug, Clone, PartialEq)]
pub struct Size {
    /// The number.
    pub size: f64,
    /// Unit as written, or `None` for a plain number.
    pub unit: Option<String>,
    /// Whether this size appears as a component of a color function.
    pub is_color_component: bool,
    /// Source line.
    pub line_no: usize,
}

impl Size {
    /// Create a size.
    #[must_use]
    pub fn new(size: f64, unit: Option<&str>, line_no: usize) -> Self {
        Self {
            size,
            unit: unit.map(str::to_string),
            is_color_component: false,
            line_no,
        }
    }

    /// Parse a signed number and its unit.
    ///
    /// # Errors
    ///
    /// [`SourceError::UnexpectedEof`] if the input ends while a unit is
    /// being read.
    pub fn parse(scanner: &mut Scanner, is_color_component: bool) -> Result<Self, SourceError> {
        let line_no = scanner.current_line();
        let mut number = String::new();
        if scanner.comes("-", false) {
            number.push_str(&scanner.consume("-")?);
        } else if scanner.comes("+", false) {
            let _ = scanner.consume("+")?;
        }
        while scanner
            .peek_char()
            .is_some_and(|c| c.is_ascii_digit() || c == '.')
        {
            number.push_str(&scanner.consume_count(1)?);
        }

        let mut unit = None;
        for length in (1..=5).rev() {
            let candidate = scanner.peek(length, 0).to_lowercase();
            if candidate.chars().count() == length && SIZE_UNITS.contains(&candidate.as_str()) {
                unit = Some(scanner.consume_count(length)?);
                break;
            }
        }

        Ok(Self {
            size: number.parse().unwrap_or(0.0),
            unit,
            is_color_component,
            line_no,
        })
    }

    /// Whether this is a length or percentage rather than an angle or time.
    #[must_use]
    pub fn is_size(&self) -> bool {
        self.unit
            .as_deref()
            .is_none_or(|unit| !NON_SIZE_UNITS.contains(&unit.to_lowercase().as_str()))
    }
}

/// Shortest rendering of a number: no trailing `.0`, no leading zero.
fn format_number(number: f64) -> String {
    let text = format!("{number}");
    if let Some(rest) = text.strip_prefix("0.") {
        format!(".{rest}")
    } else if let Some(rest) = text.strip_prefix("-0.") {
        format!("-.{rest}")
    } else {
        text
    }
}

impl Renderable for Size {
    fn render(&self, _format: &OutputFormat) -> Result<String, OutputError> {
        Ok(format!(
            "{}{}",
            format_number(self.size),
            self.unit.as_deref().unwrap_or_default()
        ))
    }
}

/// [§ 4 Representing Colors](https://www.w3.org/TR/css-color-4/#color-syntax)
///
/// Components are keyed by the letter of the color function they belong to,
/// so `rgba(…)` has components `r`, `g`, `b` and `a`.
#[derive(Debug, Clone, PartialEq)]
pub struct Color {
    /// `(channel, value)` pairs in order.
    pub components: Vec<(char, Value)>,
    /// Source line.
    pub line_no: usize,
}

impl Color {
    /// The color function name, e.g. `rgb` or `hsla`.
    #[must_use]
    pub fn mode(&self) -> String {
        self.components.iter().map(|(channel, _)| *channel).collect()
    }

    /// Parse `#hex` or a color function. A function containing `var()` is
    /// returned as a plain [`CssFunction`].
    ///
    /// # Errors
    ///
    /// [`SourceError::UnexpectedToken`] for invalid hex digits or a
    /// malformed argument list.
    pub fn parse(scanner: &mut Scanner) -> Result<Value, SourceError> {
        let line_no = scanner.current_line();

        if scanner.comes("#", false) {
            let _ = scanner.consume("#")?;
            let hex = scanner.parse_identifier(false)?;
            return Self::from_hex(&hex, line_no).map(Value::Color).ok_or_else(|| {
                SourceError::unexpected_token(
                    "Invalid hex color",
                    &format!("#{hex}"),
                    MatchType::Custom,
                    line_no,
                )
            });
        }

        let mode = scanner.parse_identifier(true)?;
        let _ = scanner.consume_whitespace()?;
        let _ = scanner.consume("(")?;

        let channels: Vec<char> = mode.chars().collect();
        let mut components = Vec::with_capacity(channels.len());
        let mut contains_var = false;
        for (index, &channel) in channels.iter().enumerate() {
            let _ = scanner.consume_whitespace()?;
            let value = if scanner.comes("var", true) {
                contains_var = true;
                Value::parse_identifier_or_function(scanner, false)?
            } else {
                Value::Size(Size::parse(scanner, true)?)
            };
            components.push((channel, value));
            if contains_var && scanner.comes(")", false) {
                break;
            }
            let _ = scanner.consume_whitespace()?;
            if index + 1 < channels.len() {
                let _ = scanner.consume(",")?;
            }
        }
        let _ = scanner.consume_whitespace()?;
        let _ = scanner.consume(")")?;

        if contains_var {
            return Ok(Value::Function(CssFunction {
                name: mode,
                arguments: components.into_iter().map(|(_, value)| value).collect(),
                separator: ",".to_string(),
                line_no,
            }));
        }
        Ok(Value::Color(Self { components, line_no }))
    }

    /// `#rgb`, `#rgba`, `#rrggbb` or `#rrggbbaa`.
    fn from_hex(hex: &str, line_no: usize) -> Option<Self> {
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let expanded: String = match hex.len() {
            3 | 4 => hex.chars().flat_map(|c| [c, c]).collect(),
            6 | 8 => hex.to_string(),
            _ => return None,
        };
        let channel = |index: usize| -> Option<f64> {
            let pair = expanded.get(index * 2..index * 2 + 2)?;
            u8::from_str_radix(pair, 16).ok().map(f64::from)
        };
        let mut components = vec![
            ('r', Value::Size(Size::color_component(channel(0)?, line_no))),
            ('g', Value::Size(Size::color_component(channel(1)?, line_no))),
            ('b', Value::Size(Size::color_component(channel(2)?, line_no))),
        ];
        if expanded.len() == 8 {
            let alpha = (channel(3)? / 255.0 * 100.0).round() / 100.0;
            components.push(('a', Value::Size(Size::color_component(alpha, line_no))));
        }
        Some(Self { components, line_no })
    }

    /// `#rrggbb` when every channel is a plain number, shortened to `#rgb`
    /// when each pair repeats.
    fn hash_notation(&self) -> Option<String> {
        let mut hex = String::with_capacity(6);
        for (_, value) in &self.components {
            let Value::Size(size) = value else {
                return None;
            };
            if size.unit.is_some() {
                return None;
            }
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let byte = size.size.clamp(0.0, 255.0) as u8;
            hex.push_str(&format!("{byte:02x}"));
        }
        let bytes = hex.as_bytes();
        if bytes[0] == bytes[1] && bytes[2] == bytes[3] && bytes[4] == bytes[5] {
            hex = [bytes[0], bytes[2], bytes[4]].iter().map(|&b| char::from(b)).collect();
        }
        Some(format!("#{hex}"))
    }
}

impl Size {
    fn color_component(size: f64, line_no: usize) -> Self {
        Self {
            size,
            unit: None,
            is_color_component: true,
            line_no,
        }
    }
}

impl Renderable for Color {
    fn render(&self, format: &OutputFormat) -> Result<String, OutputError> {
        let mode = self.mode();
        if format.rgb_hash_notation && mode == "rgb" {
            if let Some(hash) = self.hash_notation() {
                return Ok(hash);
            }
        }
        let arguments = self
            .components
            .iter()
            .map(|(_, value)| value.render(format))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(format!(
            "{mode}({})",
            arguments.join(&format.list_argument_separator(","))
        ))
    }
}

/// Values joined by one separator, e.g. `1px solid red` or `a, b`.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueList {
    /// The joined values.
    pub components: Vec<Value>,
    /// The separator between components.
    pub separator: String,
    /// Source line.
    pub line_no: usize,
}

impl ValueList {
    /// Create a list.
    pub fn new(components: Vec<Value>, separator: impl Into<String>, line_no: usize) -> Self {
        Self {
            components,
            separator: separator.into(),
            line_no,
        }
    }
}

impl Renderable for ValueList {
    fn render(&self, format: &OutputFormat) -> Result<String, OutputError> {
        let rendered = self
            .components
            .iter()
            .map(|value| value.render(format))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rendered.join(&format.list_argument_separator(&self.separator)))
    }
}

/// [§ 2.6 Functional Notations](https://www.w3.org/TR/css-values-4/#functional-notations)
#[derive(Debug, Clone, PartialEq)]
pub struct CssFunction {
    /// Function name as written.
    pub name: String,
    /// Arguments.
    pub arguments: Vec<Value>,
    /// Separator between arguments.
    pub separator: String,
    /// Source line.
    pub line_no: usize,
}

impl CssFunction {
    /// Create a function. A list argument is spread into the argument
    /// vector and its separator kept; any other value becomes the single
    /// argument.
    pub fn new(name: impl Into<String>, arguments: Value, line_no: usize) -> Self {
        let (arguments, separator) = match arguments {
            Value::List(list) => (list.components, list.separator),
            other => (vec![other], ",".to_string()),
        };
        Self {
            name: name.into(),
            arguments,
            separator,
            line_no,
        }
    }
}

impl Renderable for CssFunction {
    fn render(&self, format: &OutputFormat) -> Result<String, OutputError> {
        let arguments = self
            .arguments
            .iter()
            .map(|value| value.render(format))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(format!(
            "{}({})",
            self.name,
            arguments.join(&format.list_argument_separator(&self.separator))
        ))
    }
}

/// One token of a `calc()` expression.
#[derive(Debug, Clone, PartialEq)]
pub enum CalcComponent {
    /// A value.
    Operand(Value),
    /// `+`, `-`, `*` or `/`.
    Operator(char),
    /// `(`
    OpenParen,
    /// `)`
    CloseParen,
}

/// [§ 10.1 Basic Arithmetic](https://www.w3.org/TR/css-values-4/#calc-func)
#[derive(Debug, Clone, PartialEq)]
pub struct CalcFunction {
    /// `calc`, `-webkit-calc` or `-moz-calc`.
    pub name: String,
    /// Operands, operators and parentheses in source order.
    pub components: Vec<CalcComponent>,
    /// Source line.
    pub line_no: usize,
}

impl CalcFunction {
    /// Parse `calc(…)`.
    ///
    /// "White space is required on both sides of the + and - operators."
    ///
    /// # Errors
    ///
    /// [`SourceError::UnexpectedToken`] when an operator is missing,
    /// unknown or not surrounded by whitespace, and when the expression or
    /// a parenthesized group is empty or ends with an operator.
    pub fn parse(scanner: &mut Scanner) -> Result<Self, SourceError> {
        let line_no = scanner.current_line();
        let name = scanner
            .consume_until_char(&['('], Until::new().consume_end())?
            .trim()
            .to_string();
        let mut components = Vec::new();
        let mut nesting = 0usize;
        let mut expects_operator = false;

        while !scanner.comes(")", false) || nesting > 0 {
            let _ = scanner.consume_whitespace()?;
            if scanner.comes("(", false) {
                if expects_operator {
                    return Err(missing_operator_before(scanner, "("));
                }
                nesting += 1;
                let _ = scanner.consume("(")?;
                components.push(CalcComponent::OpenParen);
                continue;
            }
            if scanner.comes(")", false) {
                if !expects_operator {
                    return Err(missing_operand_before_close(scanner));
                }
                if nesting == 0 {
                    break;
                }
                nesting -= 1;
                let _ = scanner.consume(")")?;
                components.push(CalcComponent::CloseParen);
                continue;
            }

            if expects_operator {
                let operator = scanner.peek_char().filter(|c| "+-*/".contains(*c));
                let Some(operator) = operator else {
                    return Err(missing_operator_before(scanner, &scanner.peek(1, 0)));
                };
                if matches!(operator, '+' | '-') {
                    let spaced_before = scanner.peek(1, -1) == " ";
                    let spaced_after = scanner.comes(&format!("{operator} "), false);
                    if !spaced_before || !spaced_after {
                        return Err(SourceError::unexpected_token(
                            &format!(" {operator} "),
                            &format!("{}{}", scanner.peek(1, -1), scanner.peek(2, 0)),
                            MatchType::Literal,
                            scanner.current_line(),
                        ));
                    }
                }
                let _ = scanner.consume_count(1)?;
                components.push(CalcComponent::Operator(operator));
                expects_operator = false;
            } else {
                components.push(CalcComponent::Operand(Value::parse_primitive_value(scanner)?));
                expects_operator = true;
            }
            let _ = scanner.consume_whitespace()?;
        }
        // An empty expression or a trailing operator never reaches the check
        // inside the loop.
        if !expects_operator {
            return Err(missing_operand_before_close(scanner));
        }
        let _ = scanner.consume(")")?;

        Ok(Self {
            name,
            components,
            line_no,
        })
    }
}

/// `)` where an operand is still owed: `calc()`, `calc(1px + )`, `calc(())`.
fn missing_operand_before_close(scanner: &Scanner) -> SourceError {
    SourceError::unexpected_token(
        "Next token was expected to be an operand. Instead",
        "\u{201c})\u{201d} was found.",
        MatchType::Custom,
        scanner.current_line(),
    )
}

/// An operand or `(` directly following another operand.
fn missing_operator_before(scanner: &Scanner, found: &str) -> SourceError {
    SourceError::unexpected_token(
        "Next token was expected to be an operand of type +, -, *, /. Instead",
        &format!("\u{201c}{found}\u{201d} was found."),
        MatchType::Custom,
        scanner.current_line(),
    )
}

impl Renderable for CalcFunction {
    fn render(&self, format: &OutputFormat) -> Result<String, OutputError> {
        let parts = self
            .components
            .iter()
            .map(|component| match component {
                CalcComponent::Operand(value) => value.render(format),
                CalcComponent::Operator(operator) => Ok(operator.to_string()),
                CalcComponent::OpenParen => Ok("(".to_string()),
                CalcComponent::CloseParen => Ok(")".to_string()),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(format!("{}({})", self.name, parts.join(" ")))
    }
}

/// [§ 7.1 Named Grid Lines](https://www.w3.org/TR/css-grid-2/#named-lines)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineName {
    /// The names between the brackets.
    pub names: Vec<String>,
    /// Source line.
    pub line_no: usize,
}

impl LineName {
    /// Parse `[name …]`.
    ///
    /// # Errors
    ///
    /// [`SourceError::UnexpectedToken`] when a name is malformed. Lenient
    /// parsing keeps the names read so far if the closing `]` follows.
    pub fn parse(scanner: &mut Scanner) -> Result<Self, SourceError> {
        let line_no = scanner.current_line();
        let _ = scanner.consume("[")?;
        let _ = scanner.consume_whitespace()?;
        let mut names = Vec::new();
        loop {
            match scanner.parse_identifier(false) {
                Ok(name) => names.push(name),
                Err(error) if scanner.is_lenient() && error.is_unexpected_token() => {
                    if !scanner.comes("]", false) {
                        return Err(error);
                    }
                }
                Err(error) => return Err(error),
            }
            let _ = scanner.consume_whitespace()?;
            if scanner.comes("]", false) {
                break;
            }
        }
        let _ = scanner.consume("]")?;
        Ok(Self { names, line_no })
    }
}

impl Renderable for LineName {
    fn render(&self, _format: &OutputFormat) -> Result<String, OutputError> {
        Ok(format!("[{}]", self.names.join(" ")))
    }
}
