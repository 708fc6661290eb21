//! Character scanner shared by every parsing routine.
//!
//! The scanner owns the input and the cursor. Parsing routines only ever
//! look ahead with [`Scanner::peek`] / [`Scanner::comes`] and advance with the
//! `consume*` family, so all position state stays in one place.
//!
//! [§ 4.3.7 Consume an escaped code point](https://www.w3.org/TR/css-syntax-3/#consume-escaped-code-point)

use crate::error::{MatchType, SourceError};
use crate::settings::Settings;

/// [§ 4.3.2 Consume comments](https://www.w3.org/TR/css-syntax-3/#consume-comment)
///
/// A comment skipped while scanning, kept so it can be attached to the
/// following item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    /// Text between `/*` and `*/`.
    pub text: String,
    /// Line the comment starts on.
    pub line_no: usize,
}

/// How [`Scanner::consume_until`] treats the stop character and end of input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Until {
    include_end: bool,
    consume_end: bool,
    allow_eof: bool,
}

impl Until {
    /// Stop before the stop character and fail at end of input.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            include_end: false,
            consume_end: false,
            allow_eof: false,
        }
    }

    /// Append the stop character to the result (it is consumed).
    #[must_use]
    pub const fn include_end(mut self) -> Self {
        self.include_end = true;
        self
    }

    /// Consume the stop character without returning it.
    #[must_use]
    pub const fn consume_end(mut self) -> Self {
        self.consume_end = true;
        self
    }

    /// Treat end of input as a stop instead of an error.
    #[must_use]
    pub const fn or_eof(mut self) -> Self {
        self.allow_eof = true;
        self
    }
}

/// [§ 3 Tokenizing and Parsing CSS](https://www.w3.org/TR/css-syntax-3/#tokenizing-and-parsing)
///
/// Cursor over CSS source text with line tracking.
#[derive(Debug, Clone)]
pub struct Scanner {
    /// The input, as code points.
    text: Vec<char>,
    /// Index of the next unconsumed code point.
    position: usize,
    /// Current line, starting at the line given to [`Scanner::new`].
    line_no: usize,
    settings: Settings,
}

/// "A newline... U+000A LINE FEED"
fn count_newlines(chars: &[char]) -> usize {
    chars.iter().filter(|&&c| c == '\n').count()
}

/// Code points allowed unescaped in an identifier.
pub(crate) fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_' || u32::from(c) > 0xa1
}

impl Scanner {
    /// Create a scanner over `text`, numbering lines from `line_no`.
    #[must_use]
    pub fn new(text: &str, settings: Settings, line_no: usize) -> Self {
        Self {
            text: text.chars().collect(),
            position: 0,
            line_no,
            settings,
        }
    }

    /// The settings this scanner was created with.
    #[must_use]
    pub const fn settings(&self) -> Settings {
        self.settings
    }

    /// Whether lenient parsing is enabled.
    #[must_use]
    pub const fn is_lenient(&self) -> bool {
        self.settings.lenient_parsing
    }

    /// The line of the next unconsumed character.
    #[must_use]
    pub const fn current_line(&self) -> usize {
        self.line_no
    }

    /// Index of the next unconsumed character.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Whether all input has been consumed.
    #[must_use]
    pub fn is_end(&self) -> bool {
        self.position >= self.text.len()
    }

    /// Up to `length` characters starting `offset` characters from the
    /// cursor. Empty when the start lies outside the input.
    #[must_use]
    pub fn peek(&self, length: usize, offset: isize) -> String {
        let Some(start) = self.position.checked_add_signed(offset) else {
            return String::new();
        };
        if start >= self.text.len() {
            return String::new();
        }
        let end = (start + length).min(self.text.len());
        self.text[start..end].iter().collect()
    }

    /// The next character, if any.
    #[must_use]
    pub fn peek_char(&self) -> Option<char> {
        self.text.get(self.position).copied()
    }

    /// Whether the input at the cursor starts with `expected`.
    #[must_use]
    pub fn comes(&self, expected: &str, case_insensitive: bool) -> bool {
        let length = expected.chars().count();
        let peeked = self.peek(length, 0);
        if peeked.is_empty() {
            return false;
        }
        if case_insensitive {
            peeked.to_lowercase() == expected.to_lowercase()
        } else {
            peeked == expected
        }
    }

    /// Consume exactly `expected`.
    ///
    /// # Errors
    ///
    /// [`SourceError::UnexpectedToken`] when the input does not continue with
    /// `expected`.
    pub fn consume(&mut self, expected: &str) -> Result<String, SourceError> {
        let length = expected.chars().count();
        if self.peek(length, 0) != expected {
            return Err(SourceError::unexpected_token(
                expected,
                &self.peek(length.max(5), 0),
                MatchType::Literal,
                self.line_no,
            ));
        }
        self.advance(length);
        Ok(expected.to_string())
    }

    /// Consume the next `count` characters.
    ///
    /// # Errors
    ///
    /// [`SourceError::UnexpectedEof`] when fewer than `count` remain.
    pub fn consume_count(&mut self, count: usize) -> Result<String, SourceError> {
        if self.position + count > self.text.len() {
            return Err(SourceError::unexpected_eof(
                &count.to_string(),
                &self.peek(5, 0),
                MatchType::Count,
                self.line_no,
            ));
        }
        let start = self.position;
        self.advance(count);
        Ok(self.text[start..self.position].iter().collect())
    }

    fn advance(&mut self, count: usize) {
        let end = (self.position + count).min(self.text.len());
        self.line_no += count_newlines(&self.text[self.position..end]);
        self.position = end;
    }

    /// Step the cursor back by `count` characters.
    pub fn backtrack(&mut self, count: usize) {
        let start = self.position.saturating_sub(count);
        self.line_no -= count_newlines(&self.text[start..self.position]);
        self.position = start;
    }

    fn rewind_to(&mut self, position: usize, line_no: usize) {
        self.position = position;
        self.line_no = line_no;
    }

    /// [§ 4.3.2 Consume comments](https://www.w3.org/TR/css-syntax-3/#consume-comment)
    ///
    /// Skip whitespace and comments, returning the comments.
    ///
    /// In lenient mode an unterminated comment swallows the rest of the input.
    ///
    /// # Errors
    ///
    /// [`SourceError::UnexpectedEof`] for an unterminated comment in strict mode.
    pub fn consume_whitespace(&mut self) -> Result<Vec<Comment>, SourceError> {
        let mut comments = Vec::new();
        loop {
            while self.peek_char().is_some_and(char::is_whitespace) {
                self.advance(1);
            }
            let comment = match self.consume_comment() {
                Ok(comment) => comment,
                Err(_) if self.is_lenient() => {
                    self.advance(self.text.len() - self.position);
                    return Ok(comments);
                }
                Err(e) => return Err(e),
            };
            match comment {
                Some(comment) => comments.push(comment),
                None => return Ok(comments),
            }
        }
    }

    /// "If the next two input code point are U+002F SOLIDUS (/) followed by
    /// a U+002A ASTERISK (*), consume them and all following code points up to
    /// and including the first U+002A ASTERISK (*) followed by a U+002F SOLIDUS
    /// (/), or up to an EOF code point."
    fn consume_comment(&mut self) -> Result<Option<Comment>, SourceError> {
        if !self.comes("/*", false) {
            return Ok(None);
        }
        let line_no = self.line_no;
        self.advance(2);
        let mut text = String::new();
        loop {
            if self.comes("*/", false) {
                self.advance(2);
                return Ok(Some(Comment { text, line_no }));
            }
            text.push_str(&self.consume_count(1)?);
        }
    }

    /// Consume characters until one of `stops` is found. Comments inside the
    /// consumed range are removed from the result and pushed to `comments`.
    ///
    /// # Errors
    ///
    /// [`SourceError::UnexpectedEof`] when no stop character is found and
    /// `until` does not allow end of input. The cursor is left where it was.
    pub fn consume_until(
        &mut self,
        stops: &[char],
        until: Until,
        comments: &mut Vec<Comment>,
    ) -> Result<String, SourceError> {
        let (start, start_line) = (self.position, self.line_no);
        let mut out = String::new();
        while let Some(c) = self.peek_char() {
            self.advance(1);
            if stops.contains(&c) {
                if until.include_end {
                    out.push(c);
                } else if !until.consume_end {
                    self.backtrack(1);
                }
                return Ok(out);
            }
            out.push(c);
            if let Some(comment) = self.consume_comment()? {
                comments.push(comment);
            }
        }
        if until.allow_eof {
            return Ok(out);
        }
        self.rewind_to(start, start_line);
        let expected = stops
            .iter()
            .map(|c| format!("\"{c}\""))
            .collect::<Vec<_>>()
            .join(",");
        Err(SourceError::unexpected_eof(
            &format!("One of ({expected})"),
            &self.peek(5, 0),
            MatchType::Search,
            self.line_no,
        ))
    }

    /// [`Self::consume_until`] discarding comments.
    ///
    /// # Errors
    ///
    /// See [`Self::consume_until`].
    pub fn consume_until_char(&mut self, stops: &[char], until: Until) -> Result<String, SourceError> {
        let mut comments = Vec::new();
        self.consume_until(stops, until, &mut comments)
    }

    /// [§ 4.3.11 Consume an ident sequence](https://www.w3.org/TR/css-syntax-3/#consume-name)
    ///
    /// Escaped characters that are not identifier characters stay escaped in
    /// the result, so it can be rendered back verbatim.
    ///
    /// # Errors
    ///
    /// [`SourceError::UnexpectedToken`] when no identifier starts at the cursor.
    pub fn parse_identifier(&mut self, ignore_case: bool) -> Result<String, SourceError> {
        let Some(mut result) = self.parse_character(true)? else {
            return Err(SourceError::unexpected_token(
                "",
                &self.peek(5, 0),
                MatchType::Identifier,
                self.line_no,
            ));
        };
        while let Some(character) = self.parse_character(true)? {
            let mut chars = character.chars();
            match (chars.next(), chars.next()) {
                (None, _) => {}
                (Some(c), None) if is_identifier_char(c) => result.push(c),
                _ => {
                    result.push('\\');
                    result.push_str(&character);
                }
            }
        }
        if ignore_case {
            result = result.to_lowercase();
        }
        Ok(result)
    }

    /// [§ 4.3.7 Consume an escaped code point](https://www.w3.org/TR/css-syntax-3/#consume-escaped-code-point)
    ///
    /// Read one (possibly escaped) character. An escaped newline is a line
    /// continuation and yields an empty string. Returns `None` when no
    /// character is available: end of input, or a non-identifier character
    /// when `is_for_identifier` is set.
    ///
    /// # Errors
    ///
    /// [`SourceError::UnexpectedEof`] when the input ends right after a backslash.
    pub fn parse_character(&mut self, is_for_identifier: bool) -> Result<Option<String>, SourceError> {
        let Some(next) = self.peek_char() else {
            return Ok(None);
        };

        if next == '\\' {
            // Non-strings can contain \0 or \9, an old IE hack.
            if is_for_identifier && self.is_lenient() && (self.comes("\\0", false) || self.comes("\\9", false)) {
                return Ok(None);
            }
            let _ = self.consume("\\")?;

            if self.comes("\r\n", false) {
                self.advance(2);
                return Ok(Some(String::new()));
            }
            if self.comes("\n", false) || self.comes("\r", false) {
                self.advance(1);
                return Ok(Some(String::new()));
            }

            // "If the next input code point is not a hex digit, return the
            // current input code point."
            if !self.peek_char().is_some_and(|c| c.is_ascii_hexdigit()) {
                return self.consume_count(1).map(Some);
            }

            // "Consume as many hex digits as possible, but no more than 6."
            let mut hex = String::new();
            while hex.len() < 6 {
                match self.peek_char() {
                    Some(c) if c.is_ascii_hexdigit() => {
                        hex.push(c);
                        self.advance(1);
                    }
                    _ => break,
                }
            }
            // "If the next input code point is whitespace, consume it as well."
            if hex.len() < 6 && self.peek_char().is_some_and(char::is_whitespace) {
                let count = if self.comes("\r\n", false) { 2 } else { 1 };
                self.advance(count);
            }

            // "If this number is zero, or is for a surrogate, or is greater than
            // the maximum allowed code point, return U+FFFD REPLACEMENT CHARACTER."
            let character = u32::from_str_radix(&hex, 16)
                .ok()
                .filter(|&code| code != 0)
                .and_then(char::from_u32)
                .unwrap_or('\u{fffd}');
            return Ok(Some(character.to_string()));
        }

        if is_for_identifier && !is_identifier_char(next) {
            return Ok(None);
        }
        self.advance(1);
        Ok(Some(next.to_string()))
    }
}
