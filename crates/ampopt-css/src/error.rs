//! Parse and render errors.

use thiserror::Error;

/// How an expected token was being matched when parsing failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchType {
    /// A literal string was expected.
    Literal,
    /// A search for one of several stop strings ran off the end.
    Search,
    /// A fixed number of characters was expected.
    Count,
    /// An identifier was expected.
    Identifier,
    /// A pattern was expected.
    Expression,
    /// A free-form message.
    Custom,
}

/// Fatal CSS parse failure.
///
/// `UnexpectedToken` and `UnexpectedEof` are the recoverable kinds: lenient
/// parsing discards the offending list item or rule and carries on. `Source`
/// always aborts the parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    /// Structural failure such as an unterminated nested list.
    #[error("{message} [line no: {line}]")]
    Source {
        /// Human-readable description.
        message: String,
        /// Line the scanner was on.
        line: usize,
    },
    /// The input did not contain the expected token.
    #[error("{message} [line no: {line}]")]
    UnexpectedToken {
        /// Human-readable description.
        message: String,
        /// Line the scanner was on.
        line: usize,
    },
    /// The input ended while a token was expected.
    #[error("{message} [line no: {line}]")]
    UnexpectedEof {
        /// Human-readable description.
        message: String,
        /// Line the scanner was on.
        line: usize,
    },
}

impl SourceError {
    /// A structural failure.
    pub fn source(message: impl Into<String>, line: usize) -> Self {
        Self::Source {
            message: message.into(),
            line,
        }
    }

    /// An unexpected token, described according to `match_type`.
    #[must_use]
    pub fn unexpected_token(expected: &str, found: &str, match_type: MatchType, line: usize) -> Self {
        Self::UnexpectedToken {
            message: token_message(expected, found, match_type),
            line,
        }
    }

    /// An unexpected end of input.
    #[must_use]
    pub fn unexpected_eof(expected: &str, found: &str, match_type: MatchType, line: usize) -> Self {
        Self::UnexpectedEof {
            message: token_message(expected, found, match_type),
            line,
        }
    }

    /// Whether lenient parsing may recover from this error.
    #[must_use]
    pub const fn is_unexpected_token(&self) -> bool {
        matches!(self, Self::UnexpectedToken { .. } | Self::UnexpectedEof { .. })
    }

    /// The line the error was raised on.
    #[must_use]
    pub const fn line(&self) -> usize {
        match self {
            Self::Source { line, .. }
            | Self::UnexpectedToken { line, .. }
            | Self::UnexpectedEof { line, .. } => *line,
        }
    }
}

fn token_message(expected: &str, found: &str, match_type: MatchType) -> String {
    match match_type {
        MatchType::Search => {
            format!("Search for \u{201c}{expected}\u{201d} returned no results. Context: \u{201c}{found}\u{201d}.")
        }
        MatchType::Count => {
            format!("Next token was expected to have {expected} chars. Context: \u{201c}{found}\u{201d}.")
        }
        MatchType::Identifier => format!("Identifier expected. Got \u{201c}{found}\u{201d}"),
        MatchType::Custom => format!("{expected} {found}").trim().to_string(),
        MatchType::Literal | MatchType::Expression => {
            format!("Token \u{201c}{expected}\u{201d} not found. Got \u{201c}{found}\u{201d}.")
        }
    }
}

/// A node could not be rendered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} [line no: {line}]")]
pub struct OutputError {
    /// Human-readable description.
    pub message: String,
    /// Source line of the node.
    pub line: usize,
}

impl OutputError {
    /// Create an output error.
    pub fn new(message: impl Into<String>, line: usize) -> Self {
        Self {
            message: message.into(),
            line,
        }
    }
}
