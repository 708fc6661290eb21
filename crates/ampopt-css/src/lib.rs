//! CSS scanner, parser and renderable document model for the AMP optimizer.
//!
//! # Scope
//!
//! This crate implements:
//! - **Scanner** ([§ 4 Tokenization](https://www.w3.org/TR/css-syntax-3/#tokenization))
//!   - Lookahead, literal and counted consumption
//!   - Comments, escapes and line continuations
//!
//! - **Parser** ([§ 5 Parsing](https://www.w3.org/TR/css-syntax-3/#parsing))
//!   - Style rules, `@media`-like block rules, `@font-face`-like rule sets
//!   - `@import`, `@charset`, `@namespace`, `@keyframes` (vendor tolerant)
//!   - Lenient recovery that discards malformed items
//!
//! - **Values** ([CSS Values Level 4](https://www.w3.org/TR/css-values-4/))
//!   - Sizes, colors, strings, urls, functions, `calc()`, grid line names
//!   - Delimiter-precedence value lists
//!
//! - **Rendering**
//!   - Compact, default and pretty output formats
//!   - Unrenderable nodes omitted or reported per [`OutputFormat::ignore_exceptions`]
//!
//! # Example
//!
//! ```
//! use ampopt_css::{Document, OutputFormat, Renderable};
//!
//! let document = Document::parse("a { color: red; }").unwrap_or_default();
//! let css = document.render(&OutputFormat::create_compact()).unwrap_or_default();
//! assert_eq!(css, "a{color:red;}");
//! ```

/// Parse and render errors.
pub mod error;
/// Rendering options.
pub mod format;
/// Rule lists and the document root per [§ 5.4.1](https://www.w3.org/TR/css-syntax-3/#consume-list-of-rules).
pub mod list;
/// Recursive-descent parser per [§ 5 Parsing](https://www.w3.org/TR/css-syntax-3/#parsing).
pub mod parser;
/// Declarations per [§ 5.4 Declarations](https://www.w3.org/TR/css-syntax-3/#declaration).
pub mod rule;
/// Declaration blocks and declaration at-rules.
pub mod rule_set;
/// Character scanner.
pub mod scanner;
/// Selectors and specificity per [Selectors Level 4](https://www.w3.org/TR/selectors-4/).
pub mod selector;
/// Parser settings.
pub mod settings;
/// Rule values per [CSS Values Level 4](https://www.w3.org/TR/css-values-4/).
pub mod value;

pub use error::{MatchType, OutputError, SourceError};
pub use format::{OutputFormat, Renderable};
pub use list::{AtRuleBlockList, Charset, CssList, Document, Import, KeyFrame, ListItem, Namespace};
pub use parser::Parser;
pub use rule::Rule;
pub use rule_set::{AtRuleSet, DeclarationBlock, RuleSet};
pub use scanner::{Comment, Scanner, Until};
pub use selector::{Selector, Specificity, SpecificityFilter};
pub use settings::Settings;
pub use value::{CalcComponent, CalcFunction, Color, CssFunction, CssString, CssUrl, LineName, Size, Value, ValueList};
