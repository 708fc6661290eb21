//! Rendering options.
//!
//! Every renderable node takes an [`OutputFormat`]. Spacing strings that
//! contain a newline are followed by the indentation of the current level, so
//! nested lists indent one step deeper than their container.

use std::collections::BTreeMap;

use crate::error::OutputError;

/// Formatting options for rendering a parsed document back to CSS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFormat {
    /// Quote character used for strings.
    pub string_quoting_type: char,
    /// Render `rgb(…)` colors as `#rrggbb` (or `#rgb` when possible).
    pub rgb_hash_notation: bool,
    /// Keep the semicolon after the last rule of a block.
    pub semicolon_after_last_rule: bool,

    /// After the `:` of a rule.
    pub space_after_rule_name: String,
    /// Before the first rule of a block.
    pub space_before_rules: String,
    /// After the last rule of a block.
    pub space_after_rules: String,
    /// Between two rules.
    pub space_between_rules: String,

    /// Before the first item of a list.
    pub space_before_blocks: String,
    /// After the last item of a list.
    pub space_after_blocks: String,
    /// Between two list items.
    pub space_between_blocks: String,

    /// Before each selector separator `,`.
    pub space_before_selector_separator: String,
    /// After each selector separator `,`.
    pub space_after_selector_separator: String,

    /// Before a value list separator, unless overridden per separator.
    pub space_before_list_argument_separator: String,
    /// Per-separator overrides of `space_before_list_argument_separator`.
    pub space_before_list_argument_separators: BTreeMap<String, String>,
    /// After a value list separator, unless overridden per separator.
    pub space_after_list_argument_separator: String,
    /// Per-separator overrides of `space_after_list_argument_separator`.
    pub space_after_list_argument_separators: BTreeMap<String, String>,

    /// Before the `{` of a block.
    pub space_before_opening_brace: String,

    /// Indentation step.
    pub indentation: String,
    /// Omit children that fail to render instead of failing the parent.
    pub ignore_exceptions: bool,

    level: usize,
}

impl OutputFormat {
    /// The default format: one item per line, compact rules.
    #[must_use]
    pub fn create() -> Self {
        Self {
            string_quoting_type: '"',
            rgb_hash_notation: true,
            semicolon_after_last_rule: true,
            space_after_rule_name: " ".to_string(),
            space_before_rules: String::new(),
            space_after_rules: String::new(),
            space_between_rules: String::new(),
            space_before_blocks: String::new(),
            space_after_blocks: String::new(),
            space_between_blocks: "\n".to_string(),
            space_before_selector_separator: String::new(),
            space_after_selector_separator: " ".to_string(),
            space_before_list_argument_separator: String::new(),
            space_before_list_argument_separators: BTreeMap::new(),
            space_after_list_argument_separator: String::new(),
            space_after_list_argument_separators: BTreeMap::new(),
            space_before_opening_brace: " ".to_string(),
            indentation: "\t".to_string(),
            ignore_exceptions: true,
            level: 0,
        }
    }

    /// Everything on one line with no optional whitespace.
    #[must_use]
    pub fn create_compact() -> Self {
        Self {
            space_after_rule_name: String::new(),
            space_between_blocks: String::new(),
            space_before_opening_brace: String::new(),
            space_after_selector_separator: String::new(),
            ..Self::create()
        }
    }

    /// One rule per line, blank line between items, space after commas.
    #[must_use]
    pub fn create_pretty() -> Self {
        let mut format = Self {
            space_before_rules: "\n".to_string(),
            space_after_rules: "\n".to_string(),
            space_between_rules: "\n".to_string(),
            space_before_blocks: "\n".to_string(),
            space_after_blocks: "\n".to_string(),
            space_between_blocks: "\n\n".to_string(),
            ..Self::create()
        };
        let _ = format
            .space_after_list_argument_separators
            .insert(",".to_string(), " ".to_string());
        format
    }

    /// The same format one indentation level deeper.
    #[must_use]
    pub fn next_level(&self) -> Self {
        Self {
            level: self.level + 1,
            ..self.clone()
        }
    }

    /// Current indentation level.
    #[must_use]
    pub const fn level(&self) -> usize {
        self.level
    }

    fn indent(&self) -> String {
        self.indentation.repeat(self.level)
    }

    fn prepare_space(&self, space: &str) -> String {
        space.replace('\n', &format!("\n{}", self.indent()))
    }

    /// Space after the `:` of a rule.
    #[must_use]
    pub fn space_after_rule_name(&self) -> String {
        self.prepare_space(&self.space_after_rule_name)
    }

    /// Space before the first rule of a block.
    #[must_use]
    pub fn space_before_rules(&self) -> String {
        self.prepare_space(&self.space_before_rules)
    }

    /// Space after the last rule of a block.
    #[must_use]
    pub fn space_after_rules(&self) -> String {
        self.prepare_space(&self.space_after_rules)
    }

    /// Space between rules.
    #[must_use]
    pub fn space_between_rules(&self) -> String {
        self.prepare_space(&self.space_between_rules)
    }

    /// Space before the first list item.
    #[must_use]
    pub fn space_before_blocks(&self) -> String {
        self.prepare_space(&self.space_before_blocks)
    }

    /// Space after the last list item.
    #[must_use]
    pub fn space_after_blocks(&self) -> String {
        self.prepare_space(&self.space_after_blocks)
    }

    /// Space between list items.
    #[must_use]
    pub fn space_between_blocks(&self) -> String {
        self.prepare_space(&self.space_between_blocks)
    }

    /// Full selector separator including surrounding space.
    #[must_use]
    pub fn selector_separator(&self) -> String {
        format!(
            "{},{}",
            self.prepare_space(&self.space_before_selector_separator),
            self.prepare_space(&self.space_after_selector_separator)
        )
    }

    /// Full value list separator including surrounding space.
    #[must_use]
    pub fn list_argument_separator(&self, separator: &str) -> String {
        let before = self
            .space_before_list_argument_separators
            .get(separator)
            .unwrap_or(&self.space_before_list_argument_separator);
        let after = self
            .space_after_list_argument_separators
            .get(separator)
            .unwrap_or(&self.space_after_list_argument_separator);
        format!(
            "{}{separator}{}",
            self.prepare_space(before),
            self.prepare_space(after)
        )
    }

    /// Space before `{`.
    #[must_use]
    pub fn space_before_opening_brace(&self) -> String {
        self.prepare_space(&self.space_before_opening_brace)
    }

    /// Run one child's render. With `ignore_exceptions` set a failure yields
    /// `Ok(None)` and the child is left out; otherwise it propagates.
    ///
    /// # Errors
    ///
    /// The child's [`OutputError`] when `ignore_exceptions` is unset.
    pub fn safely<F>(&self, render: F) -> Result<Option<String>, OutputError>
    where
        F: FnOnce() -> Result<String, OutputError>,
    {
        match render() {
            Ok(rendered) => Ok(Some(rendered)),
            Err(error) if self.ignore_exceptions => {
                tracing::debug!(%error, "omitting unrenderable CSS node");
                Ok(None)
            }
            Err(error) => Err(error),
        }
    }

    /// Drop the final `;` of a rendered rule block unless
    /// `semicolon_after_last_rule` is set.
    #[must_use]
    pub fn remove_last_semicolon(&self, rendered: String) -> String {
        if self.semicolon_after_last_rule {
            return rendered;
        }
        match rendered.rfind(';') {
            Some(index) => {
                let mut out = rendered;
                let _ = out.remove(index);
                out
            }
            None => rendered,
        }
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::create()
    }
}

/// A node of the CSS document model that can be rendered back to text.
pub trait Renderable {
    /// Render with `format`.
    ///
    /// # Errors
    ///
    /// [`OutputError`] when the node cannot be represented as valid CSS, for
    /// example a declaration block whose selectors were all removed.
    fn render(&self, format: &OutputFormat) -> Result<String, OutputError>;

    /// Render with [`OutputFormat::create`], dropping anything unrenderable.
    fn to_css(&self) -> String {
        self.render(&OutputFormat::create()).unwrap_or_default()
    }
}
