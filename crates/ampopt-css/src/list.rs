//! [§ 5.4.1 Consume a list of rules](https://www.w3.org/TR/css-syntax-3/#consume-list-of-rules)
//!
//! The rule list tree: a [`Document`] holds a root [`CssList`], whose items
//! are style rules and at-rules. `@media`-like at-rules and `@keyframes`
//! nest a further list.

use std::ops::{Deref, DerefMut};

use crate::error::{OutputError, SourceError};
use crate::format::{OutputFormat, Renderable};
use crate::parser::Parser;
use crate::rule_set::{split_selectors, AtRuleSet, DeclarationBlock, RuleSet};
use crate::scanner::Comment;
use crate::selector::{Selector, SpecificityFilter};
use crate::value::{CssString, CssUrl, Value};

/// One entry of a rule list.
#[derive(Debug, Clone, PartialEq)]
pub enum ListItem {
    /// A style rule.
    DeclarationBlock(DeclarationBlock),
    /// An at-rule holding a nested rule list, e.g. `@media`.
    AtRuleBlockList(AtRuleBlockList),
    /// An at-rule holding declarations, e.g. `@font-face`.
    AtRuleSet(AtRuleSet),
    /// `@keyframes` and its vendor-prefixed spellings.
    KeyFrame(KeyFrame),
    /// `@import`.
    Import(Import),
    /// `@charset`.
    Charset(Charset),
    /// `@namespace`.
    Namespace(Namespace),
}

impl ListItem {
    /// Comments attached to this item.
    #[must_use]
    pub fn comments(&self) -> &[Comment] {
        match self {
            Self::DeclarationBlock(item) => &item.comments,
            Self::AtRuleBlockList(item) => &item.comments,
            Self::AtRuleSet(item) => &item.comments,
            Self::KeyFrame(item) => &item.comments,
            Self::Import(item) => &item.comments,
            Self::Charset(item) => &item.comments,
            Self::Namespace(item) => &item.comments,
        }
    }

    /// Prepend `comments` to the item's comments.
    pub fn add_comments(&mut self, comments: Vec<Comment>) {
        let target = match self {
            Self::DeclarationBlock(item) => &mut item.comments,
            Self::AtRuleBlockList(item) => &mut item.comments,
            Self::AtRuleSet(item) => &mut item.comments,
            Self::KeyFrame(item) => &mut item.comments,
            Self::Import(item) => &mut item.comments,
            Self::Charset(item) => &mut item.comments,
            Self::Namespace(item) => &mut item.comments,
        };
        let _ = target.splice(0..0, comments);
    }

    /// The item as a style rule, if it is one.
    #[must_use]
    pub const fn as_declaration_block(&self) -> Option<&DeclarationBlock> {
        match self {
            Self::DeclarationBlock(block) => Some(block),
            _ => None,
        }
    }
}

impl Renderable for ListItem {
    fn render(&self, format: &OutputFormat) -> Result<String, OutputError> {
        match self {
            Self::DeclarationBlock(item) => item.render(format),
            Self::AtRuleBlockList(item) => item.render(format),
            Self::AtRuleSet(item) => item.render(format),
            Self::KeyFrame(item) => item.render(format),
            Self::Import(item) => item.render(format),
            Self::Charset(item) => item.render(format),
            Self::Namespace(item) => item.render(format),
        }
    }
}

/// An ordered list of rules.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CssList {
    /// The items in source order.
    pub contents: Vec<ListItem>,
    /// Source line where the list starts.
    pub line_no: usize,
}

impl CssList {
    /// An empty list.
    #[must_use]
    pub const fn new(line_no: usize) -> Self {
        Self {
            contents: Vec::new(),
            line_no,
        }
    }

    /// Add `item` at the end.
    pub fn append(&mut self, item: ListItem) {
        self.contents.push(item);
    }

    /// Add `item` at the start.
    pub fn prepend(&mut self, item: ListItem) {
        self.contents.insert(0, item);
    }

    /// Remove `length` items (all remaining when `None`) starting at
    /// `offset` and insert `replacement` in their place. Returns the removed
    /// items. Out-of-range bounds are clamped.
    pub fn splice(&mut self, offset: usize, length: Option<usize>, replacement: Vec<ListItem>) -> Vec<ListItem> {
        let start = offset.min(self.contents.len());
        let end = length.map_or(self.contents.len(), |length| {
            start.saturating_add(length).min(self.contents.len())
        });
        self.contents.splice(start..end, replacement).collect()
    }

    /// Remove the first item equal to `item`.
    pub fn remove(&mut self, item: &ListItem) -> bool {
        match self.contents.iter().position(|i| i == item) {
            Some(index) => {
                let _ = self.contents.remove(index);
                true
            }
            None => false,
        }
    }

    /// Replace the first item equal to `old` with `new` items.
    pub fn replace(&mut self, old: &ListItem, new: Vec<ListItem>) -> bool {
        match self.contents.iter().position(|i| i == old) {
            Some(index) => {
                let _ = self.contents.splice(index..=index, new);
                true
            }
            None => false,
        }
    }

    /// Replace all items.
    pub fn set_contents(&mut self, contents: Vec<ListItem>) {
        self.contents = contents;
    }

    /// Remove style rules whose selector list equals the comma-separated
    /// `selectors`. Only the first match is removed unless `remove_all` is
    /// set. Returns the number of blocks removed.
    pub fn remove_declaration_block_by_selector(&mut self, selectors: &str, remove_all: bool) -> usize {
        let wanted: Vec<Selector> = split_selectors(selectors).into_iter().map(Selector::new).collect();
        let mut removed = 0;
        self.contents.retain(|item| {
            if removed > 0 && !remove_all {
                return true;
            }
            match item {
                ListItem::DeclarationBlock(block) if block.selectors == wanted => {
                    removed += 1;
                    false
                }
                _ => true,
            }
        });
        removed
    }

    /// Every style rule, descending into `@media`-like blocks.
    #[must_use]
    pub fn all_declaration_blocks(&self) -> Vec<&DeclarationBlock> {
        let mut out = Vec::new();
        collect_blocks(self, &mut out);
        out
    }

    /// Mutable counterpart of [`Self::all_declaration_blocks`].
    pub fn all_declaration_blocks_mut(&mut self) -> Vec<&mut DeclarationBlock> {
        let mut out = Vec::new();
        collect_blocks_mut(self, &mut out);
        out
    }

    /// Every rule set: style rules and declaration at-rules.
    #[must_use]
    pub fn all_rule_sets(&self) -> Vec<&RuleSet> {
        let mut out = Vec::new();
        collect_rule_sets(self, &mut out);
        out
    }

    /// Every selector, optionally filtered by specificity, e.g. `"<= 100"`.
    #[must_use]
    pub fn all_selectors(&self, specificity: Option<&str>) -> Vec<&Selector> {
        let filter = specificity.map(SpecificityFilter::parse);
        self.all_declaration_blocks()
            .into_iter()
            .flat_map(|block| block.selectors.iter())
            .filter(|selector| filter.is_none_or(|f| f.matches(selector)))
            .collect()
    }

    /// Every leaf value of every declaration whose name matches
    /// `rule_pattern` (see [`RuleSet::rules`]).
    ///
    /// Value lists are always descended into. Functions are returned whole
    /// unless `search_in_function_arguments` is set, in which case their
    /// arguments are returned instead.
    #[must_use]
    pub fn all_values(&self, rule_pattern: Option<&str>, search_in_function_arguments: bool) -> Vec<&Value> {
        let mut out = Vec::new();
        for rule_set in self.all_rule_sets() {
            for rule in rule_set.rules(rule_pattern) {
                collect_values(&rule.value, search_in_function_arguments, &mut out);
            }
        }
        out
    }

    /// Render the items. A root list renders at the current level; a nested
    /// list one level deeper.
    ///
    /// # Errors
    ///
    /// An item's [`OutputError`] when `ignore_exceptions` is unset.
    pub fn render_contents(&self, format: &OutputFormat, is_root: bool) -> Result<String, OutputError> {
        let next = if is_root { format.clone() } else { format.next_level() };
        let mut out = String::new();
        let mut first = true;
        for item in &self.contents {
            let Some(rendered) = format.safely(|| item.render(&next))? else {
                continue;
            };
            if first {
                first = false;
                out.push_str(&next.space_before_blocks());
            } else {
                out.push_str(&next.space_between_blocks());
            }
            out.push_str(&rendered);
        }
        if !first {
            out.push_str(&format.space_after_blocks());
        }
        Ok(out)
    }
}

fn collect_blocks<'a>(list: &'a CssList, out: &mut Vec<&'a DeclarationBlock>) {
    for item in &list.contents {
        match item {
            ListItem::DeclarationBlock(block) => out.push(block),
            ListItem::AtRuleBlockList(nested) => collect_blocks(&nested.list, out),
            _ => {}
        }
    }
}

fn collect_blocks_mut<'a>(list: &'a mut CssList, out: &mut Vec<&'a mut DeclarationBlock>) {
    for item in &mut list.contents {
        match item {
            ListItem::DeclarationBlock(block) => out.push(block),
            ListItem::AtRuleBlockList(nested) => collect_blocks_mut(&mut nested.list, out),
            _ => {}
        }
    }
}

fn collect_rule_sets<'a>(list: &'a CssList, out: &mut Vec<&'a RuleSet>) {
    for item in &list.contents {
        match item {
            ListItem::DeclarationBlock(block) => out.push(&block.rule_set),
            ListItem::AtRuleSet(at_rule) => out.push(&at_rule.rule_set),
            ListItem::AtRuleBlockList(nested) => collect_rule_sets(&nested.list, out),
            _ => {}
        }
    }
}

fn collect_values<'a>(value: &'a Value, in_functions: bool, out: &mut Vec<&'a Value>) {
    match value {
        Value::List(list) => {
            for component in &list.components {
                collect_values(component, in_functions, out);
            }
        }
        Value::Function(_) | Value::Calc(_) if in_functions => {
            for component in value.components() {
                collect_values(component, in_functions, out);
            }
        }
        Value::Color(color) if in_functions => {
            for (_, component) in &color.components {
                collect_values(component, in_functions, out);
            }
        }
        _ => out.push(value),
    }
}

/// `@media`, `@supports` and other at-rules holding a nested rule list.
#[derive(Debug, Clone, PartialEq)]
pub struct AtRuleBlockList {
    /// Name without the `@`.
    pub name: String,
    /// Prelude text, e.g. the media query.
    pub args: String,
    /// The nested rules.
    pub list: CssList,
    /// Comments preceding the at-rule.
    pub comments: Vec<Comment>,
}

impl AtRuleBlockList {
    /// An empty at-rule block.
    pub fn new(name: impl Into<String>, args: impl Into<String>, line_no: usize) -> Self {
        Self {
            name: name.into(),
            args: args.into(),
            list: CssList::new(line_no),
            comments: Vec::new(),
        }
    }
}

impl Deref for AtRuleBlockList {
    type Target = CssList;

    fn deref(&self) -> &CssList {
        &self.list
    }
}

impl DerefMut for AtRuleBlockList {
    fn deref_mut(&mut self) -> &mut CssList {
        &mut self.list
    }
}

impl Renderable for AtRuleBlockList {
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
            self.list.render_contents(format, false)?
        ))
    }
}

/// [§ 3 Keyframes](https://www.w3.org/TR/css-animations-1/#keyframes)
#[derive(Debug, Clone, PartialEq)]
pub struct KeyFrame {
    /// `keyframes` or a vendor spelling such as `-webkit-keyframes`.
    pub vendor_key_frame: String,
    /// The animation name.
    pub animation_name: String,
    /// Keyframe blocks.
    pub list: CssList,
    /// Comments preceding the at-rule.
    pub comments: Vec<Comment>,
}

impl KeyFrame {
    /// An empty `@keyframes none`.
    #[must_use]
    pub fn new(line_no: usize) -> Self {
        Self {
            vendor_key_frame: "keyframes".to_string(),
            animation_name: "none".to_string(),
            list: CssList::new(line_no),
            comments: Vec::new(),
        }
    }
}

impl Deref for KeyFrame {
    type Target = CssList;

    fn deref(&self) -> &CssList {
        &self.list
    }
}

impl DerefMut for KeyFrame {
    fn deref_mut(&mut self) -> &mut CssList {
        &mut self.list
    }
}

impl Renderable for KeyFrame {
    fn render(&self, format: &OutputFormat) -> Result<String, OutputError> {
        Ok(format!(
            "@{} {}{}{{{}}}",
            self.vendor_key_frame,
            self.animation_name,
            format.space_before_opening_brace(),
            self.list.render_contents(format, false)?
        ))
    }
}

/// [§ 2 Importing Style Sheets](https://www.w3.org/TR/css-cascade-4/#at-import)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    /// The imported location.
    pub location: CssUrl,
    /// Media query list, if any.
    pub media_query: Option<String>,
    /// Source line.
    pub line_no: usize,
    /// Comments preceding the at-rule.
    pub comments: Vec<Comment>,
}

impl Renderable for Import {
    fn render(&self, format: &OutputFormat) -> Result<String, OutputError> {
        let media = self
            .media_query
            .as_deref()
            .map(|media| format!(" {media}"))
            .unwrap_or_default();
        Ok(format!("@import {}{media};", self.location.render(format)?))
    }
}

/// [§ 3.4 The `@charset` Rule](https://www.w3.org/TR/css-syntax-3/#charset-rule)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Charset {
    /// The encoding label.
    pub charset: CssString,
    /// Source line.
    pub line_no: usize,
    /// Comments preceding the at-rule.
    pub comments: Vec<Comment>,
}

impl Renderable for Charset {
    fn render(&self, format: &OutputFormat) -> Result<String, OutputError> {
        Ok(format!("@charset {};", self.charset.render(format)?))
    }
}

/// [§ 2 Declaring Namespaces](https://www.w3.org/TR/css-namespaces-3/#declaration)
#[derive(Debug, Clone, PartialEq)]
pub struct Namespace {
    /// Namespace prefix, or `None` for the default namespace.
    pub prefix: Option<String>,
    /// A [`Value::String`] or [`Value::Url`].
    pub url: Value,
    /// Source line.
    pub line_no: usize,
    /// Comments preceding the at-rule.
    pub comments: Vec<Comment>,
}

impl Renderable for Namespace {
    fn render(&self, format: &OutputFormat) -> Result<String, OutputError> {
        let prefix = self
            .prefix
            .as_deref()
            .map(|prefix| format!("{prefix} "))
            .unwrap_or_default();
        Ok(format!("@namespace {prefix}{};", self.url.render(format)?))
    }
}

/// A parsed style sheet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    list: CssList,
}

impl Document {
    /// An empty style sheet.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            list: CssList::new(1),
        }
    }

    /// Parse `text` with lenient settings.
    ///
    /// # Errors
    ///
    /// [`SourceError::Source`] for structural failures lenient parsing
    /// cannot recover from.
    pub fn parse(text: &str) -> Result<Self, SourceError> {
        Parser::new(text).parse()
    }

    pub(crate) const fn from_list(list: CssList) -> Self {
        Self { list }
    }
}

impl Deref for Document {
    type Target = CssList;

    fn deref(&self) -> &CssList {
        &self.list
    }
}

impl DerefMut for Document {
    fn deref_mut(&mut self) -> &mut CssList {
        &mut self.list
    }
}

impl Renderable for Document {
    fn render(&self, format: &OutputFormat) -> Result<String, OutputError> {
        self.list.render_contents(format, true)
    }
}
