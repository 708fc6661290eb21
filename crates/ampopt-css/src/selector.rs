//! Selectors of declaration blocks.
//!
//! Selectors are kept as text. Specificity is computed lazily from that text
//! and memoized per instance.

use std::cell::OnceCell;
use std::fmt;

/// [§ 17 Calculating Specificity](https://www.w3.org/TR/selectors-4/#specificity-rules)
/// "A selector's specificity is calculated for a given element as follows:
///  - count the number of ID selectors in the selector (= A)
///  - count the number of class selectors, attributes selectors, and pseudo-classes in the selector (= B)
///  - count the number of type selectors and pseudo-elements in the selector (= C)
///
/// Specificities are compared by comparing the three components in order."
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Specificity(pub u32, pub u32, pub u32);

impl Specificity {
    /// Create a new specificity with (A, B, C) components.
    #[must_use]
    pub const fn new(a: u32, b: u32, c: u32) -> Self {
        Self(a, b, c)
    }

    /// Flattened weight `A * 100 + B * 10 + C`, used by specificity filters.
    #[must_use]
    pub const fn value(self) -> u32 {
        self.0 * 100 + self.1 * 10 + self.2
    }
}

/// "Pseudo-elements... ::before, ::after, ::first-line, ::first-letter"
///
/// Legacy single-colon spellings of these count as pseudo-elements too.
const PSEUDO_ELEMENTS: &[&str] = &["after", "before", "first-letter", "first-line", "selection"];

/// A single selector of a declaration block, e.g. `.hero > img`.
#[derive(Debug, Clone)]
pub struct Selector {
    text: String,
    specificity: OnceCell<Specificity>,
}

impl Selector {
    /// Create a selector from text. Surrounding whitespace is trimmed.
    #[must_use]
    pub fn new(text: impl AsRef<str>) -> Self {
        Self {
            text: text.as_ref().trim().to_string(),
            specificity: OnceCell::new(),
        }
    }

    /// The selector text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Replace the selector text, discarding the memoized specificity.
    pub fn set_text(&mut self, text: impl AsRef<str>) {
        self.text = text.as_ref().trim().to_string();
        self.specificity = OnceCell::new();
    }

    /// The selector's specificity, computed on first use.
    #[must_use]
    pub fn specificity(&self) -> Specificity {
        *self.specificity.get_or_init(|| calculate_specificity(&self.text))
    }

    /// Whether `text` consists only of characters that can appear in a
    /// selector. Escapes and quoted strings may contain anything.
    #[must_use]
    pub fn is_valid(text: &str) -> bool {
        let mut chars = text.chars();
        while let Some(c) = chars.next() {
            match c {
                '\\' => {
                    if chars.next().is_none() {
                        return false;
                    }
                }
                '\'' | '"' => {
                    if !skip_quoted(&mut chars, c) {
                        return false;
                    }
                }
                c if c.is_ascii_alphanumeric() || c.is_whitespace() || u32::from(c) >= 0xa0 => {}
                '_' | '^' | '$' | '|' | '*' | '=' | '~' | '[' | ']' | '(' | ')' | '-' | '.' | ':'
                | '#' | '+' | '>' => {}
                _ => return false,
            }
        }
        true
    }

    /// Whether `text` is a keyframe selector: `from`, `to` or a percentage.
    #[must_use]
    pub fn is_valid_keyframe(text: &str) -> bool {
        let text = text.trim();
        if text.eq_ignore_ascii_case("from") || text.eq_ignore_ascii_case("to") {
            return true;
        }
        text.strip_suffix('%')
            .is_some_and(|number| number.parse::<f64>().is_ok_and(|n| (0.0..=100.0).contains(&n)))
    }
}

impl PartialEq for Selector {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl Eq for Selector {}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Advance past a quoted string whose opening `quote` was just read.
fn skip_quoted(chars: &mut std::str::Chars<'_>, quote: char) -> bool {
    while let Some(c) = chars.next() {
        if c == '\\' {
            let _ = chars.next();
        } else if c == quote {
            return true;
        }
    }
    false
}

fn take_name(chars: &[char], mut index: usize) -> (String, usize) {
    let mut name = String::new();
    while let Some(&c) = chars.get(index) {
        if c.is_alphanumeric() || c == '-' || c == '_' {
            name.push(c);
            index += 1;
        } else if c == '\\' && index + 1 < chars.len() {
            name.push(chars[index + 1]);
            index += 2;
        } else {
            break;
        }
    }
    (name, index)
}

/// Index just past the bracket closing the one at `index`.
fn skip_group(chars: &[char], index: usize, open: char, close: char) -> usize {
    let mut depth = 0usize;
    let mut i = index;
    while let Some(&c) = chars.get(i) {
        if c == open {
            depth += 1;
        } else if c == close {
            depth -= 1;
            if depth == 0 {
                return i + 1;
            }
        } else if c == '\'' || c == '"' {
            i += 1;
            while chars.get(i).is_some_and(|&q| q != c) {
                i += 1;
            }
        }
        i += 1;
    }
    chars.len()
}

/// [§ 17 Calculating Specificity](https://www.w3.org/TR/selectors-4/#specificity-rules)
fn calculate_specificity(text: &str) -> Specificity {
    let chars: Vec<char> = text.chars().collect();
    let mut spec = Specificity::default();
    let mut i = 0;

    while let Some(&c) = chars.get(i) {
        match c {
            // "count the number of ID selectors in the selector (= A)"
            '#' => {
                let (_, next) = take_name(&chars, i + 1);
                spec.0 += 1;
                i = next.max(i + 1);
            }
            // "count the number of class selectors, attributes selectors..." (= B)
            '.' => {
                let (_, next) = take_name(&chars, i + 1);
                spec.1 += 1;
                i = next.max(i + 1);
            }
            '[' => {
                spec.1 += 1;
                i = skip_group(&chars, i, '[', ']');
            }
            ':' => {
                let double = chars.get(i + 1) == Some(&':');
                let start = if double { i + 2 } else { i + 1 };
                let (name, mut next) = take_name(&chars, start);
                let lower = name.to_ascii_lowercase();
                // "count the number of type selectors and pseudo-elements" (= C)
                if double || PSEUDO_ELEMENTS.contains(&lower.as_str()) {
                    spec.2 += 1;
                } else if lower != "where" {
                    spec.1 += 1;
                }
                if chars.get(next) == Some(&'(') {
                    next = skip_group(&chars, next, '(', ')');
                }
                i = next.max(i + 1);
            }
            c if c.is_alphabetic() || c == '_' || c == '\\' => {
                let (_, next) = take_name(&chars, i);
                spec.2 += 1;
                i = next.max(i + 1);
            }
            _ => i += 1,
        }
    }

    spec
}

/// A comparison on [`Specificity::value`], parsed from text such as `"<= 100"`
/// or `"110"` (equality).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecificityFilter {
    comparator: Comparator,
    target: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Comparator {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
}

impl SpecificityFilter {
    /// Parse `"<comparator> <value>"` or `"<value>"`. An unknown comparator
    /// means equality, and a non-numeric target means zero.
    #[must_use]
    pub fn parse(search: &str) -> Self {
        let parts: Vec<&str> = search.split(' ').collect();
        let (comparator, target) = match parts.as_slice() {
            [comparator, target, ..] => (*comparator, *target),
            [target] => ("===", *target),
            [] => ("===", "0"),
        };
        let comparator = match comparator {
            "<" => Comparator::Lt,
            "<=" => Comparator::Le,
            ">" => Comparator::Gt,
            ">=" => Comparator::Ge,
            _ => Comparator::Eq,
        };
        Self {
            comparator,
            target: target.trim().parse().unwrap_or(0),
        }
    }

    /// Whether `selector` passes the filter.
    #[must_use]
    pub fn matches(&self, selector: &Selector) -> bool {
        let value = selector.specificity().value();
        match self.comparator {
            Comparator::Lt => value < self.target,
            Comparator::Le => value <= self.target,
            Comparator::Gt => value > self.target,
            Comparator::Ge => value >= self.target,
            Comparator::Eq => value == self.target,
        }
    }
}
