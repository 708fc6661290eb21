//! Building a [`DomTree`] from markup with the `tl` HTML parser.
//!
//! `tl` keeps text and attribute values as they appear in the source, so
//! character references are decoded here. The content of raw text elements
//! (`<script>`, `<style>`) is kept verbatim.

use std::borrow::Cow;

use crate::{DomTree, NodeId, NodeType, is_raw_text_element};

/// Markup that could not be read.
#[derive(Debug, thiserror::Error)]
pub enum MarkupError {
    /// The parser rejected the input.
    #[error("failed to parse markup: {0}")]
    Parse(String),
}

impl DomTree {
    /// Parse an HTML document.
    ///
    /// A leading `<!DOCTYPE>` becomes a doctype node; the rest is handed to
    /// `tl`. Comments are kept.
    ///
    /// # Errors
    ///
    /// [`MarkupError::Parse`] when `tl` gives up on the input.
    pub fn parse_html(html: &str) -> Result<Self, MarkupError> {
        let mut tree = Self::new();
        let (doctype, rest) = split_doctype(html);
        if let Some(name) = doctype {
            let node = tree.alloc(NodeType::Doctype(name));
            tree.append_child(NodeId::ROOT, node);
        }

        let dom = tl::parse(rest, tl::ParserOptions::default())
            .map_err(|error| MarkupError::Parse(format!("{error:?}")))?;
        let parser = dom.parser();
        for handle in dom.children() {
            tree.import(*handle, parser, NodeId::ROOT, false);
        }
        Ok(tree)
    }

    fn import(&mut self, handle: tl::NodeHandle, parser: &tl::Parser<'_>, parent: NodeId, raw_text: bool) {
        let Some(node) = handle.get(parser) else {
            return;
        };
        match node {
            tl::Node::Tag(tag) => {
                let tag_name = tag.name().as_utf8_str().to_ascii_lowercase();
                let attrs: Vec<(String, String)> = tag
                    .attributes()
                    .iter()
                    .map(|(name, value)| {
                        let value = value.map(|v| decode_entities(&v).into_owned()).unwrap_or_default();
                        (name.to_ascii_lowercase(), value)
                    })
                    .collect();
                let element = self.create_element(&tag_name, attrs);
                self.append_child(parent, element);
                let raw_text = is_raw_text_element(&tag_name);
                for child in tag.children().top().iter() {
                    self.import(*child, parser, element, raw_text);
                }
            }
            tl::Node::Raw(bytes) => {
                let text = bytes.as_utf8_str();
                let text = if raw_text {
                    text.into_owned()
                } else {
                    decode_entities(&text).into_owned()
                };
                let node = self.create_text(text);
                self.append_child(parent, node);
            }
            tl::Node::Comment(bytes) => {
                let text = bytes.as_utf8_str();
                let data = text
                    .strip_prefix("<!--")
                    .and_then(|rest| rest.strip_suffix("-->"))
                    .unwrap_or(&text);
                let node = self.create_comment(data);
                self.append_child(parent, node);
            }
        }
    }
}

/// Splits off a leading `<!DOCTYPE name>`, returning the lowercased name.
fn split_doctype(html: &str) -> (Option<String>, &str) {
    let trimmed = html.trim_start();
    let is_doctype = trimmed
        .get(..9)
        .is_some_and(|start| start.eq_ignore_ascii_case("<!doctype"));
    if !is_doctype {
        return (None, html);
    }
    let Some(end) = trimmed.find('>') else {
        return (None, html);
    };
    let name = trimmed[9..end].trim().to_ascii_lowercase();
    (Some(name), &trimmed[end + 1..])
}

/// [§ 13.2.5.72 Character reference state](https://html.spec.whatwg.org/multipage/parsing.html#character-reference-state)
///
/// Decodes numeric references and the named references markup commonly
/// escapes. Anything else is left as written.
#[must_use]
pub fn decode_entities(text: &str) -> Cow<'_, str> {
    if !text.contains('&') {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        rest = &rest[start..];
        let decoded = rest.find(';').and_then(|end| {
            let decoded = decode_reference(&rest[1..end])?;
            Some((decoded, end))
        });
        match decoded {
            Some((character, end)) => {
                out.push(character);
                rest = &rest[end + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

fn decode_reference(name: &str) -> Option<char> {
    if let Some(number) = name.strip_prefix('#') {
        let code = match number.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => number.parse().ok()?,
        };
        return char::from_u32(code);
    }
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_entities() {
        assert_eq!(decode_entities("a &amp; b"), "a & b");
        assert_eq!(decode_entities("&lt;p&gt;"), "<p>");
        assert_eq!(decode_entities("&#9889; &#x26A1;"), "\u{26a1} \u{26a1}");
        assert_eq!(decode_entities("AT&T"), "AT&T");
        assert_eq!(decode_entities("&unknown;"), "&unknown;");
    }

    #[test]
    fn test_split_doctype() {
        let (name, rest) = split_doctype("<!DOCTYPE html><html></html>");
        assert_eq!(name.as_deref(), Some("html"));
        assert_eq!(rest, "<html></html>");

        let (name, rest) = split_doctype("<html></html>");
        assert_eq!(name, None);
        assert_eq!(rest, "<html></html>");
    }
}
