//! [§ 13.3 Serializing HTML fragments](https://html.spec.whatwg.org/multipage/parsing.html#serialising-html-fragments)

use crate::{DomTree, NodeId, NodeType};

/// [§ 13.1.2 Elements](https://html.spec.whatwg.org/multipage/syntax.html#void-elements)
///
/// "Void elements: area, base, br, col, embed, hr, img, input, link, meta,
/// source, track, wbr"
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

/// "If the parent of current node is a style, script, xmp, iframe, noembed,
/// noframes, or plaintext element... then append the value of current node's
/// data literally."
const RAW_TEXT_ELEMENTS: &[&str] = &[
    "style", "script", "xmp", "iframe", "noembed", "noframes", "plaintext",
];

/// Whether `tag` is a void element (no end tag, no children).
#[must_use]
pub fn is_void_element(tag: &str) -> bool {
    VOID_ELEMENTS.iter().any(|v| v.eq_ignore_ascii_case(tag))
}

/// Whether text inside `tag` is serialized literally.
#[must_use]
pub fn is_raw_text_element(tag: &str) -> bool {
    RAW_TEXT_ELEMENTS.iter().any(|v| v.eq_ignore_ascii_case(tag))
}

/// [§ 13.3 Escaping a string](https://html.spec.whatwg.org/multipage/parsing.html#escapingString)
///
/// "Replace any occurrence of the "&" character by the string "&amp;".
/// Replace any occurrences of the U+00A0 NO-BREAK SPACE character by the
/// string "&nbsp;". ... If the algorithm was not invoked in the attribute
/// mode, replace any occurrences of the "<" character by the string "&lt;",
/// and any occurrences of the ">" character by the string "&gt;"."
#[must_use]
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// "If the algorithm was invoked in the attribute mode, replace any
/// occurrences of the """ character by the string "&quot;"."
#[must_use]
pub fn escape_attribute(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

pub(crate) fn write_children(tree: &DomTree, id: NodeId, out: &mut String) {
    for &child in tree.children(id) {
        write_node(tree, child, out);
    }
}

/// Attributes with an empty value are written in their minimized form
/// (`<style amp-boilerplate>`).
pub(crate) fn write_start_tag(tree: &DomTree, id: NodeId, out: &mut String) {
    let Some(element) = tree.as_element(id) else {
        return;
    };
    out.push('<');
    out.push_str(&element.tag_name);
    for attr in &element.attrs {
        out.push(' ');
        out.push_str(&attr.name);
        if !attr.value.is_empty() {
            out.push_str("=\"");
            out.push_str(&escape_attribute(&attr.value));
            out.push('"');
        }
    }
    out.push('>');
}

pub(crate) fn write_node(tree: &DomTree, id: NodeId, out: &mut String) {
    let Some(node) = tree.get(id) else {
        return;
    };
    match &node.node_type {
        NodeType::Document => write_children(tree, id, out),
        NodeType::Doctype(name) => {
            out.push_str("<!doctype ");
            out.push_str(name);
            out.push('>');
        }
        NodeType::Comment(data) => {
            out.push_str("<!--");
            out.push_str(data);
            out.push_str("-->");
        }
        NodeType::Text(data) => {
            let raw = node
                .parent
                .and_then(|p| tree.tag_name(p))
                .is_some_and(is_raw_text_element);
            if raw {
                out.push_str(data);
            } else {
                out.push_str(&escape_text(data));
            }
        }
        NodeType::Element(element) => {
            write_start_tag(tree, id, out);
            // "If current node is an area, base, ... element, then continue
            // on to the next child node at this point."
            if is_void_element(&element.tag_name) {
                return;
            }
            write_children(tree, id, out);
            out.push_str("</");
            out.push_str(&element.tag_name);
            out.push('>');
        }
    }
}
