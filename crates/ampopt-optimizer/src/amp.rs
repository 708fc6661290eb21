//! AMP markup constants and element predicates shared by the transformers.
//!
//! [AMP HTML format](https://amp.dev/documentation/guides-and-tutorials/learn/spec/amphtml)

use ampopt_dom::{DomTree, NodeId};

pub use ampopt_common::runtime_version::AMP_CACHE_HOST as CACHE_HOST;

/// [AMP boilerplate](https://amp.dev/documentation/guides-and-tutorials/learn/spec/amp-boilerplate)
///
/// Hides the body until the runtime has loaded, with an 8 second timeout.
pub const BOILERPLATE_CSS: &str = "body{-webkit-animation:-amp-start 8s steps(1,end) 0s 1 normal both;\
-moz-animation:-amp-start 8s steps(1,end) 0s 1 normal both;\
-ms-animation:-amp-start 8s steps(1,end) 0s 1 normal both;\
animation:-amp-start 8s steps(1,end) 0s 1 normal both}\
@-webkit-keyframes -amp-start{from{visibility:hidden}to{visibility:visible}}\
@-moz-keyframes -amp-start{from{visibility:hidden}to{visibility:visible}}\
@-ms-keyframes -amp-start{from{visibility:hidden}to{visibility:visible}}\
@-o-keyframes -amp-start{from{visibility:hidden}to{visibility:visible}}\
@keyframes -amp-start{from{visibility:hidden}to{visibility:visible}}";

/// Boilerplate fallback used when scripting is disabled.
pub const BOILERPLATE_NOSCRIPT_CSS: &str =
    "body{-webkit-animation:none;-moz-animation:none;-ms-animation:none;animation:none}";

/// Boilerplate of the AMP for ads and AMP for email formats.
pub const AMP4ADS_AND_AMP4EMAIL_BOILERPLATE_CSS: &str = "body{visibility:hidden}";

/// `<html>` attribute marking a document whose boilerplate was removed by
/// server-side rendering.
pub const NO_BOILERPLATE_ATTRIBUTE: &str = "i-amphtml-no-boilerplate";

/// Boilerplate attribute of the standard format.
pub const AMP_BOILERPLATE: &str = "amp-boilerplate";
/// Boilerplate attribute of the ads format.
pub const AMP4ADS_BOILERPLATE: &str = "amp4ads-boilerplate";
/// Boilerplate attribute of the email format.
pub const AMP4EMAIL_BOILERPLATE: &str = "amp4email-boilerplate";

/// Attributes that mark a `<style>` as boilerplate.
pub const ALL_BOILERPLATES: &[&str] = &[AMP_BOILERPLATE, AMP4ADS_BOILERPLATE, AMP4EMAIL_BOILERPLATE];

/// `<html>` attributes identifying an AMP for ads document. The lightning
/// bolt may or may not carry the emoji variation selector.
pub const ALL_AMP4ADS: &[&str] = &["amp4ads", "⚡4ads", "⚡\u{fe0f}4ads"];

/// `<html>` attributes identifying an AMP for email document.
pub const ALL_AMP4EMAIL: &[&str] = &["amp4email", "⚡4email", "⚡\u{fe0f}4email"];

/// Extensions that delay first paint until they have loaded.
const RENDER_DELAYING_EXTENSIONS: &[&str] = &["amp-dynamic-css-classes", "amp-experiment", "amp-story"];

/// Attributes that turn a script into an extension script.
const EXTENSION_ATTRIBUTES: &[&str] = &["custom-element", "custom-template", "host-service"];

/// A `<script async src=..>`.
#[must_use]
pub fn is_async_script(tree: &DomTree, id: NodeId) -> bool {
    tree.is_element(id, "script") && tree.has_attr(id, "src") && tree.has_attr(id, "async")
}

/// An async script loading an extension, template or host service.
#[must_use]
pub fn is_extension(tree: &DomTree, id: NodeId) -> bool {
    is_async_script(tree, id) && EXTENSION_ATTRIBUTES.iter().any(|attr| tree.has_attr(id, attr))
}

/// The runtime script `v0.js` (or its module or ads variants). The host is
/// not checked so that rewritten, self-hosted URLs are still recognized.
#[must_use]
pub fn is_runtime_script(tree: &DomTree, id: NodeId) -> bool {
    if !is_async_script(tree, id) || is_extension(tree, id) {
        return false;
    }
    let src = tree.attr(id, "src").unwrap_or_default();
    ["/v0.js", "/v0.mjs", "/amp4ads-v0.js", "/amp4ads-v0.mjs"]
        .iter()
        .any(|suffix| src.ends_with(suffix))
}

/// The viewer integration script `v0/amp-viewer-host-*.js`.
#[must_use]
pub fn is_viewer_script(tree: &DomTree, id: NodeId) -> bool {
    if !is_async_script(tree, id) || is_extension(tree, id) {
        return false;
    }
    let src = tree.attr(id, "src").unwrap_or_default();
    src.contains("/v0/amp-viewer-host") && src.ends_with(".js")
}

/// An extension script for an extension that delays first paint.
#[must_use]
pub fn is_render_delaying_extension(tree: &DomTree, id: NodeId) -> bool {
    tree.is_element(id, "script")
        && tree
            .attr(id, "custom-element")
            .is_some_and(|name| RENDER_DELAYING_EXTENSIONS.contains(&name))
}

/// A `<template>` or a `<script type=text/plain template=amp-mustache>`.
/// Content inside templates is not part of the rendered page.
#[must_use]
pub fn is_template(tree: &DomTree, id: NodeId) -> bool {
    if tree.is_element(id, "template") {
        return true;
    }
    tree.is_element(id, "script")
        && tree.attr(id, "template") == Some("amp-mustache")
        && tree.attr(id, "type") == Some("text/plain")
}

/// The `<meta name=viewport>` child of `<head>`, the anchor after which
/// preload links are inserted.
#[must_use]
pub fn viewport_meta(tree: &DomTree) -> Option<NodeId> {
    let head = tree.head()?;
    tree.children(head)
        .iter()
        .copied()
        .find(|&child| tree.is_element(child, "meta") && tree.attr(child, "name") == Some("viewport"))
}
