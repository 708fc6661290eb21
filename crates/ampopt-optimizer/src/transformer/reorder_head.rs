use std::collections::BTreeMap;

use ampopt_dom::{DomTree, NodeId};
use strum::IntoEnumIterator;
use strum_macros::EnumIter;

use super::{Transformer, TransformerKind};
use crate::amp::{
    AMP4ADS_BOILERPLATE, AMP_BOILERPLATE, is_render_delaying_extension, is_runtime_script, is_viewer_script,
};
use crate::error::{ErrorCollection, OptimizerError};

/// Host of the AMP cache, as it appears in resource hints.
const AMP_CACHE_DOMAIN: &str = "cdn.ampproject.org";

/// [Optimize the AMP runtime loading](https://amp.dev/documentation/guides-and-tutorials/optimize-and-measure/optimize_amp/)
///
/// Categories of `<head>` children, in the order they are written back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, EnumIter)]
pub enum HeadCategory {
    /// `<meta charset>`
    MetaCharset,
    /// `<meta name=viewport>`
    MetaViewport,
    /// Resource hints pointing at the AMP cache.
    AmpResourceHints,
    /// `<link rel=stylesheet href=.../v0.css>`
    LinkStyleAmpRuntime,
    /// `<style amp-runtime>`
    StyleAmpRuntime,
    /// Remaining `<meta>` tags.
    MetaOther,
    /// Remaining resource hints.
    ResourceHintLinks,
    /// The runtime script, module version first.
    ScriptAmpRuntime,
    /// The viewer integration script.
    ScriptAmpViewer,
    /// Extensions that delay first paint, by name.
    ScriptRenderDelayingExtensions,
    /// Other extensions, templates and host services, by name.
    ScriptNonRenderDelayingExtensions,
    /// `<link rel=icon>`
    LinkIcons,
    /// Stylesheets that precede `<style amp-custom>`.
    LinkStylesheetsBeforeAmpCustom,
    /// `<style amp-custom>`
    StyleAmpCustom,
    /// Everything else.
    Others,
    /// `<style amp-boilerplate>` or `<style amp4ads-boilerplate>`.
    StyleAmpBoilerplate,
    /// `<noscript>`
    Noscript,
}

impl HeadCategory {
    /// Categories holding a single node. A second node of such a category
    /// goes to [`Self::Others`].
    const fn is_singleton(self) -> bool {
        matches!(
            self,
            Self::MetaCharset
                | Self::MetaViewport
                | Self::LinkStyleAmpRuntime
                | Self::StyleAmpRuntime
                | Self::StyleAmpCustom
        )
    }
}

/// Sorts the children of `<head>` into the order that lets the browser
/// start rendering soonest.
///
/// Whitespace-only text is dropped. Reordering an already ordered head
/// changes nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReorderHead;

/// Nodes sorted into categories. Keyed categories are ordered by name, then
/// with module scripts before `nomodule` ones.
#[derive(Debug, Default)]
struct HeadBuckets {
    lists: BTreeMap<HeadCategory, Vec<NodeId>>,
    keyed: BTreeMap<HeadCategory, BTreeMap<String, BTreeMap<usize, NodeId>>>,
}

impl HeadBuckets {
    fn contains(&self, category: HeadCategory) -> bool {
        self.lists.get(&category).is_some_and(|nodes| !nodes.is_empty())
    }

    fn push(&mut self, category: HeadCategory, node: NodeId) {
        let category = if category.is_singleton() && self.contains(category) {
            HeadCategory::Others
        } else {
            category
        };
        self.lists.entry(category).or_default().push(node);
    }

    fn insert_keyed(&mut self, category: HeadCategory, name: &str, nomodule: bool, node: NodeId) {
        let nomodule = usize::from(nomodule);
        let slot = self
            .keyed
            .entry(category)
            .or_default()
            .entry(name.to_string())
            .or_default();
        if slot.contains_key(&nomodule) {
            self.push(HeadCategory::Others, node);
        } else {
            let _ = slot.insert(nomodule, node);
        }
    }

    fn into_ordered(mut self) -> Vec<NodeId> {
        let mut ordered = Vec::new();
        for category in HeadCategory::iter() {
            if let Some(nodes) = self.lists.remove(&category) {
                ordered.extend(nodes);
            }
            if let Some(keyed) = self.keyed.remove(&category) {
                ordered.extend(keyed.into_values().flat_map(BTreeMap::into_values));
            }
        }
        ordered
    }
}

impl ReorderHead {
    fn register(tree: &DomTree, node: NodeId, buckets: &mut HeadBuckets) {
        let Some(tag) = tree.tag_name(node) else {
            let blank = tree.as_text(node).is_some_and(|text| text.trim().is_empty());
            if !blank {
                buckets.push(HeadCategory::Others, node);
            }
            return;
        };
        match tag {
            "meta" => Self::register_meta(tree, node, buckets),
            "script" => Self::register_script(tree, node, buckets),
            "style" => Self::register_style(tree, node, buckets),
            "link" => Self::register_link(tree, node, buckets),
            "noscript" => buckets.push(HeadCategory::Noscript, node),
            _ => buckets.push(HeadCategory::Others, node),
        }
    }

    fn register_meta(tree: &DomTree, node: NodeId, buckets: &mut HeadBuckets) {
        let category = if tree.has_attr(node, "charset") {
            HeadCategory::MetaCharset
        } else if tree.attr(node, "name") == Some("viewport") {
            HeadCategory::MetaViewport
        } else {
            HeadCategory::MetaOther
        };
        buckets.push(category, node);
    }

    fn register_script(tree: &DomTree, node: NodeId, buckets: &mut HeadBuckets) {
        let nomodule = tree.has_attr(node, "nomodule");
        if is_runtime_script(tree, node) {
            buckets.insert_keyed(HeadCategory::ScriptAmpRuntime, "", nomodule, node);
            return;
        }
        if is_viewer_script(tree, node) {
            buckets.insert_keyed(HeadCategory::ScriptAmpViewer, "", nomodule, node);
            return;
        }
        if let Some(name) = tree.attr(node, "custom-element") {
            let category = if is_render_delaying_extension(tree, node) {
                HeadCategory::ScriptRenderDelayingExtensions
            } else {
                HeadCategory::ScriptNonRenderDelayingExtensions
            };
            buckets.insert_keyed(category, name, nomodule, node);
            return;
        }
        let name = tree
            .attr(node, "custom-template")
            .or_else(|| tree.attr(node, "host-service"));
        match name {
            Some(name) => {
                buckets.insert_keyed(HeadCategory::ScriptNonRenderDelayingExtensions, name, nomodule, node);
            }
            None => buckets.push(HeadCategory::Others, node),
        }
    }

    fn register_style(tree: &DomTree, node: NodeId, buckets: &mut HeadBuckets) {
        let category = if tree.has_attr(node, "amp-runtime") {
            HeadCategory::StyleAmpRuntime
        } else if tree.has_attr(node, "amp-custom") {
            HeadCategory::StyleAmpCustom
        } else if tree.has_attr(node, AMP_BOILERPLATE) || tree.has_attr(node, AMP4ADS_BOILERPLATE) {
            HeadCategory::StyleAmpBoilerplate
        } else {
            HeadCategory::Others
        };
        buckets.push(category, node);
    }

    fn register_link(tree: &DomTree, node: NodeId, buckets: &mut HeadBuckets) {
        let rel = tree.attr(node, "rel").unwrap_or_default();
        if contains_word(rel, "stylesheet") {
            if tree.attr(node, "href").is_some_and(|href| href.ends_with("/v0.css")) {
                buckets.push(HeadCategory::LinkStyleAmpRuntime, node);
                return;
            }
            if !buckets.contains(HeadCategory::StyleAmpCustom) {
                buckets.push(HeadCategory::LinkStylesheetsBeforeAmpCustom, node);
                return;
            }
        }
        if contains_word(rel, "icon") {
            buckets.push(HeadCategory::LinkIcons, node);
            return;
        }
        let is_hint = ["preload", "prefetch", "dns-prefetch", "preconnect", "modulepreload"]
            .iter()
            .any(|hint| contains_word(rel, hint));
        if is_hint {
            let category = if tree.attr(node, "href").is_some_and(is_hint_for_amp) {
                HeadCategory::AmpResourceHints
            } else {
                HeadCategory::ResourceHintLinks
            };
            buckets.push(category, node);
            return;
        }
        buckets.push(HeadCategory::Others, node);
    }
}

impl Transformer for ReorderHead {
    fn kind(&self) -> TransformerKind {
        TransformerKind::ReorderHead
    }

    fn transform(&mut self, tree: &mut DomTree, _errors: &mut ErrorCollection) -> Result<(), OptimizerError> {
        let Some(head) = tree.head() else {
            return Ok(());
        };
        let children = tree.children(head).to_vec();
        if children.is_empty() {
            return Ok(());
        }

        let mut buckets = HeadBuckets::default();
        for &child in &children {
            Self::register(tree, child, &mut buckets);
        }
        for &child in &children {
            tree.detach(child);
        }
        let ordered = buckets.into_ordered();
        tracing::debug!(before = children.len(), after = ordered.len(), "reordered head");
        for node in ordered {
            tree.append_child(head, node);
        }
        Ok(())
    }
}

/// Whether the space-separated `list` contains `word`, ignoring ASCII case.
fn contains_word(list: &str, word: &str) -> bool {
    list.split_ascii_whitespace()
        .any(|token| token.eq_ignore_ascii_case(word))
}

/// Whether `href` points at the AMP cache, i.e. contains the cache domain
/// delimited by `/` or the ends of the string.
fn is_hint_for_amp(href: &str) -> bool {
    let href = href.to_ascii_lowercase();
    href.match_indices(AMP_CACHE_DOMAIN).any(|(start, _)| {
        let end = start + AMP_CACHE_DOMAIN.len();
        let before_ok = start == 0 || href.as_bytes()[start - 1] == b'/';
        let after_ok = end == href.len() || href.as_bytes()[end] == b'/';
        before_ok && after_ok
    })
}
