use ampopt_dom::{DomTree, NodeId};

use super::{Transformer, TransformerKind};
use crate::amp::{
    ALL_AMP4ADS, ALL_AMP4EMAIL, ALL_BOILERPLATES, AMP_BOILERPLATE, AMP4ADS_AND_AMP4EMAIL_BOILERPLATE_CSS,
    AMP4ADS_BOILERPLATE, AMP4EMAIL_BOILERPLATE, BOILERPLATE_CSS, BOILERPLATE_NOSCRIPT_CSS, NO_BOILERPLATE_ATTRIBUTE,
};
use crate::error::{ErrorCollection, OptimizerError};

/// Replaces the boilerplate `<style>` in `<head>` with a fresh copy matching
/// the document's format.
///
/// Existing boilerplate styles are removed first, together with an
/// enclosing `<noscript>`. Documents marked `i-amphtml-no-boilerplate` are
/// left without boilerplate. The standard format additionally receives a
/// `<noscript><style amp-boilerplate>` fallback.
#[derive(Debug, Clone, Copy, Default)]
pub struct AmpBoilerplate;

impl AmpBoilerplate {
    fn remove_boilerplate(tree: &mut DomTree, head: NodeId) {
        let styles: Vec<NodeId> = tree
            .descendants(head)
            .into_iter()
            .filter(|&id| tree.is_element(id, "style"))
            .filter(|&id| ALL_BOILERPLATES.iter().any(|attr| tree.has_attr(id, attr)))
            .collect();
        for style in styles {
            match tree.parent(style) {
                Some(parent) if tree.is_element(parent, "noscript") => tree.detach(parent),
                _ => tree.detach(style),
            }
        }
    }

    /// Later matches win, so an email document marked as ads as well gets
    /// the email boilerplate.
    fn boilerplate_for(tree: &DomTree, html: NodeId) -> (&'static str, &'static str) {
        let mut selected = (AMP_BOILERPLATE, BOILERPLATE_CSS);
        if ALL_AMP4ADS.iter().any(|attr| tree.has_attr(html, attr)) {
            selected = (AMP4ADS_BOILERPLATE, AMP4ADS_AND_AMP4EMAIL_BOILERPLATE_CSS);
        }
        if ALL_AMP4EMAIL.iter().any(|attr| tree.has_attr(html, attr)) {
            selected = (AMP4EMAIL_BOILERPLATE, AMP4ADS_AND_AMP4EMAIL_BOILERPLATE_CSS);
        }
        selected
    }

    fn append_style(tree: &mut DomTree, parent: NodeId, attribute: &str, css: &str) {
        let style = tree.create_element("style", [(attribute, "")]);
        tree.append_child(parent, style);
        let text = tree.create_text(css);
        tree.append_child(style, text);
    }
}

impl Transformer for AmpBoilerplate {
    fn kind(&self) -> TransformerKind {
        TransformerKind::AmpBoilerplate
    }

    fn transform(&mut self, tree: &mut DomTree, _errors: &mut ErrorCollection) -> Result<(), OptimizerError> {
        let (Some(html), Some(head)) = (tree.document_element(), tree.head()) else {
            return Ok(());
        };
        Self::remove_boilerplate(tree, head);
        if tree.has_attr(html, NO_BOILERPLATE_ATTRIBUTE) {
            return Ok(());
        }

        let (attribute, css) = Self::boilerplate_for(tree, html);
        tracing::debug!(attribute, "adding boilerplate");
        Self::append_style(tree, head, attribute, css);
        if attribute == AMP_BOILERPLATE {
            let noscript = tree.create_empty_element("noscript");
            tree.append_child(head, noscript);
            Self::append_style(tree, noscript, AMP_BOILERPLATE, BOILERPLATE_NOSCRIPT_CSS);
        }
        Ok(())
    }
}
