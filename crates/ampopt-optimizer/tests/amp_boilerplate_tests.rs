//! Tests for the AmpBoilerplate transformer.

use ampopt_dom::{DomTree, NodeId};
use ampopt_optimizer::amp::{AMP4ADS_AND_AMP4EMAIL_BOILERPLATE_CSS, BOILERPLATE_CSS, BOILERPLATE_NOSCRIPT_CSS};
use ampopt_optimizer::transformer::AmpBoilerplate;
use ampopt_optimizer::{ErrorCollection, Transformer};

fn run(html: &str) -> DomTree {
    let mut tree = DomTree::parse_html(html).unwrap();
    let mut errors = ErrorCollection::new();
    AmpBoilerplate.transform(&mut tree, &mut errors).unwrap();
    assert!(errors.is_empty());
    tree
}

fn head_elements(tree: &DomTree) -> Vec<NodeId> {
    tree.child_elements(tree.head().unwrap())
}

// ========== standard documents ==========

#[test]
fn test_adds_boilerplate_and_noscript_fallback() {
    let tree = run("<html amp><head><title>t</title></head><body></body></html>");
    let elements = head_elements(&tree);
    assert_eq!(elements.len(), 3);

    let style = elements[1];
    assert!(tree.is_element(style, "style"));
    assert!(tree.has_attr(style, "amp-boilerplate"));
    assert_eq!(tree.text_content(style), BOILERPLATE_CSS);

    let noscript = elements[2];
    assert!(tree.is_element(noscript, "noscript"));
    let fallback = tree.child_elements(noscript)[0];
    assert!(tree.has_attr(fallback, "amp-boilerplate"));
    assert_eq!(tree.text_content(fallback), BOILERPLATE_NOSCRIPT_CSS);
}

#[test]
fn test_replaces_existing_boilerplate() {
    let tree = run(
        "<html amp><head>\
         <style amp-boilerplate>old</style>\
         <noscript><style amp-boilerplate>old</style></noscript>\
         </head><body></body></html>",
    );
    let elements = head_elements(&tree);
    assert_eq!(elements.len(), 2);
    assert_eq!(tree.text_content(elements[0]), BOILERPLATE_CSS);
    assert!(!tree.to_html().contains("old"));
}

// ========== ads and email ==========

#[test]
fn test_amp4ads_boilerplate_has_no_noscript() {
    let mut tree = DomTree::new();
    let html = tree.create_element("html", [("⚡4ads", "")]);
    let head = tree.create_empty_element("head");
    tree.append_child(tree.root(), html);
    tree.append_child(html, head);
    let mut errors = ErrorCollection::new();
    AmpBoilerplate.transform(&mut tree, &mut errors).unwrap();

    let elements = head_elements(&tree);
    assert_eq!(elements.len(), 1);
    assert!(tree.has_attr(elements[0], "amp4ads-boilerplate"));
    assert_eq!(tree.text_content(elements[0]), AMP4ADS_AND_AMP4EMAIL_BOILERPLATE_CSS);
}

#[test]
fn test_amp4email_wins_over_amp4ads() {
    let tree = run("<html amp4ads amp4email><head></head><body></body></html>");
    let elements = head_elements(&tree);
    assert_eq!(elements.len(), 1);
    assert!(tree.has_attr(elements[0], "amp4email-boilerplate"));
}

#[test]
fn test_replaces_ads_boilerplate_with_standard_one() {
    let tree = run("<html amp><head><style amp4ads-boilerplate>body{visibility:hidden}</style></head></html>");
    let elements = head_elements(&tree);
    assert!(tree.has_attr(elements[0], "amp-boilerplate"));
    assert!(!tree.has_attr(elements[0], "amp4ads-boilerplate"));
}

// ========== no boilerplate ==========

#[test]
fn test_no_boilerplate_marker_removes_all_boilerplate() {
    let tree = run(
        "<html amp i-amphtml-no-boilerplate><head>\
         <style amp-boilerplate>old</style>\
         <noscript><style amp-boilerplate>old</style></noscript>\
         <style amp-custom>p{}</style>\
         </head><body></body></html>",
    );
    let elements = head_elements(&tree);
    assert_eq!(elements.len(), 1);
    assert!(tree.has_attr(elements[0], "amp-custom"));
}

#[test]
fn test_document_without_head_is_untouched() {
    let mut tree = DomTree::new();
    let html = tree.create_element("html", [("amp", "")]);
    tree.append_child(tree.root(), html);
    let before = tree.to_html();

    let mut errors = ErrorCollection::new();
    AmpBoilerplate.transform(&mut tree, &mut errors).unwrap();
    assert_eq!(tree.to_html(), before);
}
