//! Tests for the transformation engine.

use std::cell::RefCell;
use std::rc::Rc;

use ampopt_common::net::StubTransport;
use ampopt_dom::DomTree;
use ampopt_optimizer::configuration::{AmpRuntimeCssConfiguration, RewriteAmpUrlsConfiguration};
use ampopt_optimizer::{
    Configuration, ErrorCollection, ErrorKind, OptimizerError, TransformationEngine, Transformer, TransformerKind,
    optimize,
};

/// Records the order in which it runs.
struct Recording {
    kind: TransformerKind,
    log: Rc<RefCell<Vec<TransformerKind>>>,
}

impl Transformer for Recording {
    fn kind(&self) -> TransformerKind {
        self.kind
    }

    fn transform(&mut self, _tree: &mut DomTree, _errors: &mut ErrorCollection) -> Result<(), OptimizerError> {
        self.log.borrow_mut().push(self.kind);
        Ok(())
    }
}

const DOCUMENT: &str = "<!doctype html><html amp><head>\
    <title>Hello</title>\
    <script async src=\"https://cdn.ampproject.org/v0.js\"></script>\
    <style amp-runtime></style>\
    <meta name=\"viewport\" content=\"width=device-width\">\
    <meta charset=\"utf-8\">\
    </head><body><amp-img data-hero src=\"/hero.jpg\" width=\"800\" height=\"600\"></amp-img></body></html>";

// ========== pipeline ==========

#[test]
fn test_engine_follows_configured_order() {
    let transport = StubTransport::new();
    let configuration = Configuration {
        transformers: vec![TransformerKind::ReorderHead, TransformerKind::AmpBoilerplate],
        ..Configuration::default()
    };
    let engine = TransformationEngine::new(&configuration, &transport);
    assert_eq!(
        engine.transformer_kinds(),
        vec![TransformerKind::ReorderHead, TransformerKind::AmpBoilerplate]
    );
    assert_eq!(engine.len(), 2);
}

#[test]
fn test_custom_transformers_run_in_insertion_order() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut engine = TransformationEngine::from_transformers(Vec::new());
    assert!(engine.is_empty());
    for kind in [TransformerKind::RewriteAmpUrls, TransformerKind::AmpBoilerplate] {
        engine.push(Box::new(Recording {
            kind,
            log: Rc::clone(&log),
        }));
    }

    let mut tree = DomTree::new();
    let mut errors = ErrorCollection::new();
    engine.optimize_dom(&mut tree, &mut errors).unwrap();
    assert_eq!(
        *log.borrow(),
        vec![TransformerKind::RewriteAmpUrls, TransformerKind::AmpBoilerplate]
    );
}

#[test]
fn test_configuration_error_stops_the_pipeline() {
    let transport = StubTransport::new();
    let configuration = Configuration {
        transformers: vec![TransformerKind::RewriteAmpUrls, TransformerKind::AmpBoilerplate],
        rewrite_amp_urls: RewriteAmpUrlsConfiguration {
            lts: true,
            rtv: true,
            ..RewriteAmpUrlsConfiguration::default()
        },
        ..Configuration::default()
    };
    let mut tree = DomTree::parse_html(DOCUMENT).unwrap();
    let result = optimize(&mut tree, &configuration, &transport);

    assert!(matches!(result, Err(OptimizerError::InvalidConfiguration(_))));
    assert!(!tree.to_html().contains("amp-boilerplate"));
}

// ========== full optimization ==========

#[test]
fn test_full_pipeline() {
    let transport = StubTransport::new();
    let configuration = Configuration {
        amp_runtime_css: AmpRuntimeCssConfiguration {
            version: "012101281735000".to_string(),
            styles: "html{overflow-x:hidden}".to_string(),
            ..AmpRuntimeCssConfiguration::default()
        },
        ..Configuration::default()
    };
    let mut tree = DomTree::parse_html(DOCUMENT).unwrap();
    let errors = optimize(&mut tree, &configuration, &transport).unwrap();
    assert!(errors.is_empty());
    assert!(transport.requests().is_empty());

    let head = tree.head().unwrap();
    let elements = tree.child_elements(head);
    assert!(tree.has_attr(elements[0], "charset"));
    assert_eq!(tree.attr(elements[1], "name"), Some("viewport"));

    let runtime_style = elements
        .iter()
        .copied()
        .find(|&id| tree.has_attr(id, "amp-runtime"))
        .unwrap();
    assert_eq!(tree.text_content(runtime_style), "html{overflow-x:hidden}");

    let boilerplate_position = elements
        .iter()
        .position(|&id| tree.has_attr(id, "amp-boilerplate"))
        .unwrap();
    let title_position = elements.iter().position(|&id| tree.is_element(id, "title")).unwrap();
    assert!(title_position < boilerplate_position);
    assert!(tree.is_element(*elements.last().unwrap(), "noscript"));

    let html = tree.to_html();
    assert!(html.starts_with("<!doctype html>"));
    assert!(html.contains("src=\"https://cdn.ampproject.org/v0.mjs\""));
    assert!(html.contains("i-amphtml-ssr"));
}

#[test]
fn test_diagnostics_are_collected() {
    let transport = StubTransport::new();
    let configuration = Configuration {
        transformers: vec![TransformerKind::AmpRuntimeCss],
        ..Configuration::default()
    };
    let mut tree = DomTree::parse_html("<html amp><head></head><body></body></html>").unwrap();
    let errors = optimize(&mut tree, &configuration, &transport).unwrap();
    assert_eq!(errors.count(), 1);
    assert!(errors.has(ErrorKind::CannotInlineRuntimeCss));
}
