//! Tests for the AmpRuntimeCss transformer.

use ampopt_common::net::{Response, StubTransport};
use ampopt_dom::{DomTree, NodeId};
use ampopt_optimizer::configuration::AmpRuntimeCssConfiguration;
use ampopt_optimizer::transformer::AmpRuntimeCss;
use ampopt_optimizer::{ErrorCollection, ErrorKind, Transformer};

const DOCUMENT: &str = "<html amp><head><style amp-runtime>stale</style></head><body></body></html>";
const METADATA_URL: &str = "https://cdn.ampproject.org/rtv/metadata";

fn run(html: &str, configuration: AmpRuntimeCssConfiguration, transport: &StubTransport) -> (DomTree, ErrorCollection) {
    let mut tree = DomTree::parse_html(html).unwrap();
    let mut errors = ErrorCollection::new();
    AmpRuntimeCss::new(configuration, transport)
        .transform(&mut tree, &mut errors)
        .unwrap();
    (tree, errors)
}

fn first_head_element(tree: &DomTree) -> NodeId {
    tree.child_elements(tree.head().unwrap())[0]
}

fn unavailable() -> Response {
    Response {
        status: 503,
        body: String::new(),
    }
}

// ========== inlining ==========

#[test]
fn test_inlines_configured_styles_without_fetching() {
    let transport = StubTransport::new();
    let configuration = AmpRuntimeCssConfiguration {
        version: "012101281735000".to_string(),
        styles: "html{overflow-x:hidden}".to_string(),
        ..AmpRuntimeCssConfiguration::default()
    };
    let (tree, errors) = run(DOCUMENT, configuration, &transport);

    assert!(errors.is_empty());
    assert!(transport.requests().is_empty());
    let style = first_head_element(&tree);
    assert_eq!(tree.text_content(style), "html{overflow-x:hidden}");
    assert_eq!(tree.attr(style, "i-amphtml-version"), Some("012101281735000"));
}

#[test]
fn test_fetches_styles_of_configured_version() {
    let transport = StubTransport::new().with_response(
        "https://cdn.ampproject.org/rtv/012101281735000/v0.css",
        Response::ok("body{margin:0}"),
    );
    let configuration = AmpRuntimeCssConfiguration {
        version: "012101281735000".to_string(),
        ..AmpRuntimeCssConfiguration::default()
    };
    let (tree, errors) = run(DOCUMENT, configuration, &transport);

    assert!(errors.is_empty());
    assert_eq!(tree.text_content(first_head_element(&tree)), "body{margin:0}");
}

#[test]
fn test_looks_up_current_version() {
    let transport = StubTransport::new()
        .with_response(METADATA_URL, Response::ok(r#"{"ampRuntimeVersion":"012101281735000"}"#))
        .with_response("https://cdn.ampproject.org/v0.css", Response::ok("body{margin:0}"));
    let (tree, errors) = run(DOCUMENT, AmpRuntimeCssConfiguration::default(), &transport);

    assert!(errors.is_empty());
    let style = first_head_element(&tree);
    assert_eq!(tree.attr(style, "i-amphtml-version"), Some("012101281735000"));
    assert_eq!(tree.text_content(style), "body{margin:0}");
    assert_eq!(transport.requests()[0], METADATA_URL);
}

#[test]
fn test_looks_up_canary_version() {
    let transport = StubTransport::new()
        .with_response(
            METADATA_URL,
            Response::ok(r#"{"ampRuntimeVersion":"012101281735000","diversions":["002101281735000"]}"#),
        )
        .with_response("https://cdn.ampproject.org/v0.css", Response::ok("body{}"));
    let configuration = AmpRuntimeCssConfiguration {
        canary: true,
        ..AmpRuntimeCssConfiguration::default()
    };
    let (tree, _) = run(DOCUMENT, configuration, &transport);
    assert_eq!(
        tree.attr(first_head_element(&tree), "i-amphtml-version"),
        Some("002101281735000")
    );
}

// ========== failures ==========

#[test]
fn test_unavailable_stylesheet_leaves_element_untouched() {
    let transport = StubTransport::new().with_response(
        "https://cdn.ampproject.org/rtv/012101281735000/v0.css",
        unavailable(),
    );
    let configuration = AmpRuntimeCssConfiguration {
        version: "012101281735000".to_string(),
        ..AmpRuntimeCssConfiguration::default()
    };
    let (tree, errors) = run(DOCUMENT, configuration, &transport);

    assert!(errors.is_empty());
    let style = first_head_element(&tree);
    assert!(tree.is_element(style, "style"));
    assert_eq!(tree.text_content(style), "stale");
}

#[test]
fn test_failed_version_lookup_falls_back_to_link() {
    let transport = StubTransport::new().with_response(METADATA_URL, unavailable());
    let (tree, errors) = run(DOCUMENT, AmpRuntimeCssConfiguration::default(), &transport);

    assert_eq!(errors.count(), 1);
    assert!(errors.has(ErrorKind::CannotInlineRuntimeCss));
    let head = tree.head().unwrap();
    let elements = tree.child_elements(head);
    assert_eq!(elements.len(), 1);
    assert!(tree.is_element(elements[0], "link"));
    assert_eq!(tree.attr(elements[0], "rel"), Some("stylesheet"));
    assert_eq!(tree.attr(elements[0], "href"), Some("https://cdn.ampproject.org/v0.css"));
}

#[test]
fn test_transport_failure_falls_back_to_link() {
    let transport = StubTransport::new();
    let configuration = AmpRuntimeCssConfiguration {
        version: "012101281735000".to_string(),
        ..AmpRuntimeCssConfiguration::default()
    };
    let (tree, errors) = run(DOCUMENT, configuration, &transport);

    assert!(errors.has(ErrorKind::CannotInlineRuntimeCss));
    let error = errors.iter().next().unwrap();
    assert!(error.message.contains("012101281735000"));
    assert!(error.element.as_deref().is_some_and(|element| element.starts_with("<style amp-runtime")));
    assert!(tree.is_element(first_head_element(&tree), "link"));
}

#[test]
fn test_missing_runtime_style_is_reported() {
    let transport = StubTransport::new();
    let (tree, errors) = run(
        "<html amp><head><title>t</title></head><body></body></html>",
        AmpRuntimeCssConfiguration::default(),
        &transport,
    );

    assert!(errors.has(ErrorKind::CannotInlineRuntimeCss));
    assert!(errors.iter().next().unwrap().message.contains("'latest'"));
    assert!(transport.requests().is_empty());
    assert_eq!(tree.child_elements(tree.head().unwrap()).len(), 1);
}
