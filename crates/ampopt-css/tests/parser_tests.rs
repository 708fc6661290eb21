//! Integration tests for the CSS rule list parser.

use ampopt_css::{Document, ListItem, OutputFormat, Parser, Renderable, Selector, Settings, SourceError, Value};

fn parse(css: &str) -> Document {
    Parser::new(css).parse().unwrap()
}

fn parse_strict(css: &str) -> Result<Document, SourceError> {
    Parser::with_settings(css, Settings::create().be_strict(), 1).parse()
}

fn compact(document: &Document) -> String {
    document.render(&OutputFormat::create_compact()).unwrap()
}

// ========== Style rules ==========

#[test]
fn test_declaration_block() {
    let document = parse("h1, .title > span { color: red; margin: 0 auto }");
    assert_eq!(document.contents.len(), 1);
    let block = document.contents[0].as_declaration_block().unwrap();
    let selectors: Vec<&str> = block.selectors.iter().map(Selector::text).collect();
    assert_eq!(selectors, ["h1", ".title > span"]);
    assert_eq!(block.rules(None).len(), 2);
    assert_eq!(block.rules(Some("margin"))[0].name, "margin");
}

#[test]
fn test_property_names_lowercased_except_custom() {
    let document = parse("a { COLOR: red; --Brand: blue }");
    let block = document.contents[0].as_declaration_block().unwrap();
    let names: Vec<&str> = block.rules(None).iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, ["color", "--Brand"]);
}

#[test]
fn test_important_and_ie_hack() {
    let document = parse("a { color: red !IMPORTANT; width: 10px\\9; }");
    let block = document.contents[0].as_declaration_block().unwrap();
    let rules = block.rules(None);
    assert!(rules[0].is_important);
    assert_eq!(rules[1].ie_hacks, ["9"]);
    assert_eq!(compact(&document), "a{color:red !important;width:10px \\9;}");
}

#[test]
fn test_selector_with_comma_inside_attribute() {
    let document = parse("a[title=\"x, y\"], b { top: 0 }");
    let block = document.contents[0].as_declaration_block().unwrap();
    assert_eq!(block.selectors.len(), 2);
    assert_eq!(block.selectors[0].text(), "a[title=\"x, y\"]");
}

#[test]
fn test_comments_attach_to_following_item() {
    let document = parse("/* header */\na { top: 0 }");
    assert_eq!(document.contents[0].comments().len(), 1);
    assert_eq!(document.contents[0].comments()[0].text, " header ");
}

// ========== Lenient recovery ==========

#[test]
fn test_lenient_skips_malformed_declaration() {
    let document = parse("a { color: ; width: 1px }");
    let block = document.contents[0].as_declaration_block().unwrap();
    let names: Vec<&str> = block.rules(None).iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, ["width"]);
}

#[test]
fn test_lenient_skips_invalid_selector() {
    let document = parse("a{top:0} b%c { left: 0 } d{right:0}");
    assert_eq!(compact(&document), "a{top:0;}d{right:0;}");
}

#[test]
fn test_strict_rejects_invalid_selector() {
    let error = parse_strict("b%c { left: 0 }").unwrap_err();
    assert!(error.is_unexpected_token());
}

#[test]
fn test_strict_rejects_malformed_declaration() {
    assert!(parse_strict("a { color: ; }").is_err());
}

#[test]
fn test_stray_closing_brace() {
    // The stray brace swallows the selector that follows it.
    let document = parse("} a { top: 0 } b { left: 0 }");
    assert_eq!(compact(&document), "b{left:0;}");
    assert!(matches!(parse_strict("} a { top: 0 }"), Err(SourceError::Source { .. })));
}

#[test]
fn test_unterminated_block_at_end_of_input() {
    let document = parse("a { color: red");
    assert_eq!(compact(&document), "a{color:red;}");
    assert!(parse_strict("a { color: red").is_err());
}

// ========== At-rules ==========

#[test]
fn test_charset_import_namespace() {
    let document = parse(
        "@charset \"utf-8\";\n@import url(\"print.css\") print;\n@namespace svg url(http://www.w3.org/2000/svg);",
    );
    assert!(matches!(document.contents[0], ListItem::Charset(_)));
    let ListItem::Import(import) = &document.contents[1] else {
        panic!("expected an import");
    };
    assert_eq!(import.location.url.value, "print.css");
    assert_eq!(import.media_query.as_deref(), Some("print"));
    let ListItem::Namespace(namespace) = &document.contents[2] else {
        panic!("expected a namespace");
    };
    assert_eq!(namespace.prefix.as_deref(), Some("svg"));
    assert!(matches!(namespace.url, Value::Url(_)));
    assert_eq!(
        compact(&document),
        "@charset \"utf-8\";@import url(\"print.css\") print;@namespace svg url(\"http://www.w3.org/2000/svg\");"
    );
}

#[test]
fn test_charset_must_come_first() {
    let document = parse("a{top:0}\n@charset \"utf-8\";");
    assert_eq!(document.contents.len(), 1);
    assert!(parse_strict("a{top:0}\n@charset \"utf-8\";").unwrap_err().is_unexpected_token());
}

#[test]
fn test_charset_only_in_root() {
    let error = parse_strict("@media print { @charset \"utf-8\"; }").unwrap_err();
    assert!(error.to_string().contains("@charset may only occur in root document"));
}

#[test]
fn test_namespace_url_must_be_string_or_url() {
    assert!(parse_strict("@namespace svg 12px;").unwrap_err().is_unexpected_token());
    let document = parse("@namespace \"http://www.w3.org/1999/xhtml\";");
    let ListItem::Namespace(namespace) = &document.contents[0] else {
        panic!("expected a namespace");
    };
    assert_eq!(namespace.prefix, None);
}

#[test]
fn test_media_block_nests_rules() {
    let document = parse("@media (max-width: 600px) { a { top: 0 } @media print { b { left: 0 } } } c { right: 0 }");
    assert_eq!(document.contents.len(), 2);
    let ListItem::AtRuleBlockList(media) = &document.contents[0] else {
        panic!("expected @media");
    };
    assert_eq!(media.name, "media");
    assert_eq!(media.args, "(max-width: 600px)");
    assert_eq!(document.all_declaration_blocks().len(), 3);
}

#[test]
fn test_font_face_is_rule_set() {
    let document = parse("@font-face { font-family: \"Open Sans\"; src: url(a.woff2) format(\"woff2\") }");
    let ListItem::AtRuleSet(font_face) = &document.contents[0] else {
        panic!("expected @font-face");
    };
    assert_eq!(font_face.name, "font-face");
    assert_eq!(font_face.rules(None).len(), 2);
}

#[test]
fn test_vendor_keyframes() {
    let document = parse("@-webkit-keyframes spin { from { opacity: 0 } 50% { opacity: .5 } to { opacity: 1 } }");
    let ListItem::KeyFrame(keyframe) = &document.contents[0] else {
        panic!("expected keyframes");
    };
    assert_eq!(keyframe.vendor_key_frame, "-webkit-keyframes");
    assert_eq!(keyframe.animation_name, "spin");
    assert_eq!(keyframe.contents.len(), 3);
    // Keyframe blocks are not style rules of the document.
    assert!(document.all_declaration_blocks().is_empty());
}

#[test]
fn test_keyframe_selector_validation() {
    let document = parse("@keyframes x { 150% { top: 0 } to { top: 1px } }");
    let ListItem::KeyFrame(keyframe) = &document.contents[0] else {
        panic!("expected keyframes");
    };
    assert_eq!(keyframe.contents.len(), 1);
}

#[test]
fn test_unmatched_parenthesis_in_prelude() {
    let error = parse_strict("@media (min-width: 1px { a { top: 0 } }").unwrap_err();
    assert!(matches!(error, SourceError::Source { .. }));

    let document = parse("@media (min-width: 1px { a { top: 0 } } b { left: 0 }");
    assert_eq!(compact(&document), "b{left:0;}");
}

#[test]
fn test_unterminated_nested_list() {
    assert!(matches!(parse_strict("@media print { a { top: 0 }"), Err(SourceError::Source { .. })));
    let document = parse("@media print { a { top: 0 }");
    assert_eq!(document.all_declaration_blocks().len(), 1);
}

#[test]
fn test_line_numbers() {
    let document = parse("a { top: 0 }\n\nb {\n  left: 0;\n}");
    let blocks = document.all_declaration_blocks();
    assert_eq!(blocks[1].rule_set.line_no, 3);
    assert_eq!(blocks[1].rules(None)[0].line_no, 4);
}
