//! Tests for the PreloadHeroImage transformer.

use ampopt_dom::{DomTree, NodeId};
use ampopt_optimizer::configuration::PreloadHeroImageConfiguration;
use ampopt_optimizer::transformer::{DATA_HERO_MAX, PreloadHeroImage};
use ampopt_optimizer::{ErrorCollection, ErrorKind, Transformer};
use quickcheck_macros::quickcheck;

fn document(body: &str) -> String {
    format!(
        "<html amp><head><meta charset=\"utf-8\"><meta name=\"viewport\" content=\"width=device-width\">\
         <title>t</title></head><body>{body}</body></html>"
    )
}

fn run_with(body: &str, configuration: PreloadHeroImageConfiguration) -> (DomTree, ErrorCollection) {
    let mut tree = DomTree::parse_html(&document(body)).unwrap();
    let mut errors = ErrorCollection::new();
    PreloadHeroImage::new(configuration)
        .transform(&mut tree, &mut errors)
        .unwrap();
    (tree, errors)
}

fn run(body: &str) -> (DomTree, ErrorCollection) {
    run_with(body, PreloadHeroImageConfiguration::default())
}

fn find(tree: &DomTree, tag: &str) -> Vec<NodeId> {
    tree.descendants(tree.root())
        .into_iter()
        .filter(|&id| tree.is_element(id, tag))
        .collect()
}

fn preloads(tree: &DomTree) -> Vec<NodeId> {
    tree.child_elements(tree.head().unwrap())
        .into_iter()
        .filter(|&id| tree.is_element(id, "link") && tree.attr(id, "rel") == Some("preload"))
        .collect()
}

fn ssr_rendered(tree: &DomTree) -> usize {
    find(tree, "amp-img")
        .into_iter()
        .filter(|&id| tree.has_attr(id, "i-amphtml-ssr"))
        .count()
}

// ========== data-hero ==========

#[test]
fn test_hero_image_gets_preload_and_img() {
    let (tree, errors) = run(
        "<amp-img data-hero src=\"/hero.jpg\" media=\"(min-width: 600px)\" width=\"800\" height=\"600\"></amp-img>",
    );
    assert!(errors.is_empty());

    let head = tree.head().unwrap();
    let elements = tree.child_elements(head);
    assert_eq!(tree.attr(elements[1], "name"), Some("viewport"));
    let preload = elements[2];
    assert_eq!(tree.attr(preload, "rel"), Some("preload"));
    assert_eq!(tree.attr(preload, "href"), Some("/hero.jpg"));
    assert_eq!(tree.attr(preload, "as"), Some("image"));
    assert_eq!(tree.attr(preload, "media"), Some("(min-width: 600px)"));
    assert!(tree.has_attr(preload, "data-hero"));

    let amp_img = find(&tree, "amp-img")[0];
    assert!(tree.has_attr(amp_img, "i-amphtml-ssr"));
    let img = find(&tree, "img")[0];
    assert_eq!(tree.parent(img), Some(amp_img));
    assert_eq!(tree.attr(img, "src"), Some("/hero.jpg"));
    assert_eq!(tree.attr(img, "decoding"), Some("async"));
    assert_eq!(
        tree.attr(img, "class"),
        Some("i-amphtml-fill-content i-amphtml-replaced-content")
    );
    assert!(!tree.has_attr(img, "loading"));
}

#[test]
fn test_hero_without_media_is_not_preloaded() {
    let (tree, errors) = run("<amp-img data-hero src=\"/hero.jpg\" width=\"800\" height=\"600\"></amp-img>");
    assert!(errors.is_empty());
    assert!(preloads(&tree).is_empty());
    assert_eq!(ssr_rendered(&tree), 1);
}

#[test]
fn test_too_many_hero_images() {
    let (tree, errors) = run(
        "<amp-img data-hero src=\"/1.jpg\"></amp-img>\
         <amp-img data-hero src=\"/2.jpg\"></amp-img>\
         <amp-img data-hero src=\"/3.jpg\"></amp-img>",
    );
    assert!(errors.has(ErrorKind::TooManyHeroImages));
    assert_eq!(ssr_rendered(&tree), DATA_HERO_MAX);
    assert!(!tree.has_attr(find(&tree, "amp-img")[2], "i-amphtml-ssr"));
}

#[quickcheck]
fn prop_hero_images_are_capped(count: u8) -> bool {
    let count = usize::from(count % 8);
    let body: String = (0..count)
        .map(|index| format!("<amp-img data-hero src=\"/{index}.jpg\" media=\"all\"></amp-img>"))
        .collect();
    let (tree, errors) = run(&body);
    ssr_rendered(&tree) == count.min(DATA_HERO_MAX)
        && preloads(&tree).len() == count.min(DATA_HERO_MAX)
        && errors.has(ErrorKind::TooManyHeroImages) == (count > DATA_HERO_MAX)
}

#[test]
fn test_preloads_follow_each_other_after_viewport() {
    let (tree, _) = run(
        "<amp-img data-hero src=\"/1.jpg\" media=\"all\"></amp-img>\
         <amp-img data-hero src=\"/2.jpg\" media=\"all\"></amp-img>",
    );
    let elements = tree.child_elements(tree.head().unwrap());
    assert_eq!(tree.attr(elements[2], "href"), Some("/1.jpg"));
    assert_eq!(tree.attr(elements[3], "href"), Some("/2.jpg"));
    assert!(tree.is_element(elements[4], "title"));
}

#[test]
fn test_existing_preload_is_not_duplicated() {
    let html = "<html amp><head><meta name=\"viewport\" content=\"width=device-width\">\
                <link rel=\"preload\" as=\"image\" href=\"/hero.jpg\"></head>\
                <body><amp-img data-hero src=\"/hero.jpg\" media=\"all\"></amp-img></body></html>";
    let mut tree = DomTree::parse_html(html).unwrap();
    let mut errors = ErrorCollection::new();
    PreloadHeroImage::new(PreloadHeroImageConfiguration::default())
        .transform(&mut tree, &mut errors)
        .unwrap();
    assert_eq!(preloads(&tree).len(), 1);
}

#[test]
fn test_lazy_loading_is_removed() {
    let (tree, _) = run("<amp-img data-hero loading=\"lazy\" src=\"/hero.jpg\"></amp-img>");
    assert!(!tree.has_attr(find(&tree, "amp-img")[0], "loading"));
}

#[test]
fn test_story_player_poster_keeps_lazy_loading() {
    let (tree, _) = run(
        "<amp-img data-hero loading=\"lazy\" data-amp-story-player-poster-img src=\"/poster.jpg\"></amp-img>",
    );
    assert_eq!(tree.attr(find(&tree, "amp-img")[0], "loading"), Some("lazy"));
}

// ========== srcset ==========

#[test]
fn test_srcset_is_not_preloaded_by_default() {
    let (tree, errors) = run(
        "<amp-img data-hero src=\"/hero.jpg\" srcset=\"/hero-2x.jpg 2x\" media=\"all\"></amp-img>",
    );
    assert!(errors.has(ErrorKind::CannotPreloadImage));
    assert!(preloads(&tree).is_empty());
    let img = find(&tree, "img")[0];
    assert_eq!(tree.attr(img, "srcset"), Some("/hero-2x.jpg 2x"));
}

#[test]
fn test_srcset_preload_when_enabled() {
    let configuration = PreloadHeroImageConfiguration {
        preload_srcset: true,
        ..PreloadHeroImageConfiguration::default()
    };
    let (tree, errors) = run_with(
        "<amp-img data-hero src=\"/hero.jpg\" srcset=\"/hero-2x.jpg 2x\" sizes=\"100vw\" media=\"all\"></amp-img>",
        configuration,
    );
    assert!(errors.is_empty());
    let preload = preloads(&tree)[0];
    assert_eq!(tree.attr(preload, "imagesrcset"), Some("/hero-2x.jpg 2x"));
    assert_eq!(tree.attr(preload, "imagesizes"), Some("100vw"));
}

// ========== candidates and fallbacks ==========

#[test]
fn test_candidates_only_before_second_paragraph() {
    let (tree, _) = run(
        "<p>one</p><amp-img data-hero-candidate src=\"/a.jpg\"></amp-img>\
         <p>two</p><amp-img data-hero-candidate src=\"/b.jpg\"></amp-img>",
    );
    let images = find(&tree, "amp-img");
    assert!(tree.has_attr(images[0], "i-amphtml-ssr"));
    assert!(!tree.has_attr(images[1], "i-amphtml-ssr"));
}

#[test]
fn test_data_hero_excludes_candidates() {
    let (tree, _) = run(
        "<amp-img data-hero-candidate src=\"/a.jpg\"></amp-img>\
         <amp-img data-hero src=\"/b.jpg\"></amp-img>",
    );
    let images = find(&tree, "amp-img");
    assert!(!tree.has_attr(images[0], "i-amphtml-ssr"));
    assert!(tree.has_attr(images[1], "i-amphtml-ssr"));
}

#[test]
fn test_fallback_skips_tiny_images() {
    let (tree, _) = run(
        "<amp-img src=\"/icon.png\" width=\"32\" height=\"32\"></amp-img>\
         <amp-img src=\"/large.jpg\" width=\"800\" height=\"600\"></amp-img>",
    );
    let images = find(&tree, "amp-img");
    assert!(!tree.has_attr(images[0], "i-amphtml-ssr"));
    assert!(tree.has_attr(images[1], "i-amphtml-ssr"));
    assert!(tree.has_attr(images[1], "data-hero"));
    // Never marked explicitly, so the rendered image still loads lazily.
    let img = tree.child_elements(images[1])[0];
    assert_eq!(tree.attr(img, "loading"), Some("lazy"));
}

#[test]
fn test_only_one_fallback_is_used() {
    let (tree, _) = run(
        "<amp-img src=\"/a.jpg\" width=\"800\" height=\"600\"></amp-img>\
         <amp-img src=\"/b.jpg\" width=\"800\" height=\"600\"></amp-img>",
    );
    assert_eq!(ssr_rendered(&tree), 1);
}

#[test]
fn test_fallback_skips_nodisplay_and_templates() {
    let (tree, _) = run(
        "<amp-img layout=\"nodisplay\" src=\"/hidden.jpg\"></amp-img>\
         <template><amp-img src=\"/templated.jpg\" width=\"800\" height=\"600\"></amp-img></template>\
         <amp-img src=\"/visible.jpg\" width=\"800\" height=\"600\"></amp-img>",
    );
    let rendered: Vec<NodeId> = find(&tree, "amp-img")
        .into_iter()
        .filter(|&id| tree.has_attr(id, "i-amphtml-ssr"))
        .collect();
    assert_eq!(rendered.len(), 1);
    assert_eq!(tree.attr(rendered[0], "src"), Some("/visible.jpg"));
}

#[test]
fn test_video_poster_is_preloaded() {
    let (tree, _) = run(
        "<amp-video poster=\"/poster.jpg\" media=\"all\" width=\"800\" height=\"600\"></amp-video>",
    );
    let preload = preloads(&tree)[0];
    assert_eq!(tree.attr(preload, "href"), Some("/poster.jpg"));
    assert!(find(&tree, "img").is_empty());
}

#[test]
fn test_embed_placeholder_is_used() {
    let (tree, _) = run(
        "<amp-iframe data-hero src=\"https://example.com/frame\" width=\"800\" height=\"600\">\
         <amp-img placeholder src=\"/placeholder.jpg\" layout=\"fill\"></amp-img>\
         </amp-iframe>",
    );
    let placeholder = find(&tree, "amp-img")[0];
    assert!(tree.has_attr(placeholder, "i-amphtml-ssr"));
}

#[test]
fn test_background_image_of_inline_style() {
    let (tree, _) = run("<div data-hero media=\"all\" style=\"background-image: url('/bg.jpg')\"></div>");
    let preload = preloads(&tree)[0];
    assert_eq!(tree.attr(preload, "href"), Some("/bg.jpg"));
}

#[test]
fn test_background_image_of_backup_attribute() {
    let configuration = PreloadHeroImageConfiguration {
        inline_style_backup_attribute: "data-amp-original-style".to_string(),
        ..PreloadHeroImageConfiguration::default()
    };
    let (tree, _) = run_with(
        "<div data-hero media=\"all\" data-amp-original-style=\"background-image:url(/bg.jpg)\"></div>",
        configuration,
    );
    assert_eq!(tree.attr(preloads(&tree)[0], "href"), Some("/bg.jpg"));
}

// ========== rendered image ==========

#[test]
fn test_object_fit_is_inlined() {
    let (tree, errors) = run(
        "<amp-img data-hero src=\"/hero.jpg\" object-fit=\"cover\" alt=\"Hero\"></amp-img>",
    );
    assert!(errors.is_empty());
    let img = find(&tree, "img")[0];
    assert_eq!(tree.attr(img, "style"), Some("object-fit:cover"));
    assert_eq!(tree.attr(img, "alt"), Some("Hero"));
}

#[test]
fn test_invalid_object_fit_is_reported() {
    let (tree, errors) = run(
        "<amp-img data-hero src=\"/hero.jpg\" object-fit=\"cover; color: red\"></amp-img>",
    );
    assert!(errors.has(ErrorKind::InvalidHtmlAttribute));
    let img = find(&tree, "img")[0];
    assert!(!tree.has_attr(img, "style"));
}

#[test]
fn test_noscript_fallback_is_removed() {
    let (tree, _) = run(
        "<amp-img data-hero src=\"/hero.jpg\"><noscript><img src=\"/hero.jpg\"></noscript></amp-img>",
    );
    assert!(find(&tree, "noscript").is_empty());
    assert_eq!(find(&tree, "img").len(), 1);
}

#[test]
fn test_disabled_transformer_changes_nothing() {
    let body = "<amp-img data-hero src=\"/hero.jpg\" media=\"all\"></amp-img>";
    let configuration = PreloadHeroImageConfiguration {
        preload_hero_image: false,
        ..PreloadHeroImageConfiguration::default()
    };
    let (tree, errors) = run_with(body, configuration);
    assert!(errors.is_empty());
    assert_eq!(tree.to_html(), DomTree::parse_html(&document(body)).unwrap().to_html());
}
