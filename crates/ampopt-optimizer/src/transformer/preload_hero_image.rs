use ampopt_common::url::is_valid_non_data_url;
use ampopt_dom::{DomTree, NodeId};

use super::{Transformer, TransformerKind};
use crate::amp::{is_template, viewport_meta};
use crate::configuration::PreloadHeroImageConfiguration;
use crate::error::{Error, ErrorCollection, OptimizerError};
use crate::hero_image::{HeroImage, ImageDimensions};
use crate::inline_style;

/// Classes of a server-side rendered image.
const SSR_IMAGE_CLASS: &str = "i-amphtml-fill-content i-amphtml-replaced-content";

/// Attributes copied from the `amp-img` onto the rendered `<img>`.
const ATTRIBUTES_TO_COPY: &[&str] = &["alt", "attribution", "referrerpolicy", "src", "srcset", "sizes", "title"];

/// Attributes turned into inline style on the rendered `<img>`.
const ATTRIBUTES_TO_INLINE: &[&str] = &["object-fit", "object-position"];

/// Maximum number of images optimized as hero images.
pub const DATA_HERO_MAX: usize = 2;

/// Embeds that can show a placeholder image while loading.
const AMP_EMBEDS: &[&str] = &[
    "amp-ad",
    "amp-anim",
    "amp-brightcove",
    "amp-dailymotion",
    "amp-facebook",
    "amp-gfycat",
    "amp-iframe",
    "amp-imgur",
    "amp-instagram",
    "amp-pinterest",
    "amp-reddit",
    "amp-twitter",
    "amp-video",
    "amp-video-iframe",
    "amp-vimeo",
    "amp-wistia-player",
    "amp-youtube",
];

/// Speeds up rendering of hero images.
///
/// Hero images are the images marked `data-hero`, else up to two marked
/// `data-hero-candidate` before the second paragraph, else the first large
/// enough image near the top of the page. For each of them the lazy loading
/// is removed, a `<link rel=preload>` is added when the image has a `media`
/// attribute, and an `amp-img` gets a server-side rendered `<img>` child so
/// the browser can paint it before the runtime loads.
pub struct PreloadHeroImage {
    configuration: PreloadHeroImageConfiguration,
}

/// Images found while walking the body, by tier.
#[derive(Default)]
struct Candidates {
    heroes: Vec<HeroImage>,
    candidates: Vec<HeroImage>,
    fallbacks: Vec<HeroImage>,
}

impl PreloadHeroImage {
    /// A transformer with the given options.
    #[must_use]
    pub const fn new(configuration: PreloadHeroImageConfiguration) -> Self {
        Self { configuration }
    }

    fn find_hero_images(&self, tree: &DomTree) -> Vec<HeroImage> {
        let Some(body) = tree.body() else {
            return Vec::new();
        };
        let mut found = Candidates::default();
        let mut seen_paragraphs = 0;
        let mut node = Some(body);
        while let Some(id) = node {
            if tree.as_element(id).is_some() {
                if tree.is_element(id, "p") {
                    seen_paragraphs += 1;
                }
                self.classify(tree, id, seen_paragraphs, &mut found);
            }
            node = if is_template(tree, id) {
                tree.next_skipping_children(id, body)
            } else {
                tree.next_in_preorder(id, body)
            };
        }

        if !found.heroes.is_empty() {
            return found.heroes;
        }
        found.candidates.truncate(DATA_HERO_MAX);
        if !found.candidates.is_empty() {
            return found.candidates;
        }
        found.fallbacks.truncate(1);
        found.fallbacks
    }

    fn classify(&self, tree: &DomTree, id: NodeId, seen_paragraphs: usize, found: &mut Candidates) {
        if let Some(hero) = self.detect_with_attribute(tree, id, "data-hero") {
            found.heroes.push(hero);
            return;
        }
        if seen_paragraphs >= 2 || found.candidates.len() >= DATA_HERO_MAX {
            return;
        }
        if let Some(candidate) = self.detect_with_attribute(tree, id, "data-hero-candidate") {
            found.candidates.push(candidate);
            return;
        }
        if found.fallbacks.len() >= DATA_HERO_MAX {
            return;
        }
        if let Some(fallback) = Self::detect_fallback(tree, id) {
            // A placeholder is found both on its own and through its embed.
            let duplicate = fallback.element.is_some()
                && found.fallbacks.last().is_some_and(|previous| previous.element == fallback.element);
            if !duplicate {
                found.fallbacks.push(fallback);
            }
        }
    }

    fn detect_with_attribute(&self, tree: &DomTree, id: NodeId, attribute: &str) -> Option<HeroImage> {
        if !tree.has_attr(id, attribute) {
            return None;
        }
        let media = tree.attr(id, "media").unwrap_or_default();
        let srcset = tree.attr(id, "srcset").unwrap_or_default();
        let src = tree.attr(id, "src").unwrap_or_default();
        if tree.is_element(id, "amp-img") && is_valid_non_data_url(src) {
            return Some(HeroImage::new(src, media, srcset, Some(id)));
        }
        let placeholder = if is_amp_embed(tree, id) { placeholder_image(tree, id) } else { None };
        if placeholder.is_some() {
            return placeholder;
        }
        let background = self.background_image_url(tree, id)?;
        is_valid_non_data_url(&background).then(|| HeroImage::new(background, media, srcset, Some(id)))
    }

    /// The `background-image` URL of the inline style, or of the backed up
    /// inline style when the style attribute was already moved elsewhere.
    fn background_image_url(&self, tree: &DomTree, id: NodeId) -> Option<String> {
        tree.attr(id, "style")
            .and_then(inline_style::background_image_url)
            .or_else(|| {
                let backup = self.configuration.inline_style_backup_attribute.as_str();
                if backup.is_empty() {
                    return None;
                }
                tree.attr(id, backup).and_then(inline_style::background_image_url)
            })
    }

    fn detect_fallback(tree: &DomTree, id: NodeId) -> Option<HeroImage> {
        if tree
            .attr(id, "layout")
            .is_some_and(|layout| layout.eq_ignore_ascii_case("nodisplay"))
        {
            return None;
        }
        let media = tree.attr(id, "media").unwrap_or_default();
        if tree.is_element(id, "amp-img") || tree.is_element(id, "img") {
            let src = tree.attr(id, "src").unwrap_or_default();
            if !is_valid_non_data_url(src) || ImageDimensions::new(tree, id).is_tiny() {
                return None;
            }
            let srcset = tree.attr(id, "srcset").unwrap_or_default();
            return Some(HeroImage::new(src, media, srcset, Some(id)));
        }
        if tree.is_element(id, "amp-video") {
            let poster = tree.attr(id, "poster").unwrap_or_default();
            if !is_valid_non_data_url(poster) || ImageDimensions::new(tree, id).is_tiny() {
                return None;
            }
            return Some(HeroImage::new(poster, media, "", None));
        }
        if is_amp_embed(tree, id) {
            if tree.children(id).is_empty() || ImageDimensions::new(tree, id).is_tiny() {
                return None;
            }
            return placeholder_image(tree, id);
        }
        None
    }

    fn generate_preload(
        &self,
        tree: &mut DomTree,
        hero: &HeroImage,
        reference: &mut Option<NodeId>,
        errors: &mut ErrorCollection,
    ) {
        // Without a media query there is no telling whether the image is
        // hidden on some viewports.
        if hero.media.is_empty() {
            return;
        }
        if !hero.srcset.is_empty() && !self.configuration.preload_srcset {
            errors.add(Error::cannot_preload_srcset(hero.element.map(|id| tree.dump(id))));
            return;
        }
        let Some(head) = tree.head() else {
            return;
        };
        if has_existing_image_preload(tree, head, &hero.src) {
            return;
        }

        let mut attributes = vec![
            ("rel", "preload".to_string()),
            ("href", hero.src.clone()),
            ("as", "image".to_string()),
            ("data-hero", String::new()),
        ];
        if !hero.srcset.is_empty() {
            attributes.push(("imagesrcset", hero.srcset.clone()));
            if let Some(sizes) = hero.element.and_then(|id| tree.attr(id, "sizes")) {
                attributes.push(("imagesizes", sizes.to_string()));
            }
        }
        attributes.push(("media", hero.media.clone()));
        let preload = tree.create_element("link", attributes);

        if reference.is_none() {
            *reference = viewport_meta(tree);
        }
        match *reference {
            Some(anchor) => tree.insert_after(anchor, preload),
            None => tree.append_child(head, preload),
        }
        *reference = Some(preload);
    }

    fn generate_img(tree: &mut DomTree, hero: &HeroImage, errors: &mut ErrorCollection) {
        let Some(element) = hero.element.filter(|&id| tree.is_element(id, "amp-img")) else {
            return;
        };
        if tree.has_attr(element, "i-amphtml-ssr") {
            return;
        }

        let img = tree.create_element(
            "img",
            [("class", SSR_IMAGE_CLASS), ("decoding", "async")],
        );
        // A candidate that was never marked explicitly may lie outside the
        // viewport, so it keeps loading lazily.
        if !is_marked_as_hero(tree, element) {
            tree.set_attr(img, "loading", "lazy");
        }
        if !tree.has_attr(element, "data-hero") {
            tree.set_attr(element, "data-hero", "");
        }
        for &attribute in ATTRIBUTES_TO_COPY {
            if let Some(value) = tree.attr(element, attribute).map(str::to_string) {
                tree.set_attr(img, attribute, value);
            }
        }
        for &attribute in ATTRIBUTES_TO_INLINE {
            let Some(value) = tree.attr(element, attribute).map(str::to_string) else {
                continue;
            };
            if value.is_empty() {
                continue;
            }
            match inline_style::parse_declaration(attribute, &value) {
                Ok(rule) => {
                    let style = tree.attr(img, "style").unwrap_or_default();
                    let style = inline_style::add_declaration(style, rule);
                    tree.set_attr(img, "style", style);
                }
                Err(error) => {
                    tracing::debug!(%error, attribute, value, "not inlining attribute");
                    errors.add(Error::invalid_html_attribute(attribute, tree.dump(element)));
                }
            }
        }
        tree.set_attr(element, "i-amphtml-ssr", "");
        tree.append_child(element, img);

        let noscript = tree.descendants(element).into_iter().find(|&id| {
            tree.is_element(id, "noscript") && tree.children(id).iter().any(|&child| tree.is_element(child, "img"))
        });
        if let Some(noscript) = noscript {
            tree.detach(noscript);
        }
    }
}

impl Transformer for PreloadHeroImage {
    fn kind(&self) -> TransformerKind {
        TransformerKind::PreloadHeroImage
    }

    fn transform(&mut self, tree: &mut DomTree, errors: &mut ErrorCollection) -> Result<(), OptimizerError> {
        if !self.configuration.preload_hero_image {
            return Ok(());
        }
        let mut heroes = self.find_hero_images(tree);
        if heroes.len() > DATA_HERO_MAX {
            errors.add(Error::too_many_hero_images(DATA_HERO_MAX));
            heroes.truncate(DATA_HERO_MAX);
        }
        tracing::debug!(count = heroes.len(), "optimizing hero images");

        let mut reference = None;
        for hero in &heroes {
            remove_lazy_loading(tree, hero);
            self.generate_preload(tree, hero, &mut reference, errors);
            Self::generate_img(tree, hero, errors);
        }
        Ok(())
    }
}

fn is_amp_embed(tree: &DomTree, id: NodeId) -> bool {
    tree.tag_name(id).is_some_and(|tag| AMP_EMBEDS.contains(&tag))
}

/// The first image inside a `placeholder` child of `embed`, ignoring
/// templates.
fn placeholder_image(tree: &DomTree, embed: NodeId) -> Option<HeroImage> {
    let placeholder = tree
        .children(embed)
        .iter()
        .copied()
        .find(|&child| tree.has_attr(child, "placeholder"))?;

    let mut node = Some(placeholder);
    let mut image = None;
    while let Some(id) = node {
        if tree.is_element(id, "amp-img") || tree.is_element(id, "img") {
            image = Some(id);
            break;
        }
        node = if is_template(tree, id) {
            tree.next_skipping_children(id, placeholder)
        } else {
            tree.next_in_preorder(id, placeholder)
        };
    }

    let image = image?;
    let src = tree.attr(image, "src").unwrap_or_default();
    if !is_valid_non_data_url(src) {
        return None;
    }
    Some(HeroImage::new(
        src,
        tree.attr(embed, "media").unwrap_or_default(),
        tree.attr(image, "srcset").unwrap_or_default(),
        Some(image),
    ))
}

fn remove_lazy_loading(tree: &mut DomTree, hero: &HeroImage) {
    let Some(element) = hero.element else {
        return;
    };
    if tree.attr(element, "loading") == Some("lazy") && !tree.has_attr(element, "data-amp-story-player-poster-img") {
        let _ = tree.remove_attr(element, "loading");
    }
}

fn has_existing_image_preload(tree: &DomTree, head: NodeId, src: &str) -> bool {
    tree.children(head).iter().any(|&id| {
        tree.is_element(id, "link")
            && tree.attr(id, "rel") == Some("preload")
            && tree.attr(id, "as") == Some("image")
            && tree.attr(id, "href") == Some(src)
    })
}

/// Whether `element` or one of its ancestors below `<body>` carries
/// `data-hero`.
fn is_marked_as_hero(tree: &DomTree, element: NodeId) -> bool {
    std::iter::once(element)
        .chain(tree.ancestors(element))
        .take_while(|&id| !tree.is_element(id, "body") && !tree.is_element(id, "html"))
        .any(|id| tree.has_attr(id, "data-hero"))
}
