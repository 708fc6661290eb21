//! Hero image candidates and the size heuristic used to pick them.

use ampopt_dom::{DomTree, NodeId};

/// Images narrower or shorter than this many pixels are decorative.
pub const DEFAULT_TINY_THRESHOLD: f64 = 150.0;

/// An image worth preloading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeroImage {
    /// URL of the image.
    pub src: String,
    /// Media query of the element, empty when it has none.
    pub media: String,
    /// Responsive sources, empty when there are none.
    pub srcset: String,
    /// The element the image came from, if it is an image element.
    pub element: Option<NodeId>,
}

impl HeroImage {
    /// A hero image taken from `element`.
    #[must_use]
    pub fn new(src: impl Into<String>, media: impl Into<String>, srcset: impl Into<String>, element: Option<NodeId>) -> Self {
        Self {
            src: src.into(),
            media: media.into(),
            srcset: srcset.into(),
            element,
        }
    }
}

/// A `width` or `height` attribute value.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Dimension {
    /// Absent attribute.
    None,
    /// The keyword `auto`.
    Auto,
    /// A length in CSS pixels.
    Pixels(f64),
    /// A length in some other unit.
    Other,
}

impl Dimension {
    fn parse(value: Option<&str>) -> Self {
        let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
            return Self::None;
        };
        if value.eq_ignore_ascii_case("auto") {
            return Self::Auto;
        }
        let number = value.strip_suffix("px").unwrap_or(value);
        number.parse::<f64>().map_or(Self::Other, Self::Pixels)
    }

    fn is_below(self, threshold: f64) -> bool {
        matches!(self, Self::Pixels(pixels) if pixels < threshold)
    }
}

/// [AMP layout system](https://amp.dev/documentation/guides-and-tutorials/learn/amp-html-layout/)
///
/// Width, height and layout of an element, as far as its attributes tell.
#[derive(Debug, Clone, Copy)]
pub struct ImageDimensions<'a> {
    tree: &'a DomTree,
    element: NodeId,
}

impl<'a> ImageDimensions<'a> {
    /// Dimensions of `element`.
    #[must_use]
    pub const fn new(tree: &'a DomTree, element: NodeId) -> Self {
        Self { tree, element }
    }

    fn layout(&self) -> String {
        self.tree
            .attr(self.element, "layout")
            .unwrap_or_default()
            .to_ascii_lowercase()
    }

    /// Whether the element renders smaller than `threshold` pixels in either
    /// direction.
    ///
    /// `layout=fill` takes the size of the parent. `layout=responsive` and
    /// `layout=intrinsic` scale with the container, so only their aspect ratio
    /// is known and they never count as tiny. Elements without dimensions
    /// cannot be judged and are not tiny either.
    #[must_use]
    pub fn is_tiny_below(&self, threshold: f64) -> bool {
        let layout = self.layout();
        if layout == "fill" {
            return self
                .tree
                .parent(self.element)
                .filter(|&parent| self.tree.as_element(parent).is_some())
                .is_some_and(|parent| Self::new(self.tree, parent).is_tiny_below(threshold));
        }
        if layout == "responsive" || layout == "intrinsic" {
            return false;
        }

        let width = Dimension::parse(self.tree.attr(self.element, "width"));
        let height = Dimension::parse(self.tree.attr(self.element, "height"));
        if width == Dimension::None && height == Dimension::None {
            return false;
        }
        // `fixed-height` sets `width=auto`, so only the height counts.
        if width == Dimension::Auto {
            return height.is_below(threshold);
        }
        width.is_below(threshold) || height.is_below(threshold)
    }

    /// [`Self::is_tiny_below`] with [`DEFAULT_TINY_THRESHOLD`].
    #[must_use]
    pub fn is_tiny(&self) -> bool {
        self.is_tiny_below(DEFAULT_TINY_THRESHOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(attrs: &[(&str, &str)]) -> (DomTree, NodeId) {
        let mut tree = DomTree::new();
        let parent = tree.create_element("div", [("width", "100"), ("height", "100")]);
        tree.append_child(tree.root(), parent);
        let img = tree.create_element("amp-img", attrs.iter().copied());
        tree.append_child(parent, img);
        (tree, img)
    }

    #[test]
    fn test_small_fixed_image_is_tiny() {
        let (tree, img) = image(&[("width", "100"), ("height", "300")]);
        assert!(ImageDimensions::new(&tree, img).is_tiny());
    }

    #[test]
    fn test_large_image_is_not_tiny() {
        let (tree, img) = image(&[("width", "400px"), ("height", "300")]);
        assert!(!ImageDimensions::new(&tree, img).is_tiny());
    }

    #[test]
    fn test_responsive_image_is_never_tiny() {
        let (tree, img) = image(&[("width", "4"), ("height", "3"), ("layout", "responsive")]);
        assert!(!ImageDimensions::new(&tree, img).is_tiny());
    }

    #[test]
    fn test_fill_uses_parent_size() {
        let (tree, img) = image(&[("layout", "fill")]);
        assert!(ImageDimensions::new(&tree, img).is_tiny());
    }

    #[test]
    fn test_fixed_height_checks_height_only() {
        let (tree, img) = image(&[("width", "auto"), ("height", "400"), ("layout", "fixed-height")]);
        assert!(!ImageDimensions::new(&tree, img).is_tiny());
    }

    #[test]
    fn test_unknown_dimensions_are_not_tiny() {
        let (tree, img) = image(&[]);
        assert!(!ImageDimensions::new(&tree, img).is_tiny());
        let (tree, img) = image(&[("width", "10em"), ("height", "10em")]);
        assert!(!ImageDimensions::new(&tree, img).is_tiny());
    }
}
