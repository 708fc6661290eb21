//! Transformers: one unit per optimization concern.
//!
//! Each transformer mutates the document in place and records content
//! problems in the [`ErrorCollection`]. Only configuration problems abort a
//! transformation.

use ampopt_dom::DomTree;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::error::{ErrorCollection, OptimizerError};

mod amp_boilerplate;
mod amp_runtime_css;
mod preload_hero_image;
mod reorder_head;
mod rewrite_amp_urls;

pub use amp_boilerplate::AmpBoilerplate;
pub use amp_runtime_css::AmpRuntimeCss;
pub use preload_hero_image::{DATA_HERO_MAX, PreloadHeroImage};
pub use reorder_head::{HeadCategory, ReorderHead};
pub use rewrite_amp_urls::RewriteAmpUrls;

/// The available transformers. Declaration order is the default pipeline
/// order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, IntoStaticStr)]
pub enum TransformerKind {
    /// See [`AmpBoilerplate`].
    AmpBoilerplate,
    /// See [`PreloadHeroImage`].
    PreloadHeroImage,
    /// See [`RewriteAmpUrls`].
    RewriteAmpUrls,
    /// See [`AmpRuntimeCss`].
    AmpRuntimeCss,
    /// See [`ReorderHead`].
    ReorderHead,
}

impl Serialize for TransformerKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.into())
    }
}

impl<'de> Deserialize<'de> for TransformerKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse()
            .map_err(|_| serde::de::Error::custom(format!("unknown transformer '{name}'")))
    }
}

/// A single step of the optimizer pipeline.
pub trait Transformer {
    /// Which transformer this is.
    fn kind(&self) -> TransformerKind;

    /// Apply the transformation to `tree`.
    ///
    /// # Errors
    ///
    /// Returns [`OptimizerError`] when the configuration makes the
    /// transformation impossible. Such errors are raised before the tree is
    /// touched.
    fn transform(&mut self, tree: &mut DomTree, errors: &mut ErrorCollection) -> Result<(), OptimizerError>;
}
