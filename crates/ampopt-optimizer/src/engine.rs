//! The transformation pipeline.
//!
//! - [`TransformationEngine`] - Ordered collection of transformers and the
//!   single entry point of the optimizer
//!
//! # Architecture
//!
//! Transformers run in a flat sequence, in the order the configuration lists
//! them. Each one sees the document as left by its predecessors. A
//! configuration error stops the pipeline; content problems only add to the
//! [`ErrorCollection`].
//!
//! # Example
//!
//! ```ignore
//! let configuration = Configuration::default();
//! let transport = ReqwestTransport::new()?;
//! let mut engine = TransformationEngine::new(&configuration, &transport);
//! let mut errors = ErrorCollection::new();
//! engine.optimize_dom(&mut tree, &mut errors)?;
//! ```

use ampopt_common::net::RemoteGetRequest;
use ampopt_dom::DomTree;

use crate::configuration::Configuration;
use crate::error::{ErrorCollection, OptimizerError};
use crate::transformer::{
    AmpBoilerplate, AmpRuntimeCss, PreloadHeroImage, ReorderHead, RewriteAmpUrls, Transformer, TransformerKind,
};

/// Runs a sequence of transformers over a document.
pub struct TransformationEngine<'a> {
    transformers: Vec<Box<dyn Transformer + 'a>>,
}

impl<'a> TransformationEngine<'a> {
    /// The transformers listed in `configuration`, in the listed order.
    /// Transformers that fetch resources do so through `remote`.
    #[must_use]
    pub fn new(configuration: &Configuration, remote: &'a dyn RemoteGetRequest) -> Self {
        let transformers = configuration
            .transformers
            .iter()
            .map(|&kind| Self::create(kind, configuration, remote))
            .collect();
        Self { transformers }
    }

    /// An engine running exactly `transformers`.
    #[must_use]
    pub fn from_transformers(transformers: Vec<Box<dyn Transformer + 'a>>) -> Self {
        Self { transformers }
    }

    fn create(
        kind: TransformerKind,
        configuration: &Configuration,
        remote: &'a dyn RemoteGetRequest,
    ) -> Box<dyn Transformer + 'a> {
        match kind {
            TransformerKind::AmpBoilerplate => Box::new(AmpBoilerplate),
            TransformerKind::AmpRuntimeCss => {
                Box::new(AmpRuntimeCss::new(configuration.amp_runtime_css.clone(), remote))
            }
            TransformerKind::PreloadHeroImage => {
                Box::new(PreloadHeroImage::new(configuration.preload_hero_image.clone()))
            }
            TransformerKind::ReorderHead => Box::new(ReorderHead),
            TransformerKind::RewriteAmpUrls => {
                Box::new(RewriteAmpUrls::new(configuration.rewrite_amp_urls.clone()))
            }
        }
    }

    /// Append a transformer to the end of the pipeline.
    pub fn push(&mut self, transformer: Box<dyn Transformer + 'a>) {
        self.transformers.push(transformer);
    }

    /// Number of transformers in the pipeline.
    #[must_use]
    pub fn len(&self) -> usize {
        self.transformers.len()
    }

    /// Whether the pipeline has no transformers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.transformers.is_empty()
    }

    /// The transformers in execution order.
    #[must_use]
    pub fn transformer_kinds(&self) -> Vec<TransformerKind> {
        self.transformers.iter().map(|transformer| transformer.kind()).collect()
    }

    /// Run every transformer over `tree` in order.
    ///
    /// # Errors
    ///
    /// Returns the first [`OptimizerError`]; the remaining transformers do
    /// not run.
    pub fn optimize_dom(&mut self, tree: &mut DomTree, errors: &mut ErrorCollection) -> Result<(), OptimizerError> {
        for transformer in &mut self.transformers {
            let kind = transformer.kind();
            tracing::debug!(transformer = %kind, "Running transformer");
            transformer.transform(tree, errors)?;
        }
        tracing::debug!(diagnostics = errors.count(), "optimization finished");
        Ok(())
    }
}

/// Convenience wrapper: optimize `tree` with `configuration` and return the
/// collected diagnostics.
///
/// # Errors
///
/// See [`TransformationEngine::optimize_dom`].
pub fn optimize(
    tree: &mut DomTree,
    configuration: &Configuration,
    remote: &dyn RemoteGetRequest,
) -> Result<ErrorCollection, OptimizerError> {
    let mut errors = ErrorCollection::new();
    TransformationEngine::new(configuration, remote).optimize_dom(tree, &mut errors)?;
    Ok(errors)
}
