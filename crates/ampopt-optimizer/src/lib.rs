//! Server-side optimizations for AMP documents.
//!
//! # Scope
//!
//! This crate implements:
//! - **Transformers** ([Optimize AMP pages](https://amp.dev/documentation/guides-and-tutorials/optimize-and-measure/optimize_amp/))
//!   - Boilerplate normalization for AMP, AMP4ADS and AMP4EMAIL
//!   - Runtime CSS inlining with a stylesheet link fallback
//!   - Hero image preloading and server-side `<img>` rendering
//!   - `<head>` reordering
//!   - Runtime URL rewriting for self-hosting and module scripts
//!
//! - **Engine**
//!   - Ordered pipeline driven by [`Configuration`]
//!   - Fatal [`OptimizerError`]s versus collected [`ErrorCollection`] diagnostics
//!
//! - **Configuration**
//!   - JSON with camel-cased keys, unknown keys rejected
//!
//! # Example
//!
//! ```
//! use ampopt_common::net::StubTransport;
//! use ampopt_dom::DomTree;
//! use ampopt_optimizer::{Configuration, TransformerKind, optimize};
//!
//! let mut tree = DomTree::new();
//! let html = tree.create_element("html", [("amp", "")]);
//! let head = tree.create_empty_element("head");
//! tree.append_child(tree.root(), html);
//! tree.append_child(html, head);
//!
//! let configuration = Configuration {
//!     transformers: vec![TransformerKind::AmpBoilerplate],
//!     ..Configuration::default()
//! };
//! let errors = optimize(&mut tree, &configuration, &StubTransport::new()).unwrap_or_default();
//! assert!(errors.is_empty());
//! assert!(tree.to_html().contains("<style amp-boilerplate>"));
//! ```

/// AMP markup constants and element predicates.
pub mod amp;
/// Optimizer configuration read from JSON.
pub mod configuration;
/// The transformer pipeline.
pub mod engine;
/// Diagnostics and fatal errors.
pub mod error;
/// Hero image candidates and the tiny-image heuristic.
pub mod hero_image;
/// `style` attribute editing.
pub mod inline_style;
/// The individual transformers.
pub mod transformer;

pub use configuration::{Configuration, TransformerConfiguration};
pub use engine::{TransformationEngine, optimize};
pub use error::{Error, ErrorCollection, ErrorKind, OptimizerError};
pub use hero_image::{HeroImage, ImageDimensions};
pub use transformer::{Transformer, TransformerKind};
