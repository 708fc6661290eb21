//! Optimizer configuration.
//!
//! Configuration is read from JSON with camel-cased keys. Every section is
//! optional and unknown keys are rejected:
//!
//! ```json
//! {
//!   "transformers": ["AmpBoilerplate", "ReorderHead"],
//!   "ampRuntimeCss": { "version": "012101281735000", "canary": false, "styles": "" },
//!   "preloadHeroImage": { "preloadHeroImage": true, "preloadSrcset": false, "inlineStyleBackupAttribute": "" },
//!   "rewriteAmpUrls": { "ampUrlPrefix": "https://example.com/amp", "esmModulesEnabled": true }
//! }
//! ```

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

use crate::amp::CACHE_HOST;
use crate::error::OptimizerError;
use crate::transformer::TransformerKind;

/// Configuration of the whole optimizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Configuration {
    /// Transformers to run, in order.
    #[serde(default = "default_transformers")]
    pub transformers: Vec<TransformerKind>,
    /// Options of [`TransformerKind::AmpRuntimeCss`].
    #[serde(default)]
    pub amp_runtime_css: AmpRuntimeCssConfiguration,
    /// Options of [`TransformerKind::PreloadHeroImage`].
    #[serde(default)]
    pub preload_hero_image: PreloadHeroImageConfiguration,
    /// Options of [`TransformerKind::RewriteAmpUrls`].
    #[serde(default)]
    pub rewrite_amp_urls: RewriteAmpUrlsConfiguration,
}

fn default_transformers() -> Vec<TransformerKind> {
    TransformerKind::iter().collect()
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            transformers: default_transformers(),
            amp_runtime_css: AmpRuntimeCssConfiguration::default(),
            preload_hero_image: PreloadHeroImageConfiguration::default(),
            rewrite_amp_urls: RewriteAmpUrlsConfiguration::default(),
        }
    }
}

/// Options for inlining the runtime CSS.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct AmpRuntimeCssConfiguration {
    /// Runtime version to inline. Empty means the version currently served.
    pub version: String,
    /// Look up the canary version instead of the production one.
    pub canary: bool,
    /// CSS to inline instead of fetching `v0.css`.
    pub styles: String,
}

/// Options for hero image preloading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct PreloadHeroImageConfiguration {
    /// Master switch.
    pub preload_hero_image: bool,
    /// Preload images that carry a `srcset`.
    pub preload_srcset: bool,
    /// Attribute holding an element's original inline style after it was
    /// moved elsewhere. Empty when there is none.
    pub inline_style_backup_attribute: String,
}

impl Default for PreloadHeroImageConfiguration {
    fn default() -> Self {
        Self {
            preload_hero_image: true,
            preload_srcset: false,
            inline_style_backup_attribute: String::new(),
        }
    }
}

/// Options for rewriting runtime URLs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct RewriteAmpUrlsConfiguration {
    /// Runtime version to pin URLs to, used together with `rtv`.
    pub amp_runtime_version: String,
    /// Prefix replacing the AMP cache host.
    pub amp_url_prefix: String,
    /// Fallback `amp-geo` API endpoint.
    pub geo_api_url: String,
    /// Use long-term stable URLs.
    pub lts: bool,
    /// Append the runtime version to URLs.
    pub rtv: bool,
    /// Load the runtime as ES modules.
    pub esm_modules_enabled: bool,
}

impl Default for RewriteAmpUrlsConfiguration {
    fn default() -> Self {
        Self {
            amp_runtime_version: String::new(),
            amp_url_prefix: CACHE_HOST.to_string(),
            geo_api_url: String::new(),
            lts: false,
            rtv: false,
            esm_modules_enabled: true,
        }
    }
}

/// The configuration section belonging to one transformer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformerConfiguration<'a> {
    /// Options of [`TransformerKind::AmpRuntimeCss`].
    AmpRuntimeCss(&'a AmpRuntimeCssConfiguration),
    /// Options of [`TransformerKind::PreloadHeroImage`].
    PreloadHeroImage(&'a PreloadHeroImageConfiguration),
    /// Options of [`TransformerKind::RewriteAmpUrls`].
    RewriteAmpUrls(&'a RewriteAmpUrlsConfiguration),
}

impl Configuration {
    /// Parse a JSON document.
    ///
    /// # Errors
    ///
    /// [`OptimizerError::Json`] for malformed JSON, unknown keys, values of
    /// the wrong type and unknown transformer names.
    pub fn from_json_str(json: &str) -> Result<Self, OptimizerError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Build from an already parsed JSON value.
    ///
    /// # Errors
    ///
    /// See [`Self::from_json_str`].
    pub fn from_json_value(value: serde_json::Value) -> Result<Self, OptimizerError> {
        Ok(serde_json::from_value(value)?)
    }

    /// Look up a value by dotted key, e.g. `rewriteAmpUrls.lts`.
    ///
    /// # Errors
    ///
    /// [`OptimizerError::UnknownConfigurationKey`] when no such key exists.
    pub fn get(&self, key: &str) -> Result<serde_json::Value, OptimizerError> {
        let mut value = serde_json::to_value(self)?;
        for segment in key.split('.') {
            value = match value {
                serde_json::Value::Object(mut map) => map
                    .remove(segment)
                    .ok_or_else(|| OptimizerError::UnknownConfigurationKey(key.to_string()))?,
                _ => return Err(OptimizerError::UnknownConfigurationKey(key.to_string())),
            };
        }
        Ok(value)
    }

    /// The section configuring `kind`.
    ///
    /// # Errors
    ///
    /// [`OptimizerError::UnknownConfigurationClass`] for transformers that
    /// take no options.
    pub fn transformer_configuration(
        &self,
        kind: TransformerKind,
    ) -> Result<TransformerConfiguration<'_>, OptimizerError> {
        match kind {
            TransformerKind::AmpRuntimeCss => Ok(TransformerConfiguration::AmpRuntimeCss(&self.amp_runtime_css)),
            TransformerKind::PreloadHeroImage => {
                Ok(TransformerConfiguration::PreloadHeroImage(&self.preload_hero_image))
            }
            TransformerKind::RewriteAmpUrls => Ok(TransformerConfiguration::RewriteAmpUrls(&self.rewrite_amp_urls)),
            TransformerKind::AmpBoilerplate | TransformerKind::ReorderHead => {
                Err(OptimizerError::UnknownConfigurationClass(kind.to_string()))
            }
        }
    }
}
