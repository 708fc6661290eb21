use ampopt_common::net::RemoteGetRequest;
use ampopt_common::runtime_version::{RuntimeVersion, append_runtime_version};
use ampopt_dom::{DomTree, NodeId};

use super::{Transformer, TransformerKind};
use crate::amp::CACHE_HOST;
use crate::configuration::AmpRuntimeCssConfiguration;
use crate::error::{Error, ErrorCollection, OptimizerError};

const V0_CSS: &str = "v0.css";

/// Inlines the runtime stylesheet `v0.css` into `<style amp-runtime>`.
///
/// The element is only present after server-side rendering; its absence is
/// reported as a diagnostic. When the stylesheet cannot be inlined, the
/// element is replaced with a `<link rel=stylesheet>` to the AMP cache.
pub struct AmpRuntimeCss<'a> {
    configuration: AmpRuntimeCssConfiguration,
    remote: &'a dyn RemoteGetRequest,
}

impl<'a> AmpRuntimeCss<'a> {
    /// A transformer fetching through `remote`.
    #[must_use]
    pub fn new(configuration: AmpRuntimeCssConfiguration, remote: &'a dyn RemoteGetRequest) -> Self {
        Self { configuration, remote }
    }

    fn find_runtime_style(tree: &DomTree) -> Option<NodeId> {
        let head = tree.head()?;
        tree.descendants(head)
            .into_iter()
            .find(|&id| tree.is_element(id, "style") && tree.has_attr(id, "amp-runtime"))
    }

    /// Sets `i-amphtml-version` and the stylesheet text. A non-2xx answer
    /// for the stylesheet leaves the text untouched.
    fn inline_css(&self, tree: &mut DomTree, style: NodeId) -> Result<(), String> {
        let (version, url) = if self.configuration.version.is_empty() {
            let version = RuntimeVersion::new(self.remote)
                .current_version(self.configuration.canary)
                .map_err(|error| error.to_string())?;
            (version, format!("{CACHE_HOST}/{V0_CSS}"))
        } else {
            let version = self.configuration.version.clone();
            let url = format!("{}/{V0_CSS}", append_runtime_version(CACHE_HOST, &version));
            (version, url)
        };
        tree.set_attr(style, "i-amphtml-version", version);

        let styles = if self.configuration.styles.is_empty() {
            let response = self.remote.get(&url).map_err(|error| error.to_string())?;
            if !response.is_success() {
                tracing::debug!(url, status = response.status, "runtime CSS not available");
                return Ok(());
            }
            response.body
        } else {
            self.configuration.styles.clone()
        };
        tree.set_text_content(style, &styles);
        Ok(())
    }

    fn link_css(tree: &mut DomTree, style: NodeId) {
        let Some(parent) = tree.parent(style) else {
            return;
        };
        let href = format!("{CACHE_HOST}/{V0_CSS}");
        let link = tree.create_element("link", [("rel", "stylesheet"), ("href", href.as_str())]);
        tree.insert_before(parent, link, Some(style));
        tree.detach(style);
    }
}

impl Transformer for AmpRuntimeCss<'_> {
    fn kind(&self) -> TransformerKind {
        TransformerKind::AmpRuntimeCss
    }

    fn transform(&mut self, tree: &mut DomTree, errors: &mut ErrorCollection) -> Result<(), OptimizerError> {
        let Some(style) = Self::find_runtime_style(tree) else {
            errors.add(Error::missing_amp_runtime_style(&self.configuration.version));
            return Ok(());
        };
        if let Err(reason) = self.inline_css(tree, style) {
            errors.add(Error::cannot_inline_runtime_css(
                &reason,
                tree.dump(style),
                &self.configuration.version,
            ));
            Self::link_css(tree, style);
        }
        Ok(())
    }
}
