use ampopt_common::runtime_version::append_runtime_version;
use ampopt_common::url::origin;
use ampopt_dom::{DomTree, NodeId};

use super::{Transformer, TransformerKind};
use crate::amp::{CACHE_HOST, viewport_meta};
use crate::configuration::RewriteAmpUrlsConfiguration;
use crate::error::{Error, ErrorCollection, OptimizerError};

/// Points runtime and extension URLs at a different host, optionally
/// switching to module scripts.
///
/// [Self-hosting the AMP framework](https://github.com/ampproject/amphtml/blob/main/docs/spec/amp-framework-hosting.md)
///
/// "Publishers can self-host the AMP framework... The runtime-host meta tag
/// tells the runtime where to load extensions from."
///
/// Scripts, stylesheets and preloads served from the AMP cache get the
/// configured prefix. Preload links for the runtime are placed right after
/// the viewport meta so the browser discovers them early.
#[derive(Debug, Clone)]
pub struct RewriteAmpUrls {
    configuration: RewriteAmpUrlsConfiguration,
}

impl RewriteAmpUrls {
    /// A transformer with the given options.
    #[must_use]
    pub const fn new(configuration: RewriteAmpUrlsConfiguration) -> Self {
        Self { configuration }
    }

    /// The prefix replacing [`CACHE_HOST`].
    fn calculate_host(&self) -> Result<String, OptimizerError> {
        let RewriteAmpUrlsConfiguration { lts, rtv, .. } = self.configuration;
        if lts && rtv {
            return Err(OptimizerError::mutually_exclusive_flags("lts", "rtv"));
        }
        let prefix = self.configuration.amp_url_prefix.trim_end_matches('/');
        let version = &self.configuration.amp_runtime_version;
        if !version.is_empty() && rtv {
            Ok(append_runtime_version(prefix, version))
        } else if lts {
            Ok(format!("{prefix}/lts"))
        } else {
            Ok(prefix.to_string())
        }
    }

    /// Rewrites the URLs of `<head>` and returns the preload links to add.
    fn collect_preloads(&self, tree: &mut DomTree, head: NodeId, host: &str) -> Vec<NodeId> {
        let esm = self.configuration.esm_modules_enabled;
        let mut preloads = Vec::new();
        for node in tree.children(head).to_vec() {
            let Some(tag) = tree.tag_name(node) else {
                continue;
            };
            let src = tree.attr(node, "src").unwrap_or_default().to_string();
            let href = tree.attr(node, "href").unwrap_or_default().to_string();
            let rel = tree.attr(node, "rel").unwrap_or_default();

            if tag == "script" && uses_amp_cache_url(&src) {
                let url = replace_url(&src, host);
                tree.set_attr(node, "src", url.as_str());
                let preload = if esm {
                    add_esm(tree, head, node)
                } else {
                    create_preload(tree, &url, "script")
                };
                preloads.extend(preload);
            } else if tag == "link" && rel == "stylesheet" && uses_amp_cache_url(&href) {
                let url = replace_url(&href, host);
                tree.set_attr(node, "href", url.as_str());
                preloads.extend(create_preload(tree, &url, "style"));
            } else if tag == "link" && rel == "preload" && uses_amp_cache_url(&href) {
                if esm && should_preload(&href) {
                    // Module mode preloads the `.mjs` runtime instead.
                    tree.detach(node);
                } else {
                    tree.set_attr(node, "href", replace_url(&href, host));
                }
            }
        }
        preloads
    }

    fn adapt_for_self_hosting(&self, tree: &mut DomTree, head: NodeId, host: &str, errors: &mut ErrorCollection) {
        let lts = self.configuration.lts;
        if !uses_amp_cache_url(host) && !lts {
            match origin(host) {
                Some(origin) => add_meta(tree, head, "runtime-host", &origin),
                None => errors.add(Error::non_absolute_host(host)),
            }
        }
        let geo_api_url = &self.configuration.geo_api_url;
        if !geo_api_url.is_empty() && !lts {
            add_meta(tree, head, "amp-geo-api", geo_api_url);
        }
    }
}

impl Transformer for RewriteAmpUrls {
    fn kind(&self) -> TransformerKind {
        TransformerKind::RewriteAmpUrls
    }

    fn transform(&mut self, tree: &mut DomTree, errors: &mut ErrorCollection) -> Result<(), OptimizerError> {
        let host = self.calculate_host()?;
        let Some(head) = tree.head() else {
            return Ok(());
        };
        tracing::debug!(host, esm = self.configuration.esm_modules_enabled, "rewriting AMP URLs");

        let mut reference = viewport_meta(tree);
        for preload in self.collect_preloads(tree, head, &host) {
            match reference {
                Some(node) => tree.insert_after(node, preload),
                None => tree.append_child(head, preload),
            }
            reference = Some(preload);
        }
        self.adapt_for_self_hosting(tree, head, &host, errors);
        Ok(())
    }
}

fn uses_amp_cache_url(url: &str) -> bool {
    url.starts_with(CACHE_HOST)
}

fn replace_url(url: &str, host: &str) -> String {
    url.replace(CACHE_HOST, host)
}

/// Only the runtime script and stylesheet are worth preloading.
fn should_preload(url: &str) -> bool {
    url.ends_with("v0.js") || url.ends_with("v0.css")
}

fn create_preload(tree: &mut DomTree, href: &str, as_type: &str) -> Option<NodeId> {
    if !should_preload(href) {
        return None;
    }
    Some(tree.create_element("link", [("rel", "preload"), ("href", href), ("as", as_type)]))
}

/// Turns `script` into a module script and inserts a `nomodule` copy for
/// older browsers in front of it. Returns the `modulepreload` link for the
/// runtime.
fn add_esm(tree: &mut DomTree, head: NodeId, script: NodeId) -> Option<NodeId> {
    let url = tree.attr(script, "src").unwrap_or_default().to_string();
    let esm_url = url.strip_suffix(".js").map_or_else(|| url.clone(), |base| format!("{base}.mjs"));

    let preload = should_preload(&url).then(|| {
        tree.create_element(
            "link",
            [
                ("as", "script"),
                ("crossorigin", "anonymous"),
                ("href", esm_url.as_str()),
                ("rel", "modulepreload"),
            ],
        )
    });

    let nomodule = tree.create_element(
        "script",
        [
            ("async", ""),
            ("nomodule", ""),
            ("src", url.as_str()),
            ("crossorigin", "anonymous"),
        ],
    );
    for name in ["custom-element", "custom-template"] {
        if let Some(value) = tree.attr(script, name).map(str::to_string) {
            tree.set_attr(nomodule, name, value);
        }
    }
    tree.insert_before(head, nomodule, Some(script));

    tree.set_attr(script, "type", "module");
    // Without it the browser fetches the script again after the preload.
    tree.set_attr(script, "crossorigin", "anonymous");
    tree.set_attr(script, "src", esm_url);
    preload
}

/// Inserts `<meta name=.. content=..>` before the first script of `<head>`.
fn add_meta(tree: &mut DomTree, head: NodeId, name: &str, content: &str) {
    let meta = tree.create_element("meta", [("name", name), ("content", content)]);
    let first_script = tree
        .children(head)
        .iter()
        .copied()
        .find(|&child| tree.is_element(child, "script"));
    tree.insert_before(head, meta, first_script);
}
