//! Command line options and how they map onto the optimizer configuration.

use std::fs;
use std::path::{Path, PathBuf};

use ampopt_optimizer::{Configuration, TransformerKind};
use anyhow::{Context, Result};
use clap::Args;

/// Options of the `optimize` command.
#[derive(Args, Debug)]
pub struct OptimizeArgs {
    /// HTML file to optimize, or `-` for stdin
    #[arg(value_name = "FILE|-")]
    pub input: String,

    /// Write the result to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub config: ConfigArgs,

    /// Do not fetch anything. Inlining runtime CSS then needs
    /// --runtime-styles and --runtime-css-version
    #[arg(long)]
    pub offline: bool,

    /// Timeout for remote requests in seconds
    #[arg(long, value_name = "SECS", default_value = "30")]
    pub timeout: u64,

    /// Exit with status 1 when any diagnostic was reported
    #[arg(long)]
    pub strict: bool,
}

/// Options shared by every command that builds a configuration.
#[derive(Args, Debug, Default)]
#[allow(clippy::struct_excessive_bools)]
pub struct ConfigArgs {
    /// JSON configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Transformers to run, in order (comma separated)
    #[arg(long, value_name = "NAMES", value_delimiter = ',')]
    pub transformers: Vec<TransformerKind>,

    /// Host replacing `https://cdn.ampproject.org` in runtime URLs
    #[arg(long, value_name = "URL")]
    pub amp_url_prefix: Option<String>,

    /// Runtime version used with --rtv
    #[arg(long, value_name = "VERSION")]
    pub amp_runtime_version: Option<String>,

    /// Use long-term stable runtime URLs
    #[arg(long)]
    pub lts: bool,

    /// Pin runtime URLs to --amp-runtime-version
    #[arg(long)]
    pub rtv: bool,

    /// Keep classic scripts instead of module scripts
    #[arg(long)]
    pub no_esm: bool,

    /// Fallback amp-geo API endpoint
    #[arg(long, value_name = "URL")]
    pub geo_api_url: Option<String>,

    /// Runtime version whose CSS is inlined
    #[arg(long, value_name = "VERSION")]
    pub runtime_css_version: Option<String>,

    /// Inline the CSS in this file instead of fetching v0.css
    #[arg(long, value_name = "FILE")]
    pub runtime_styles: Option<PathBuf>,

    /// Look up the canary runtime version
    #[arg(long)]
    pub canary: bool,

    /// Preload hero images that have a srcset
    #[arg(long)]
    pub preload_srcset: bool,

    /// Leave hero images alone
    #[arg(long)]
    pub no_hero_images: bool,

    /// Attribute holding a backup of the inline style
    #[arg(long, value_name = "NAME")]
    pub inline_style_backup_attribute: Option<String>,
}

impl ConfigArgs {
    /// The configuration file, if any, with the flags applied on top.
    ///
    /// # Errors
    ///
    /// Fails when a file cannot be read or the configuration is invalid.
    pub fn load(&self) -> Result<Configuration> {
        let configuration = match &self.config {
            Some(path) => read_configuration(path)?,
            None => Configuration::default(),
        };
        let styles = match &self.runtime_styles {
            Some(path) => Some(
                fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?,
            ),
            None => None,
        };
        Ok(self.apply(configuration, styles))
    }

    /// Flags win over file values. Switches only ever turn their option on.
    #[must_use]
    pub fn apply(&self, mut configuration: Configuration, runtime_styles: Option<String>) -> Configuration {
        if !self.transformers.is_empty() {
            configuration.transformers.clone_from(&self.transformers);
        }

        let rewrite = &mut configuration.rewrite_amp_urls;
        if let Some(prefix) = &self.amp_url_prefix {
            rewrite.amp_url_prefix.clone_from(prefix);
        }
        if let Some(version) = &self.amp_runtime_version {
            rewrite.amp_runtime_version.clone_from(version);
        }
        if let Some(url) = &self.geo_api_url {
            rewrite.geo_api_url.clone_from(url);
        }
        rewrite.lts |= self.lts;
        rewrite.rtv |= self.rtv;
        if self.no_esm {
            rewrite.esm_modules_enabled = false;
        }

        let runtime_css = &mut configuration.amp_runtime_css;
        if let Some(version) = &self.runtime_css_version {
            runtime_css.version.clone_from(version);
        }
        if let Some(styles) = runtime_styles {
            runtime_css.styles = styles;
        }
        runtime_css.canary |= self.canary;

        let hero = &mut configuration.preload_hero_image;
        hero.preload_srcset |= self.preload_srcset;
        if self.no_hero_images {
            hero.preload_hero_image = false;
        }
        if let Some(attribute) = &self.inline_style_backup_attribute {
            hero.inline_style_backup_attribute.clone_from(attribute);
        }
        configuration
    }
}

fn read_configuration(path: &Path) -> Result<Configuration> {
    let json = fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    Configuration::from_json_str(&json).with_context(|| format!("invalid configuration in {}", path.display()))
}
