//! Diagnostics and fatal errors of the optimizer.
//!
//! Content problems found while transforming a document are recorded as
//! [`Error`]s in an [`ErrorCollection`] and processing continues. Problems
//! with the configuration itself are fatal and surface as [`OptimizerError`].

use strum_macros::{Display, EnumString, IntoStaticStr};

/// Category of a non-fatal diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
pub enum ErrorKind {
    /// The AMP runtime CSS could not be inlined.
    CannotInlineRuntimeCss,
    /// A hero image could not be preloaded.
    CannotPreloadImage,
    /// More images carry `data-hero` than can be optimized.
    TooManyHeroImages,
    /// The document could not be adapted to a self-hosted runtime.
    CannotAdaptDocumentForSelfHosting,
    /// An attribute value could not be used.
    InvalidHtmlAttribute,
}

/// A non-fatal diagnostic recorded during a transformation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    /// Category of the problem.
    pub kind: ErrorKind,
    /// Human-readable description.
    pub message: String,
    /// Start tag of the offending element, if one is known.
    pub element: Option<String>,
}

impl Error {
    /// A diagnostic without an offending element.
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            element: None,
        }
    }

    /// Attach the dump of the offending element.
    #[must_use]
    pub fn with_element(mut self, element: impl Into<String>) -> Self {
        self.element = Some(element.into());
        self
    }

    /// `<style amp-runtime>` is missing from the head.
    #[must_use]
    pub fn missing_amp_runtime_style(version: &str) -> Self {
        Self::new(
            ErrorKind::CannotInlineRuntimeCss,
            format!(
                "Cannot inline the AMP runtime CSS in version '{}' as the <style amp-runtime> element is missing.",
                display_version(version)
            ),
        )
    }

    /// Fetching or inlining the runtime CSS failed.
    #[must_use]
    pub fn cannot_inline_runtime_css(reason: &str, element: String, version: &str) -> Self {
        Self::new(
            ErrorKind::CannotInlineRuntimeCss,
            format!(
                "Cannot inline the AMP runtime CSS in version '{}': {reason}",
                display_version(version)
            ),
        )
        .with_element(element)
    }

    /// A hero image has a `srcset` but srcset preloading is disabled.
    #[must_use]
    pub fn cannot_preload_srcset(element: Option<String>) -> Self {
        let error = Self::new(
            ErrorKind::CannotPreloadImage,
            "Not preloading the hero image because of the presence of a srcset attribute, which can \
             currently only be preloaded by Chromium-based browsers (see https://web.dev/preload-responsive-images/).",
        );
        match element {
            Some(element) => error.with_element(element),
            None => error,
        }
    }

    /// More than `maximum` images carry `data-hero`.
    #[must_use]
    pub fn too_many_hero_images(maximum: usize) -> Self {
        Self::new(
            ErrorKind::TooManyHeroImages,
            format!(
                "Too many images with the \"data-hero\" attribute were detected, the maximum allowed is {maximum}."
            ),
        )
    }

    /// The self-hosting prefix is not an absolute URL.
    #[must_use]
    pub fn non_absolute_host(host: &str) -> Self {
        Self::new(
            ErrorKind::CannotAdaptDocumentForSelfHosting,
            format!("The runtime-host meta tag was not added as the host URL '{host}' is not absolute."),
        )
    }

    /// An attribute holds a value that cannot be used.
    #[must_use]
    pub fn invalid_html_attribute(name: &str, element: String) -> Self {
        Self::new(
            ErrorKind::InvalidHtmlAttribute,
            format!("Invalid value detected for attribute '{name}'"),
        )
        .with_element(element)
    }
}

fn display_version(version: &str) -> &str {
    if version.is_empty() { "latest" } else { version }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)?;
        if let Some(element) = &self.element {
            write!(f, " ({element})")?;
        }
        Ok(())
    }
}

/// Ordered, append-only collection of diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorCollection {
    errors: Vec<Error>,
}

impl ErrorCollection {
    /// An empty collection.
    #[must_use]
    pub const fn new() -> Self {
        Self { errors: Vec::new() }
    }

    /// Record a diagnostic.
    pub fn add(&mut self, error: Error) {
        tracing::warn!(kind = %error.kind, element = error.element.as_deref(), "{}", error.message);
        self.errors.push(error);
    }

    /// Whether a diagnostic of `kind` was recorded.
    #[must_use]
    pub fn has(&self, kind: ErrorKind) -> bool {
        self.errors.iter().any(|error| error.kind == kind)
    }

    /// Number of recorded diagnostics.
    #[must_use]
    pub fn count(&self) -> usize {
        self.errors.len()
    }

    /// Whether nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Diagnostics in the order they were recorded.
    #[must_use]
    pub fn iter(&self) -> std::slice::Iter<'_, Error> {
        self.errors.iter()
    }
}

impl<'a> IntoIterator for &'a ErrorCollection {
    type Item = &'a Error;
    type IntoIter = std::slice::Iter<'a, Error>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

/// Fatal failure of an optimizer call.
#[derive(Debug, thiserror::Error)]
pub enum OptimizerError {
    /// The configuration is contradictory or malformed.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    /// A configuration key that does not exist was requested.
    #[error("the provided configuration key '{0}' is not known")]
    UnknownConfigurationKey(String),
    /// A transformer without its own configuration was asked for one.
    #[error("no configuration is registered for the transformer '{0}'")]
    UnknownConfigurationClass(String),
    /// The configuration is not valid JSON of the expected shape.
    #[error("failed to read configuration: {0}")]
    Json(#[from] serde_json::Error),
}

impl OptimizerError {
    /// Two flags were enabled that cannot be combined.
    #[must_use]
    pub fn mutually_exclusive_flags(first: &str, second: &str) -> Self {
        Self::InvalidConfiguration(format!(
            "the configuration flags '{first}' and '{second}' are mutually exclusive and cannot be used at the same time"
        ))
    }
}
