//! Lookup of the AMP runtime version currently served by the AMP cache.
//!
//! The cache publishes a metadata document at `<host>/rtv/metadata`:
//!
//! ```json
//! { "ampRuntimeVersion": "012101281735000", "diversions": ["002101281735000"] }
//! ```
//!
//! Versions come back with a two-digit release prefix (`01` production, `00`
//! canary). Bare 13-digit versions are padded with the production prefix.

use serde::Deserialize;
use thiserror::Error;

use crate::net::{FetchError, RemoteGetRequest};

/// Host of the AMP cache.
pub const AMP_CACHE_HOST: &str = "https://cdn.ampproject.org";

/// Release prefix of production runtime versions.
const RELEASE_PREFIX_PRODUCTION: &str = "01";

/// Length of a runtime version without its release prefix.
const UNPREFIXED_VERSION_LENGTH: usize = 13;

/// Failure to determine the runtime version.
#[derive(Debug, Error)]
pub enum VersionError {
    /// The metadata document could not be fetched.
    #[error(transparent)]
    Fetch(#[from] FetchError),
    /// The metadata endpoint answered with a non-2xx status.
    #[error("runtime metadata request to {url} returned status {status}")]
    Status {
        /// Requested URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },
    /// The metadata document is not valid JSON of the expected shape.
    #[error("malformed runtime metadata: {0}")]
    Json(#[from] serde_json::Error),
    /// The metadata document carries no usable version.
    #[error("runtime metadata does not contain a version")]
    Missing,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RuntimeMetadata {
    #[serde(default)]
    amp_runtime_version: Option<String>,
    #[serde(default)]
    diversions: Vec<String>,
}

/// Looks up runtime versions through an injected [`RemoteGetRequest`].
pub struct RuntimeVersion<'a> {
    request: &'a dyn RemoteGetRequest,
    host: String,
}

impl<'a> RuntimeVersion<'a> {
    /// Query the default AMP cache host.
    #[must_use]
    pub fn new(request: &'a dyn RemoteGetRequest) -> Self {
        Self::with_host(request, AMP_CACHE_HOST)
    }

    /// Query a different host serving the same metadata document.
    #[must_use]
    pub fn with_host(request: &'a dyn RemoteGetRequest, host: &str) -> Self {
        Self {
            request,
            host: host.trim_end_matches('/').to_string(),
        }
    }

    /// The runtime version currently served, or the first canary diversion
    /// when `canary` is set and one exists.
    ///
    /// # Errors
    ///
    /// Returns [`VersionError`] when the metadata cannot be fetched or holds
    /// no version.
    pub fn current_version(&self, canary: bool) -> Result<String, VersionError> {
        let url = format!("{}/rtv/metadata", self.host);
        let response = self.request.get(&url)?;
        if !response.is_success() {
            return Err(VersionError::Status {
                url,
                status: response.status,
            });
        }

        let metadata: RuntimeMetadata = serde_json::from_str(&response.body)?;
        let canary_version = canary
            .then(|| metadata.diversions.first().cloned())
            .flatten()
            .filter(|v| !v.is_empty());
        let version = canary_version
            .or(metadata.amp_runtime_version)
            .filter(|v| !v.is_empty())
            .ok_or(VersionError::Missing)?;

        tracing::debug!(version, canary, "resolved AMP runtime version");
        Ok(pad_version(&version))
    }
}

/// Prefix a bare 13-digit version with the production release prefix.
#[must_use]
pub fn pad_version(version: &str) -> String {
    if version.len() == UNPREFIXED_VERSION_LENGTH {
        format!("{RELEASE_PREFIX_PRODUCTION}{version}")
    } else {
        version.to_string()
    }
}

/// `https://cdn.ampproject.org` + `012101281735000` →
/// `https://cdn.ampproject.org/rtv/012101281735000`.
#[must_use]
pub fn append_runtime_version(url: &str, version: &str) -> String {
    format!("{}/rtv/{version}", url.trim_end_matches('/'))
}
