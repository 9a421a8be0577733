//! Remote API configuration shared by the submission, upload, and history clients.

use std::time::Duration;

use crate::error::{Error, Result};
use crate::util::{is_http_url, normalize_text_option};

/// Default per-request timeout. A hung request becomes a network failure.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const MAX_REQUEST_TIMEOUT_SECS: u64 = 300;

/// Validated connection settings for the activity-points REST API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    base_url: String,
    request_timeout_secs: u64,
}

impl ApiConfig {
    /// Builds a config with the default request timeout.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(base_url, DEFAULT_REQUEST_TIMEOUT_SECS)
    }

    /// Builds a config with an explicit request timeout in seconds.
    pub fn with_timeout(base_url: impl Into<String>, request_timeout_secs: u64) -> Result<Self> {
        let base_url = normalize_base_url(base_url.into())?;
        validate_request_timeout(request_timeout_secs)?;
        Ok(Self {
            base_url,
            request_timeout_secs,
        })
    }

    /// Returns the normalized base URL (no trailing slash).
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Joins a route such as `/upload` onto the base URL.
    pub fn endpoint(&self, route: &str) -> String {
        format!("{}/{}", self.base_url, route.trim_start_matches('/'))
    }

    /// Builds the shared HTTP client with the configured timeout applied.
    pub fn http_client(&self) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(self.request_timeout())
            .build()
            .map_err(|error| Error::Config(format!("failed to construct HTTP client: {error}")))
    }
}

pub fn validate_request_timeout(request_timeout_secs: u64) -> Result<()> {
    if request_timeout_secs == 0 || request_timeout_secs > MAX_REQUEST_TIMEOUT_SECS {
        return Err(Error::Config(format!(
            "request timeout must be between 1 and {MAX_REQUEST_TIMEOUT_SECS} seconds"
        )));
    }
    Ok(())
}

fn normalize_base_url(raw: String) -> Result<String> {
    let base = normalize_text_option(Some(raw))
        .ok_or_else(|| Error::Config("API base URL must not be empty".to_string()))?;
    if !is_http_url(&base) {
        return Err(Error::Config(
            "API base URL must include http:// or https://".to_string(),
        ));
    }
    Ok(base.trim_end_matches('/').to_string())
}
