//! Client configuration

use std::time::Duration;

use url::Url;

use crate::error::{ViewerError, ViewerResult};

/// Address of the storage API when nothing else is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";

/// Per-request timeout when nothing else is configured.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Where the storage API lives and how long to wait for it.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: Url,
    pub timeout: Duration,
}

impl ClientConfig {
    /// Parse a base URL. Only http and https are accepted.
    pub fn new(base_url: &str, timeout: Duration) -> ViewerResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ViewerError::Config(format!("Invalid API URL '{}': {}", base_url, e)))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(ViewerError::Config(format!(
                "Unsupported API URL scheme '{}'",
                base_url.scheme()
            )));
        }
        if base_url.cannot_be_a_base() {
            return Err(ViewerError::Config(format!(
                "API URL '{}' cannot be used as a base",
                base_url
            )));
        }
        Ok(Self { base_url, timeout })
    }

    /// Build the URL for `/api/<segments...>`, percent-encoding each segment.
    pub fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().push("api");
            path.extend(segments);
        }
        url
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default API URL is valid"),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}
