//! Cart client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `MAGNOLIA_API_URL` - Base URL of the storefront API (default: `http://127.0.0.1:3000/`)
//! - `MAGNOLIA_REQUEST_TIMEOUT_SECS` - Per-request timeout in seconds (default: 10)

use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_API_URL: &str = "http://127.0.0.1:3000/";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Cart session configuration.
#[derive(Debug, Clone)]
pub struct CartConfig {
    /// Base URL of the storefront API. Always ends with `/`.
    pub api_url: Url,
    /// Upper bound on any single provider call.
    pub request_timeout: Duration,
}

impl Default for CartConfig {
    /// Local development defaults.
    ///
    /// # Panics
    ///
    /// This function will not panic. `DEFAULT_API_URL` is a valid absolute
    /// http URL, which `parse_api_url` always accepts.
    #[allow(clippy::expect_used)]
    fn default() -> Self {
        Self {
            api_url: parse_api_url(DEFAULT_API_URL).expect("default API URL is valid"),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

impl CartConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_url = parse_api_url(&get_env_or_default("MAGNOLIA_API_URL", DEFAULT_API_URL))
            .map_err(|e| ConfigError::InvalidEnvVar("MAGNOLIA_API_URL".to_string(), e))?;

        let timeout_secs = get_env_or_default(
            "MAGNOLIA_REQUEST_TIMEOUT_SECS",
            &DEFAULT_REQUEST_TIMEOUT_SECS.to_string(),
        )
        .parse::<u64>()
        .map_err(|e| {
            ConfigError::InvalidEnvVar("MAGNOLIA_REQUEST_TIMEOUT_SECS".to_string(), e.to_string())
        })?;

        if timeout_secs == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "MAGNOLIA_REQUEST_TIMEOUT_SECS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            api_url,
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Override the API base URL.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `url` is not an absolute http(s) URL.
    pub fn with_api_url(mut self, url: &str) -> Result<Self, ConfigError> {
        self.api_url = parse_api_url(url)
            .map_err(|e| ConfigError::InvalidEnvVar("api_url".to_string(), e))?;
        Ok(self)
    }

    /// Override the request timeout.
    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// Parse a base URL, normalizing it to end with `/` so `Url::join` appends
/// rather than replaces the last path segment.
fn parse_api_url(raw: &str) -> Result<Url, String> {
    let mut url = Url::parse(raw).map_err(|e| e.to_string())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("unsupported scheme '{}'", url.scheme()));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_api_url_appends_slash() {
        let url = parse_api_url("https://shop.example.com/bff").unwrap();
        assert_eq!(url.as_str(), "https://shop.example.com/bff/");
        assert_eq!(
            url.join("api/checkout").unwrap().as_str(),
            "https://shop.example.com/bff/api/checkout"
        );
    }

    #[test]
    fn test_parse_api_url_rejects_other_schemes() {
        assert!(parse_api_url("ftp://shop.example.com").is_err());
        assert!(parse_api_url("not a url").is_err());
    }

    #[test]
    fn test_default_config() {
        let config = CartConfig::default();
        assert_eq!(config.api_url.as_str(), DEFAULT_API_URL);
        assert_eq!(config.request_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_builder_overrides() {
        let config = CartConfig::default()
            .with_api_url("http://localhost:4000")
            .unwrap()
            .with_request_timeout(Duration::from_millis(250));
        assert_eq!(config.api_url.as_str(), "http://localhost:4000/");
        assert_eq!(config.request_timeout, Duration::from_millis(250));
    }
}
