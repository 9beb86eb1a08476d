//! Runtime configuration
//!
//! The binary collects raw settings from the command line and environment,
//! and validates them once at startup into a `ClientConfig`. Library code only
//! ever receives the validated value.

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Default OMDb endpoint.
pub const DEFAULT_BASE_URL: &str = "https://www.omdbapi.com/";

/// Delay between consecutive API requests.
pub const DEFAULT_REQUEST_DELAY: Duration = Duration::from_millis(500);

/// Timeout applied to each individual request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors that can occur while validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No API key was supplied
    #[error("No OMDb API key configured. Set OMDB_API_KEY or pass --api-key.")]
    MissingApiKey,

    /// The base URL is empty
    #[error("Invalid API base URL: '{0}'")]
    InvalidBaseUrl(String),
}

/// An API key that never shows up in `Debug` output or logs.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Returns the raw key for use in a request.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

/// Validated settings for the metadata client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Key sent with every request
    pub api_key: ApiKey,
    /// Endpoint all requests are sent to
    pub base_url: String,
    /// Pause between consecutive requests (informal rate limiting)
    pub request_delay: Duration,
    /// Per-request timeout
    pub request_timeout: Duration,
}

impl ClientConfig {
    /// Validates raw settings into a client configuration.
    ///
    /// A missing or blank API key is the only fatal startup condition of the
    /// application.
    pub fn validate(
        api_key: Option<&str>,
        base_url: &str,
        request_delay: Duration,
        request_timeout: Duration,
    ) -> Result<Self, ConfigError> {
        let api_key = api_key
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or(ConfigError::MissingApiKey)?;

        let base_url = base_url.trim();
        if base_url.is_empty() {
            return Err(ConfigError::InvalidBaseUrl(base_url.to_string()));
        }

        Ok(Self {
            api_key: ApiKey::new(api_key),
            base_url: base_url.to_string(),
            request_delay,
            request_timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_api_key_is_rejected() {
        let result = ClientConfig::validate(
            None,
            DEFAULT_BASE_URL,
            DEFAULT_REQUEST_DELAY,
            DEFAULT_REQUEST_TIMEOUT,
        );
        assert!(matches!(result, Err(ConfigError::MissingApiKey)));
    }

    #[test]
    fn test_blank_api_key_is_rejected() {
        let result = ClientConfig::validate(
            Some("   "),
            DEFAULT_BASE_URL,
            DEFAULT_REQUEST_DELAY,
            DEFAULT_REQUEST_TIMEOUT,
        );
        assert!(matches!(result, Err(ConfigError::MissingApiKey)));
    }

    #[test]
    fn test_valid_config_trims_key() {
        let config = ClientConfig::validate(
            Some(" abc123 "),
            DEFAULT_BASE_URL,
            Duration::ZERO,
            DEFAULT_REQUEST_TIMEOUT,
        )
        .unwrap();

        assert_eq!(config.api_key.expose(), "abc123");
        assert_eq!(config.request_delay, Duration::ZERO);
    }

    #[test]
    fn test_api_key_debug_is_redacted() {
        let key = ApiKey::new("secret");
        assert_eq!(format!("{:?}", key), "ApiKey(***)");
    }
}
