//! Runtime configuration.
//!
//! The only required setting is the upstream API key. It is read from the
//! `API_KEY` environment variable; a missing key is a fatal configuration
//! error at startup.

use std::time::Duration;

use crate::error::{LensError, Result};
use crate::security::SecureString;

/// Environment variable holding the upstream API key.
pub const API_KEY_VAR: &str = "API_KEY";
/// Environment variable overriding the upstream base URL.
pub const BASE_URL_VAR: &str = "DATALENS_BASE_URL";
/// Environment variable overriding the request timeout, in seconds.
pub const TIMEOUT_VAR: &str = "DATALENS_TIMEOUT_SECS";
/// Environment variable overriding the default record limit.
pub const FETCH_LIMIT_VAR: &str = "DATALENS_FETCH_LIMIT";

/// Default upstream endpoint for open-data resources.
pub const DEFAULT_BASE_URL: &str = "https://api.data.gov.in/resource";
/// Default number of records requested per fetch.
pub const DEFAULT_FETCH_LIMIT: usize = 1000;

/// Configuration for talking to the open-data API.
#[derive(Debug, Clone)]
pub struct LensConfig {
    api_key: SecureString,
    base_url: String,
    timeout: Duration,
    default_limit: usize,
}

impl LensConfig {
    /// Create a new configuration with the given API key and defaults for
    /// everything else.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: SecureString::new(api_key.into()),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            default_limit: DEFAULT_FETCH_LIMIT,
        }
    }

    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup(API_KEY_VAR).ok_or_else(|| {
            LensError::Configuration(format!(
                "{API_KEY_VAR} not found. Set it in the environment or in a .env file"
            ))
        })?;
        if api_key.trim().is_empty() {
            return Err(LensError::Configuration(format!("{API_KEY_VAR} is empty")));
        }

        let mut config = Self::new(api_key);

        if let Some(base_url) = lookup(BASE_URL_VAR) {
            config = config.with_base_url(base_url);
        }
        if let Some(raw) = lookup(TIMEOUT_VAR) {
            let secs = parse_positive(TIMEOUT_VAR, &raw)?;
            config = config.with_timeout(Duration::from_secs(secs as u64));
        }
        if let Some(raw) = lookup(FETCH_LIMIT_VAR) {
            config = config.with_default_limit(parse_positive(FETCH_LIMIT_VAR, &raw)?);
        }

        Ok(config)
    }

    /// Set a custom base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the HTTP request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the record limit used when the caller does not pass one.
    pub fn with_default_limit(mut self, limit: usize) -> Self {
        self.default_limit = limit;
        self
    }

    /// Get the API key.
    ///
    /// # Security
    /// Returns a reference to the secure string. Use `expose()` to access
    /// the underlying value. Avoid storing or logging the exposed value.
    pub fn api_key(&self) -> &SecureString {
        &self.api_key
    }

    /// Get the base URL, without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Get the HTTP request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Get the default record limit.
    pub fn default_limit(&self) -> usize {
        self.default_limit
    }
}

fn parse_positive(name: &str, raw: &str) -> Result<usize> {
    match raw.trim().parse::<usize>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(LensError::Configuration(format!(
            "{name} must be a positive integer, got '{raw}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_missing_api_key_is_fatal() {
        let err = LensConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, LensError::Configuration(_)));
        assert!(err.to_string().contains("API_KEY"));
    }

    #[test]
    fn test_blank_api_key_is_fatal() {
        assert!(LensConfig::from_lookup(lookup(&[("API_KEY", "  ")])).is_err());
    }

    #[test]
    fn test_defaults() {
        let config = LensConfig::from_lookup(lookup(&[("API_KEY", "abc")])).unwrap();
        assert_eq!(config.api_key().expose(), "abc");
        assert_eq!(config.base_url(), DEFAULT_BASE_URL);
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.default_limit(), DEFAULT_FETCH_LIMIT);
    }

    #[test]
    fn test_overrides() {
        let config = LensConfig::from_lookup(lookup(&[
            ("API_KEY", "abc"),
            ("DATALENS_BASE_URL", "http://localhost:8080/resource/"),
            ("DATALENS_TIMEOUT_SECS", "5"),
            ("DATALENS_FETCH_LIMIT", "5000"),
        ]))
        .unwrap();

        assert_eq!(config.base_url(), "http://localhost:8080/resource");
        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert_eq!(config.default_limit(), 5000);
    }

    #[test]
    fn test_invalid_limit() {
        let err = LensConfig::from_lookup(lookup(&[
            ("API_KEY", "abc"),
            ("DATALENS_FETCH_LIMIT", "zero"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("DATALENS_FETCH_LIMIT"));
    }

    #[test]
    fn test_debug_does_not_leak_key() {
        let config = LensConfig::new("super-secret");
        assert!(!format!("{config:?}").contains("super-secret"));
    }
}
