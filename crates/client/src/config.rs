use std::time::Duration;

use reqwest::Url;
use thiserror::Error;

pub const API_BASE_VAR: &str = "TRADETRACK_API_BASE";
pub const API_TIMEOUT_VAR: &str = "TRADETRACK_API_TIMEOUT_SECS";

pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:8000";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid API base URL '{value}': {reason}")]
    InvalidBaseUrl { value: String, reason: String },

    #[error("invalid timeout '{0}': expected a positive number of seconds")]
    InvalidTimeout(String),
}

/// Where the API lives and how long to wait for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    base_url: String,
    timeout: Duration,
}

impl ApiConfig {
    /// Config for `base_url` with the default timeout. A trailing slash is
    /// dropped so paths can be appended directly.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self, ConfigError> {
        let raw = base_url.as_ref().trim();
        let parsed = Url::parse(raw).map_err(|e| ConfigError::InvalidBaseUrl {
            value: raw.to_string(),
            reason: e.to_string(),
        })?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidBaseUrl {
                value: raw.to_string(),
                reason: "scheme must be http or https".to_string(),
            });
        }

        Ok(Self {
            base_url: raw.trim_end_matches('/').to_string(),
            timeout: DEFAULT_TIMEOUT,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Read `TRADETRACK_API_BASE` and `TRADETRACK_API_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ApiConfig::from_env`] over an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let base = lookup(API_BASE_VAR)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| {
                tracing::debug!("{API_BASE_VAR} not set; using {DEFAULT_API_BASE}");
                DEFAULT_API_BASE.to_string()
            });

        let mut config = Self::new(base)?;

        if let Some(raw) = lookup(API_TIMEOUT_VAR).filter(|v| !v.trim().is_empty()) {
            let secs: u64 = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidTimeout(raw.clone()))?;
            if secs == 0 {
                return Err(ConfigError::InvalidTimeout(raw));
            }
            config.timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Absolute URL for an API path (`/api/...`).
    pub fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}
