use std::time::Duration;

use anyhow::{Context, Result};

use crate::config::Config;

/// Default base URL for the hosted Core Connect API.
pub const DEFAULT_BASE_URL: &str = "https://core-connect-seven.vercel.app";

/// Environment variable overriding the API base URL.
pub const API_URL_ENV: &str = "CORECONNECT_API_URL";

/// Configuration for the auth client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthClientConfig {
    pub base_url: String,
    /// Per-request timeout (None waits indefinitely)
    pub timeout: Option<Duration>,
}

impl AuthClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: None,
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Creates a client config from the environment and the loaded config.
    ///
    /// Base URL resolution order:
    /// 1. `CORECONNECT_API_URL` env var (if set and non-empty)
    /// 2. `api_url` from config.toml (if set and non-empty)
    /// 3. Default: `https://core-connect-seven.vercel.app`
    ///
    /// # Errors
    /// Returns an error if the resolved URL is malformed.
    pub fn from_config(config: &Config) -> Result<Self> {
        let env_url = std::env::var(API_URL_ENV).ok();
        let base_url = Self::resolve_base_url(env_url.as_deref(), config.effective_api_url())?;

        Ok(Self {
            base_url,
            timeout: config.request_timeout(),
        })
    }

    /// Resolves the base URL with precedence: env > config > default.
    fn resolve_base_url(env_url: Option<&str>, config_url: Option<&str>) -> Result<String> {
        let candidate = [env_url, config_url]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|url| !url.is_empty());

        match candidate {
            Some(url) => {
                Self::validate_url(url)?;
                Ok(url.trim_end_matches('/').to_string())
            }
            None => Ok(DEFAULT_BASE_URL.to_string()),
        }
    }

    /// Validates that a URL is well-formed.
    fn validate_url(url: &str) -> Result<()> {
        url::Url::parse(url).with_context(|| format!("Invalid API base URL: {url}"))?;
        Ok(())
    }
}
