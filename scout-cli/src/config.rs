//! Configuration module
//!
//! Handles CLI configuration: which API to talk to, credentials and timeouts.

use std::time::Duration;

use anyhow::{Context, Result};
use scout_client::GitHubClient;

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// API root of the search service
    pub api_url: String,

    /// Optional bearer token
    pub token: Option<String>,

    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: scout_client::DEFAULT_API_URL.to_string(),
            token: None,
            timeout: Duration::from_secs(30),
        }
    }
}

impl Config {
    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        if self.api_url.is_empty() {
            anyhow::bail!("api_url cannot be empty");
        }

        if !self.api_url.starts_with("http://") && !self.api_url.starts_with("https://") {
            anyhow::bail!("api_url must start with http:// or https://");
        }

        if self.timeout.is_zero() {
            anyhow::bail!("timeout must be greater than 0");
        }

        Ok(())
    }

    /// Builds the search client described by this configuration
    pub fn build_client(&self) -> Result<GitHubClient> {
        let http_client = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .context("Failed to build HTTP client")?;

        let client = GitHubClient::with_client(&self.api_url, http_client);
        Ok(match &self.token {
            Some(token) => client.with_token(token),
            None => client,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.api_url, "https://api.github.com");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();

        config.api_url = String::new();
        assert!(config.validate().is_err());

        config.api_url = "api.github.com".to_string();
        assert!(config.validate().is_err());

        config.api_url = "http://localhost:8080".to_string();
        assert!(config.validate().is_ok());

        config.timeout = Duration::ZERO;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_build_client_carries_token() {
        let config = Config {
            token: Some("abc".to_string()),
            ..Config::default()
        };
        let client = config.build_client().unwrap();
        assert!(client.is_authenticated());
        assert_eq!(client.base_url(), "https://api.github.com");
    }
}
