//! Scout HTTP Client
//!
//! A small, typed client for the public repository search endpoint.
//!
//! The client issues exactly one GET per call and hands failures back to the
//! caller untouched: there is no retry and no backoff.
//!
//! # Example
//!
//! ```no_run
//! use scout_client::{GitHubClient, RepositorySearch};
//! use scout_core::dto::search::SearchQuery;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), scout_client::ClientError> {
//!     let client = GitHubClient::new("https://api.github.com");
//!     let page = client.search(&SearchQuery::new("rust"), 1).await?;
//!
//!     println!("{} repositories match", page.total_count);
//!     Ok(())
//! }
//! ```

pub mod error;
mod search;

// Re-export commonly used types
pub use error::{ClientError, Result};
pub use search::RepositorySearch;

use reqwest::{Client, RequestBuilder, header};
use serde::de::DeserializeOwned;

/// Default public API root
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Media type requested from the endpoint
const ACCEPT: &str = "application/vnd.github.v3+json";

/// The endpoint rejects requests without a User-Agent
const USER_AGENT: &str = concat!("scout/", env!("CARGO_PKG_VERSION"));

/// HTTP client for the repository search API
#[derive(Debug, Clone)]
pub struct GitHubClient {
    /// Base URL of the API (e.g., "https://api.github.com")
    base_url: String,
    /// HTTP client instance
    client: Client,
    /// Optional bearer token, raises the rate limit when set
    token: Option<String>,
}

impl GitHubClient {
    /// Create a new client
    ///
    /// # Arguments
    /// * `base_url` - The API root (e.g., "https://api.github.com")
    ///
    /// # Example
    /// ```
    /// use scout_client::GitHubClient;
    ///
    /// let client = GitHubClient::new("https://api.github.com");
    /// ```
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    ///
    /// # Example
    /// ```
    /// use scout_client::GitHubClient;
    /// use reqwest::Client;
    /// use std::time::Duration;
    ///
    /// let http_client = Client::builder()
    ///     .timeout(Duration::from_secs(30))
    ///     .build()
    ///     .unwrap();
    ///
    /// let client = GitHubClient::with_client("https://api.github.com", http_client);
    /// ```
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            token: None,
        }
    }

    /// Authenticate requests with a bearer token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.token = (!token.is_empty()).then_some(token);
        self
    }

    /// Get the base URL of the API
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Whether requests carry an Authorization header
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    // =============================================================================
    // Request / Response Handling
    // =============================================================================

    /// Start a GET request with the headers every call needs
    fn get(&self, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let request = self
            .client
            .get(url)
            .header(header::ACCEPT, ACCEPT)
            .header(header::USER_AGENT, USER_AGENT);

        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Handle an API response and deserialize JSON
    ///
    /// This method checks the status code and returns an appropriate error if
    /// the request failed, or deserializes the response body if successful.
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::service(status.as_u16(), error_text));
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body)
            .map_err(|e| ClientError::Parse(format!("Failed to parse JSON response: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = GitHubClient::new("https://api.github.com");
        assert_eq!(client.base_url(), "https://api.github.com");
        assert!(!client.is_authenticated());
    }

    #[test]
    fn test_client_trims_trailing_slash() {
        let client = GitHubClient::new("https://api.github.com/");
        assert_eq!(client.base_url(), "https://api.github.com");
    }

    #[test]
    fn test_client_with_custom_client() {
        let http_client = Client::new();
        let client = GitHubClient::with_client(DEFAULT_API_URL, http_client);
        assert_eq!(client.base_url(), DEFAULT_API_URL);
    }

    #[test]
    fn test_empty_token_is_ignored() {
        let client = GitHubClient::new(DEFAULT_API_URL).with_token("");
        assert!(!client.is_authenticated());

        let client = GitHubClient::new(DEFAULT_API_URL).with_token("ghp_secret");
        assert!(client.is_authenticated());
    }
}
