//! Error types for the Scout client

use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur when querying the search endpoint
///
/// None of these are retried by the client; callers decide what to do.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request could not complete (DNS, connect, TLS, timeout)
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The endpoint answered with a non-success status code
    #[error("Search service error (status {status}): {message}")]
    Service {
        /// HTTP status code
        status: u16,
        /// Error body returned by the endpoint
        message: String,
    },

    /// The endpoint answered 2xx with a body that is not a search response
    #[error("Malformed search response: {0}")]
    Parse(String),
}

impl ClientError {
    /// Create a service error from status code and message
    pub fn service(status: u16, message: impl Into<String>) -> Self {
        Self::Service {
            status,
            message: message.into(),
        }
    }

    /// True for transport failures
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_))
    }

    /// True for non-success responses and malformed bodies
    pub fn is_service(&self) -> bool {
        matches!(self, Self::Service { .. } | Self::Parse(_))
    }

    /// Check if the endpoint refused the request for rate limiting
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::Service { status: 403 | 429, .. })
    }

    /// HTTP status, when the endpoint answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Service { status, .. } => Some(*status),
            Self::Network(err) => err.status().map(|s| s.as_u16()),
            Self::Parse(_) => None,
        }
    }
}
