//! Error types for LMS API access

use thiserror::Error;

/// Errors that can occur when talking to the LMS API
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed before a response arrived
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    /// API answered with a non-success status
    #[error("API error ({status}) on {path}: {message}")]
    Http {
        /// HTTP status code
        status: u16,
        /// Route path that was requested
        path: String,
        /// Response body, if any
        message: String,
    },

    /// Response body was not valid JSON
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Base URL could not be parsed or cannot carry a path
    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),

    /// The navigation that issued the request was abandoned
    #[error("Request cancelled")]
    Cancelled,
}

impl ApiError {
    /// Check if this error is recoverable (user can retry)
    pub fn is_recoverable(&self) -> bool {
        match self {
            ApiError::RequestError(_) | ApiError::Cancelled => true,
            ApiError::Http { status, .. } => *status >= 500 || *status == 408 || *status == 429,
            ApiError::JsonError(_) | ApiError::InvalidUrl(_) => false,
        }
    }

    /// Check if this error means the resource does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::Http { status: 404, .. })
    }
}
