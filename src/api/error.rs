//! Error types for the platform API and lesson data layer

use thiserror::Error;

/// Errors that can occur when talking to the platform or decoding its data
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport failure (connection refused, DNS, timeout, ...)
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The requested resource does not exist
    #[error("{resource} not found")]
    NotFound {
        /// Human readable description of what was missing
        resource: String,
    },

    /// Credentials were missing or rejected
    #[error("Not authorized ({status}). Please sign in again")]
    Unauthorized {
        /// HTTP status code (401 or 403)
        status: u16,
    },

    /// API returned a non-success status
    #[error("API error ({status}): {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body or reason phrase
        message: String,
    },

    /// Malformed data, e.g. a lesson without an id or corrupted local JSON
    #[error("Invalid data: {0}")]
    Validation(String),

    /// Remote code execution reported a runtime error
    #[error("Execution failed: {0}")]
    Execution(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Failed to access the system keyring
    #[error("Failed to access keyring: {0}")]
    Keyring(String),
}

impl ApiError {
    /// Shorthand for a missing resource
    pub fn not_found(resource: impl Into<String>) -> Self {
        ApiError::NotFound { resource: resource.into() }
    }

    /// Check if this error is recoverable (user can retry)
    pub fn is_recoverable(&self) -> bool {
        match self {
            ApiError::Network(_) => true,
            ApiError::Status { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// Check if this error requires re-authentication
    pub fn requires_reauth(&self) -> bool {
        matches!(self, ApiError::Unauthorized { .. })
    }

    /// Short, friendly message suitable for an inline error panel
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Network(_) => {
                "Could not reach the server. Check your connection and try again.".to_string()
            }
            ApiError::NotFound { resource } => format!("{} could not be found.", resource),
            ApiError::Unauthorized { .. } => "Your session has expired. Please sign in again.".into(),
            ApiError::Status { status, .. } if *status >= 500 => {
                "The server had a problem. Please try again in a moment.".to_string()
            }
            other => other.to_string(),
        }
    }
}
