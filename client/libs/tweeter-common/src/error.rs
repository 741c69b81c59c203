//! Unified error handling for the Tweeter client
//!
//! Every backend, storage and configuration failure is mapped onto
//! [`ClientError`] so stores can log the cause and surface a generic message.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for the Tweeter client
pub type Result<T> = std::result::Result<T, ClientError>;

/// Unified error type for client operations
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "error_type", content = "details")]
pub enum ClientError {
    /// Backend unreachable or the request never completed
    #[error("Network error: {0}")]
    Network(String),

    /// Backend answered with a non-success status
    #[error("Backend error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Response body could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),

    /// No session, or the backend rejected the credentials
    #[error("Not authenticated: {0}")]
    Unauthenticated(String),

    /// Caller-supplied input rejected before reaching the backend
    #[error("Validation error: {0}")]
    Validation(String),

    /// Durable local storage failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// Invalid or missing configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Anything else
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ClientError {
    /// HTTP-style status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Network(_) => 503,
            Self::Api { status, .. } => *status,
            Self::Decode(_) => 502,
            Self::Unauthenticated(_) => 401,
            Self::Validation(_) => 400,
            Self::Storage(_) => 500,
            Self::Config(_) => 500,
            Self::Internal(_) => 500,
        }
    }

    /// Check if re-issuing the same request could succeed.
    ///
    /// Nothing in the client retries automatically; this only informs callers
    /// deciding whether to offer a retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            ClientError::Api {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            ClientError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Decode(err.to_string())
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        ClientError::Storage(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ClientError::Network("down".into()).status_code(), 503);
        assert_eq!(
            ClientError::Api {
                status: 409,
                message: "duplicate".into()
            }
            .status_code(),
            409
        );
        assert_eq!(ClientError::Unauthenticated("no session".into()).status_code(), 401);
    }

    #[test]
    fn test_retryable() {
        assert!(ClientError::Network("reset".into()).is_retryable());
        assert!(ClientError::Api {
            status: 503,
            message: "busy".into()
        }
        .is_retryable());
        assert!(!ClientError::Api {
            status: 400,
            message: "bad".into()
        }
        .is_retryable());
        assert!(!ClientError::Decode("eof".into()).is_retryable());
    }

    #[test]
    fn test_serde_tagging() {
        let json = serde_json::to_value(ClientError::Storage("disk full".into())).unwrap();
        assert_eq!(json["error_type"], "Storage");
        assert_eq!(json["details"], "disk full");
    }
}
