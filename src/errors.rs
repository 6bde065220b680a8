// Copyright (c) 2025 - Cowboy AI, Inc.
//! Error types for store and notification I/O

use thiserror::Error;

/// Errors raised while talking to the document store
///
/// A backend that answers but refuses a write is not an error: that outcome is
/// reported through `is_valid` on the response types.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Backend settings are unusable
    #[error("Store configuration error: {0}")]
    Configuration(String),

    /// Backend unreachable or the request could not be sent
    #[error("Store transport error: {0}")]
    Transport(String),

    /// Backend answered a read with a status that is neither found nor missing
    #[error("Store returned {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    /// Document could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        StoreError::Transport(err.to_string())
    }
}

/// Errors raised while delivering a notification to one channel
#[derive(Debug, Error)]
pub enum NotifyError {
    /// HTTP request failed before a response arrived
    #[error("HTTP error: {0}")]
    Http(String),

    /// Remote endpoint answered with a non-success status
    #[error("Channel returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Subscription has no webhook URL / topic ARN for its channel type
    #[error("Subscription for category `{0}` has no destination")]
    MissingDestination(String),

    /// Destination is present but unusable
    #[error("Invalid destination: {0}")]
    InvalidDestination(String),

    /// Notification requested without a category
    #[error("The category can not be null or whitespace")]
    MissingCategory,

    /// Payload could not be serialized
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Request signing failed
    #[error("Signing error: {0}")]
    Signing(String),

    /// Channel type has no registered adapter
    #[error("Notification channel `{0}` is not supported")]
    UnsupportedChannel(String),

    /// The caller cancelled delivery
    #[error("Notification cancelled")]
    Cancelled,
}

/// Result type for notification delivery
pub type NotifyResult<T> = Result<T, NotifyError>;

impl From<serde_json::Error> for NotifyError {
    fn from(err: serde_json::Error) -> Self {
        NotifyError::Serialization(err.to_string())
    }
}

impl From<reqwest::Error> for NotifyError {
    fn from(err: reqwest::Error) -> Self {
        NotifyError::Http(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_display() {
        let err = StoreError::Transport("connection refused".to_string());
        assert_eq!(err.to_string(), "Store transport error: connection refused");
    }

    #[test]
    fn test_notify_error_from_serde() {
        let parse = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: NotifyError = parse.into();
        assert!(matches!(err, NotifyError::Serialization(_)));
    }

    #[test]
    fn test_status_error_display() {
        let err = NotifyError::Status {
            status: 404,
            body: "no_team".to_string(),
        };
        assert_eq!(err.to_string(), "Channel returned 404: no_team");
    }
}
