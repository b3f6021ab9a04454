//! Error types for the hubauth-events crate.

use thiserror::Error;

/// Errors raised while configuring or publishing events.
#[derive(Debug, Error)]
pub enum EventError {
    /// Required configuration variable is missing.
    #[error("configuration missing: {var}")]
    ConfigMissing { var: String },

    /// Configuration value is invalid.
    #[error("configuration invalid for {var}: {reason}")]
    ConfigInvalid { var: String, reason: String },

    /// Failed to connect to the event broker.
    #[error("connection to broker {broker} failed: {cause}")]
    ConnectionFailed { broker: String, cause: String },

    /// Failed to publish to a subject.
    #[error("failed to publish to {subject}: {cause}")]
    PublishFailed { subject: String, cause: String },

    /// Failed to serialize an event payload.
    #[error("failed to serialize event: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    /// Failed to flush pending deliveries.
    #[error("failed to flush publisher: {cause}")]
    FlushFailed { cause: String },
}
