//! The event-publisher capability.

use async_trait::async_trait;
use tracing::debug;

use crate::error::EventError;

/// Publishes opaque payloads to named subjects.
///
/// The lifecycle service treats delivery as fire-and-forget; any concrete
/// message-bus client satisfies this contract.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish one payload to a subject.
    async fn publish_data(&self, subject: &str, payload: Vec<u8>) -> Result<(), EventError>;

    /// Wait for pending deliveries to complete.
    async fn flush(&self) -> Result<(), EventError>;
}

/// Publisher for deployments without an event bus; drops every event
/// after logging it.
#[derive(Debug, Clone, Default)]
pub struct NoopPublisher;

#[async_trait]
impl EventPublisher for NoopPublisher {
    async fn publish_data(&self, subject: &str, payload: Vec<u8>) -> Result<(), EventError> {
        debug!(subject = %subject, payload_size = payload.len(), "event bus disabled, dropping event");
        Ok(())
    }

    async fn flush(&self) -> Result<(), EventError> {
        Ok(())
    }
}
