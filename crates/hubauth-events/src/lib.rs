//! # hubauth-events
//!
//! Event payloads and the publisher capability for device ownership
//! changes.
//!
//! Events are addressed to a per-owner subject and delivered best-effort:
//! the lifecycle service logs and swallows publish failures, so a missed
//! notification never rolls back a completed deletion.
//!
//! ## Cargo features
//!
//! - `kafka`: enable the Kafka-backed [`KafkaPublisher`] (requires
//!   librdkafka).

pub mod error;
pub mod event;
pub mod publisher;

#[cfg(feature = "kafka")]
pub mod kafka;

pub use error::EventError;
pub use event::{owner_subject, AuditContext, DevicesUnregistered, DEVICES_UNREGISTERED};
pub use publisher::{EventPublisher, NoopPublisher};

#[cfg(feature = "kafka")]
pub use kafka::{KafkaConfig, KafkaPublisher};
