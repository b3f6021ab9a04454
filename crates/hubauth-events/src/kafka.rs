//! Kafka-backed event publisher.
//!
//! Subjects map to the record key within one configured topic, so
//! per-owner ordering is preserved by key partitioning.

use std::time::Duration;

use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use rdkafka::util::Timeout;
use tracing::{debug, info};

use crate::error::EventError;
use crate::publisher::EventPublisher;

/// Kafka connection settings.
#[derive(Debug, Clone)]
pub struct KafkaConfig {
    /// Comma-separated broker list.
    pub bootstrap_servers: String,
    /// Client identifier reported to the brokers.
    pub client_id: String,
    /// Topic all device ownership events are published to.
    pub topic: String,
}

/// Kafka event publisher.
pub struct KafkaPublisher {
    producer: FutureProducer,
    topic: String,
}

impl KafkaPublisher {
    /// Create a publisher with acknowledged, bounded-time delivery.
    pub fn new(config: &KafkaConfig) -> Result<Self, EventError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", &config.bootstrap_servers)
            .set("client.id", &config.client_id)
            .set("message.timeout.ms", "5000")
            .set("acks", "all")
            .create()
            .map_err(|e| EventError::ConnectionFailed {
                broker: config.bootstrap_servers.clone(),
                cause: e.to_string(),
            })?;

        info!(
            bootstrap_servers = %config.bootstrap_servers,
            client_id = %config.client_id,
            topic = %config.topic,
            "kafka publisher created"
        );

        Ok(Self {
            producer,
            topic: config.topic.clone(),
        })
    }
}

#[async_trait]
impl EventPublisher for KafkaPublisher {
    async fn publish_data(&self, subject: &str, payload: Vec<u8>) -> Result<(), EventError> {
        let record = FutureRecord::to(&self.topic).key(subject).payload(&payload);

        let (partition, offset) = self
            .producer
            .send(record, Duration::from_secs(5))
            .await
            .map_err(|(err, _)| EventError::PublishFailed {
                subject: subject.to_string(),
                cause: err.to_string(),
            })?;

        debug!(
            subject = %subject,
            partition = partition,
            offset = offset,
            "event published"
        );
        Ok(())
    }

    async fn flush(&self) -> Result<(), EventError> {
        self.producer
            .flush(Timeout::After(Duration::from_secs(5)))
            .map_err(|e| EventError::FlushFailed {
                cause: e.to_string(),
            })
    }
}
