use async_trait::async_trait;
use common::KafkaConfig;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::error::KafkaError;
use rdkafka::message::Message;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::source::{MessageSource, ReceivedMessage};

#[derive(Debug, Error)]
pub enum ConsumerError {
    #[error("Failed to create Kafka consumer: {0}")]
    ConsumerCreation(#[from] KafkaError),

    #[error("Kafka error while receiving: {0}")]
    Transport(#[source] KafkaError),

    #[error("Message has no payload")]
    NoPayload,

    #[error("Message source closed")]
    Closed,
}

/// Kafka consumer subscribed to the order topic.
///
/// Offsets are auto-committed as messages are handed out, whatever the
/// outcome of processing them.
pub struct KafkaOrderConsumer {
    consumer: StreamConsumer,
    topic: String,
}

impl KafkaOrderConsumer {
    /// Create a new Kafka consumer and subscribe it to the configured topic
    pub fn new(config: &KafkaConfig) -> Result<Self, ConsumerError> {
        info!(
            group_id = %config.group_id,
            topic = %config.topic,
            brokers = %config.brokers,
            "Creating Kafka consumer"
        );

        let consumer: StreamConsumer = client_config(config).create()?;
        consumer.subscribe(&[config.topic.as_str()])?;

        info!("Kafka consumer created successfully");
        Ok(Self {
            consumer,
            topic: config.topic.clone(),
        })
    }
}

fn client_config(config: &KafkaConfig) -> ClientConfig {
    let mut client = ClientConfig::new();
    client
        .set("group.id", &config.group_id)
        .set("bootstrap.servers", &config.brokers)
        .set("enable.auto.commit", "true")
        .set("auto.commit.interval.ms", "1000")
        .set("auto.offset.reset", "earliest")
        .set("enable.partition.eof", "false")
        .set("session.timeout.ms", "30000")
        .set("heartbeat.interval.ms", "10000");
    client
}

#[async_trait]
impl MessageSource for KafkaOrderConsumer {
    async fn recv(&self) -> Result<ReceivedMessage, ConsumerError> {
        let message = self.consumer.recv().await.map_err(ConsumerError::Transport)?;

        debug!(
            topic = message.topic(),
            partition = message.partition(),
            offset = message.offset(),
            "Received message from Kafka"
        );

        match message.payload() {
            Some(payload) => Ok(ReceivedMessage {
                topic: message.topic().to_string(),
                partition: message.partition(),
                offset: message.offset(),
                payload: payload.to_vec(),
            }),
            None => {
                warn!(offset = message.offset(), "Message has no payload");
                Err(ConsumerError::NoPayload)
            }
        }
    }

    fn close(&self) {
        self.consumer.unsubscribe();
        info!(topic = %self.topic, "Kafka consumer unsubscribed");
    }
}
