use async_trait::async_trait;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::{mpsc, Mutex};

use crate::ConsumerError;

/// A message pulled from the broker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedMessage {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
    pub payload: Vec<u8>,
}

/// Anything the ingestion loop can pull raw order payloads from
#[async_trait]
pub trait MessageSource: Send + Sync {
    /// Wait for the next message. Must be safe to drop mid-await.
    async fn recv(&self) -> Result<ReceivedMessage, ConsumerError>;

    /// Release broker-side resources. No messages are delivered afterwards.
    fn close(&self);
}

/// In-memory source fed through a tokio channel.
///
/// `Err` values pushed into the channel are handed out as-is, which lets
/// callers script transport failures.
pub struct ChannelSource {
    topic: String,
    receiver: Mutex<mpsc::UnboundedReceiver<Result<Vec<u8>, ConsumerError>>>,
    next_offset: AtomicI64,
}

/// Sending half of a [`ChannelSource`]
#[derive(Clone)]
pub struct ChannelSender {
    sender: mpsc::UnboundedSender<Result<Vec<u8>, ConsumerError>>,
}

impl ChannelSender {
    pub fn send(&self, payload: impl Into<Vec<u8>>) -> bool {
        self.sender.send(Ok(payload.into())).is_ok()
    }

    pub fn send_error(&self, error: ConsumerError) -> bool {
        self.sender.send(Err(error)).is_ok()
    }
}

impl ChannelSource {
    pub fn new(topic: &str) -> (ChannelSender, Self) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let source = Self {
            topic: topic.to_string(),
            receiver: Mutex::new(receiver),
            next_offset: AtomicI64::new(0),
        };
        (ChannelSender { sender }, source)
    }
}

#[async_trait]
impl MessageSource for ChannelSource {
    async fn recv(&self) -> Result<ReceivedMessage, ConsumerError> {
        let mut receiver = self.receiver.lock().await;
        match receiver.recv().await {
            Some(Ok(payload)) => Ok(ReceivedMessage {
                topic: self.topic.clone(),
                partition: 0,
                offset: self.next_offset.fetch_add(1, Ordering::SeqCst),
                payload,
            }),
            Some(Err(e)) => Err(e),
            None => Err(ConsumerError::Closed),
        }
    }

    fn close(&self) {
        if let Ok(mut receiver) = self.receiver.try_lock() {
            receiver.close();
        }
    }
}
