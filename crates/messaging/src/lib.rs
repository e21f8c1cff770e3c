pub mod consumer;
pub mod source;

pub use consumer::{ConsumerError, KafkaOrderConsumer};
pub use source::{ChannelSender, ChannelSource, MessageSource, ReceivedMessage};
