pub mod consumer;
pub mod errors;
pub mod service;

pub use consumer::{ConsumerStats, OrderConsumer};
pub use errors::{ProcessingError, ProcessingStage};
pub use service::{OrderProcessor, OrderService};
