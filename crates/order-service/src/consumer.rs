use common::metrics::record_transport_error;
use messaging::{ConsumerError, MessageSource};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::service::OrderProcessor;

/// Counters for one run of the consumer loop
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsumerStats {
    pub received: u64,
    pub processed: u64,
    pub failed: u64,
    pub transport_errors: u64,
}

/// Pulls order messages and hands each payload to the processor.
///
/// A failing message is logged and skipped; its offset is not held back and
/// it is not retried. Broker read failures are logged and reading resumes
/// after `error_backoff`.
pub struct OrderConsumer {
    source: Box<dyn MessageSource>,
    processor: Arc<dyn OrderProcessor>,
    error_backoff: Duration,
}

impl OrderConsumer {
    pub fn new(source: Box<dyn MessageSource>, processor: Arc<dyn OrderProcessor>) -> Self {
        Self {
            source,
            processor,
            error_backoff: Duration::from_secs(1),
        }
    }

    pub fn with_error_backoff(mut self, error_backoff: Duration) -> Self {
        self.error_backoff = error_backoff;
        self
    }

    /// Consume until `shutdown` is cancelled or the source closes.
    ///
    /// Cancellation is checked between messages, so a message already being
    /// processed is finished first. The source is closed before returning.
    pub async fn run(self, shutdown: CancellationToken) -> ConsumerStats {
        info!("Starting order consumer");
        let mut stats = ConsumerStats::default();

        loop {
            let received = tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    info!("Shutdown requested, stopping order consumer");
                    break;
                }
                received = self.source.recv() => received,
            };

            match received {
                Ok(message) => {
                    stats.received += 1;
                    match self.processor.process_message(&message.payload).await {
                        Ok(order_uid) => {
                            stats.processed += 1;
                            debug!(
                                order_uid = %order_uid,
                                partition = message.partition,
                                offset = message.offset,
                                "Message processed"
                            );
                        }
                        Err(e) => {
                            stats.failed += 1;
                            error!(
                                stage = %e.stage(),
                                topic = %message.topic,
                                partition = message.partition,
                                offset = message.offset,
                                error = %e,
                                "Failed to process order message, skipping"
                            );
                        }
                    }
                }
                Err(ConsumerError::Closed) => {
                    info!("Message source closed, stopping order consumer");
                    break;
                }
                Err(ConsumerError::NoPayload) => {
                    stats.received += 1;
                    stats.failed += 1;
                    error!("Received message without payload, skipping");
                }
                Err(e) => {
                    stats.transport_errors += 1;
                    record_transport_error();
                    error!(error = %e, "Failed to read message from broker");

                    tokio::select! {
                        _ = shutdown.cancelled() => {
                            info!("Shutdown requested, stopping order consumer");
                            break;
                        }
                        _ = tokio::time::sleep(self.error_backoff) => {}
                    }
                }
            }
        }

        self.source.close();
        info!(
            received = stats.received,
            processed = stats.processed,
            failed = stats.failed,
            transport_errors = stats.transport_errors,
            "Order consumer stopped"
        );

        stats
    }
}
