use async_trait::async_trait;
use common::metrics::{record_cache_request, record_message};
use domain::{validate, Order};
use order_store::{CacheStats, OrderCache, OrderRepository, StoreError};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::errors::{ProcessingError, ProcessingStage};

/// Something that turns a raw message payload into a stored order
#[async_trait]
pub trait OrderProcessor: Send + Sync {
    /// Returns the order_uid of the stored order
    async fn process_message(&self, payload: &[u8]) -> Result<String, ProcessingError>;
}

/// Ties validation, durable storage and the in-process cache together.
///
/// The cache is owned by the service and only ever filled with orders that
/// storage already holds: after a committed write, after a storage read, or
/// at warm-up.
pub struct OrderService {
    repository: Arc<dyn OrderRepository>,
    cache: Box<dyn OrderCache>,
}

impl OrderService {
    pub fn new(repository: Arc<dyn OrderRepository>, cache: Box<dyn OrderCache>) -> Self {
        Self { repository, cache }
    }

    /// Decode, validate, persist and cache one order message
    pub async fn process_message(&self, payload: &[u8]) -> Result<String, ProcessingError> {
        let started = Instant::now();
        let result = self.ingest(payload).await;

        let outcome = match &result {
            Ok(_) => ProcessingStage::Done.as_str(),
            Err(e) => e.outcome(),
        };
        record_message(outcome, started.elapsed().as_secs_f64());

        result
    }

    async fn ingest(&self, payload: &[u8]) -> Result<String, ProcessingError> {
        let order: Order = serde_json::from_slice(payload).map_err(|e| {
            error!(error = %e, payload_len = payload.len(), "Failed to decode order");
            ProcessingError::Decode(e)
        })?;

        if let Err(e) = validate(&order) {
            warn!(
                order_uid = %order.order_uid,
                rule = e.rule(),
                error = %e,
                "Invalid order data"
            );
            return Err(ProcessingError::Validation {
                order_uid: order.order_uid,
                source: e,
            });
        }

        if let Err(e) = self.repository.save(&order).await {
            error!(order_uid = %order.order_uid, error = %e, "Failed to save order");
            return Err(ProcessingError::Persistence {
                order_uid: order.order_uid,
                source: e,
            });
        }

        self.refresh_cache(&order.order_uid).await;

        info!(order_uid = %order.order_uid, "Order processed successfully");
        Ok(order.order_uid)
    }

    /// Re-read a just-written order and cache what storage holds.
    ///
    /// Redelivered messages keep the first root row and append items again, so
    /// the message body alone can disagree with storage. When the read fails
    /// the entry is dropped, so the next lookup goes to storage.
    async fn refresh_cache(&self, order_uid: &str) {
        match self.repository.get_by_id(order_uid).await {
            Ok(Some(stored)) => self.cache.set(order_uid, stored).await,
            Ok(None) => {
                warn!(
                    order_uid = %order_uid,
                    "Saved order not found on read-back, dropping cache entry"
                );
                self.cache.remove(order_uid).await;
            }
            Err(e) => {
                warn!(
                    order_uid = %order_uid,
                    stage = %ProcessingStage::Cached,
                    error = %e,
                    "Failed to refresh cache after save, dropping cache entry"
                );
                self.cache.remove(order_uid).await;
            }
        }
    }

    /// Cache-aside lookup; a storage hit is written back to the cache, a miss is not.
    ///
    /// The write-back never replaces an entry set meanwhile by a save, whose
    /// read-back is at least as recent as this one.
    pub async fn get_by_id(&self, order_uid: &str) -> Result<Option<Order>, StoreError> {
        if let Some(order) = self.cache.get(order_uid).await {
            record_cache_request(true);
            debug!(order_uid = %order_uid, "Order found in cache");
            return Ok(Some(order));
        }

        record_cache_request(false);
        debug!(order_uid = %order_uid, "Order not found in cache, querying database");

        let order = self.repository.get_by_id(order_uid).await.map_err(|e| {
            error!(order_uid = %order_uid, error = %e, "Failed to get order from database");
            e
        })?;

        if let Some(order) = &order {
            self.cache.insert_if_absent(order_uid, order.clone()).await;
        }

        Ok(order)
    }

    /// Load every stored order into the cache. Must run before traffic is accepted.
    pub async fn restore_cache(&self) -> Result<usize, StoreError> {
        info!("Restoring cache from database");

        let orders = self.repository.get_all().await.map_err(|e| {
            error!(error = %e, "Failed to get orders from database");
            e
        })?;
        let count = orders.len();
        self.cache.load_bulk(orders).await;

        info!(num_orders = count, "Orders restored successfully");
        Ok(count)
    }

    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.stats().await
    }
}

#[async_trait]
impl OrderProcessor for OrderService {
    async fn process_message(&self, payload: &[u8]) -> Result<String, ProcessingError> {
        OrderService::process_message(self, payload).await
    }
}
