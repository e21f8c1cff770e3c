use async_trait::async_trait;
use common::metrics::set_cache_size;
use domain::Order;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Snapshot of what the cache currently holds
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub total_orders: usize,
    pub order_uids: Vec<String>,
}

/// In-process index from order_uid to order
#[async_trait]
pub trait OrderCache: Send + Sync {
    /// Insert or replace the entry for `order_uid`
    async fn set(&self, order_uid: &str, order: Order);

    /// Insert only when no entry exists yet. Returns whether the order was stored.
    async fn insert_if_absent(&self, order_uid: &str, order: Order) -> bool;

    /// Drop the entry so the next read goes to storage
    async fn remove(&self, order_uid: &str);

    async fn get(&self, order_uid: &str) -> Option<Order>;

    /// Insert many orders at once, replacing existing entries with the same uid
    async fn load_bulk(&self, orders: Vec<Order>);

    async fn stats(&self) -> CacheStats;
}

/// Unbounded map guarded by a reader/writer lock. Entries are never evicted.
#[derive(Debug, Default)]
pub struct InMemoryOrderCache {
    orders: RwLock<HashMap<String, Order>>,
}

impl InMemoryOrderCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderCache for InMemoryOrderCache {
    async fn set(&self, order_uid: &str, order: Order) {
        let mut orders = self.orders.write().await;
        orders.insert(order_uid.to_string(), order);
        set_cache_size(orders.len());
        debug!(order_uid = %order_uid, "Order added to cache");
    }

    async fn insert_if_absent(&self, order_uid: &str, order: Order) -> bool {
        let mut orders = self.orders.write().await;
        if orders.contains_key(order_uid) {
            debug!(order_uid = %order_uid, "Order already cached, keeping existing entry");
            return false;
        }
        orders.insert(order_uid.to_string(), order);
        set_cache_size(orders.len());
        debug!(order_uid = %order_uid, "Order added to cache");
        true
    }

    async fn remove(&self, order_uid: &str) {
        let mut orders = self.orders.write().await;
        if orders.remove(order_uid).is_some() {
            set_cache_size(orders.len());
            debug!(order_uid = %order_uid, "Order removed from cache");
        }
    }

    async fn get(&self, order_uid: &str) -> Option<Order> {
        self.orders.read().await.get(order_uid).cloned()
    }

    async fn load_bulk(&self, loaded: Vec<Order>) {
        let count = loaded.len();
        let mut orders = self.orders.write().await;
        for order in loaded {
            orders.insert(order.order_uid.clone(), order);
        }
        set_cache_size(orders.len());
        info!(orders_count = count, cache_size = orders.len(), "Cache loaded from database");
    }

    async fn stats(&self) -> CacheStats {
        let orders = self.orders.read().await;
        let mut order_uids: Vec<String> = orders.keys().cloned().collect();
        order_uids.sort();

        CacheStats {
            total_orders: orders.len(),
            order_uids,
        }
    }
}
