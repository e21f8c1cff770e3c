use async_trait::async_trait;
use domain::{Delivery, Item, Order, Payment};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

use super::order_repository::OrderRepository;
use crate::StoreError;

#[derive(Debug, Clone, Default)]
struct Tables {
    orders: HashMap<String, Order>,
    deliveries: HashMap<String, Delivery>,
    payments: HashMap<String, Payment>,
    items: Vec<(String, Item)>,
}

impl Tables {
    fn assemble(&self, order_uid: &str) -> Option<Order> {
        let mut order = self.orders.get(order_uid)?.clone();
        order.delivery = self.deliveries.get(order_uid).cloned().unwrap_or_default();
        order.payment = self.payments.get(order_uid).cloned().unwrap_or_default();
        order.items = self
            .items
            .iter()
            .filter(|(uid, _)| uid == order_uid)
            .map(|(_, item)| item.clone())
            .collect();
        Some(order)
    }
}

/// Repository kept entirely in memory, with the same write semantics as the
/// PostgreSQL one and switches for simulating storage faults.
///
/// Writes are staged on a copy of the tables and swapped in only when every
/// step succeeded, so a failed save leaves nothing behind.
#[derive(Debug, Default)]
pub struct InMemoryOrderRepository {
    tables: RwLock<Tables>,
    unavailable: AtomicBool,
    fail_item_inserts: AtomicBool,
    failing_reads: Mutex<HashSet<String>>,
    reads: AtomicUsize,
    saves: AtomicUsize,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate losing (or regaining) the storage connection.
    pub fn set_available(&self, available: bool) {
        self.unavailable.store(!available, Ordering::SeqCst);
    }

    /// Make the item step of every save fail after the other tables were written.
    pub fn fail_item_inserts(&self, fail: bool) {
        self.fail_item_inserts.store(fail, Ordering::SeqCst);
    }

    /// Make loading one order fail while every other order still loads.
    ///
    /// `get_by_id` returns an error for it and `get_all` skips it.
    pub async fn fail_reads_for(&self, order_uid: &str, fail: bool) {
        let mut failing = self.failing_reads.lock().await;
        if fail {
            failing.insert(order_uid.to_string());
        } else {
            failing.remove(order_uid);
        }
    }

    /// Number of read round-trips served (`get_by_id` and `get_all`).
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Number of committed saves.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Whether a root row exists, without counting as a read.
    pub async fn contains(&self, order_uid: &str) -> bool {
        self.tables.read().await.orders.contains_key(order_uid)
    }

    fn ensure_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn save(&self, order: &Order) -> Result<(), StoreError> {
        self.ensure_available()?;

        let mut tables = self.tables.write().await;
        let mut staged = tables.clone();
        let order_uid = order.order_uid.clone();

        staged
            .orders
            .entry(order_uid.clone())
            .or_insert_with(|| order.root());
        staged
            .deliveries
            .insert(order_uid.clone(), order.delivery.clone());
        staged
            .payments
            .insert(order_uid.clone(), order.payment.clone());

        for item in &order.items {
            if self.fail_item_inserts.load(Ordering::SeqCst) {
                return Err(StoreError::WriteFailed(format!(
                    "failed to insert item for order {}",
                    order_uid
                )));
            }
            staged.items.push((order_uid.clone(), item.clone()));
        }

        *tables = staged;
        self.saves.fetch_add(1, Ordering::SeqCst);
        debug!(order_uid = %order_uid, "Order saved in memory");
        Ok(())
    }

    async fn get_by_id(&self, order_uid: &str) -> Result<Option<Order>, StoreError> {
        self.ensure_available()?;
        self.reads.fetch_add(1, Ordering::SeqCst);

        if self.failing_reads.lock().await.contains(order_uid) {
            return Err(StoreError::Unavailable(format!(
                "failed to load order {}",
                order_uid
            )));
        }

        Ok(self.tables.read().await.assemble(order_uid))
    }

    async fn get_all(&self) -> Result<Vec<Order>, StoreError> {
        self.ensure_available()?;
        self.reads.fetch_add(1, Ordering::SeqCst);

        let failing = self.failing_reads.lock().await;
        let tables = self.tables.read().await;
        let mut order_uids: Vec<&String> = tables.orders.keys().collect();
        order_uids.sort();

        let mut orders = Vec::with_capacity(order_uids.len());
        for order_uid in order_uids {
            if failing.contains(order_uid) {
                warn!(order_uid = %order_uid, "Failed to load order, skipping");
                continue;
            }
            orders.extend(tables.assemble(order_uid));
        }
        Ok(orders)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(order_uid: &str, delivery_name: &str, items: usize) -> Order {
        Order {
            order_uid: order_uid.to_string(),
            track_number: "TN".to_string(),
            delivery: Delivery {
                name: delivery_name.to_string(),
                ..Default::default()
            },
            payment: Payment {
                amount: 100,
                ..Default::default()
            },
            items: (0..items)
                .map(|i| Item {
                    chrt_id: i as i64 + 1,
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let repository = InMemoryOrderRepository::new();
        let saved = order("o1", "A", 2);

        repository.save(&saved).await.unwrap();

        assert_eq!(repository.get_by_id("o1").await.unwrap(), Some(saved));
        assert_eq!(repository.get_by_id("missing").await.unwrap(), None);
        assert_eq!(repository.read_count(), 2);
    }

    #[tokio::test]
    async fn test_root_is_insert_once_and_delivery_is_overwritten() {
        let repository = InMemoryOrderRepository::new();
        repository.save(&order("o1", "A", 1)).await.unwrap();

        let mut second = order("o1", "B", 1);
        second.track_number = "CHANGED".to_string();
        repository.save(&second).await.unwrap();

        let loaded = repository.get_by_id("o1").await.unwrap().unwrap();
        assert_eq!(loaded.track_number, "TN");
        assert_eq!(loaded.delivery.name, "B");
        assert_eq!(loaded.items.len(), 2);
    }

    #[tokio::test]
    async fn test_failed_item_insert_leaves_no_rows() {
        let repository = InMemoryOrderRepository::new();
        repository.fail_item_inserts(true);

        let result = repository.save(&order("o1", "A", 1)).await;
        assert!(matches!(result, Err(StoreError::WriteFailed(_))));
        assert!(!repository.contains("o1").await);
        assert_eq!(repository.save_count(), 0);
    }

    #[tokio::test]
    async fn test_unavailable_storage_fails_every_call() {
        let repository = InMemoryOrderRepository::new();
        repository.save(&order("o1", "A", 1)).await.unwrap();
        repository.set_available(false);

        assert!(matches!(
            repository.get_by_id("o1").await,
            Err(StoreError::Unavailable(_))
        ));
        assert!(repository.get_all().await.is_err());
        assert!(repository.save(&order("o2", "A", 1)).await.is_err());

        repository.set_available(true);
        assert_eq!(repository.get_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_get_all_skips_order_that_fails_to_load() {
        let repository = InMemoryOrderRepository::new();
        for uid in ["a", "b", "c"] {
            repository.save(&order(uid, "A", 1)).await.unwrap();
        }
        repository.fail_reads_for("b", true).await;

        let uids: Vec<String> = repository
            .get_all()
            .await
            .unwrap()
            .into_iter()
            .map(|o| o.order_uid)
            .collect();
        assert_eq!(uids, vec!["a", "c"]);
        assert!(matches!(
            repository.get_by_id("b").await,
            Err(StoreError::Unavailable(_))
        ));

        repository.fail_reads_for("b", false).await;
        assert_eq!(repository.get_all().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_get_all_is_sorted_by_order_uid() {
        let repository = InMemoryOrderRepository::new();
        for uid in ["c", "a", "b"] {
            repository.save(&order(uid, "A", 1)).await.unwrap();
        }

        let uids: Vec<String> = repository
            .get_all()
            .await
            .unwrap()
            .into_iter()
            .map(|o| o.order_uid)
            .collect();
        assert_eq!(uids, vec!["a", "b", "c"]);
    }
}
