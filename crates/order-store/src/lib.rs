pub mod cache;
pub mod repositories;

pub use cache::{CacheStats, InMemoryOrderCache, OrderCache};
pub use repositories::{InMemoryOrderRepository, OrderRepository, PostgresOrderRepository};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Write failed: {0}")]
    WriteFailed(String),
}
