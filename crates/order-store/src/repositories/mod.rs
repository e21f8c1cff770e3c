pub mod in_memory;
pub mod order_repository;

pub use in_memory::InMemoryOrderRepository;
pub use order_repository::{OrderRepository, PostgresOrderRepository};
