pub mod cache_stats;
pub mod get_order;
pub mod health;
