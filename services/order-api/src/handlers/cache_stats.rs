use axum::{extract::State, Json};
use order_store::CacheStats;

use crate::state::AppState;

/// Size of the in-process cache and the ids it holds
pub async fn cache_stats_handler(State(state): State<AppState>) -> Json<CacheStats> {
    Json(state.service.cache_stats().await)
}
