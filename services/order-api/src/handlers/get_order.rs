use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use domain::Order;
use serde_json::{json, Value};
use tracing::{error, info};

use crate::state::AppState;

/// Get a single order by order_uid, served from the cache when possible
pub async fn get_order_handler(
    State(state): State<AppState>,
    Path(order_uid): Path<String>,
) -> Result<Json<Order>, (StatusCode, Json<Value>)> {
    match state.service.get_by_id(&order_uid).await {
        Ok(Some(order)) => Ok(Json(order)),
        Ok(None) => {
            info!(order_uid = %order_uid, "Order not found");
            Err((
                StatusCode::NOT_FOUND,
                Json(json!({ "error": "order not found" })),
            ))
        }
        Err(e) => {
            error!(order_uid = %order_uid, error = %e, "Failed to get order");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "failed to get order" })),
            ))
        }
    }
}
