use axum::{extract::State, Json};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::warn;

use crate::app::AppState;

/// GET /health: liveness probe, with the current subscriber count.
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    let subscribers = state
        .directory
        .count()
        .map_err(|e| warn!(error = %e, "health: subscriber count unavailable"))
        .ok();
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "subscribers": subscribers,
    }))
}
