use axum::{extract::State, Json};
use outreach_dispatch::AnalyticsSnapshot;
use std::sync::Arc;

use super::error::ApiError;
use crate::app::AppState;

/// GET /api/analytics/stats
pub async fn stats_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<AnalyticsSnapshot>, ApiError> {
    Ok(Json(state.analytics.snapshot()?))
}
