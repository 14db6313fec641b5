use axum::{
    extract::{Query, State},
    Json,
};
use outreach_ledger::{BroadcastRecord, LedgerStore};
use serde::Deserialize;
use std::sync::Arc;

use super::error::ApiError;
use crate::app::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

/// GET /api/history: broadcast records, newest first.
pub async fn history_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<BroadcastRecord>>, ApiError> {
    Ok(Json(state.ledger.list(query.limit)?))
}
