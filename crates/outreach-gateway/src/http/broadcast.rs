//! `POST /api/alerts/broadcast`: send one alert to every subscriber.
//!
//! Request: `{ "text": "...", "channel": "whatsapp" | "telegram" | "sms" }`
//! Response: `{ "success": true, "id", "channel", "timestamp", "sent", "failed", "total" }`
//!
//! Validation happens before any transport is touched. The dispatch itself
//! runs on its own task: if the client disconnects mid-broadcast the sends
//! still settle and the outcome is still recorded.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use chrono::{DateTime, Utc};
use outreach_core::{ChannelKind, OutreachError};
use outreach_dispatch::BroadcastRequest;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use super::error::ApiError;
use crate::app::AppState;

#[derive(Debug, Deserialize)]
pub struct BroadcastBody {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub channel: String,
}

#[derive(Debug, Serialize)]
pub struct BroadcastResponse {
    pub success: bool,
    pub id: i64,
    pub channel: ChannelKind,
    pub timestamp: DateTime<Utc>,
    pub sent: u32,
    pub failed: u32,
    pub total: u32,
}

pub async fn broadcast_handler(
    State(state): State<Arc<AppState>>,
    body: Result<Json<BroadcastBody>, JsonRejection>,
) -> Result<Json<BroadcastResponse>, ApiError> {
    let Json(body) = body?;
    let request = BroadcastRequest::parse(body.text, &body.channel)?;
    info!(channel = %request.channel(), "broadcast requested");

    let dispatcher = Arc::clone(&state.dispatcher);
    let record = tokio::spawn(async move { dispatcher.dispatch(request).await })
        .await
        .map_err(|e| OutreachError::Internal(format!("dispatch task failed: {e}")))??;

    Ok(Json(BroadcastResponse {
        success: true,
        id: record.id,
        channel: record.channel,
        timestamp: record.timestamp,
        sent: record.sent,
        failed: record.failed,
        total: record.total,
    }))
}
