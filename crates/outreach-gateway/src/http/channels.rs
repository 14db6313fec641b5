use axum::{extract::State, Json};
use outreach_channels::ChannelStatus;
use outreach_core::ChannelKind;
use serde::Serialize;
use std::sync::Arc;

use crate::app::AppState;

#[derive(Debug, Serialize)]
pub struct ChannelEntry {
    pub channel: ChannelKind,
    pub status: ChannelStatus,
}

/// GET /api/channels: every supported channel and whether it can send.
pub async fn channels_handler(State(state): State<Arc<AppState>>) -> Json<Vec<ChannelEntry>> {
    Json(
        state
            .channels
            .statuses()
            .into_iter()
            .map(|(channel, status)| ChannelEntry { channel, status })
            .collect(),
    )
}
