use axum::{
    routing::{delete, get, post},
    Router,
};
use outreach_channels::ChannelManager;
use outreach_core::OutreachConfig;
use outreach_dispatch::{Aggregator, Dispatcher};
use outreach_ledger::BroadcastLedger;
use outreach_subscribers::SubscriberDirectory;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::http;

/// Central shared state, passed as `Arc<AppState>` to all Axum handlers.
pub struct AppState {
    pub directory: Arc<SubscriberDirectory>,
    pub ledger: Arc<BroadcastLedger>,
    pub channels: Arc<ChannelManager>,
    /// Shared with spawned dispatch tasks so a dropped request still finishes.
    pub dispatcher: Arc<Dispatcher>,
    pub analytics: Aggregator,
}

impl AppState {
    pub fn new(
        config: &OutreachConfig,
        directory: SubscriberDirectory,
        ledger: BroadcastLedger,
        channels: ChannelManager,
    ) -> Self {
        let directory = Arc::new(directory);
        let ledger = Arc::new(ledger);
        let channels = Arc::new(channels);

        let dispatcher = Dispatcher::new(directory.clone(), ledger.clone(), channels.clone())
            .with_max_concurrent_sends(config.broadcast.max_concurrent_sends);
        let analytics = Aggregator::new(
            directory.clone(),
            ledger.clone(),
            config.analytics.recent_window(),
        );

        Self {
            directory,
            ledger,
            channels,
            dispatcher: Arc::new(dispatcher),
            analytics,
        }
    }
}

/// Assemble the full Axum router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(http::health::health_handler))
        .route(
            "/api/subscribers",
            get(http::subscribers::list_handler).post(http::subscribers::upsert_handler),
        )
        .route(
            "/api/subscribers/{phone}",
            delete(http::subscribers::remove_handler),
        )
        .route(
            "/api/alerts/broadcast",
            post(http::broadcast::broadcast_handler),
        )
        .route("/api/history", get(http::history::history_handler))
        .route("/api/analytics/stats", get(http::analytics::stats_handler))
        .route("/api/channels", get(http::channels::channels_handler))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
