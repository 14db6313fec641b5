use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use outreach_channels::ChannelManager;
use outreach_core::OutreachConfig;
use outreach_gateway::{build_router, AppState};
use outreach_ledger::BroadcastLedger;
use outreach_subscribers::SubscriberDirectory;
use rusqlite::Connection;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(name = "outreach-gateway", version, about = "Public-health alert broadcast server")]
struct Cli {
    /// Path to outreach.toml. Falls back to $OUTREACH_CONFIG, then ~/.outreach/outreach.toml.
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "outreach_gateway=info,tower_http=debug".into()),
        )
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.or_else(|| std::env::var("OUTREACH_CONFIG").ok());
    let config = OutreachConfig::load(config_path.as_deref()).unwrap_or_else(|e| {
        warn!("Config load failed ({}), using defaults", e);
        OutreachConfig::default()
    });

    let db_path = config.database.path.clone();
    ensure_parent_dir(&db_path);
    info!(path = %db_path, "opening SQLite database");

    let db = Connection::open(&db_path)?;
    db.execute_batch("PRAGMA journal_mode=WAL;")?;

    // schema migrations (idempotent)
    outreach_subscribers::db::init_db(&db)?;
    outreach_ledger::db::init_db(&db)?;
    info!("database migrations complete");

    // each store gets its own connection
    let directory = SubscriberDirectory::new(Connection::open(&db_path)?)?;
    let ledger = BroadcastLedger::new(Connection::open(&db_path)?)?;

    let channels = ChannelManager::from_config(
        &config.channels,
        Duration::from_secs(config.broadcast.send_timeout_secs),
    );

    let addr: SocketAddr = format!("{}:{}", config.gateway.bind, config.gateway.port).parse()?;
    let state = Arc::new(AppState::new(&config, directory, ledger, channels));
    let router = build_router(state);

    info!("Outreach gateway listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;
    Ok(())
}

fn ensure_parent_dir(path: &str) {
    if let Some(parent) = std::path::Path::new(path).parent() {
        let _ = std::fs::create_dir_all(parent);
    }
}
