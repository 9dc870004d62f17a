//! # relayhubd — relayhub daemon
//!
//! Composition root that wires all adapters together and runs the engine.
//!
//! ## Responsibilities
//! - Load configuration (config file, env vars)
//! - Install the `tracing` subscriber
//! - Initialize the `SQLite` connection pool and run migrations
//! - Register the configured relay channels
//! - Construct the automation service over the storage and transport adapters
//! - Start the background tasks and serve the HTTP control API
//! - Handle graceful shutdown (SIGTERM/SIGINT)
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod config;

use std::sync::Arc;

use relayhub_adapter_http_axum::router;
use relayhub_adapter_http_axum::state::AppState;
use relayhub_adapter_storage_sqlite_sqlx::{
    Config as StorageConfig, SqliteRelayLog, SqliteRelayStore, SqliteScheduleStore,
};
use relayhub_adapter_virtual::VirtualTransport;
use relayhub_app::event_bus::InProcessEventBus;
use relayhub_app::ports::SystemClock;
use relayhub_app::services::AutomationService;
use relayhub_domain::id::RelayId;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

const EVENT_BUS_CAPACITY: usize = 256;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load()?;
    init_tracing(&config.logging.filter);

    // Database
    let db = StorageConfig {
        database_url: config.database_url().to_string(),
    }
    .build()
    .await?;
    let pool = db.pool().clone();

    let relays = SqliteRelayStore::new(pool.clone());
    for channel in &config.database.relay_channels {
        relays.register(RelayId::new(*channel)?, false).await?;
    }
    tracing::info!(channels = ?config.database.relay_channels, "relay channels registered");

    // Engine
    let event_bus = Arc::new(InProcessEventBus::new(EVENT_BUS_CAPACITY));
    let settings = config.engine_settings();
    if settings.notify_recipient.is_none() {
        tracing::warn!("no notification recipient configured, power-down notices are disabled");
    }
    let service = Arc::new(AutomationService::new(
        VirtualTransport::new(config.virtual_transport),
        Arc::clone(&event_bus),
        SqliteScheduleStore::new(pool.clone()),
        relays,
        SqliteRelayLog::new(pool),
        SystemClock,
        settings,
    ));
    let tasks = service.spawn_background();

    // HTTP
    let app = router::build(AppState::new(Arc::clone(&service), event_bus));
    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "relayhubd listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tasks.cancel();
    service.shutdown().await;
    tracing::info!("relayhubd stopped");
    Ok(())
}

fn init_tracing(filter: &str) {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|err| {
        eprintln!("invalid log filter {filter:?}: {err}, falling back to info");
        EnvFilter::new("info")
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(%err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(%err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
