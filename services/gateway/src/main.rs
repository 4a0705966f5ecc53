mod auth;
mod config;
mod error;
mod handlers;
mod models;
mod router;
mod state;

use anyhow::Context;
use auth::TokenIssuer;
use config::GatewayConfig;
use match_store::MatchStore;
use persistence::JournalConfig;
use reservation::ReservationService;
use router::create_router;
use state::AppState;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    tracing::info!("Starting reservation gateway");

    let config = GatewayConfig::from_env()?;
    let store = open_store(&config)?;

    let service = ReservationService::new(Arc::new(store)).with_retry(config.retry);
    let tokens = TokenIssuer::new(config.jwt_secret.as_bytes(), config.token_ttl);
    let app = create_router(AppState::new(service, tokens));

    let listener = TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;

    tracing::info!("Listening on {}", config.addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Gateway stopped");
    Ok(())
}

fn open_store(config: &GatewayConfig) -> anyhow::Result<MatchStore> {
    let Some(dir) = &config.journal_dir else {
        tracing::warn!("JOURNAL_DIR not set; matches will not survive a restart");
        return Ok(MatchStore::in_memory());
    };

    let (store, report) = MatchStore::open(JournalConfig::new(dir))
        .with_context(|| format!("failed to recover journal at {}", dir.display()))?;
    tracing::info!(
        dir = %dir.display(),
        replayed = report.replayed,
        matches = report.matches,
        users = report.users,
        "journal recovered"
    );
    Ok(store)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
