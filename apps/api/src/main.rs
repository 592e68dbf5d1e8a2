mod config;
mod errors;
mod extraction;
mod generation;
mod llm_client;
mod routes;
mod state;
mod usage;

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::CompletionClient;
use crate::routes::build_router;
use crate::state::AppState;
use crate::usage::UsagePolicy;

const PRUNE_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Tailor API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize completion client
    let completion = CompletionClient::from_config(&config)?;
    if completion.has_credentials() {
        info!(
            "Completion client initialized (model: {}, daily limit: {})",
            config.model.model, config.daily_request_limit
        );
    } else {
        warn!("OPENAI_API_KEY is not set; only requests carrying their own API key can generate");
    }

    // Build app state
    let state = AppState::new(config.clone(), completion);
    spawn_usage_pruner(state.usage.clone());

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Drops usage counters from previous days once an hour.
fn spawn_usage_pruner(usage: UsagePolicy) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(PRUNE_INTERVAL);
        loop {
            interval.tick().await;
            let today = chrono::Local::now().date_naive();
            let removed = usage.prune_before(today);
            if removed > 0 {
                info!("Pruned {removed} stale usage counters");
            }
        }
    });
}
