mod config;
mod errors;
mod generation;
mod llm_client;
mod routes;
mod screening;
mod state;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::generation::GenerationClient;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::screening::{DialogueEngine, JsonlStore, ScreeningService};
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing or inconsistent env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting TalentScout API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize session store
    let store = JsonlStore::open(&config.data_dir, config.hash_salt.clone())
        .await
        .with_context(|| format!("Cannot use data directory {}", config.data_dir.display()))?;
    info!("Session records appended to {}", store.path().display());
    if config.hash_salt.is_none() {
        warn!("HASH_SALT is not set; email and phone will be stored in clear");
    }

    // Initialize LLM client and the generation client on top of it
    let llm = LlmClient::new(config.anthropic_api_key.clone(), config.generation_timeout);
    info!(
        "LLM client initialized (model: {}, timeout: {:?})",
        llm_client::MODEL,
        config.generation_timeout
    );
    let limits = Arc::new(config.limits.clone());
    let generator = Arc::new(GenerationClient::new(llm, limits.clone()));

    let engine = DialogueEngine::new(limits, generator, config.generation_deadline);

    // Build app state
    let state = AppState {
        screening: Arc::new(ScreeningService::new(engine, store)),
    };

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
