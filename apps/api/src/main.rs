mod config;
mod documents;
mod errors;
mod llm_client;
mod prompts;
mod routes;
mod session;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::OllamaClient;
use crate::routes::build_router;
use crate::session::SessionStore;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Interviewer v{}", env!("CARGO_PKG_VERSION"));

    // Initialize model backend
    let llm = OllamaClient::new(
        &config.ollama_base_url,
        &config.ollama_model,
        Duration::from_secs(config.llm_timeout_secs),
    )?;
    info!(
        "Model backend: {} (model: {}, timeout {}s)",
        config.ollama_base_url, config.ollama_model, config.llm_timeout_secs
    );

    let sessions = SessionStore::new(chrono::Duration::seconds(config.session_ttl_secs as i64));

    let state = AppState {
        llm: Arc::new(llm),
        sessions,
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
