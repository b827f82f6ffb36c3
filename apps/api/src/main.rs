mod config;
mod errors;
mod extraction;
mod llm_client;
mod routes;
mod sections;
mod session;
mod state;
mod suggestions;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Config, SessionStoreKind};
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::session::store::{MemorySessionStore, RedisSessionStore, SessionStore};
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Tailor API v{}", env!("CARGO_PKG_VERSION"));

    let store = build_session_store(&config)?;

    // Initialize LLM client
    let llm = LlmClient::new(config.anthropic_api_key.clone(), config.llm_timeout())?;
    info!(
        "LLM client initialized (model: {}, timeout: {}s)",
        llm_client::MODEL,
        config.llm_timeout_secs
    );

    let state = AppState {
        store,
        generator: Arc::new(llm),
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the frontend host is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_session_store(config: &Config) -> Result<Arc<dyn SessionStore>> {
    match config.session_store {
        SessionStoreKind::Redis => {
            let url = config
                .redis_url
                .clone()
                .context("REDIS_URL is required when SESSION_STORE=redis")?;
            let client = redis::Client::open(url)?;
            info!("Redis session store initialized (ttl: {}s)", config.session_ttl_secs);
            Ok(Arc::new(RedisSessionStore::new(client, config.session_ttl())))
        }
        SessionStoreKind::Memory => {
            info!("In-memory session store initialized; sessions do not survive restarts");
            Ok(Arc::new(MemorySessionStore::new()))
        }
    }
}
