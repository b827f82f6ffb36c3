use std::sync::Arc;

use crate::config::Config;
use crate::llm_client::TextGenerator;
use crate::session::store::SessionStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Redis-backed in production, in-memory under `SESSION_STORE=memory`.
    pub store: Arc<dyn SessionStore>,
    /// `LlmClient` in production; scripted fakes in tests.
    pub generator: Arc<dyn TextGenerator>,
    pub config: Config,
}
