use std::sync::Arc;

use crate::config::Config;
use crate::llm_client::CompletionBackend;
use crate::session::SessionStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Pluggable model backend. Default: `OllamaClient`; tests swap in a stub.
    pub llm: Arc<dyn CompletionBackend>,
    pub sessions: SessionStore,
    pub config: Config,
}
