use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::session::{SessionContext, SessionView};

/// In-memory session registry. Nothing outlives the process.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, SessionContext>>>,
    idle_ttl: Duration,
}

impl SessionStore {
    pub fn new(idle_ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            idle_ttl,
        }
    }

    /// Creates a session, dropping any that have been idle past the TTL first.
    pub async fn create(&self) -> SessionView {
        let session = SessionContext::new();
        let view = session.view();

        let mut sessions = self.sessions.write().await;
        let cutoff = Utc::now() - self.idle_ttl;
        let before = sessions.len();
        sessions.retain(|_, s| s.last_active >= cutoff);
        if sessions.len() < before {
            info!("Expired {} idle session(s)", before - sessions.len());
        }
        sessions.insert(session.id, session);

        view
    }

    pub async fn view(&self, id: Uuid) -> Result<SessionView, AppError> {
        let sessions = self.sessions.read().await;
        sessions
            .get(&id)
            .map(SessionContext::view)
            .ok_or_else(|| not_found(id))
    }

    /// Runs `f` against the session under the write lock. Keep `f` short and
    /// synchronous; never hold the lock across a backend call.
    pub async fn update<T>(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut SessionContext) -> T,
    ) -> Result<T, AppError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(&id).ok_or_else(|| not_found(id))?;
        Ok(f(session))
    }

    pub async fn remove(&self, id: Uuid) -> Result<(), AppError> {
        self.sessions
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| not_found(id))
    }

    pub async fn active_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(Duration::hours(1))
    }
}

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Session {id} not found"))
}
