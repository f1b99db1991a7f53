use std::collections::HashMap;
use std::sync::Arc;

use parley_chat::ChatSession;
use parley_db::Database;
use parley_types::api::Claims;
use tokio::sync::RwLock;
use tracing::error;
use uuid::Uuid;

use crate::ApiError;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
    /// Chat selection per authenticated session, keyed by session id.
    sessions: RwLock<HashMap<Uuid, ChatSession>>,
}

impl AppStateInner {
    pub fn new(db: Database, jwt_secret: String) -> AppState {
        Arc::new(Self {
            db,
            jwt_secret,
            sessions: RwLock::new(HashMap::new()),
        })
    }

    /// The caller's chat context, fresh if they have not selected anything yet.
    pub async fn chat_session(&self, claims: &Claims) -> ChatSession {
        self.sessions
            .read()
            .await
            .get(&claims.sid)
            .cloned()
            .unwrap_or_else(|| ChatSession::new(claims.sub.to_string()))
    }

    pub async fn save_chat_session(&self, claims: &Claims, session: ChatSession) {
        self.sessions.write().await.insert(claims.sid, session);
    }

    pub async fn drop_chat_session(&self, session_id: Uuid) {
        self.sessions.write().await.remove(&session_id);
    }

    pub async fn drop_chat_sessions(&self, session_ids: impl IntoIterator<Item = Uuid>) {
        let mut sessions = self.sessions.write().await;
        for id in session_ids {
            sessions.remove(&id);
        }
    }

    pub async fn has_chat_session(&self, session_id: Uuid) -> bool {
        self.sessions.read().await.contains_key(&session_id)
    }
}

/// Run blocking store work off the async runtime.
pub async fn run_blocking<F, T, E>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&AppStateInner) -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: Into<ApiError> + Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state).map_err(Into::into))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal
        })?
}
