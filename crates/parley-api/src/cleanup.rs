use std::time::Duration;

use tracing::{info, warn};
use uuid::Uuid;

use crate::ApiError;
use crate::auth::TOKEN_DAYS;
use crate::state::{AppState, run_blocking};

/// Background task that closes sessions older than a token's lifetime.
///
/// The first tick fires at once, so sessions left over from a previous run
/// are pruned at startup.
pub async fn run_cleanup_loop(state: AppState, interval_secs: u64) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));

    loop {
        interval.tick().await;

        match prune_expired_sessions(&state).await {
            Ok(count) => {
                if count > 0 {
                    info!("Cleanup: closed {} expired sessions", count);
                }
            }
            Err(e) => {
                warn!("Cleanup error: {}", e);
            }
        }
    }
}

/// Delete expired session rows and drop their chat selections.
pub async fn prune_expired_sessions(state: &AppState) -> Result<usize, ApiError> {
    let expired = run_blocking(state, |s| s.db.prune_sessions(TOKEN_DAYS)).await?;

    let ids: Vec<Uuid> = expired.iter().filter_map(|id| id.parse().ok()).collect();
    state.drop_chat_sessions(ids).await;

    Ok(expired.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AppStateInner;
    use parley_chat::ChatSession;
    use parley_db::Database;
    use parley_types::api::Claims;

    #[tokio::test]
    async fn expired_sessions_lose_their_selection() {
        let state = AppStateInner::new(Database::open_in_memory().unwrap(), "secret".into());
        let user_id = Uuid::new_v4();
        let (old, fresh) = (Uuid::new_v4(), Uuid::new_v4());

        state
            .db
            .create_credentials(&user_id.to_string(), "bob@example.com", "hash")
            .unwrap();
        for sid in [old, fresh] {
            state
                .db
                .create_session(&sid.to_string(), &user_id.to_string())
                .unwrap();
            let claims = Claims {
                sub: user_id,
                sid,
                exp: 0,
            };
            state
                .save_chat_session(&claims, ChatSession::new(user_id.to_string()))
                .await;
        }
        state
            .db
            .with_conn(|conn| {
                conn.execute(
                    "UPDATE sessions SET created_at = datetime('now', '-31 days') WHERE id = ?1",
                    [old.to_string()],
                )?;
                Ok(())
            })
            .unwrap();

        assert_eq!(prune_expired_sessions(&state).await.unwrap(), 1);
        assert!(!state.has_chat_session(old).await);
        assert!(state.has_chat_session(fresh).await);
        assert!(state.db.get_session(&old.to_string()).unwrap().is_none());
    }
}
