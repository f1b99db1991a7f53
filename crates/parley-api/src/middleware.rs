use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, Validation, decode};
use parley_types::api::Claims;
use tracing::debug;

use crate::ApiError;
use crate::state::{AppState, run_blocking};

/// Extract and validate the bearer token, then check its session is still open.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::Unauthorized)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(ApiError::Unauthorized)?;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(state.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| ApiError::Unauthorized)?;
    let claims = token_data.claims;

    let sid = claims.sid.to_string();
    let session = run_blocking(&state, move |s| s.db.get_session(&sid)).await?;
    match session {
        Some(row) if row.user_id == claims.sub.to_string() => {}
        _ => {
            debug!("Rejected token for closed session {}", claims.sid);
            state.drop_chat_session(claims.sid).await;
            return Err(ApiError::Unauthorized);
        }
    }

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}
