use axum::{Extension, Json, extract::State, response::IntoResponse};

use parley_chat::profile;
use parley_types::api::{Claims, UpdateProfileRequest};

use crate::{ApiError, ApiJson};
use crate::state::{AppState, run_blocking};

pub async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state.chat_session(&claims).await;
    let user = run_blocking(&state, move |s| profile::profile(&s.db, &session)).await?;
    Ok(Json(user))
}

/// Only the caller's own record is reachable here, and username cannot be sent.
pub async fn update_me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(req): ApiJson<UpdateProfileRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state.chat_session(&claims).await;
    let user =
        run_blocking(&state, move |s| profile::update_profile(&s.db, &session, req)).await?;
    Ok(Json(user))
}
