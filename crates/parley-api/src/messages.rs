use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use parley_chat::threads;
use parley_types::api::{Claims, MessageResponse, SendMessageRequest};

use crate::{ApiError, ApiJson};
use crate::state::{AppState, run_blocking};

pub async fn get_thread(
    State(state): State<AppState>,
    Path(message_id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state.chat_session(&claims).await;

    let thread =
        run_blocking(&state, move |s| threads::thread(&s.db, &session, &message_id)).await?;

    Ok(Json(thread))
}

pub async fn send_message(
    State(state): State<AppState>,
    Path(message_id): Path<String>,
    Extension(claims): Extension<Claims>,
    ApiJson(req): ApiJson<SendMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state.chat_session(&claims).await;

    let (message_id, message) = run_blocking(&state, move |s| {
        threads::send_message(&s.db, &session, &message_id, &req.text).map(|m| (message_id, m))
    })
    .await?;

    Ok((StatusCode::CREATED, Json(MessageResponse { message_id, message })))
}
