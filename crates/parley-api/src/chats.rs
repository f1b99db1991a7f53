use axum::{Extension, Json, extract::State, response::IntoResponse};

use parley_chat::{ChatSession, chat_list};
use parley_types::api::{Claims, SelectionResponse};
use parley_types::models::ChatEntry;

use crate::{ApiError, ApiJson};
use crate::state::{AppState, run_blocking};

pub async fn list(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state.chat_session(&claims).await;

    let items = run_blocking(&state, move |s| chat_list::chat_list(&s.db, &session)).await?;

    Ok(Json(items))
}

pub async fn select(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(entry): ApiJson<ChatEntry>,
) -> Result<impl IntoResponse, ApiError> {
    let mut session = state.chat_session(&claims).await;
    if !entry.has_thread() {
        return Ok(Json(selection_response(&session, false)));
    }

    let (session, marked_read) = run_blocking(&state, move |s| {
        let marked_read = chat_list::select_chat(&s.db, &mut session, &entry);
        Ok::<_, ApiError>((session, marked_read))
    })
    .await?;

    // The selection stands even if marking the entry read failed.
    let response = marked_read.map(|matched| selection_response(&session, matched));
    state.save_chat_session(&claims, session).await;
    Ok(Json(response?))
}

pub async fn selection(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> impl IntoResponse {
    let session = state.chat_session(&claims).await;
    Json(selection_response(&session, false))
}

fn selection_response(session: &ChatSession, marked_read: bool) -> SelectionResponse {
    match session.selection() {
        Some(selection) => SelectionResponse {
            message_id: Some(selection.message_id.clone()),
            peer: Some(selection.peer.clone()),
            marked_read,
        },
        None => SelectionResponse::default(),
    }
}
