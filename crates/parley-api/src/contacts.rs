use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};

use parley_chat::contacts;
use parley_db::DocumentStore;
use parley_types::api::{Claims, SearchQuery, SearchResponse, StartChatRequest};
use parley_types::collections::USERS;
use parley_types::models::User;

use crate::{ApiError, ApiJson, ApiQuery};
use crate::state::{AppState, run_blocking};

/// A miss is not an error: the response carries `"user": null`.
pub async fn search(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<SearchQuery>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state.chat_session(&claims).await;

    let user = run_blocking(&state, move |s| contacts::search(&s.db, &session, &query.q)).await?;

    Ok(Json(SearchResponse { user }))
}

pub async fn start_chat(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(req): ApiJson<StartChatRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state.chat_session(&claims).await;

    let entry = run_blocking(&state, move |s| -> Result<_, ApiError> {
        let peer = s.db.get_as::<User>(USERS, &req.peer_id)?;
        Ok(contacts::start_chat(&s.db, &session, peer.as_ref())?)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(entry)))
}
