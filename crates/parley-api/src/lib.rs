pub mod auth;
pub mod chats;
pub mod contacts;
pub mod cleanup;
pub mod error;
pub mod extract;
pub mod messages;
pub mod middleware;
pub mod state;
pub mod users;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};

pub use error::ApiError;
pub use extract::{ApiJson, ApiQuery};
pub use state::{AppState, AppStateInner};

/// All routes, without transport layers (CORS, tracing); the binary adds those.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/auth/signup", post(auth::signup))
        .route("/auth/login", post(auth::login))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/auth/logout", post(auth::logout))
        .route("/users/me", get(users::me).patch(users::update_me))
        .route("/contacts/search", get(contacts::search))
        .route("/chats", get(chats::list).post(contacts::start_chat))
        .route("/chats/select", post(chats::select))
        .route("/chats/selection", get(chats::selection))
        .route(
            "/messages/{message_id}",
            get(messages::get_thread).post(messages::send_message),
        )
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ))
        .with_state(state);

    Router::new().merge(public_routes).merge(protected_routes)
}
