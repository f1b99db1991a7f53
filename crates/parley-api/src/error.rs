use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use parley_chat::ChatError;
use parley_db::StoreError;
use parley_types::api::ErrorResponse;
use thiserror::Error;
use tracing::{error, warn};

/// Handler failure. The message is the notification shown to the user.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Invalid email or password.")]
    InvalidCredentials,

    #[error("Not authenticated.")]
    Unauthorized,

    #[error("{0}")]
    Conflict(String),

    /// The request body or query string could not be decoded.
    #[error("{message}")]
    Rejected { status: StatusCode, message: String },

    #[error(transparent)]
    Chat(#[from] ChatError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Internal server error.")]
    Internal,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidCredentials | ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Rejected { status, .. } => *status,
            ApiError::Chat(e) => match e {
                ChatError::PeerMissing | ChatError::ThreadMissing | ChatError::UserMissing => {
                    StatusCode::NOT_FOUND
                }
                ChatError::SelfChat => StatusCode::BAD_REQUEST,
                ChatError::AlreadyLinked => StatusCode::CONFLICT,
                ChatError::NotParticipant => StatusCode::FORBIDDEN,
                ChatError::EmptyMessage => StatusCode::UNPROCESSABLE_ENTITY,
                ChatError::Store(e) => store_status(e),
                ChatError::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Store(e) => store_status(e),
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

fn store_status(e: &StoreError) -> StatusCode {
    match e {
        StoreError::NotFound { .. } => StatusCode::NOT_FOUND,
        StoreError::Conflict(_) => StatusCode::CONFLICT,
        StoreError::InvalidQuery(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Storage internals stay in the log, not in the response.
        let message = if status.is_server_error() {
            error!("Request failed: {}", self);
            "Something went wrong. Please try again.".to_string()
        } else {
            warn!("Request rejected ({}): {}", status, self);
            self.to_string()
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
