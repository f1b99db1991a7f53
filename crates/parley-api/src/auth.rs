use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use parley_chat::{ChatSession, profile};
use parley_db::DocumentStore;
use parley_types::api::{Claims, LoginRequest, LoginResponse, SignupRequest, SignupResponse};
use parley_types::collections::USERS;

use crate::{ApiError, ApiJson};
use crate::state::{AppState, AppStateInner, run_blocking};

/// Lifetime of a token and of the session behind it.
pub const TOKEN_DAYS: i64 = 30;

pub async fn signup(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<SignupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_signup(&req)?;

    let username = req.username.to_lowercase();
    let email = req.email.trim().to_lowercase();

    let (user_id, token) = run_blocking(&state, move |s| -> Result<_, ApiError> {
        if !s
            .db
            .query_eq(USERS, "username", &Value::from(username.as_str()))?
            .is_empty()
        {
            return Err(ApiError::Conflict("Username already taken.".into()));
        }
        if s.db.get_credentials_by_email(&email)?.is_some() {
            return Err(ApiError::Conflict("Email already in use.".into()));
        }

        // Hash password with Argon2id
        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(req.password.as_bytes(), &salt)
            .map_err(|_| ApiError::Internal)?
            .to_string();

        let user_id = Uuid::new_v4();
        let id = user_id.to_string();
        s.db.create_credentials(&id, &email, &password_hash)?;

        if let Err(e) = profile::create_profile(&s.db, &id, &username, &email) {
            // The account is useless without its documents.
            s.db.delete_credentials(&id)?;
            return Err(e.into());
        }

        let token = open_session(s, user_id)?;
        info!("New account '{}' ({})", username, user_id);
        Ok((user_id, token))
    })
    .await?;

    Ok((StatusCode::CREATED, Json(SignupResponse { user_id, token })))
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = req.email.trim().to_lowercase();

    let response = run_blocking(&state, move |s| -> Result<_, ApiError> {
        let credentials = s
            .db
            .get_credentials_by_email(&email)?
            .ok_or(ApiError::InvalidCredentials)?;

        // Verify password
        let parsed_hash = PasswordHash::new(&credentials.password).map_err(|_| ApiError::Internal)?;
        Argon2::default()
            .verify_password(req.password.as_bytes(), &parsed_hash)
            .map_err(|_| ApiError::InvalidCredentials)?;

        let user_id: Uuid = credentials.user_id.parse().map_err(|_| ApiError::Internal)?;

        if let Err(e) = profile::touch_last_seen(&s.db, &credentials.user_id) {
            warn!("Could not refresh lastSeen for {}: {}", user_id, e);
        }
        let user = profile::profile(&s.db, &ChatSession::new(credentials.user_id.as_str()))?;

        let token = open_session(s, user_id)?;
        Ok(LoginResponse {
            user_id,
            username: user.username,
            token,
        })
    })
    .await?;

    Ok(Json(response))
}

pub async fn logout(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let sid = claims.sid.to_string();
    run_blocking(&state, move |s| s.db.delete_session(&sid)).await?;
    state.drop_chat_session(claims.sid).await;

    info!("User {} logged out", claims.sub);
    Ok(StatusCode::NO_CONTENT)
}

fn validate_signup(req: &SignupRequest) -> Result<(), ApiError> {
    let username_ok = (3..=32).contains(&req.username.chars().count())
        && req
            .username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
    if !username_ok {
        return Err(ApiError::BadRequest(
            "Username must be 3-32 letters, digits, '_' or '.'.".into(),
        ));
    }
    if !req.email.contains('@') {
        return Err(ApiError::BadRequest("Invalid email.".into()));
    }
    if req.password.chars().count() < 6 {
        return Err(ApiError::BadRequest(
            "Password should be at least 6 characters.".into(),
        ));
    }
    Ok(())
}

fn open_session(state: &AppStateInner, user_id: Uuid) -> Result<String, ApiError> {
    let session_id = Uuid::new_v4();
    state
        .db
        .create_session(&session_id.to_string(), &user_id.to_string())?;

    create_token(&state.jwt_secret, user_id, session_id).map_err(|e| {
        warn!("Token encoding failed: {}", e);
        ApiError::Internal
    })
}

fn create_token(secret: &str, user_id: Uuid, session_id: Uuid) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id,
        sid: session_id,
        exp: (chrono::Utc::now() + chrono::Duration::days(TOKEN_DAYS)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

