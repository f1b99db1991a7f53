use parley_db::{DocumentStore, Fields, Write};
use parley_types::api::UpdateProfileRequest;
use parley_types::collections::{CHATS, USERS};
use parley_types::models::User;
use serde_json::Value;
use tracing::info;

use crate::{CHATS_DATA, ChatError, ChatSession, now_millis};

pub const DEFAULT_BIO: &str = "Hey, There i am using Chat App.";

/// Write the user record and an empty chat list for a new account, in one batch.
pub fn create_profile<S: DocumentStore>(
    store: &S,
    user_id: &str,
    username: &str,
    email: &str,
) -> Result<User, ChatError> {
    let user = User {
        id: user_id.to_string(),
        username: username.to_lowercase(),
        email: email.to_string(),
        name: String::new(),
        avatar: String::new(),
        bio: DEFAULT_BIO.to_string(),
        last_seen: now_millis(),
    };

    let record = Fields::new()
        .value("id", user.id.as_str())
        .value("username", user.username.as_str())
        .value("email", user.email.as_str())
        .value("name", "")
        .value("avatar", "")
        .value("bio", DEFAULT_BIO)
        .value("lastSeen", user.last_seen);

    store.commit(vec![
        Write::set(USERS, user_id, record),
        Write::set(CHATS, user_id, Fields::new().value(CHATS_DATA, Value::Array(vec![]))),
    ])?;

    info!("Created profile for '{}' ({})", user.username, user.id);
    Ok(user)
}

pub fn profile<S: DocumentStore>(store: &S, session: &ChatSession) -> Result<User, ChatError> {
    store
        .get_as::<User>(USERS, session.user_id())?
        .ok_or(ChatError::UserMissing)
}

/// Change the caller's own mutable fields. Absent fields keep their value.
pub fn update_profile<S: DocumentStore>(
    store: &S,
    session: &ChatSession,
    update: UpdateProfileRequest,
) -> Result<User, ChatError> {
    let mut fields = Fields::new();
    if let Some(name) = update.name {
        fields = fields.value("name", name);
    }
    if let Some(avatar) = update.avatar {
        fields = fields.value("avatar", avatar);
    }
    if let Some(bio) = update.bio {
        fields = fields.value("bio", bio);
    }

    if !fields.is_empty() {
        store
            .update(USERS, session.user_id(), fields)
            .map_err(missing_as(ChatError::UserMissing))?;
    }

    profile(store, session)
}

pub fn touch_last_seen<S: DocumentStore>(store: &S, user_id: &str) -> Result<(), ChatError> {
    store
        .update(USERS, user_id, Fields::new().value("lastSeen", now_millis()))
        .map_err(missing_as(ChatError::UserMissing))
}

/// Map a store `NotFound` to a domain error, passing other failures through.
pub(crate) fn missing_as(err: ChatError) -> impl FnOnce(parley_db::StoreError) -> ChatError {
    move |e| match e {
        parley_db::StoreError::NotFound { .. } => err,
        other => ChatError::Store(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{db, user};

    #[test]
    fn signup_documents_have_defaults() {
        let db = db();
        let created = create_profile(&db, "u1", "Alice", "alice@example.com").unwrap();

        assert_eq!(created.username, "alice");
        assert_eq!(created.bio, DEFAULT_BIO);
        assert!(created.name.is_empty());

        let chats = db.get(CHATS, "u1").unwrap().unwrap();
        assert_eq!(chats, serde_json::json!({ "chatsData": [] }));
    }

    #[test]
    fn update_keeps_unspecified_fields() {
        let db = db();
        user(&db, "u1", "alice");
        let session = ChatSession::new("u1");

        let updated = update_profile(
            &db,
            &session,
            UpdateProfileRequest {
                name: Some("Alice A.".into()),
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(updated.name, "Alice A.");
        assert_eq!(updated.username, "alice");
        assert_eq!(updated.bio, DEFAULT_BIO);
    }

    #[test]
    fn missing_profile() {
        let db = db();
        let session = ChatSession::new("ghost");
        assert!(matches!(profile(&db, &session), Err(ChatError::UserMissing)));
        assert!(matches!(
            update_profile(
                &db,
                &session,
                UpdateProfileRequest {
                    bio: Some("x".into()),
                    ..Default::default()
                }
            ),
            Err(ChatError::UserMissing)
        ));
    }
}
