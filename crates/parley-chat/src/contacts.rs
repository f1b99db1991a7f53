use parley_db::{DocumentStore, Fields, Write};
use parley_types::collections::{CHATS, MESSAGES, USERS};
use parley_types::models::{ChatEntry, User};
use serde_json::Value;
use tracing::{debug, info};

use crate::chat_list::chat_list_document;
use crate::{CHATS_DATA, ChatError, ChatSession, now_millis};

/// Find the user whose username equals `term`, ignoring case.
///
/// Returns `None` for an empty term, no match, the caller themself, or a
/// user already linked from the caller's chat list.
pub fn search<S: DocumentStore>(
    store: &S,
    session: &ChatSession,
    term: &str,
) -> Result<Option<User>, ChatError> {
    if term.is_empty() {
        return Ok(None);
    }

    let hits = store.query_eq(USERS, "username", &Value::from(term.to_lowercase()))?;
    let Some(hit) = hits.into_iter().next() else {
        debug!("No user named '{}'", term);
        return Ok(None);
    };

    let user: User = hit.decode()?;
    if user.id.is_empty() || user.id == session.user_id() {
        return Ok(None);
    }

    if chat_list_document(store, session.user_id())?.links(&user.id) {
        debug!("User {} is already a contact of {}", user.id, session.user_id());
        return Ok(None);
    }

    Ok(Some(user))
}

/// Open a new thread with `peer` and link it from both chat lists.
///
/// The thread and both entries are written in a single batch. Returns the
/// entry added to the caller's list.
pub fn start_chat<S: DocumentStore>(
    store: &S,
    session: &ChatSession,
    peer: Option<&User>,
) -> Result<ChatEntry, ChatError> {
    let peer = peer
        .filter(|p| !p.id.is_empty())
        .ok_or(ChatError::PeerMissing)?;
    let caller = session.user_id();

    if peer.id == caller {
        return Err(ChatError::SelfChat);
    }
    // Not atomic with the batch below; two racing calls can both pass.
    if chat_list_document(store, caller)?.links(&peer.id) {
        return Err(ChatError::AlreadyLinked);
    }

    let message_id = store.new_id();
    let now = now_millis();
    let peer_entry = ChatEntry::new_chat(&message_id, caller, now);
    let own_entry = ChatEntry::new_chat(&message_id, &peer.id, now);

    store.commit(vec![
        Write::set(
            MESSAGES,
            &message_id,
            Fields::new()
                .server_timestamp("createAt")
                .value("messages", Value::Array(vec![])),
        ),
        Write::update(
            CHATS,
            &peer.id,
            Fields::new().array_union(CHATS_DATA, vec![serde_json::to_value(&peer_entry)?]),
        ),
        Write::update(
            CHATS,
            caller,
            Fields::new().array_union(CHATS_DATA, vec![serde_json::to_value(&own_entry)?]),
        ),
    ])?;

    info!("Started chat {} between {} and {}", message_id, caller, peer.id);
    Ok(own_entry)
}
