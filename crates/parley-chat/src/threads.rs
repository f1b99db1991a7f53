use parley_db::{DocumentStore, Fields, Write};
use parley_types::collections::{CHATS, MESSAGES};
use parley_types::models::{ChatEntry, Message, MessageThread};
use serde_json::{Map, Value};
use tracing::info;

use crate::chat_list::chat_list_document;
use crate::profile::missing_as;
use crate::{CHATS_DATA, ChatError, ChatSession, now_millis};

/// Characters of a message kept as the chat list preview.
const PREVIEW_CHARS: usize = 30;

/// The caller's entry for `message_id`; only participants may touch a thread.
fn participant_entry<S: DocumentStore>(
    store: &S,
    session: &ChatSession,
    message_id: &str,
) -> Result<ChatEntry, ChatError> {
    chat_list_document(store, session.user_id())?
        .find(message_id)
        .cloned()
        .ok_or(ChatError::NotParticipant)
}

pub fn thread<S: DocumentStore>(
    store: &S,
    session: &ChatSession,
    message_id: &str,
) -> Result<MessageThread, ChatError> {
    participant_entry(store, session, message_id)?;

    store
        .get_as::<MessageThread>(MESSAGES, message_id)?
        .ok_or(ChatError::ThreadMissing)
}

/// Append a message and refresh both chat entries' preview in one batch.
/// The sender's entry stays read; the peer's becomes unread.
pub fn send_message<S: DocumentStore>(
    store: &S,
    session: &ChatSession,
    message_id: &str,
    text: &str,
) -> Result<Message, ChatError> {
    if text.trim().is_empty() {
        return Err(ChatError::EmptyMessage);
    }
    let entry = participant_entry(store, session, message_id)?;

    let now = now_millis();
    let message = Message {
        s_id: session.user_id().to_string(),
        text: text.to_string(),
        created_at: now,
    };
    let preview: String = text.chars().take(PREVIEW_CHARS).collect();

    store
        .commit(vec![
            Write::update(
                MESSAGES,
                message_id,
                Fields::new().array_append("messages", vec![serde_json::to_value(&message)?]),
            ),
            Write::patch_array_entry(
                CHATS,
                session.user_id(),
                CHATS_DATA,
                "messageId",
                message_id,
                summary(&preview, now, true),
            ),
            Write::patch_array_entry(
                CHATS,
                &entry.r_id,
                CHATS_DATA,
                "messageId",
                message_id,
                summary(&preview, now, false),
            ),
        ])
        .map_err(missing_as(ChatError::ThreadMissing))?;

    info!("{} posted to chat {}", session.user_id(), message_id);
    Ok(message)
}

fn summary(preview: &str, now: i64, seen: bool) -> Map<String, Value> {
    let mut patch = Map::new();
    patch.insert("lastMessage".into(), Value::from(preview));
    patch.insert("updatedAt".into(), Value::from(now));
    patch.insert("messageseen".into(), Value::Bool(seen));
    patch
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat_list::chat_list_document;
    use crate::contacts::start_chat;
    use crate::testing::{db, user};

    #[test]
    fn message_updates_thread_and_both_entries() {
        let db = db();
        user(&db, "U1", "alice");
        let bob = user(&db, "u2", "bob");
        let session = ChatSession::new("U1");
        let entry = start_chat(&db, &session, Some(&bob)).unwrap();

        let text = "This message is definitely longer than thirty characters";
        let sent = send_message(&db, &session, &entry.message_id, text).unwrap();
        assert_eq!(sent.s_id, "U1");

        let thread = thread(&db, &session, &entry.message_id).unwrap();
        assert_eq!(thread.messages, vec![sent]);

        let own = chat_list_document(&db, "U1").unwrap();
        let theirs = chat_list_document(&db, "u2").unwrap();
        let own = own.find(&entry.message_id).unwrap();
        let theirs = theirs.find(&entry.message_id).unwrap();

        assert_eq!(own.last_message.chars().count(), 30);
        assert_eq!(own.last_message, theirs.last_message);
        assert!(own.message_seen);
        assert!(!theirs.message_seen);
    }

    #[test]
    fn repeated_identical_messages_are_all_kept() {
        let db = db();
        user(&db, "U1", "alice");
        let bob = user(&db, "u2", "bob");
        let session = ChatSession::new("U1");
        let entry = start_chat(&db, &session, Some(&bob)).unwrap();

        // Same sender and text, many within the same millisecond.
        for _ in 0..200 {
            send_message(&db, &session, &entry.message_id, "ok").unwrap();
        }

        let thread = thread(&db, &session, &entry.message_id).unwrap();
        assert_eq!(thread.messages.len(), 200);
        assert!(thread.messages.iter().all(|m| m.text == "ok"));
    }

    #[test]
    fn outsiders_cannot_read_or_post() {
        let db = db();
        user(&db, "U1", "alice");
        let bob = user(&db, "u2", "bob");
        user(&db, "u3", "mallory");
        let entry = start_chat(&db, &ChatSession::new("U1"), Some(&bob)).unwrap();

        let mallory = ChatSession::new("u3");
        assert!(matches!(
            thread(&db, &mallory, &entry.message_id),
            Err(ChatError::NotParticipant)
        ));
        assert!(matches!(
            send_message(&db, &mallory, &entry.message_id, "hi"),
            Err(ChatError::NotParticipant)
        ));
    }

    #[test]
    fn blank_messages_are_rejected() {
        let db = db();
        let session = ChatSession::new("U1");
        assert!(matches!(
            send_message(&db, &session, "m1", "   "),
            Err(ChatError::EmptyMessage)
        ));
    }
}
