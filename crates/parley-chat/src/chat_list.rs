use parley_db::DocumentStore;
use parley_types::api::ChatListItem;
use parley_types::collections::{CHATS, USERS};
use parley_types::models::{ChatEntry, ChatListDocument, User};
use serde_json::{Map, Value};
use tracing::debug;

use crate::{CHATS_DATA, ChatError, ChatSession};

/// The user's chat list. A missing document reads as an empty list.
pub fn chat_list_document<S: DocumentStore>(
    store: &S,
    user_id: &str,
) -> Result<ChatListDocument, ChatError> {
    Ok(store
        .get_as::<ChatListDocument>(CHATS, user_id)?
        .unwrap_or_default())
}

/// The caller's chats, most recently updated first, each with the peer's record.
pub fn chat_list<S: DocumentStore>(
    store: &S,
    session: &ChatSession,
) -> Result<Vec<ChatListItem>, ChatError> {
    let mut entries = chat_list_document(store, session.user_id())?.chats_data;
    entries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

    entries
        .into_iter()
        .map(|entry| -> Result<ChatListItem, ChatError> {
            let peer = store.get_as::<User>(USERS, &entry.r_id)?;
            Ok(ChatListItem { entry, peer })
        })
        .collect()
}

/// Open `entry` in the session and mark it read.
///
/// An entry without a thread id changes nothing. Otherwise the selection is
/// updated and the matching entry in the caller's list gets
/// `messageseen = true`; no other entry is rewritten. Returns whether a
/// matching entry was found.
pub fn select_chat<S: DocumentStore>(
    store: &S,
    session: &mut ChatSession,
    entry: &ChatEntry,
) -> Result<bool, ChatError> {
    if !entry.has_thread() {
        return Ok(false);
    }

    session.select(entry.clone());

    let mut patch = Map::new();
    patch.insert("messageseen".into(), Value::Bool(true));

    let matched = store.patch_array_entry(
        CHATS,
        session.user_id(),
        CHATS_DATA,
        "messageId",
        Value::from(entry.message_id.as_str()),
        patch,
    )?;

    if !matched {
        debug!(
            "Chat {} not in list of {}; nothing marked read",
            entry.message_id,
            session.user_id()
        );
    }
    Ok(matched)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contacts::start_chat;
    use crate::testing::{db, user};
    use parley_db::Fields;
    use serde_json::json;

    #[test]
    fn select_without_thread_is_noop() {
        let db = db();
        let mut session = ChatSession::new("nobody");

        // No chat list exists for this caller, so any store call would fail.
        let matched = select_chat(&db, &mut session, &ChatEntry::default()).unwrap();
        assert!(!matched);
        assert_eq!(session.selection(), None);
    }

    #[test]
    fn select_marks_only_that_entry_read() {
        let db = db();
        let before = json!({
            "chatsData": [
                {
                    "messageId": "m1", "lastMessage": "hi", "rId": "u2",
                    "updatedAt": 5, "messageseen": false
                },
                {
                    "messageId": "m2", "lastMessage": "yo", "rId": "u3",
                    "updatedAt": 7, "messageseen": false
                }
            ]
        });
        db.set(CHATS, "U1", Fields::new().value(CHATS_DATA, before["chatsData"].clone()))
            .unwrap();

        let mut session = ChatSession::new("U1");
        let entry: ChatEntry = serde_json::from_value(before["chatsData"][1].clone()).unwrap();

        assert!(select_chat(&db, &mut session, &entry).unwrap());

        let selection = session.selection().unwrap();
        assert_eq!(selection.message_id, "m2");
        assert_eq!(selection.peer, entry);

        let after = db.get(CHATS, "U1").unwrap().unwrap();
        assert_eq!(after["chatsData"][0], before["chatsData"][0]);
        assert_eq!(after["chatsData"][1]["messageseen"], json!(true));
        assert_eq!(after["chatsData"][1]["lastMessage"], json!("yo"));
    }

    #[test]
    fn select_unknown_thread_still_selects() {
        let db = db();
        user(&db, "U1", "alice");
        let mut session = ChatSession::new("U1");
        let entry = ChatEntry {
            message_id: "gone".into(),
            ..Default::default()
        };

        assert!(!select_chat(&db, &mut session, &entry).unwrap());
        assert_eq!(session.selection().map(|s| s.message_id.as_str()), Some("gone"));
    }

    #[test]
    fn selection_survives_failed_mark_read() {
        let db = db();
        let mut session = ChatSession::new("U1");
        let entry = ChatEntry {
            message_id: "m1".into(),
            ..Default::default()
        };

        // U1 has no chat list document, so the patch fails.
        assert!(select_chat(&db, &mut session, &entry).is_err());
        assert_eq!(session.selection().map(|s| s.message_id.as_str()), Some("m1"));
    }

    #[test]
    fn chat_list_is_newest_first_with_peers() {
        let db = db();
        user(&db, "U1", "alice");
        let bob = user(&db, "u2", "bob");
        let carol = user(&db, "u3", "carol");
        let session = ChatSession::new("U1");

        start_chat(&db, &session, Some(&bob)).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));
        start_chat(&db, &session, Some(&carol)).unwrap();

        let items = chat_list(&db, &session).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].peer.as_ref(), Some(&carol));
        assert_eq!(items[1].peer.as_ref(), Some(&bob));
    }
}
