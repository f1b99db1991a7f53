use serde::{Deserialize, Serialize};

/// `users/{id}`. Field names are the document wire contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default)]
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub avatar: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub last_seen: i64,
}

/// One row of a user's chat list, summarizing the conversation with one peer.
///
/// Every field defaults so that partially written entries still load; an
/// entry with an empty `message_id` refers to no thread.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatEntry {
    #[serde(default)]
    pub message_id: String,
    #[serde(default)]
    pub last_message: String,
    #[serde(default)]
    pub r_id: String,
    #[serde(default)]
    pub updated_at: i64,
    #[serde(rename = "messageseen", default)]
    pub message_seen: bool,
}

impl ChatEntry {
    /// A fresh entry for a newly started chat with `peer_id`.
    pub fn new_chat(message_id: &str, peer_id: &str, now: i64) -> Self {
        Self {
            message_id: message_id.to_string(),
            last_message: String::new(),
            r_id: peer_id.to_string(),
            updated_at: now,
            message_seen: true,
        }
    }

    pub fn has_thread(&self) -> bool {
        !self.message_id.is_empty()
    }
}

/// `chats/{user_id}`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatListDocument {
    #[serde(default)]
    pub chats_data: Vec<ChatEntry>,
}

impl ChatListDocument {
    pub fn find(&self, message_id: &str) -> Option<&ChatEntry> {
        self.chats_data.iter().find(|c| c.message_id == message_id)
    }

    pub fn links(&self, peer_id: &str) -> bool {
        self.chats_data.iter().any(|c| c.r_id == peer_id)
    }
}

/// `messages/{message_id}`: the log shared by both participants.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageThread {
    #[serde(default)]
    pub create_at: i64,
    #[serde(default)]
    pub messages: Vec<Message>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub s_id: String,
    pub text: String,
    pub created_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn chat_entry_uses_document_field_names() {
        let entry = ChatEntry::new_chat("m1", "u2", 42);
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(
            value,
            json!({
                "messageId": "m1",
                "lastMessage": "",
                "rId": "u2",
                "updatedAt": 42,
                "messageseen": true
            })
        );
    }

    #[test]
    fn entry_without_thread_id_loads() {
        let entry: ChatEntry = serde_json::from_value(json!({ "messageseen": false })).unwrap();
        assert!(!entry.has_thread());
    }

    #[test]
    fn chat_list_lookup() {
        let doc: ChatListDocument = serde_json::from_value(json!({
            "chatsData": [
                { "messageId": "m1", "rId": "u2" },
                { "messageId": "m2", "rId": "u3" }
            ]
        }))
        .unwrap();

        assert_eq!(doc.find("m2").map(|c| c.r_id.as_str()), Some("u3"));
        assert!(doc.links("u2"));
        assert!(!doc.links("u4"));
    }
}
