use parley_types::models::ChatEntry;

/// The chat currently open in a session.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub message_id: String,
    pub peer: ChatEntry,
}

/// Per-session context handed to every chat operation: who is calling, and
/// which chat they have open. One exists per authenticated session.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatSession {
    user_id: String,
    selection: Option<Selection>,
}

impl ChatSession {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            selection: None,
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub(crate) fn select(&mut self, entry: ChatEntry) {
        self.selection = Some(Selection {
            message_id: entry.message_id.clone(),
            peer: entry,
        });
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }
}
