pub mod api;
pub mod models;

/// Collection names. These are part of the document wire contract.
pub mod collections {
    pub const USERS: &str = "users";
    pub const CHATS: &str = "chats";
    pub const MESSAGES: &str = "messages";
}
