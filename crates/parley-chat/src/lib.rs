//! Chat operations over a [`DocumentStore`](parley_db::DocumentStore):
//! contact search, chat initiation, chat selection, threads and profiles.
//!
//! Every operation takes the caller's [`ChatSession`] explicitly and runs its
//! store calls in order, one after another.

pub mod chat_list;
pub mod contacts;
pub mod error;
pub mod profile;
pub mod session;
pub mod threads;

pub use error::ChatError;
pub use session::{ChatSession, Selection};

/// Array field of `chats/{id}` holding the entries.
pub const CHATS_DATA: &str = "chatsData";

pub(crate) fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
