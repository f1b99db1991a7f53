use parley_db::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("User not found.")]
    PeerMissing,

    #[error("You cannot start a chat with yourself.")]
    SelfChat,

    #[error("A chat with this user already exists.")]
    AlreadyLinked,

    #[error("You are not part of this chat.")]
    NotParticipant,

    #[error("Chat not found.")]
    ThreadMissing,

    #[error("Profile not found.")]
    UserMissing,

    #[error("Message is empty.")]
    EmptyMessage,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
