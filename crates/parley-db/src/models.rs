//! Rows of the auth tables. Documents are plain JSON and have no row type.

pub struct CredentialRow {
    pub user_id: String,
    pub email: String,
    pub password: String,
    pub created_at: String,
}

pub struct SessionRow {
    pub id: String,
    pub user_id: String,
    pub created_at: String,
}
