use crate::models::{CredentialRow, SessionRow};
use crate::{Database, StoreError};
use rusqlite::{Connection, OptionalExtension};

impl Database {
    // -- Credentials --

    pub fn create_credentials(
        &self,
        user_id: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO credentials (user_id, email, password) VALUES (?1, ?2, ?3)",
                (user_id, email, password_hash),
            )?;
            Ok(())
        })
    }

    /// Undo `create_credentials` when the profile documents could not be written.
    pub fn delete_credentials(&self, user_id: &str) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM credentials WHERE user_id = ?1", [user_id])?;
            Ok(())
        })
    }

    pub fn get_credentials_by_email(
        &self,
        email: &str,
    ) -> Result<Option<CredentialRow>, StoreError> {
        self.with_conn(|conn| query_credentials_by_email(conn, email))
    }

    // -- Sessions --

    pub fn create_session(&self, id: &str, user_id: &str) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO sessions (id, user_id) VALUES (?1, ?2)",
                (id, user_id),
            )?;
            Ok(())
        })
    }

    pub fn get_session(&self, id: &str) -> Result<Option<SessionRow>, StoreError> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, user_id, created_at FROM sessions WHERE id = ?1",
                    [id],
                    |row| {
                        Ok(SessionRow {
                            id: row.get(0)?,
                            user_id: row.get(1)?,
                            created_at: row.get(2)?,
                        })
                    },
                )
                .optional()?;
            Ok(row)
        })
    }

    /// Returns whether a session was removed.
    pub fn delete_session(&self, id: &str) -> Result<bool, StoreError> {
        self.with_conn(|conn| {
            let removed = conn.execute("DELETE FROM sessions WHERE id = ?1", [id])?;
            Ok(removed > 0)
        })
    }

    /// Delete sessions opened more than `max_age_days` ago and return their ids.
    pub fn prune_sessions(&self, max_age_days: i64) -> Result<Vec<String>, StoreError> {
        let cutoff = format!("-{} days", max_age_days);

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let expired = tx
                .prepare("SELECT id FROM sessions WHERE created_at < datetime('now', ?1)")?
                .query_map([&cutoff], |row| row.get::<_, String>(0))?
                .collect::<Result<Vec<_>, _>>()?;
            tx.execute(
                "DELETE FROM sessions WHERE created_at < datetime('now', ?1)",
                [&cutoff],
            )?;
            tx.commit()?;
            Ok(expired)
        })
    }
}

fn query_credentials_by_email(
    conn: &Connection,
    email: &str,
) -> Result<Option<CredentialRow>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT user_id, email, password, created_at FROM credentials WHERE email = ?1",
    )?;

    let row = stmt
        .query_row([email], |row| {
            Ok(CredentialRow {
                user_id: row.get(0)?,
                email: row.get(1)?,
                password: row.get(2)?,
                created_at: row.get(3)?,
            })
        })
        .optional()?;

    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_are_unique_by_email() {
        let db = Database::open_in_memory().unwrap();
        db.create_credentials("u1", "bob@example.com", "hash").unwrap();

        let err = db
            .create_credentials("u2", "bob@example.com", "hash")
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        let row = db.get_credentials_by_email("bob@example.com").unwrap().unwrap();
        assert_eq!(row.user_id, "u1");
        assert!(db.get_credentials_by_email("eve@example.com").unwrap().is_none());
    }

    #[test]
    fn sessions_can_be_deleted() {
        let db = Database::open_in_memory().unwrap();
        db.create_credentials("u1", "bob@example.com", "hash").unwrap();
        db.create_session("s1", "u1").unwrap();

        assert_eq!(db.get_session("s1").unwrap().unwrap().user_id, "u1");
        assert!(db.delete_session("s1").unwrap());
        assert!(!db.delete_session("s1").unwrap());
        assert!(db.get_session("s1").unwrap().is_none());
    }

    #[test]
    fn prune_removes_only_old_sessions() {
        let db = Database::open_in_memory().unwrap();
        db.create_credentials("u1", "bob@example.com", "hash").unwrap();
        db.create_session("old", "u1").unwrap();
        db.create_session("new", "u1").unwrap();
        db.with_conn(|conn| {
            conn.execute(
                "UPDATE sessions SET created_at = datetime('now', '-31 days') WHERE id = 'old'",
                [],
            )?;
            Ok(())
        })
        .unwrap();

        assert_eq!(db.prune_sessions(30).unwrap(), vec!["old".to_string()]);
        assert!(db.get_session("old").unwrap().is_none());
        assert!(db.get_session("new").unwrap().is_some());
        assert!(db.prune_sessions(30).unwrap().is_empty());
    }
}
