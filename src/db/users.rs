use rusqlite::{OptionalExtension, params};
use serde::Serialize;

use super::Database;
use crate::error::AppResult;

/// Local account, keyed by the Spotify user id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    pub id: String,
    pub display_name: Option<String>,
}

impl Database {
    /// Creates the user or refreshes its display name.
    pub fn upsert_user(&self, id: &str, display_name: Option<&str>) -> AppResult<()> {
        self.conn().execute(
            "INSERT INTO user (id, display_name) VALUES (?1, ?2) \
             ON CONFLICT(id) DO UPDATE SET display_name = excluded.display_name",
            params![id, display_name],
        )?;
        Ok(())
    }

    pub fn get_user(&self, id: &str) -> AppResult<Option<User>> {
        let user = self
            .conn()
            .query_row(
                "SELECT id, display_name FROM user WHERE id = ?1",
                params![id],
                |row| {
                    Ok(User {
                        id: row.get(0)?,
                        display_name: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(user)
    }
}
