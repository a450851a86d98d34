use rusqlite::{OptionalExtension, params};

use super::Database;
use crate::{error::AppResult, types::Token, utils::now_timestamp};

/// Server-side web session, referenced by an opaque cookie.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub id: String,
    pub user_id: String,
    token: Option<Token>,
    dirty: bool,
}

impl Session {
    pub fn new(id: String, user_id: String, token: Option<Token>) -> Self {
        Self {
            id,
            user_id,
            token,
            dirty: false,
        }
    }

    pub fn token(&self) -> Option<&Token> {
        self.token.as_ref()
    }

    /// Replaces the token and marks the session as needing a save.
    pub fn set_token(&mut self, token: Token) {
        self.token = Some(token);
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}

impl Database {
    pub fn create_session(&self, session: &Session) -> AppResult<()> {
        let token = session.token();
        self.conn().execute(
            "INSERT INTO session (id, user_id, access_token, refresh_token, scope, expires_at, last_used) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                session.id,
                session.user_id,
                token.map(|t| &t.access_token),
                token.map(|t| &t.refresh_token),
                token.map(|t| &t.scope),
                token.map(|t| t.expires_at),
                now_timestamp(),
            ],
        )?;
        Ok(())
    }

    pub fn load_session(&self, id: &str) -> AppResult<Option<Session>> {
        let session = self
            .conn()
            .query_row(
                "SELECT id, user_id, access_token, refresh_token, scope, expires_at \
                 FROM session WHERE id = ?1",
                params![id],
                |row| {
                    let access_token: Option<String> = row.get(2)?;
                    let token = match access_token {
                        Some(access_token) => Some(Token {
                            access_token,
                            refresh_token: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
                            scope: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
                            expires_at: row.get::<_, Option<i64>>(5)?.unwrap_or_default(),
                        }),
                        None => None,
                    };
                    Ok(Session::new(row.get(0)?, row.get(1)?, token))
                },
            )
            .optional()?;
        Ok(session)
    }

    /// Writes the token back and clears the dirty flag.
    pub fn save_session(&self, session: &mut Session) -> AppResult<()> {
        let token = session.token();
        self.conn().execute(
            "UPDATE session SET access_token = ?2, refresh_token = ?3, scope = ?4, \
             expires_at = ?5, last_used = ?6 WHERE id = ?1",
            params![
                session.id,
                token.map(|t| &t.access_token),
                token.map(|t| &t.refresh_token),
                token.map(|t| &t.scope),
                token.map(|t| t.expires_at),
                now_timestamp(),
            ],
        )?;
        session.dirty = false;
        Ok(())
    }

    pub fn delete_session(&self, id: &str) -> AppResult<bool> {
        let deleted = self
            .conn()
            .execute("DELETE FROM session WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(access: &str, expires_at: i64) -> Token {
        Token {
            access_token: access.to_string(),
            refresh_token: "refresh".to_string(),
            scope: "user-top-read".to_string(),
            expires_at,
        }
    }

    fn setup() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.upsert_user("alice", Some("Alice")).unwrap();
        db
    }

    #[test]
    fn session_round_trips_token() {
        let db = setup();
        let session = Session::new("s1".into(), "alice".into(), Some(token("a1", 100)));
        db.create_session(&session).unwrap();

        let loaded = db.load_session("s1").unwrap().unwrap();
        assert_eq!(loaded, session);
        assert!(!loaded.is_dirty());
    }

    #[test]
    fn saving_clears_dirty_flag() {
        let db = setup();
        let mut session = Session::new("s1".into(), "alice".into(), Some(token("a1", 100)));
        db.create_session(&session).unwrap();

        session.set_token(token("a2", 200));
        assert!(session.is_dirty());
        db.save_session(&mut session).unwrap();
        assert!(!session.is_dirty());

        let loaded = db.load_session("s1").unwrap().unwrap();
        assert_eq!(loaded.token().unwrap().access_token, "a2");
        assert_eq!(loaded.token().unwrap().expires_at, 200);
    }

    #[test]
    fn deleted_session_is_gone() {
        let db = setup();
        let session = Session::new("s1".into(), "alice".into(), None);
        db.create_session(&session).unwrap();

        assert!(db.delete_session("s1").unwrap());
        assert!(db.load_session("s1").unwrap().is_none());
        assert!(!db.delete_session("s1").unwrap());
    }
}
