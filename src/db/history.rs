use rusqlite::params;
use serde::Serialize;

use super::Database;
use crate::{error::AppResult, utils::now_timestamp};

/// One play to append to the listening history.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub track_id: String,
    pub played_at: String,
    pub duration_ms: Option<u64>,
}

/// A stored play, joined with the cached song it refers to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryRecord {
    pub track_id: String,
    pub track_name: String,
    pub artist_names: String,
    pub played_at: String,
    pub duration_ms: Option<u64>,
    pub fetched_at: i64,
}

impl Database {
    /// Appends one row per entry. Rows are never matched against earlier
    /// fetches, so fetching the same plays twice stores them twice.
    ///
    /// Every referenced song must already be cached.
    pub fn append_history(&self, user_id: &str, entries: &[HistoryEntry]) -> AppResult<usize> {
        let fetched_at = now_timestamp();
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO listening_history (user_id, track_id, played_at, duration_ms, fetched_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for entry in entries {
                stmt.execute(params![
                    user_id,
                    entry.track_id,
                    entry.played_at,
                    entry.duration_ms.map(|d| d as i64),
                    fetched_at,
                ])?;
            }
        }
        tx.commit()?;
        Ok(entries.len())
    }

    /// Most recent plays first.
    pub fn recent_history(&self, user_id: &str, limit: usize) -> AppResult<Vec<HistoryRecord>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT h.track_id, s.track_name, s.artist_names, h.played_at, h.duration_ms, h.fetched_at \
             FROM listening_history h JOIN song s ON s.track_id = h.track_id \
             WHERE h.user_id = ?1 ORDER BY h.played_at DESC, h.id DESC LIMIT ?2",
        )?;
        let records = stmt
            .query_map(params![user_id, limit as i64], |row| {
                Ok(HistoryRecord {
                    track_id: row.get(0)?,
                    track_name: row.get(1)?,
                    artist_names: row.get(2)?,
                    played_at: row.get(3)?,
                    duration_ms: row.get::<_, Option<i64>>(4)?.map(|d| d as u64),
                    fetched_at: row.get(5)?,
                })
            })?
            .collect::<Result<_, _>>()?;
        Ok(records)
    }

    pub fn count_history(&self, user_id: &str) -> AppResult<u64> {
        let count: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM listening_history WHERE user_id = ?1",
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}
