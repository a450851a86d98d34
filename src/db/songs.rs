use std::collections::HashSet;

use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::Serialize;

use super::Database;
use crate::{error::AppResult, types::AudioFeatures};

/// Cached track metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Song {
    pub track_id: String,
    pub track_name: String,
    pub artist_names: String,
    pub album_art: Option<String>,
    pub popularity: Option<u32>,
    pub release_date: Option<String>,
    pub genres: Vec<String>,
    pub danceability: Option<f64>,
    pub energy: Option<f64>,
    pub valence: Option<f64>,
    pub acousticness: Option<f64>,
    pub instrumentalness: Option<f64>,
    pub liveness: Option<f64>,
    pub speechiness: Option<f64>,
}

impl Song {
    pub fn set_audio_features(&mut self, features: &AudioFeatures) {
        self.danceability = features.danceability;
        self.energy = features.energy;
        self.valence = features.valence;
        self.acousticness = features.acousticness;
        self.instrumentalness = features.instrumentalness;
        self.liveness = features.liveness;
        self.speechiness = features.speechiness;
    }
}

/// Averages over the songs associated with one user. Every field is `None`
/// when the user has no song carrying it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AudioAverages {
    pub songs: u64,
    pub danceability: Option<f64>,
    pub energy: Option<f64>,
    pub valence: Option<f64>,
    pub acousticness: Option<f64>,
    pub instrumentalness: Option<f64>,
    pub liveness: Option<f64>,
    pub speechiness: Option<f64>,
    pub popularity: Option<f64>,
}

const SONG_COLUMNS: &str = "track_id, track_name, artist_names, album_art, popularity, release_date, \
     danceability, energy, valence, acousticness, instrumentalness, liveness, speechiness";

fn song_from_row(row: &Row) -> rusqlite::Result<Song> {
    Ok(Song {
        track_id: row.get(0)?,
        track_name: row.get(1)?,
        artist_names: row.get(2)?,
        album_art: row.get(3)?,
        popularity: row.get(4)?,
        release_date: row.get(5)?,
        genres: Vec::new(),
        danceability: row.get(6)?,
        energy: row.get(7)?,
        valence: row.get(8)?,
        acousticness: row.get(9)?,
        instrumentalness: row.get(10)?,
        liveness: row.get(11)?,
        speechiness: row.get(12)?,
    })
}

fn load_genres(conn: &Connection, track_id: &str) -> rusqlite::Result<Vec<String>> {
    let mut stmt =
        conn.prepare("SELECT genre FROM song_genre WHERE track_id = ?1 ORDER BY position")?;
    stmt.query_map(params![track_id], |row| row.get(0))?
        .collect()
}

fn find_song(conn: &Connection, track_id: &str) -> rusqlite::Result<Option<Song>> {
    let song = conn
        .query_row(
            &format!("SELECT {} FROM song WHERE track_id = ?1", SONG_COLUMNS),
            params![track_id],
            song_from_row,
        )
        .optional()?;

    match song {
        Some(mut song) => {
            song.genres = load_genres(conn, track_id)?;
            Ok(Some(song))
        }
        None => Ok(None),
    }
}

impl Database {
    pub fn get_song(&self, track_id: &str) -> AppResult<Option<Song>> {
        let conn = self.conn();
        Ok(find_song(&conn, track_id)?)
    }

    /// Inserts a new song with its genres and associates it with `user_id`,
    /// all in one transaction.
    ///
    /// Returns the stored row. When another writer created the song first,
    /// the existing row wins and only the association is added.
    pub fn insert_song(&self, song: &Song, user_id: &str) -> AppResult<Song> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let inserted = tx.execute(
            &format!(
                "INSERT OR IGNORE INTO song ({}) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                SONG_COLUMNS
            ),
            params![
                song.track_id,
                song.track_name,
                song.artist_names,
                song.album_art,
                song.popularity,
                song.release_date,
                song.danceability,
                song.energy,
                song.valence,
                song.acousticness,
                song.instrumentalness,
                song.liveness,
                song.speechiness,
            ],
        )?;

        if inserted > 0 {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO song_genre (track_id, genre, position) VALUES (?1, ?2, ?3)",
            )?;
            for (position, genre) in song.genres.iter().enumerate() {
                stmt.execute(params![song.track_id, genre, position as i64])?;
            }
        }

        tx.execute(
            "INSERT OR IGNORE INTO user_song (user_id, track_id) VALUES (?1, ?2)",
            params![user_id, song.track_id],
        )?;

        let stored = find_song(&tx, &song.track_id)?;
        tx.commit()?;

        Ok(stored.unwrap_or_else(|| song.clone()))
    }

    /// Associates an existing song with a user. Returns `true` when the
    /// association is new.
    pub fn associate_user(&self, user_id: &str, track_id: &str) -> AppResult<bool> {
        let changed = self.conn().execute(
            "INSERT OR IGNORE INTO user_song (user_id, track_id) VALUES (?1, ?2)",
            params![user_id, track_id],
        )?;
        Ok(changed > 0)
    }

    pub fn is_owned(&self, user_id: &str, track_id: &str) -> AppResult<bool> {
        let count: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM user_song WHERE user_id = ?1 AND track_id = ?2",
            params![user_id, track_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Every track id associated with the user.
    pub fn user_track_ids(&self, user_id: &str) -> AppResult<HashSet<String>> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT track_id FROM user_song WHERE user_id = ?1")?;
        let ids = stmt
            .query_map(params![user_id], |row| row.get(0))?
            .collect::<Result<_, _>>()?;
        Ok(ids)
    }

    pub fn count_songs(&self) -> AppResult<u64> {
        let count: i64 = self
            .conn()
            .query_row("SELECT COUNT(*) FROM song", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    pub fn count_user_songs(&self, user_id: &str) -> AppResult<u64> {
        let count: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM user_song WHERE user_id = ?1",
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    /// The user's most frequent genres, counted once per cached song.
    /// Ties are ordered by genre name.
    pub fn top_genres_for_user(&self, user_id: &str, limit: usize) -> AppResult<Vec<(String, u64)>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT g.genre, COUNT(*) AS occurrences FROM song_genre g \
             JOIN user_song u ON u.track_id = g.track_id \
             WHERE u.user_id = ?1 \
             GROUP BY g.genre ORDER BY occurrences DESC, g.genre ASC LIMIT ?2",
        )?;
        let genres = stmt
            .query_map(params![user_id, limit as i64], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64))
            })?
            .collect::<Result<_, _>>()?;
        Ok(genres)
    }

    pub fn user_averages(&self, user_id: &str) -> AppResult<AudioAverages> {
        let averages = self.conn().query_row(
            "SELECT COUNT(*), AVG(s.danceability), AVG(s.energy), AVG(s.valence), \
             AVG(s.acousticness), AVG(s.instrumentalness), AVG(s.liveness), \
             AVG(s.speechiness), AVG(s.popularity) \
             FROM song s JOIN user_song u ON u.track_id = s.track_id WHERE u.user_id = ?1",
            params![user_id],
            |row| {
                Ok(AudioAverages {
                    songs: row.get::<_, i64>(0)? as u64,
                    danceability: row.get(1)?,
                    energy: row.get(2)?,
                    valence: row.get(3)?,
                    acousticness: row.get(4)?,
                    instrumentalness: row.get(5)?,
                    liveness: row.get(6)?,
                    speechiness: row.get(7)?,
                    popularity: row.get(8)?,
                })
            },
        )?;
        Ok(averages)
    }
}
