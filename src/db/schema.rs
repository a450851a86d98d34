use rusqlite::Connection;

use crate::error::{AppError, AppResult};

/// Added to the schema version before it is written to `PRAGMA user_version`,
/// so that a database created by another program is never mistaken for ours.
pub const BASE_DB_VERSION: u32 = 100;

pub struct Table {
    pub name: &'static str,
    pub schema: &'static str,
    pub columns: &'static [&'static str],
    pub indices: &'static [&'static str],
}

pub struct VersionedSchema {
    pub version: u32,
    pub tables: &'static [Table],
}

/// V 0
const USER_TABLE_V_0: Table = Table {
    name: "user",
    schema: "CREATE TABLE user (id TEXT NOT NULL, display_name TEXT, created INTEGER DEFAULT (cast(strftime('%s','now') as int)), PRIMARY KEY (id));",
    columns: &["id", "display_name", "created"],
    indices: &[],
};
const SONG_TABLE_V_0: Table = Table {
    name: "song",
    schema: "CREATE TABLE song (track_id TEXT NOT NULL, track_name TEXT NOT NULL, artist_names TEXT NOT NULL, album_art TEXT, popularity INTEGER, release_date TEXT, danceability REAL, energy REAL, valence REAL, acousticness REAL, instrumentalness REAL, liveness REAL, speechiness REAL, created INTEGER DEFAULT (cast(strftime('%s','now') as int)), PRIMARY KEY (track_id));",
    columns: &[
        "track_id",
        "track_name",
        "artist_names",
        "album_art",
        "popularity",
        "release_date",
        "danceability",
        "energy",
        "valence",
        "acousticness",
        "instrumentalness",
        "liveness",
        "speechiness",
        "created",
    ],
    indices: &[],
};
const SONG_GENRE_TABLE_V_0: Table = Table {
    name: "song_genre",
    schema: "CREATE TABLE song_genre (track_id TEXT NOT NULL, genre TEXT NOT NULL, position INTEGER NOT NULL, PRIMARY KEY (track_id, genre), CONSTRAINT track_id FOREIGN KEY (track_id) REFERENCES song (track_id) ON DELETE CASCADE);",
    columns: &["track_id", "genre", "position"],
    indices: &["CREATE INDEX song_genre_genre_index ON song_genre (genre);"],
};
const USER_SONG_TABLE_V_0: Table = Table {
    name: "user_song",
    schema: "CREATE TABLE user_song (user_id TEXT NOT NULL, track_id TEXT NOT NULL, created INTEGER DEFAULT (cast(strftime('%s','now') as int)), PRIMARY KEY (user_id, track_id), CONSTRAINT user_id FOREIGN KEY (user_id) REFERENCES user (id) ON DELETE CASCADE, CONSTRAINT track_id FOREIGN KEY (track_id) REFERENCES song (track_id) ON DELETE CASCADE);",
    columns: &["user_id", "track_id", "created"],
    indices: &["CREATE INDEX user_song_track_index ON user_song (track_id);"],
};
const LISTENING_HISTORY_TABLE_V_0: Table = Table {
    name: "listening_history",
    schema: "CREATE TABLE listening_history (id INTEGER NOT NULL, user_id TEXT NOT NULL, track_id TEXT NOT NULL, played_at TEXT NOT NULL, duration_ms INTEGER, fetched_at INTEGER NOT NULL, PRIMARY KEY (id), CONSTRAINT user_id FOREIGN KEY (user_id) REFERENCES user (id) ON DELETE CASCADE, CONSTRAINT track_id FOREIGN KEY (track_id) REFERENCES song (track_id));",
    columns: &["id", "user_id", "track_id", "played_at", "duration_ms", "fetched_at"],
    indices: &["CREATE INDEX listening_history_user_index ON listening_history (user_id, played_at);"],
};
const SESSION_TABLE_V_0: Table = Table {
    name: "session",
    schema: "CREATE TABLE session (id TEXT NOT NULL, user_id TEXT NOT NULL, access_token TEXT, refresh_token TEXT, scope TEXT, expires_at INTEGER, created INTEGER DEFAULT (cast(strftime('%s','now') as int)), last_used INTEGER, PRIMARY KEY (id), CONSTRAINT user_id FOREIGN KEY (user_id) REFERENCES user (id) ON DELETE CASCADE);",
    columns: &[
        "id",
        "user_id",
        "access_token",
        "refresh_token",
        "scope",
        "expires_at",
        "created",
        "last_used",
    ],
    indices: &[],
};

pub const VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[
        USER_TABLE_V_0,
        SONG_TABLE_V_0,
        SONG_GENRE_TABLE_V_0,
        USER_SONG_TABLE_V_0,
        LISTENING_HISTORY_TABLE_V_0,
        SESSION_TABLE_V_0,
    ],
}];

pub fn current_schema() -> &'static VersionedSchema {
    &VERSIONED_SCHEMAS[VERSIONED_SCHEMAS.len() - 1]
}

/// Creates every table of `schema` and stamps the database version.
pub fn create(conn: &Connection, schema: &VersionedSchema) -> AppResult<()> {
    for table in schema.tables {
        conn.execute(table.schema, [])?;
        for index in table.indices {
            conn.execute(index, [])?;
        }
    }
    conn.execute(
        &format!("PRAGMA user_version = {}", BASE_DB_VERSION + schema.version),
        [],
    )?;
    Ok(())
}

/// Checks that every table of `schema` exists with the expected columns.
pub fn validate(conn: &Connection, schema: &VersionedSchema) -> AppResult<()> {
    for table in schema.tables {
        let mut stmt = conn.prepare(&format!("PRAGMA table_info({});", table.name))?;
        let columns: Vec<String> = stmt
            .query_map([], |row| row.get(1))?
            .collect::<Result<_, _>>()?;

        if columns != table.columns {
            return Err(AppError::Schema(format!(
                "table {} has columns {:?}, expected {:?}",
                table.name, columns, table.columns
            )));
        }
    }
    Ok(())
}
