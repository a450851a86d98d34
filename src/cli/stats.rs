use tabled::Table;

use super::open_database;
use crate::{
    error, success,
    types::{GenreTableRow, HistoryTableRow},
    warning,
};

/// Prints the user's most frequent genres over the cached songs.
pub fn top_genres(user_id: &str, limit: usize) {
    let (_, db) = open_database();

    let genres = match db.top_genres_for_user(user_id, limit) {
        Ok(genres) => genres,
        Err(e) => error!("Cannot read genres. Err: {}", e),
    };
    if genres.is_empty() {
        warning!("No cached songs with genres for user {}.", user_id);
        return;
    }

    let rows: Vec<GenreTableRow> = genres
        .into_iter()
        .enumerate()
        .map(|(i, (genre, songs))| GenreTableRow {
            rank: i + 1,
            genre,
            songs,
        })
        .collect();

    println!("{}", Table::new(rows));
}

/// Prints the user's most recent stored plays.
pub fn history(user_id: &str, limit: usize) {
    let (_, db) = open_database();

    let records = match db.recent_history(user_id, limit) {
        Ok(records) => records,
        Err(e) => error!("Cannot read listening history. Err: {}", e),
    };
    let total = db.count_history(user_id).unwrap_or_default();

    let rows: Vec<HistoryTableRow> = records
        .into_iter()
        .map(|r| HistoryTableRow {
            played_at: r.played_at,
            track: r.track_name,
            artists: r.artist_names,
        })
        .collect();

    println!("{}", Table::new(rows));
    success!("{} plays stored for user {}.", total, user_id);
}
