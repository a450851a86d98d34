use super::SongCache;
use crate::{
    db::{Database, HistoryEntry},
    error::AppResult,
    spotify::MusicApi,
    types::PlayHistoryItem,
};

/// Fetches the user's recent plays, caches their tracks and appends one
/// history row per play. Returns the plays whose track could be cached.
pub async fn record_recent_plays(
    api: &dyn MusicApi,
    db: &Database,
    cache: &SongCache<'_>,
    user_id: &str,
    limit: u32,
) -> AppResult<Vec<PlayHistoryItem>> {
    let plays = api.recently_played(limit).await?;

    let mut recorded = Vec::with_capacity(plays.len());
    let mut entries = Vec::with_capacity(plays.len());
    for play in plays {
        let Some(track) = play.track.as_ref() else {
            continue;
        };
        let songs = cache.cache_tracks(api, std::slice::from_ref(track), user_id).await?;
        let Some(song) = songs.into_iter().next() else {
            continue;
        };

        entries.push(HistoryEntry {
            track_id: song.track_id,
            played_at: play.played_at.clone(),
            duration_ms: track.duration_ms,
        });
        recorded.push(play);
    }

    db.append_history(user_id, &entries)?;
    Ok(recorded)
}
