use tracing::{info, warn};

use super::SongCache;
use crate::{error::AppResult, spotify::MusicApi, types::Track};

const PLAYLISTS_PAGE: u32 = 50;
const PLAYLIST_TRACKS_PAGE: u32 = 100;
const SAVED_TRACKS_PAGE: u32 = 50;

/// Collects the tracks of every playlist of the user, followed by the saved
/// tracks. Local files and entries without a track id are left out. A
/// playlist whose tracks cannot be read keeps what was read before.
pub async fn collect_library_tracks(api: &dyn MusicApi) -> AppResult<Vec<Track>> {
    let mut tracks = Vec::new();

    let mut offset = 0;
    loop {
        let page = api.user_playlists(PLAYLISTS_PAGE, offset).await?;
        let received = page.items.len() as u32;

        for playlist in &page.items {
            let mut track_offset = 0;
            loop {
                let items = match api
                    .playlist_tracks(&playlist.id, PLAYLIST_TRACKS_PAGE, track_offset)
                    .await
                {
                    Ok(items) => items,
                    Err(e) if e.is_unauthorized() => return Err(e),
                    Err(e) => {
                        warn!("Skipping playlist {}: {}", playlist.id, e);
                        break;
                    }
                };
                let item_count = items.items.len() as u32;
                tracks.extend(items.items.into_iter().filter_map(|item| item.track));
                if items.next.is_none() || item_count == 0 {
                    break;
                }
                track_offset += item_count;
            }
        }

        if page.next.is_none() || received == 0 {
            break;
        }
        offset += received;
    }

    let mut offset = 0;
    loop {
        let page = api.saved_tracks(SAVED_TRACKS_PAGE, offset).await?;
        let received = page.items.len() as u32;
        tracks.extend(page.items.into_iter().filter_map(|saved| saved.track));
        if page.next.is_none() || received == 0 {
            break;
        }
        offset += received;
    }

    tracks.retain(|track| !track.is_local && track.track_id().is_some());
    Ok(tracks)
}

/// Caches the user's whole library. Returns the number of tracks collected.
pub async fn import_library(
    api: &dyn MusicApi,
    cache: &SongCache<'_>,
    user_id: &str,
) -> AppResult<usize> {
    let tracks = collect_library_tracks(api).await?;
    let songs = cache.cache_tracks(api, &tracks, user_id).await?;
    info!(
        "Imported library of user {}: {} tracks collected, {} cached",
        user_id,
        tracks.len(),
        songs.len()
    );
    Ok(tracks.len())
}
