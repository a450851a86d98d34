use tracing::{info, warn};

use super::{
    PlaylistOutcome,
    builder::{add_tracks, create_playlist},
};
use crate::{
    config::GenrePlaylistConfig,
    db::Database,
    error::{AppError, AppResult},
    management::SongCache,
    spotify::MusicApi,
    utils::shuffle,
};

/// A validated "explore a genre" request.
#[derive(Debug, Clone, PartialEq)]
pub struct GenrePlaylistRequest {
    pub genre: String,
    pub num_songs: usize,
}

impl GenrePlaylistRequest {
    /// Validates the form values. A missing `num_songs` takes the configured
    /// default.
    pub fn parse(
        genre: Option<&str>,
        num_songs: Option<&str>,
        config: &GenrePlaylistConfig,
    ) -> AppResult<Self> {
        let genre = genre
            .map(str::trim)
            .filter(|g| !g.is_empty())
            .ok_or_else(|| AppError::InvalidInput("a genre is required".to_string()))?;

        let num_songs = match num_songs.map(str::trim).filter(|n| !n.is_empty()) {
            Some(raw) => raw
                .parse::<usize>()
                .map_err(|_| AppError::InvalidInput(format!("'{}' is not a number", raw)))?,
            None => config.default_songs,
        };
        if num_songs == 0 || num_songs > config.max_songs {
            return Err(AppError::InvalidInput(format!(
                "number of songs must be between 1 and {}",
                config.max_songs
            )));
        }

        Ok(Self {
            genre: genre.to_string(),
            num_songs,
        })
    }

    pub fn query(&self) -> String {
        format!("genre:\"{}\"", self.genre)
    }

    pub fn playlist_name(&self) -> String {
        format!("{} Playlist", self.genre)
    }
}

/// Pages through the genre search and caches up to `num_songs` tracks the
/// user does not own yet. Returns the ids in discovery order.
///
/// Offsets at or past the configured ceiling are never requested. A failing
/// search page ends the walk; the tracks collected so far are kept.
pub async fn collect_genre_tracks(
    api: &dyn MusicApi,
    db: &Database,
    cache: &SongCache<'_>,
    config: &GenrePlaylistConfig,
    user_id: &str,
    request: &GenrePlaylistRequest,
) -> AppResult<Vec<String>> {
    let query = request.query();
    let mut collected: Vec<String> = Vec::new();
    let mut offset = 0;

    while collected.len() < request.num_songs && offset < config.offset_ceiling {
        let page = match api.search_tracks(&query, config.page_size, offset).await {
            Ok(page) => page,
            Err(e) if e.is_unauthorized() => return Err(e),
            Err(e) => {
                warn!("Genre search for '{}' failed at offset {}: {}", request.genre, offset, e);
                break;
            }
        };
        if page.items.is_empty() {
            break;
        }

        for track in &page.items {
            if collected.len() >= request.num_songs {
                break;
            }
            let Some(track_id) = track.track_id() else {
                continue;
            };
            if db.is_owned(user_id, track_id)? {
                continue;
            }

            match cache.get_or_create_song(api, track, user_id).await {
                Ok(Some(song)) => collected.push(song.track_id),
                Ok(None) => {}
                Err(e) if e.is_unauthorized() => return Err(e),
                Err(e) => warn!("Skipping genre track {}: {}", track_id, e),
            }
        }

        if page.next.is_none() {
            break;
        }
        offset += config.page_size;
    }

    Ok(collected)
}

/// Builds a shuffled playlist named "<genre> Playlist".
pub async fn create_genre_playlist(
    api: &dyn MusicApi,
    db: &Database,
    cache: &SongCache<'_>,
    config: &GenrePlaylistConfig,
    user_id: &str,
    request: &GenrePlaylistRequest,
) -> AppResult<PlaylistOutcome> {
    let mut track_ids = collect_genre_tracks(api, db, cache, config, user_id, request).await?;
    if track_ids.is_empty() {
        info!("No tracks found for genre '{}'", request.genre);
        return Ok(PlaylistOutcome::NoTracks);
    }

    shuffle(&mut track_ids);

    let name = request.playlist_name();
    let description = format!("Tracks tagged {}", request.genre);
    let playlist_id = create_playlist(api, user_id, &name, &description).await?;
    let added = add_tracks(api, &playlist_id, &track_ids).await?;

    Ok(PlaylistOutcome::Created {
        playlist_id,
        name,
        added,
    })
}
