use tracing::{debug, warn};

use crate::{
    db::{Database, Song},
    error::AppResult,
    spotify::MusicApi,
    types::Track,
    utils::{join_artist_names, normalize_genres},
};

/// Get-or-create access to the local song table.
pub struct SongCache<'a> {
    db: &'a Database,
    audio_features_enabled: bool,
}

impl<'a> SongCache<'a> {
    pub fn new(db: &'a Database, audio_features_enabled: bool) -> Self {
        Self {
            db,
            audio_features_enabled,
        }
    }

    /// Returns the cached song for `track`, creating it on first encounter,
    /// and associates it with `user_id`.
    ///
    /// A track without an id yields `Ok(None)` and nothing is stored. Cached
    /// rows are never re-populated. A new row is written together with its
    /// genres and the user association, so a failed lookup leaves nothing
    /// behind.
    pub async fn get_or_create_song(
        &self,
        api: &dyn MusicApi,
        track: &Track,
        user_id: &str,
    ) -> AppResult<Option<Song>> {
        let Some(track_id) = track.track_id() else {
            return Ok(None);
        };

        if let Some(song) = self.db.get_song(track_id)? {
            self.db.associate_user(user_id, track_id)?;
            return Ok(Some(song));
        }

        let mut genres = Vec::new();
        for artist in &track.artists {
            let Some(artist_id) = artist.id.as_deref().filter(|id| !id.is_empty()) else {
                continue;
            };
            genres.extend(api.artist(artist_id).await?.genres);
        }

        let album = track.album.as_ref();
        let mut song = Song {
            track_id: track_id.to_string(),
            track_name: if track.name.is_empty() {
                "Unknown".to_string()
            } else {
                track.name.clone()
            },
            artist_names: join_artist_names(track),
            album_art: Some(
                album
                    .and_then(|a| a.images.first())
                    .map(|image| image.url.clone())
                    .unwrap_or_default(),
            ),
            popularity: track.popularity,
            release_date: album.and_then(|a| a.release_date.clone()),
            genres: normalize_genres(genres),
            ..Default::default()
        };

        if self.audio_features_enabled {
            match api.audio_features(track_id).await {
                Ok(features) => song.set_audio_features(&features),
                Err(e) => warn!("No audio features for track {}: {}", track_id, e),
            }
        }

        let stored = self.db.insert_song(&song, user_id)?;
        debug!("Cached track {} ({})", stored.track_id, stored.track_name);
        Ok(Some(stored))
    }

    /// Caches every track, skipping the ones that cannot be cached.
    ///
    /// Stops at the first [`crate::error::AppError::Unauthorized`], since no
    /// later call can succeed either.
    pub async fn cache_tracks(
        &self,
        api: &dyn MusicApi,
        tracks: &[Track],
        user_id: &str,
    ) -> AppResult<Vec<Song>> {
        let mut songs = Vec::with_capacity(tracks.len());
        for track in tracks {
            match self.get_or_create_song(api, track, user_id).await {
                Ok(Some(song)) => songs.push(song),
                Ok(None) => {}
                Err(e) if e.is_unauthorized() => return Err(e),
                Err(e) => warn!("Skipping track {:?}: {}", track.id, e),
            }
        }
        Ok(songs)
    }
}
