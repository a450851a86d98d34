use super::SpotifyClient;
use crate::{
    error::AppResult,
    types::{Album, AlbumSearchResponse, Page, Track, TrackSearchResponse},
};

impl SpotifyClient {
    /// Searches tracks with a field-filter query such as `genre:"jazz" year:1960`.
    pub async fn find_tracks(&self, query: &str, limit: u32, offset: u32) -> AppResult<Page<Track>> {
        let response: TrackSearchResponse = self
            .get(
                "/search",
                &[
                    ("q", query.to_string()),
                    ("type", "track".to_string()),
                    ("limit", limit.min(50).to_string()),
                    ("offset", offset.to_string()),
                ],
            )
            .await?;
        Ok(response.tracks)
    }

    pub async fn find_albums(&self, query: &str, limit: u32, offset: u32) -> AppResult<Page<Album>> {
        let response: AlbumSearchResponse = self
            .get(
                "/search",
                &[
                    ("q", query.to_string()),
                    ("type", "album".to_string()),
                    ("limit", limit.min(50).to_string()),
                    ("offset", offset.to_string()),
                ],
            )
            .await?;
        Ok(response.albums)
    }
}
