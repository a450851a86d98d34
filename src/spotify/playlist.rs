use super::SpotifyClient;
use crate::{
    error::AppResult,
    types::{
        AddTrackToPlaylistRequest, AddTrackToPlaylistResponse, CreatePlaylistRequest, Page,
        PlaylistItem, PlaylistSummary,
    },
};

impl SpotifyClient {
    pub async fn get_user_playlists(
        &self,
        limit: u32,
        offset: u32,
    ) -> AppResult<Page<PlaylistSummary>> {
        self.get(
            "/me/playlists",
            &[("limit", limit.min(50)), ("offset", offset)],
        )
        .await
    }

    pub async fn get_playlist_tracks(
        &self,
        playlist_id: &str,
        limit: u32,
        offset: u32,
    ) -> AppResult<Page<PlaylistItem>> {
        self.get(
            &format!("/playlists/{}/tracks", playlist_id),
            &[("limit", limit.min(100)), ("offset", offset)],
        )
        .await
    }

    /// Creates a private playlist for `user_id`.
    pub async fn create_private_playlist(
        &self,
        user_id: &str,
        name: &str,
        description: &str,
    ) -> AppResult<PlaylistSummary> {
        let body = CreatePlaylistRequest {
            name: name.to_string(),
            description: description.to_string(),
            public: false,
        };
        self.post(&format!("/users/{}/playlists", user_id), &body)
            .await
    }

    /// Adds up to 100 `spotify:track:` URIs in one call.
    pub async fn add_tracks(&self, playlist_id: &str, uris: &[String]) -> AppResult<()> {
        let body = AddTrackToPlaylistRequest {
            uris: uris.to_vec(),
        };
        let _: AddTrackToPlaylistResponse = self
            .post(&format!("/playlists/{}/tracks", playlist_id), &body)
            .await?;
        Ok(())
    }
}
