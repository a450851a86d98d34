use super::SpotifyClient;
use crate::{
    error::AppResult,
    types::{AudioFeatures, Page, PlayHistoryItem, SavedTrack, TopItemsResponse, Track},
    utils::TimeRange,
};

const ALBUM_TRACKS_PAGE: u32 = 50;

impl SpotifyClient {
    pub async fn get_top_tracks(&self, time_range: TimeRange, limit: u32) -> AppResult<Vec<Track>> {
        let response: TopItemsResponse<Track> = self
            .get(
                "/me/top/tracks",
                &[
                    ("time_range", time_range.as_str().to_string()),
                    ("limit", limit.min(50).to_string()),
                ],
            )
            .await?;
        Ok(response.items)
    }

    pub async fn get_track(&self, track_id: &str) -> AppResult<Track> {
        self.get(&format!("/tracks/{}", track_id), &[] as &[(&str, &str)])
            .await
    }

    /// Audio features of one track. Spotify deprecated this endpoint for new
    /// applications, which then receive `403`.
    pub async fn get_audio_features(&self, track_id: &str) -> AppResult<AudioFeatures> {
        self.get(
            &format!("/audio-features/{}", track_id),
            &[] as &[(&str, &str)],
        )
        .await
    }

    /// Every track of an album, following pagination.
    pub async fn get_album_tracks(&self, album_id: &str) -> AppResult<Vec<Track>> {
        let mut tracks = Vec::new();
        let mut offset = 0;

        loop {
            let page: Page<Track> = self
                .get(
                    &format!("/albums/{}/tracks", album_id),
                    &[("limit", ALBUM_TRACKS_PAGE), ("offset", offset)],
                )
                .await?;

            let received = page.items.len() as u32;
            tracks.extend(page.items);
            if page.next.is_none() || received == 0 {
                break;
            }
            offset += received;
        }

        Ok(tracks)
    }

    pub async fn get_saved_tracks(&self, limit: u32, offset: u32) -> AppResult<Page<SavedTrack>> {
        self.get(
            "/me/tracks",
            &[("limit", limit.min(50)), ("offset", offset)],
        )
        .await
    }

    pub async fn get_recently_played(&self, limit: u32) -> AppResult<Vec<PlayHistoryItem>> {
        let page: Page<PlayHistoryItem> = self
            .get("/me/player/recently-played", &[("limit", limit.min(50))])
            .await?;
        Ok(page.items)
    }
}
