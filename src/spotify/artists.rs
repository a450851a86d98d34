use super::SpotifyClient;
use crate::{
    error::AppResult,
    types::{Artist, TopItemsResponse},
    utils::TimeRange,
};

impl SpotifyClient {
    /// The current user's top artists for `time_range` (`limit` at most 50).
    pub async fn get_top_artists(
        &self,
        time_range: TimeRange,
        limit: u32,
    ) -> AppResult<Vec<Artist>> {
        let response: TopItemsResponse<Artist> = self
            .get(
                "/me/top/artists",
                &[
                    ("time_range", time_range.as_str().to_string()),
                    ("limit", limit.min(50).to_string()),
                ],
            )
            .await?;
        Ok(response.items)
    }

    pub async fn get_artist(&self, artist_id: &str) -> AppResult<Artist> {
        self.get(&format!("/artists/{}", artist_id), &[] as &[(&str, &str)])
            .await
    }
}
