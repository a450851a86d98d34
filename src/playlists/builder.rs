use std::collections::HashSet;

use tracing::info;

use crate::{error::AppResult, spotify::MusicApi, utils::track_uri};

/// Maximum number of URIs per add-tracks call.
pub const ADD_TRACKS_CHUNK: usize = 100;

/// Creates a private playlist and returns its id.
pub async fn create_playlist(
    api: &dyn MusicApi,
    user_id: &str,
    name: &str,
    description: &str,
) -> AppResult<String> {
    let playlist = api.create_playlist(user_id, name, description).await?;
    info!("Created playlist '{}' ({}) for {}", name, playlist.id, user_id);
    Ok(playlist.id)
}

/// Appends the tracks in chunks of [`ADD_TRACKS_CHUNK`].
///
/// Returns the number of tracks added. The first failing chunk aborts the
/// call; chunks sent before it stay in the playlist.
pub async fn add_tracks(
    api: &dyn MusicApi,
    playlist_id: &str,
    track_ids: &[String],
) -> AppResult<usize> {
    let mut added = 0;
    for chunk in track_ids.chunks(ADD_TRACKS_CHUNK) {
        let uris: Vec<String> = chunk.iter().map(|id| track_uri(id)).collect();
        api.add_to_playlist(playlist_id, &uris).await?;
        added += chunk.len();
    }
    Ok(added)
}

/// Drops ids the user already owns, keeping order.
pub fn filter_owned(track_ids: Vec<String>, owned: &HashSet<String>) -> Vec<String> {
    track_ids
        .into_iter()
        .filter(|id| !owned.contains(id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_owned_keeps_order() {
        let owned: HashSet<String> = ["b".to_string()].into_iter().collect();
        let ids = vec!["c".to_string(), "b".to_string(), "a".to_string()];
        assert_eq!(filter_owned(ids, &owned), vec!["c", "a"]);
    }
}
