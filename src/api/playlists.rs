use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::error;

use super::{AppState, AuthUser};
use crate::{
    error::{AppError, AppResult},
    management::import_library,
    playlists::{
        PlaylistOutcome,
        genre::{GenrePlaylistRequest, create_genre_playlist as build_genre_playlist},
        recommend::{RecommendationRequest, create_recommendation_playlist as build_recommendation_playlist},
    },
};

const DEFAULT_RECOMMENDATION_PLAYLIST: &str = "Tastemaker Recommendations";

/// Playlist failures caused by Spotify answer with a fixed message; the
/// details only go to the log.
fn playlist_failure(result: AppResult<Response>) -> AppResult<Response> {
    match result {
        Err(e) if e.is_upstream() => {
            error!("Playlist creation failed: {}", e);
            Ok((StatusCode::BAD_GATEWAY, "Failed to create playlist.").into_response())
        }
        other => other,
    }
}

pub async fn add_all_songs(State(state): State<AppState>, user: AuthUser) -> AppResult<String> {
    let cache = state.song_cache();
    let added = import_library(user.api(), &cache, user.user_id()).await?;
    Ok(format!("Added {} songs to the database.", added))
}

#[derive(Debug, Deserialize)]
pub struct GenrePlaylistForm {
    pub explore_a_genre: Option<String>,
    pub num_songs: Option<String>,
}

pub async fn create_genre_playlist(
    State(state): State<AppState>,
    user: AuthUser,
    Form(form): Form<GenrePlaylistForm>,
) -> AppResult<Response> {
    let config = &state.config.genre_playlist;
    let request = GenrePlaylistRequest::parse(
        form.explore_a_genre.as_deref(),
        form.num_songs.as_deref(),
        config,
    )?;

    let cache = state.song_cache();
    let result = build_genre_playlist(
        user.api(),
        &state.db,
        &cache,
        config,
        user.user_id(),
        &request,
    )
    .await
    .map(|outcome| match outcome {
        PlaylistOutcome::Created { name, added, .. } => {
            format!("Playlist '{}' created with {} tracks.", name, added).into_response()
        }
        PlaylistOutcome::NoTracks => "No tracks found for the specified genre.".into_response(),
    });

    playlist_failure(result)
}

#[derive(Debug, Deserialize)]
pub struct RecommendationForm {
    pub playlist_name: Option<String>,
    pub num_songs: Option<String>,
    pub weight_genres: Option<String>,
    pub weight_artists: Option<String>,
    pub year: Option<String>,
    pub hipster: Option<String>,
}

pub async fn create_recommendation_playlist(
    State(state): State<AppState>,
    user: AuthUser,
    Form(form): Form<RecommendationForm>,
) -> AppResult<Response> {
    let config = &state.config.recommend;
    let request = RecommendationRequest::parse(
        form.num_songs.as_deref(),
        form.weight_genres.as_deref(),
        form.weight_artists.as_deref(),
        form.year.as_deref(),
        form.hipster.as_deref(),
        config,
    )?;
    let name = form
        .playlist_name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(DEFAULT_RECOMMENDATION_PLAYLIST);
    if name.chars().count() > 100 {
        return Err(AppError::InvalidInput(
            "playlist name must be at most 100 characters".to_string(),
        ));
    }

    let cache = state.song_cache();
    let result = build_recommendation_playlist(
        user.api(),
        &state.db,
        &cache,
        config,
        user.user_id(),
        name,
        &request,
    )
    .await
    .map(|outcome| match outcome {
        PlaylistOutcome::Created { name, added, .. } => format!(
            "Playlist '{}' created successfully with {} recommendations!",
            name, added
        )
        .into_response(),
        PlaylistOutcome::NoTracks => "Unable to create playlist with the given inputs.".into_response(),
    });

    playlist_failure(result)
}
