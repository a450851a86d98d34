use axum::{
    extract::{Path, State},
    response::Json,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;
use serde_json::{Value, json};

use super::{AppState, AuthUser, session::session_from_jar};
use crate::{
    db::Song,
    error::AppResult,
    management::record_recent_plays,
    types::{PlayHistoryItem, UserProfile},
    utils::{TimeRange, as_percentage, join_artist_names, normalize_genres, rank_by_count, round2},
};

/// Size of the "top" listings and the recently played window.
const VIEW_LIMIT: u32 = 50;

const ROUTES: &[&str] = &[
    "/me/",
    "/view_top_artists/[time_range/]",
    "/view_top_genres/[time_range/]",
    "/view_top_songs/[time_range/]",
    "/view_recent/",
    "/view_user_averages/",
    "/add_all_songs_to_database/",
    "/create_genre_playlist/",
    "/create_recommendation_playlist/",
    "/logout/",
];

fn time_range(param: Option<Path<String>>) -> AppResult<TimeRange> {
    let range = param.map(|Path(raw)| raw.parse::<TimeRange>()).transpose()?;
    Ok(range.unwrap_or_default())
}

/// Landing page: who is signed in and what can be done.
pub async fn index(State(state): State<AppState>, jar: CookieJar) -> AppResult<Json<Value>> {
    let user = match session_from_jar(&jar, &state)? {
        Some(session) => state.db.get_user(&session.user_id)?,
        None => None,
    };

    Ok(Json(match user {
        Some(user) => json!({
            "app": "tastemaker",
            "user": user,
            "routes": ROUTES,
        }),
        None => json!({
            "app": "tastemaker",
            "user": null,
            "login": "/login/",
        }),
    }))
}

pub async fn me(user: AuthUser) -> AppResult<Json<UserProfile>> {
    Ok(Json(user.api().current_user().await?))
}

#[derive(Debug, Serialize)]
pub struct TopArtistRow {
    pub rank: usize,
    pub name: String,
    pub image: Option<String>,
    pub popularity: Option<u32>,
}

pub async fn top_artists(
    user: AuthUser,
    param: Option<Path<String>>,
) -> AppResult<Json<Vec<TopArtistRow>>> {
    let range = time_range(param)?;
    let artists = user.api().top_artists(range, VIEW_LIMIT).await?;

    Ok(Json(
        artists
            .into_iter()
            .enumerate()
            .map(|(i, artist)| TopArtistRow {
                rank: i + 1,
                name: artist.name,
                image: artist.images.into_iter().next().map(|image| image.url),
                popularity: artist.popularity,
            })
            .collect(),
    ))
}

#[derive(Debug, Serialize)]
pub struct TopGenreRow {
    pub rank: usize,
    pub genre: String,
    pub artists: u64,
}

/// Genres of the user's top artists, most frequent first.
pub async fn top_genres(
    user: AuthUser,
    param: Option<Path<String>>,
) -> AppResult<Json<Vec<TopGenreRow>>> {
    let range = time_range(param)?;
    let artists = user.api().top_artists(range, VIEW_LIMIT).await?;

    let genres = artists
        .into_iter()
        .flat_map(|artist| normalize_genres(artist.genres));

    Ok(Json(
        rank_by_count(genres)
            .into_iter()
            .enumerate()
            .map(|(i, (genre, artists))| TopGenreRow {
                rank: i + 1,
                genre,
                artists,
            })
            .collect(),
    ))
}

/// The user's top tracks, cached on the way.
pub async fn top_songs(
    State(state): State<AppState>,
    user: AuthUser,
    param: Option<Path<String>>,
) -> AppResult<Json<Vec<Song>>> {
    let range = time_range(param)?;
    let tracks = user.api().top_tracks(range, VIEW_LIMIT).await?;
    let songs = state
        .song_cache()
        .cache_tracks(user.api(), &tracks, user.user_id())
        .await?;
    Ok(Json(songs))
}

#[derive(Debug, Serialize)]
pub struct RecentPlayRow {
    pub track_id: Option<String>,
    pub track_name: String,
    pub artist_names: String,
    pub played_at: String,
}

impl From<PlayHistoryItem> for RecentPlayRow {
    fn from(play: PlayHistoryItem) -> Self {
        let track = play.track.unwrap_or_default();
        Self {
            artist_names: join_artist_names(&track),
            track_id: track.id,
            track_name: track.name,
            played_at: play.played_at,
        }
    }
}

/// Recently played tracks; every visit appends them to the history log.
pub async fn recent(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<Vec<RecentPlayRow>>> {
    let cache = state.song_cache();
    let plays = record_recent_plays(user.api(), &state.db, &cache, user.user_id(), VIEW_LIMIT).await?;
    Ok(Json(plays.into_iter().map(RecentPlayRow::from).collect()))
}

/// Audio feature averages in percent, popularity on its 0..100 scale.
pub async fn user_averages(State(state): State<AppState>, user: AuthUser) -> AppResult<Json<Value>> {
    let averages = state.db.user_averages(user.user_id())?;
    Ok(Json(json!({
        "songs": averages.songs,
        "danceability": as_percentage(averages.danceability),
        "energy": as_percentage(averages.energy),
        "valence": as_percentage(averages.valence),
        "acousticness": as_percentage(averages.acousticness),
        "instrumentalness": as_percentage(averages.instrumentalness),
        "liveness": as_percentage(averages.liveness),
        "speechiness": as_percentage(averages.speechiness),
        "popularity": round2(averages.popularity),
    })))
}
