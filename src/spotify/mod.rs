//! # Spotify Integration Module
//!
//! Typed access to the Spotify accounts service and Web API.
//!
//! ```text
//! Request handlers / playlist flows
//!          ↓
//! MusicApi (per access token)      OAuthClient (per application)
//!          ↓                                ↓
//! SpotifyClient ── send_with_retry ── reqwest
//! ```
//!
//! The traits are the seam between the application and Spotify: handlers and
//! the playlist flows only ever see `dyn MusicApi`, which lets the tests swap
//! in an in-memory implementation.
//!
//! ## Submodules
//!
//! - [`auth`] - authorization URL, code exchange and token refresh
//! - [`artists`] - top artists and artist lookups
//! - [`tracks`] - tracks, audio features, library and listening history
//! - [`search`] - track and album searches
//! - [`playlist`] - playlist listing, creation and mutation
//!
//! ## Retries
//!
//! Every request goes through [`send_with_retry`], which retries connection
//! failures, `502 Bad Gateway` and `429 Too Many Requests` a bounded number of
//! times. A `Retry-After` header above 120 seconds is not waited for; the call
//! fails with [`AppError::RateLimited`] instead.

pub mod artists;
pub mod auth;
pub mod playlist;
pub mod search;
pub mod tracks;

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tokio::time::sleep;
use tracing::warn;

use crate::{
    error::{AppError, AppResult},
    types::{
        Album, Artist, AudioFeatures, Page, PlayHistoryItem, PlaylistItem, PlaylistSummary,
        SavedTrack, Token, Track, UserProfile,
    },
    utils::TimeRange,
};

pub use auth::Spotify;

/// Longest `Retry-After` the client is willing to sleep through.
pub const MAX_RETRY_AFTER_SECS: u64 = 120;

/// Web API operations available with one user's access token.
#[async_trait]
pub trait MusicApi: Send + Sync {
    async fn current_user(&self) -> AppResult<UserProfile>;

    async fn top_artists(&self, time_range: TimeRange, limit: u32) -> AppResult<Vec<Artist>>;

    async fn top_tracks(&self, time_range: TimeRange, limit: u32) -> AppResult<Vec<Track>>;

    async fn artist(&self, artist_id: &str) -> AppResult<Artist>;

    async fn track(&self, track_id: &str) -> AppResult<Track>;

    async fn audio_features(&self, track_id: &str) -> AppResult<AudioFeatures>;

    async fn album_tracks(&self, album_id: &str) -> AppResult<Vec<Track>>;

    async fn saved_tracks(&self, limit: u32, offset: u32) -> AppResult<Page<SavedTrack>>;

    async fn recently_played(&self, limit: u32) -> AppResult<Vec<PlayHistoryItem>>;

    async fn search_tracks(&self, query: &str, limit: u32, offset: u32) -> AppResult<Page<Track>>;

    async fn search_albums(&self, query: &str, limit: u32, offset: u32) -> AppResult<Page<Album>>;

    async fn user_playlists(&self, limit: u32, offset: u32) -> AppResult<Page<PlaylistSummary>>;

    async fn playlist_tracks(
        &self,
        playlist_id: &str,
        limit: u32,
        offset: u32,
    ) -> AppResult<Page<PlaylistItem>>;

    /// Creates a private playlist owned by `user_id`.
    async fn create_playlist(
        &self,
        user_id: &str,
        name: &str,
        description: &str,
    ) -> AppResult<PlaylistSummary>;

    /// Appends at most 100 track URIs to a playlist.
    async fn add_to_playlist(&self, playlist_id: &str, uris: &[String]) -> AppResult<()>;
}

/// The authorization-code flow of the accounts service.
#[async_trait]
pub trait OAuthClient: Send + Sync {
    /// URL the browser is sent to, carrying `state` for the callback check.
    fn authorize_url(&self, state: &str) -> AppResult<String>;

    async fn exchange_code(&self, code: &str) -> AppResult<Token>;

    /// Obtains a fresh access token. The returned token keeps
    /// `refresh_token` when the service does not rotate it.
    async fn refresh(&self, refresh_token: &str) -> AppResult<Token>;
}

/// Builds per-request API clients from shared application credentials.
pub trait SpotifyConnector: OAuthClient {
    fn api(&self, access_token: &str) -> Arc<dyn MusicApi>;
}

/// Web API client bound to one access token.
#[derive(Clone)]
pub struct SpotifyClient {
    http: Client,
    api_url: String,
    access_token: String,
    max_retries: u32,
}

impl SpotifyClient {
    pub fn new(http: Client, api_url: &str, access_token: &str, max_retries: u32) -> Self {
        Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            access_token: access_token.to_string(),
            max_retries,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    async fn get<T, Q>(&self, path: &str, query: &Q) -> AppResult<T>
    where
        T: DeserializeOwned,
        Q: serde::Serialize + Sync + ?Sized,
    {
        let url = self.url(path);
        let response = send_with_retry(self.max_retries, || {
            self.http
                .get(&url)
                .bearer_auth(&self.access_token)
                .query(query)
        })
        .await?;
        Ok(response.json::<T>().await?)
    }

    async fn post<T, B>(&self, path: &str, body: &B) -> AppResult<T>
    where
        T: DeserializeOwned,
        B: serde::Serialize + Sync + ?Sized,
    {
        let url = self.url(path);
        let response = send_with_retry(self.max_retries, || {
            self.http
                .post(&url)
                .bearer_auth(&self.access_token)
                .json(body)
        })
        .await?;
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl MusicApi for SpotifyClient {
    async fn current_user(&self) -> AppResult<UserProfile> {
        self.get("/me", &[] as &[(&str, &str)]).await
    }

    async fn top_artists(&self, time_range: TimeRange, limit: u32) -> AppResult<Vec<Artist>> {
        self.get_top_artists(time_range, limit).await
    }

    async fn top_tracks(&self, time_range: TimeRange, limit: u32) -> AppResult<Vec<Track>> {
        self.get_top_tracks(time_range, limit).await
    }

    async fn artist(&self, artist_id: &str) -> AppResult<Artist> {
        self.get_artist(artist_id).await
    }

    async fn track(&self, track_id: &str) -> AppResult<Track> {
        self.get_track(track_id).await
    }

    async fn audio_features(&self, track_id: &str) -> AppResult<AudioFeatures> {
        self.get_audio_features(track_id).await
    }

    async fn album_tracks(&self, album_id: &str) -> AppResult<Vec<Track>> {
        self.get_album_tracks(album_id).await
    }

    async fn saved_tracks(&self, limit: u32, offset: u32) -> AppResult<Page<SavedTrack>> {
        self.get_saved_tracks(limit, offset).await
    }

    async fn recently_played(&self, limit: u32) -> AppResult<Vec<PlayHistoryItem>> {
        self.get_recently_played(limit).await
    }

    async fn search_tracks(&self, query: &str, limit: u32, offset: u32) -> AppResult<Page<Track>> {
        self.find_tracks(query, limit, offset).await
    }

    async fn search_albums(&self, query: &str, limit: u32, offset: u32) -> AppResult<Page<Album>> {
        self.find_albums(query, limit, offset).await
    }

    async fn user_playlists(&self, limit: u32, offset: u32) -> AppResult<Page<PlaylistSummary>> {
        self.get_user_playlists(limit, offset).await
    }

    async fn playlist_tracks(
        &self,
        playlist_id: &str,
        limit: u32,
        offset: u32,
    ) -> AppResult<Page<PlaylistItem>> {
        self.get_playlist_tracks(playlist_id, limit, offset).await
    }

    async fn create_playlist(
        &self,
        user_id: &str,
        name: &str,
        description: &str,
    ) -> AppResult<PlaylistSummary> {
        self.create_private_playlist(user_id, name, description).await
    }

    async fn add_to_playlist(&self, playlist_id: &str, uris: &[String]) -> AppResult<()> {
        self.add_tracks(playlist_id, uris).await
    }
}

/// Sends the request produced by `build`, retrying transient failures.
///
/// Connection errors, timeouts and `502` responses are retried with a short
/// doubling delay; `429` responses wait for `Retry-After`. At most
/// `max_retries` retries are made. Non-success statuses are mapped onto
/// [`AppError`].
pub async fn send_with_retry<F>(max_retries: u32, build: F) -> AppResult<Response>
where
    F: Fn() -> RequestBuilder,
{
    let mut attempt = 0;

    loop {
        let response = match build().send().await {
            Ok(response) => response,
            Err(err) if (err.is_connect() || err.is_timeout()) && attempt < max_retries => {
                warn!("Request to Spotify failed, retrying: {}", err);
                sleep(backoff(attempt)).await;
                attempt += 1;
                continue;
            }
            Err(err) => return Err(err.into()),
        };

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = retry_after_secs(&response);
            if attempt < max_retries && retry_after <= MAX_RETRY_AFTER_SECS {
                sleep(Duration::from_secs(retry_after)).await;
                attempt += 1;
                continue;
            }
            warn!(
                "Spotify rate limit persists (Retry-After {} seconds), giving up",
                retry_after
            );
            return Err(AppError::RateLimited);
        }

        if status == StatusCode::BAD_GATEWAY && attempt < max_retries {
            sleep(backoff(attempt)).await;
            attempt += 1;
            continue;
        }

        let path = response.url().path().to_string();
        let body = response.text().await.unwrap_or_default();
        return Err(status_error(status, path, body));
    }
}

fn backoff(attempt: u32) -> Duration {
    Duration::from_millis(250 * 2u64.pow(attempt.min(6)))
}

fn retry_after_secs(response: &Response) -> u64 {
    response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .unwrap_or(1)
}

fn status_error(status: StatusCode, path: String, body: String) -> AppError {
    match status {
        StatusCode::UNAUTHORIZED => {
            AppError::Unauthorized(format!("Spotify rejected the token: {}", body))
        }
        StatusCode::NOT_FOUND => AppError::NotFound { entity: path },
        _ => AppError::Upstream {
            status: status.as_u16(),
            message: body,
        },
    }
}
