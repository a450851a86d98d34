//! # API Module
//!
//! HTTP handlers of the web application, built on [axum](https://docs.rs/axum).
//!
//! ## Endpoints
//!
//! - [`auth`] - `/login/`, `/callback/` and `/logout/`
//! - [`health`] - `/health`
//! - [`views`] - `/`, `/me/` and the `view_*` listings
//! - [`playlists`] - library import and the playlist generators
//!
//! Handlers that need a signed-in user take an [`AuthUser`]. Its extraction
//! loads the web session from the `session` cookie, refreshes the Spotify
//! token when it is about to expire and saves the session again if the token
//! changed. Without a usable session the request is redirected to `/login/`.
//!
//! Errors are returned as [`AppError`] and turned into responses here:
//! missing authentication redirects, invalid input answers `400`, Spotify
//! failures `502` and everything else `500`, always as plain text.

pub mod auth;
pub mod health;
pub mod playlists;
mod session;
pub mod views;

use std::sync::Arc;

use axum::{
    extract::FromRef,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use tracing::{error, warn};

use crate::{
    config::Config, db::Database, error::AppError, management::TokenManager,
    spotify::SpotifyConnector,
};

pub use session::{AuthUser, OAUTH_STATE_COOKIE, SESSION_COOKIE};

/// Shared state of every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: Arc<Database>,
    pub spotify: Arc<dyn SpotifyConnector>,
    pub tokens: Arc<TokenManager>,
}

impl AppState {
    pub fn new(config: Config, db: Database, spotify: Arc<dyn SpotifyConnector>) -> Self {
        let tokens = TokenManager::new(spotify.clone(), config.refresh_margin_secs);
        Self {
            config: Arc::new(config),
            db: Arc::new(db),
            spotify,
            tokens: Arc::new(tokens),
        }
    }
}

impl FromRef<AppState> for Arc<Database> {
    fn from_ref(input: &AppState) -> Self {
        input.db.clone()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Unauthorized(reason) => {
                warn!("Redirecting to login: {}", reason);
                Redirect::to("/login/").into_response()
            }
            AppError::InvalidInput(message) => (StatusCode::BAD_REQUEST, message).into_response(),
            AppError::NotFound { entity } => {
                warn!("Not found: {}", entity);
                (StatusCode::NOT_FOUND, "Not found.").into_response()
            }
            e if e.is_upstream() => {
                error!("Spotify request failed: {}", e);
                (
                    StatusCode::BAD_GATEWAY,
                    "Spotify could not complete the request. Please try again later.",
                )
                    .into_response()
            }
            e => {
                error!("Request failed: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong.").into_response()
            }
        }
    }
}
