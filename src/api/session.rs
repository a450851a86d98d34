use std::sync::Arc;

use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::CookieJar;
use tracing::debug;

use super::AppState;
use crate::{
    db::Session,
    error::AppError,
    management::SongCache,
    spotify::MusicApi,
};

pub const SESSION_COOKIE: &str = "session";
pub const OAUTH_STATE_COOKIE: &str = "oauth_state";

/// A signed-in user with a Spotify client ready to use.
pub struct AuthUser {
    pub session: Session,
    pub api: Arc<dyn MusicApi>,
}

impl AuthUser {
    pub fn user_id(&self) -> &str {
        &self.session.user_id
    }

    pub fn api(&self) -> &dyn MusicApi {
        self.api.as_ref()
    }
}

/// Loads the session named by the session cookie, without touching its
/// token.
pub fn session_from_jar(jar: &CookieJar, state: &AppState) -> Result<Option<Session>, AppError> {
    match jar.get(SESSION_COOKIE) {
        Some(cookie) => state.db.load_session(cookie.value()),
        None => Ok(None),
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let mut session = session_from_jar(&jar, state)?
            .ok_or_else(|| AppError::Unauthorized("no session".to_string()))?;

        let api = state.tokens.authorize(&mut session).await?;
        if session.is_dirty() {
            debug!("Saving refreshed token of session for {}", session.user_id);
            state.db.save_session(&mut session)?;
        }

        Ok(AuthUser { session, api })
    }
}

impl AppState {
    pub fn song_cache(&self) -> SongCache<'_> {
        SongCache::new(&self.db, self.config.audio_features_enabled)
    }
}
