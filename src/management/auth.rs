use std::sync::Arc;

use tracing::{info, warn};

use crate::{
    db::Session,
    error::{AppError, AppResult},
    spotify::{MusicApi, SpotifyConnector},
    types::Token,
    utils::now_timestamp,
};

/// Hands out usable access tokens for web sessions, refreshing them shortly
/// before they expire.
pub struct TokenManager {
    connector: Arc<dyn SpotifyConnector>,
    refresh_margin_secs: i64,
}

impl TokenManager {
    pub fn new(connector: Arc<dyn SpotifyConnector>, refresh_margin_secs: i64) -> Self {
        TokenManager {
            connector,
            refresh_margin_secs,
        }
    }

    /// Whether `token` expires within the refresh margin at time `now`.
    pub fn needs_refresh(&self, token: &Token, now: i64) -> bool {
        token.expires_at - now < self.refresh_margin_secs
    }

    /// Returns a valid token for the session, refreshing it when needed.
    ///
    /// A refreshed token replaces the stored one and marks the session dirty;
    /// the caller is responsible for saving it.
    ///
    /// # Errors
    ///
    /// [`AppError::Unauthorized`] when the session holds no token or the
    /// refresh fails for any reason.
    pub async fn valid_token(&self, session: &mut Session) -> AppResult<Token> {
        let token = session
            .token()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("session has no token".to_string()))?;

        if !self.needs_refresh(&token, now_timestamp()) {
            return Ok(token);
        }

        match self.connector.refresh(&token.refresh_token).await {
            Ok(fresh) => {
                info!("Refreshed access token for user {}", session.user_id);
                session.set_token(fresh.clone());
                Ok(fresh)
            }
            Err(e) => {
                warn!("Token refresh for user {} failed: {}", session.user_id, e);
                Err(AppError::Unauthorized(format!("token refresh failed: {}", e)))
            }
        }
    }

    /// Returns an API client authorized for the session's user.
    pub async fn authorize(&self, session: &mut Session) -> AppResult<Arc<dyn MusicApi>> {
        let token = self.valid_token(session).await?;
        Ok(self.connector.api(&token.access_token))
    }
}
