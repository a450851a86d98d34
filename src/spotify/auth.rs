use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, Url};
use tracing::debug;

use super::{MusicApi, OAuthClient, SpotifyClient, SpotifyConnector, send_with_retry};
use crate::{
    config::{Config, SpotifyConfig},
    error::{AppError, AppResult},
    types::{Token, TokenResponse},
    utils::now_timestamp,
};

/// Application-wide Spotify connector.
///
/// Holds the client credentials and one shared `reqwest` connection pool.
/// [`SpotifyConnector::api`] hands out lightweight clients bound to a single
/// user's access token.
pub struct Spotify {
    config: SpotifyConfig,
    http: Client,
    max_retries: u32,
}

impl Spotify {
    pub fn new(config: &Config) -> AppResult<Self> {
        let http = Client::builder().timeout(config.http_timeout).build()?;
        Ok(Self {
            config: config.spotify.clone(),
            http,
            max_retries: config.http_max_retries,
        })
    }

    async fn request_token(&self, form: &[(&str, &str)]) -> AppResult<TokenResponse> {
        let response = send_with_retry(self.max_retries, || {
            self.http
                .post(&self.config.token_url)
                .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
                .form(form)
        })
        .await?;
        Ok(response.json::<TokenResponse>().await?)
    }
}

/// Converts a token endpoint response into a stored token.
///
/// `previous_refresh_token` is kept when the response carries none.
pub fn token_from_response(response: TokenResponse, previous_refresh_token: &str) -> Token {
    Token {
        access_token: response.access_token,
        refresh_token: response
            .refresh_token
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| previous_refresh_token.to_string()),
        scope: response.scope.unwrap_or_default(),
        expires_at: now_timestamp() + response.expires_in,
    }
}

#[async_trait]
impl OAuthClient for Spotify {
    fn authorize_url(&self, state: &str) -> AppResult<String> {
        let url = Url::parse_with_params(
            &self.config.auth_url,
            &[
                ("client_id", self.config.client_id.as_str()),
                ("response_type", "code"),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("scope", self.config.scope.as_str()),
                ("state", state),
            ],
        )
        .map_err(|e| AppError::Config(format!("invalid SPOTIFY_API_AUTH_URL: {}", e)))?;
        Ok(url.to_string())
    }

    async fn exchange_code(&self, code: &str) -> AppResult<Token> {
        let response = self
            .request_token(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", self.config.redirect_uri.as_str()),
            ])
            .await?;
        debug!("Exchanged authorization code for a token");
        Ok(token_from_response(response, ""))
    }

    async fn refresh(&self, refresh_token: &str) -> AppResult<Token> {
        let response = self
            .request_token(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ])
            .await?;
        debug!("Refreshed access token");
        Ok(token_from_response(response, refresh_token))
    }
}

impl SpotifyConnector for Spotify {
    fn api(&self, access_token: &str) -> Arc<dyn MusicApi> {
        Arc::new(SpotifyClient::new(
            self.http.clone(),
            &self.config.api_url,
            access_token,
            self.max_retries,
        ))
    }
}
