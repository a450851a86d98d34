//! Configuration management for tastemaker.
//!
//! Configuration comes from environment variables, usually provided through a
//! `.env` file. The lookup order is:
//! 1. Environment variables already set for the process (highest priority)
//! 2. `.env` in the current working directory
//! 3. `.env` in the local data directory (`<data_local_dir>/tastemaker/.env`)
//! 4. Application defaults (where applicable)
//!
//! The recommendation weights and the genre playlist limits are configuration
//! rather than constants; different setups favour different values.

use std::{env, path::PathBuf, str::FromStr, time::Duration};

use crate::error::{AppError, AppResult};

pub const APP_DIR: &str = "tastemaker";

const DEFAULT_SERVER_ADDRESS: &str = "127.0.0.1:8888";
const DEFAULT_AUTH_URL: &str = "https://accounts.spotify.com/authorize";
const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
const DEFAULT_API_URL: &str = "https://api.spotify.com/v1";
const DEFAULT_SCOPE: &str = "playlist-modify-private playlist-modify-public playlist-read-private user-library-read user-top-read user-read-recently-played";

/// Loads environment variables from a `.env` file.
///
/// A `.env` in the working directory wins over the one in the local data
/// directory. Variables that are already set are never overwritten. A missing
/// file is not an error; the process environment may carry everything.
///
/// # Errors
///
/// Returns an error when the data directory cannot be created or when a
/// `.env` file exists but cannot be parsed.
pub async fn load_env() -> AppResult<()> {
    let local = PathBuf::from(".env");
    if local.is_file() {
        return dotenv::from_path(&local)
            .map_err(|e| AppError::Config(format!("cannot read {}: {}", local.display(), e)));
    }

    let path = data_dir().join(".env");
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent).await?;
    }

    if path.is_file() {
        dotenv::from_path(&path)
            .map_err(|e| AppError::Config(format!("cannot read {}: {}", path.display(), e)))?;
    }
    Ok(())
}

/// Returns the platform-specific data directory of the application.
///
/// - Linux: `~/.local/share/tastemaker`
/// - macOS: `~/Library/Application Support/tastemaker`
/// - Windows: `%LOCALAPPDATA%/tastemaker`
pub fn data_dir() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(APP_DIR);
    path
}

/// Spotify application credentials and endpoints.
#[derive(Debug, Clone)]
pub struct SpotifyConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub scope: String,
    pub auth_url: String,
    pub token_url: String,
    pub api_url: String,
}

/// Tunables of the recommendation scorer.
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendConfig {
    /// How many of the user's cached genres seed the genre pass.
    pub top_genres: usize,
    /// How many of the user's top artists seed the artist pass.
    pub top_artists: u32,
    /// Default score added per genre match.
    pub weight_genres: u32,
    /// Default score added per artist match.
    pub weight_artists: u32,
    /// Result size of every seed search.
    pub search_limit: u32,
}

impl Default for RecommendConfig {
    fn default() -> Self {
        Self {
            top_genres: 5,
            top_artists: 5,
            weight_genres: 20,
            weight_artists: 10,
            search_limit: 20,
        }
    }
}

/// Tunables of the genre playlist flow.
#[derive(Debug, Clone, PartialEq)]
pub struct GenrePlaylistConfig {
    pub page_size: u32,
    /// Search offsets at or past this value are never requested.
    pub offset_ceiling: u32,
    pub default_songs: usize,
    pub max_songs: usize,
}

impl Default for GenrePlaylistConfig {
    fn default() -> Self {
        Self {
            page_size: 50,
            offset_ceiling: 1000,
            default_songs: 50,
            max_songs: 100,
        }
    }
}

/// Complete runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub database_path: PathBuf,
    pub spotify: SpotifyConfig,
    /// Tokens expiring within this window are refreshed before use.
    pub refresh_margin_secs: i64,
    pub http_max_retries: u32,
    pub http_timeout: Duration,
    pub audio_features_enabled: bool,
    pub recommend: RecommendConfig,
    pub genre_playlist: GenrePlaylistConfig,
}

impl Config {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Reads the configuration through an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Fails when a required variable is missing or a numeric/boolean value
    /// cannot be parsed.
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &str| {
            get(key).ok_or_else(|| AppError::Config(format!("{} must be set", key)))
        };
        let or_default = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let spotify = SpotifyConfig {
            client_id: required("SPOTIFY_API_AUTH_CLIENT_ID")?,
            client_secret: required("SPOTIFY_API_AUTH_CLIENT_SECRET")?,
            redirect_uri: required("SPOTIFY_API_REDIRECT_URI")?,
            scope: or_default("SPOTIFY_API_AUTH_SCOPE", DEFAULT_SCOPE),
            auth_url: or_default("SPOTIFY_API_AUTH_URL", DEFAULT_AUTH_URL),
            token_url: or_default("SPOTIFY_API_TOKEN_URL", DEFAULT_TOKEN_URL),
            api_url: or_default("SPOTIFY_API_URL", DEFAULT_API_URL)
                .trim_end_matches('/')
                .to_string(),
        };

        let recommend_defaults = RecommendConfig::default();
        let recommend = RecommendConfig {
            top_genres: parse_or(&get, "RECOMMEND_TOP_GENRES", recommend_defaults.top_genres)?,
            top_artists: parse_or(&get, "RECOMMEND_TOP_ARTISTS", recommend_defaults.top_artists)?,
            weight_genres: parse_or(
                &get,
                "RECOMMEND_WEIGHT_GENRES",
                recommend_defaults.weight_genres,
            )?,
            weight_artists: parse_or(
                &get,
                "RECOMMEND_WEIGHT_ARTISTS",
                recommend_defaults.weight_artists,
            )?,
            search_limit: parse_or(&get, "RECOMMEND_SEARCH_LIMIT", recommend_defaults.search_limit)?,
        };

        let genre_defaults = GenrePlaylistConfig::default();
        let genre_playlist = GenrePlaylistConfig {
            page_size: parse_or(&get, "GENRE_PLAYLIST_PAGE_SIZE", genre_defaults.page_size)?,
            offset_ceiling: parse_or(
                &get,
                "GENRE_PLAYLIST_OFFSET_CEILING",
                genre_defaults.offset_ceiling,
            )?,
            default_songs: genre_defaults.default_songs,
            max_songs: parse_or(&get, "GENRE_PLAYLIST_MAX_SONGS", genre_defaults.max_songs)?,
        };
        if genre_playlist.page_size == 0 || genre_playlist.page_size > 50 {
            return Err(AppError::Config(
                "GENRE_PLAYLIST_PAGE_SIZE must be between 1 and 50".to_string(),
            ));
        }

        let database_path = get("DATABASE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir().join("tastemaker.db"));

        Ok(Config {
            server_address: or_default("SERVER_ADDRESS", DEFAULT_SERVER_ADDRESS),
            database_path,
            spotify,
            refresh_margin_secs: parse_or(&get, "TOKEN_REFRESH_MARGIN_SECS", 60)?,
            http_max_retries: parse_or(&get, "HTTP_MAX_RETRIES", 3)?,
            http_timeout: Duration::from_secs(parse_or(&get, "HTTP_TIMEOUT_SECS", 5)?),
            audio_features_enabled: parse_bool_or(&get, "AUDIO_FEATURES_ENABLED", false)?,
            recommend,
            genre_playlist,
        })
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> AppResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| AppError::Config(format!("{} has an invalid value '{}': {}", key, raw, e))),
        None => Ok(default),
    }
}

fn parse_bool_or<G>(get: &G, key: &str, default: bool) -> AppResult<bool>
where
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => match raw.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(AppError::Config(format!(
                "{} has an invalid value '{}'",
                key, raw
            ))),
        },
        None => Ok(default),
    }
}
