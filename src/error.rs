//! Error types shared by every layer of the application.

use thiserror::Error;

/// Errors that can occur while serving a request or running a command.
#[derive(Debug, Error)]
pub enum AppError {
    /// There is no usable Spotify token; the user has to sign in again.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The requested entity does not exist upstream or locally.
    #[error("not found: {entity}")]
    NotFound { entity: String },

    /// Spotify answered with an unexpected status.
    #[error("upstream error ({status}): {message}")]
    Upstream { status: u16, message: String },

    /// Spotify kept rate limiting after all retries were spent.
    #[error("rate limited by Spotify")]
    RateLimited,

    /// The request carried a value the application cannot work with.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A configuration value is missing or malformed.
    #[error("configuration error: {0}")]
    Config(String),

    /// An error propagated from `reqwest`.
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),

    /// An error propagated from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The local database does not have the expected layout.
    #[error("schema error: {0}")]
    Schema(String),

    /// An I/O error, mostly while preparing data directories.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// Returns `true` when the user has to go through the login flow again.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }

    /// Returns `true` for failures caused by Spotify rather than by us.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Self::Upstream { .. } | Self::RateLimited | Self::Request(_) | Self::NotFound { .. }
        )
    }
}

/// Convenience alias for results carrying an [`AppError`].
pub type AppResult<T> = std::result::Result<T, AppError>;
