//! Tastemaker library
//!
//! A small personal web application on top of the Spotify Web API. It signs a
//! user in through the OAuth authorization-code flow, caches the tracks it
//! encounters in a local SQLite database, and builds playlists from that data:
//! genre playlists and weighted-score recommendations.
//!
//! # Modules
//!
//! - `api` - axum request handlers for every HTTP route
//! - `cli` - command-line entry points (`serve`, `top-genres`, `history`)
//! - `config` - environment loading and runtime configuration
//! - `db` - SQLite persistence for songs, users, history and sessions
//! - `error` - the crate-wide error type
//! - `management` - token store and metadata cache
//! - `playlists` - candidate scoring, genre playlists and playlist building
//! - `server` - router construction and the HTTP listener
//! - `spotify` - Spotify Web API client
//! - `types` - wire types and table rows
//! - `utils` - small helpers shared by the other modules

pub mod api;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod management;
pub mod playlists;
pub mod server;
pub mod spotify;
pub mod types;
pub mod utils;

/// Prints an informational message with a blue bullet point.
///
/// # Example
///
/// ```
/// info!("Listening on {}", addr);
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a success message with a green checkmark.
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints an error message with a red exclamation mark and exits the program.
///
/// Only used by the command-line entry points for unrecoverable startup
/// failures. Request handlers never call it.
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints a warning message with a yellow exclamation mark.
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}
