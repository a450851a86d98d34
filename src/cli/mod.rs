//! # CLI Module
//!
//! Command-line entry points of the `tastemaker` binary.
//!
//! - [`serve`] - runs the web application, optionally opening the login page
//! - [`top_genres`] - prints a user's most frequent cached genres
//! - [`history`] - prints a user's stored listening history
//!
//! The commands report progress with the crate's colored `info!`,
//! `success!`, `warning!` and `error!` macros. `error!` ends the process, so
//! it is only used for failures the command cannot continue from.
//!
//! ```bash
//! tastemaker serve --open
//! tastemaker top-genres --user 31abc --limit 10
//! tastemaker history --user 31abc
//! ```

mod serve;
mod stats;

pub use serve::serve;
pub use stats::{history, top_genres};

use crate::{config::Config, db::Database, error};

/// Reads the configuration and opens the database, or exits.
fn open_database() -> (Config, Database) {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => error!("Invalid configuration. Err: {}", e),
    };
    let db = match Database::open(&config.database_path) {
        Ok(db) => db,
        Err(e) => error!(
            "Cannot open database at {}. Err: {}",
            config.database_path.display(),
            e
        ),
    };
    (config, db)
}
