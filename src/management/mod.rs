mod auth;
mod history;
mod library;
mod songs;

pub use auth::TokenManager;
pub use history::record_recent_plays;
pub use library::{collect_library_tracks, import_library};
pub use songs::SongCache;
