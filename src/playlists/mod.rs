//! Playlist generation on top of the song cache.
//!
//! - [`builder`] - creating playlists and adding tracks in chunks
//! - [`genre`] - "explore a genre" playlists built from paged searches
//! - [`recommend`] - weighted genre/artist scoring of candidate tracks

pub mod builder;
pub mod genre;
pub mod recommend;

/// Result of a playlist flow that may find nothing to add.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaylistOutcome {
    Created {
        playlist_id: String,
        name: String,
        added: usize,
    },
    NoTracks,
}
