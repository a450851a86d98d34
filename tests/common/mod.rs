#![allow(dead_code)]

use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use tastemaker::{
    config::Config,
    db::Database,
    error::{AppError, AppResult},
    spotify::{MusicApi, OAuthClient, SpotifyConnector},
    types::{
        Album, AlbumRef, Artist, ArtistRef, AudioFeatures, Image, Page, PlayHistoryItem,
        PlaylistItem, PlaylistSummary, SavedTrack, Token, Track, UserProfile,
    },
    utils::{TimeRange, now_timestamp},
};

/// In-memory stand-in for the Spotify Web API.
#[derive(Default)]
pub struct FakeApi {
    pub user_id: String,
    pub artists: HashMap<String, Artist>,
    pub tracks: HashMap<String, Track>,
    pub track_searches: HashMap<String, Vec<Track>>,
    pub album_searches: HashMap<String, Vec<Album>>,
    pub album_tracks: HashMap<String, Vec<Track>>,
    pub top_artists: Vec<Artist>,
    pub top_tracks: Vec<Track>,
    pub recently_played: Vec<PlayHistoryItem>,
    pub playlists: Vec<(PlaylistSummary, Vec<Track>)>,
    pub saved_tracks: Vec<Track>,
    pub failing_queries: HashSet<String>,
    /// Track searches at or past this offset fail.
    pub search_fails_from: Option<u32>,
    pub failing_albums: HashSet<String>,
    pub failing_playlists: HashSet<String>,
    pub failing_artists: HashSet<String>,
    pub reject_token: bool,
    pub audio_features: Option<AudioFeatures>,

    pub search_calls: Mutex<Vec<(String, u32)>>,
    pub created_playlists: Mutex<Vec<(String, String)>>,
    pub added_uris: Mutex<Vec<Vec<String>>>,
}

fn page<T: Clone>(items: &[T], limit: u32, offset: u32) -> Page<T> {
    let start = (offset as usize).min(items.len());
    let end = (start + limit as usize).min(items.len());
    Page {
        items: items[start..end].to_vec(),
        next: (end < items.len()).then(|| format!("offset={}", end)),
        total: Some(items.len() as u64),
    }
}

impl FakeApi {
    pub fn new(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            ..Default::default()
        }
    }

    fn check_token(&self) -> AppResult<()> {
        if self.reject_token {
            Err(AppError::Unauthorized("token revoked".to_string()))
        } else {
            Ok(())
        }
    }

    pub fn add_artist(&mut self, id: &str, name: &str, genres: &[&str]) {
        self.artists.insert(id.to_string(), artist(id, name, genres));
    }

    pub fn add_track(&mut self, track: Track) {
        if let Some(id) = track.id.clone() {
            self.tracks.insert(id, track);
        }
    }

    pub fn searches(&self) -> Vec<(String, u32)> {
        self.search_calls.lock().unwrap().clone()
    }

    pub fn created(&self) -> Vec<(String, String)> {
        self.created_playlists.lock().unwrap().clone()
    }

    pub fn added(&self) -> Vec<Vec<String>> {
        self.added_uris.lock().unwrap().clone()
    }
}

#[async_trait]
impl MusicApi for FakeApi {
    async fn current_user(&self) -> AppResult<UserProfile> {
        self.check_token()?;
        Ok(UserProfile {
            id: self.user_id.clone(),
            display_name: Some(format!("{} display", self.user_id)),
            email: None,
            country: None,
        })
    }

    async fn top_artists(&self, _time_range: TimeRange, limit: u32) -> AppResult<Vec<Artist>> {
        self.check_token()?;
        Ok(self.top_artists.iter().take(limit as usize).cloned().collect())
    }

    async fn top_tracks(&self, _time_range: TimeRange, limit: u32) -> AppResult<Vec<Track>> {
        self.check_token()?;
        Ok(self.top_tracks.iter().take(limit as usize).cloned().collect())
    }

    async fn artist(&self, artist_id: &str) -> AppResult<Artist> {
        self.check_token()?;
        if self.failing_artists.contains(artist_id) {
            return Err(AppError::Upstream {
                status: 500,
                message: "artist lookup failed".to_string(),
            });
        }
        self.artists
            .get(artist_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound {
                entity: format!("/artists/{}", artist_id),
            })
    }

    async fn track(&self, track_id: &str) -> AppResult<Track> {
        self.check_token()?;
        self.tracks
            .get(track_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound {
                entity: format!("/tracks/{}", track_id),
            })
    }

    async fn audio_features(&self, _track_id: &str) -> AppResult<AudioFeatures> {
        self.check_token()?;
        self.audio_features.clone().ok_or(AppError::Upstream {
            status: 403,
            message: "audio features unavailable".to_string(),
        })
    }

    async fn album_tracks(&self, album_id: &str) -> AppResult<Vec<Track>> {
        self.check_token()?;
        if self.failing_albums.contains(album_id) {
            return Err(AppError::NotFound {
                entity: format!("/albums/{}/tracks", album_id),
            });
        }
        Ok(self.album_tracks.get(album_id).cloned().unwrap_or_default())
    }

    async fn saved_tracks(&self, limit: u32, offset: u32) -> AppResult<Page<SavedTrack>> {
        self.check_token()?;
        let saved: Vec<SavedTrack> = self
            .saved_tracks
            .iter()
            .map(|t| SavedTrack {
                added_at: None,
                track: Some(t.clone()),
            })
            .collect();
        Ok(page(&saved, limit, offset))
    }

    async fn recently_played(&self, limit: u32) -> AppResult<Vec<PlayHistoryItem>> {
        self.check_token()?;
        Ok(self
            .recently_played
            .iter()
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn search_tracks(&self, query: &str, limit: u32, offset: u32) -> AppResult<Page<Track>> {
        self.check_token()?;
        self.search_calls
            .lock()
            .unwrap()
            .push((query.to_string(), offset));
        let past_limit = self.search_fails_from.is_some_and(|from| offset >= from);
        if self.failing_queries.contains(query) || past_limit {
            return Err(AppError::Upstream {
                status: 500,
                message: "search failed".to_string(),
            });
        }
        let tracks = self.track_searches.get(query).cloned().unwrap_or_default();
        Ok(page(&tracks, limit, offset))
    }

    async fn search_albums(&self, query: &str, limit: u32, offset: u32) -> AppResult<Page<Album>> {
        self.check_token()?;
        self.search_calls
            .lock()
            .unwrap()
            .push((query.to_string(), offset));
        let albums = self.album_searches.get(query).cloned().unwrap_or_default();
        Ok(page(&albums, limit, offset))
    }

    async fn user_playlists(&self, limit: u32, offset: u32) -> AppResult<Page<PlaylistSummary>> {
        self.check_token()?;
        let summaries: Vec<PlaylistSummary> =
            self.playlists.iter().map(|(p, _)| p.clone()).collect();
        Ok(page(&summaries, limit, offset))
    }

    async fn playlist_tracks(
        &self,
        playlist_id: &str,
        limit: u32,
        offset: u32,
    ) -> AppResult<Page<PlaylistItem>> {
        self.check_token()?;
        if self.failing_playlists.contains(playlist_id) {
            return Err(AppError::NotFound {
                entity: format!("/playlists/{}/tracks", playlist_id),
            });
        }
        let items: Vec<PlaylistItem> = self
            .playlists
            .iter()
            .find(|(p, _)| p.id == playlist_id)
            .map(|(_, tracks)| {
                tracks
                    .iter()
                    .map(|t| PlaylistItem {
                        track: Some(t.clone()),
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(page(&items, limit, offset))
    }

    async fn create_playlist(
        &self,
        user_id: &str,
        name: &str,
        _description: &str,
    ) -> AppResult<PlaylistSummary> {
        self.check_token()?;
        let mut created = self.created_playlists.lock().unwrap();
        created.push((user_id.to_string(), name.to_string()));
        Ok(PlaylistSummary {
            id: format!("playlist-{}", created.len()),
            name: name.to_string(),
        })
    }

    async fn add_to_playlist(&self, _playlist_id: &str, uris: &[String]) -> AppResult<()> {
        self.check_token()?;
        assert!(uris.len() <= 100, "more than 100 uris in one call");
        self.added_uris.lock().unwrap().push(uris.to_vec());
        Ok(())
    }
}

/// Connector handing out the same [`FakeApi`] for every token.
pub struct FakeConnector {
    pub api: Arc<FakeApi>,
    pub fail_refresh: bool,
    pub rotate_refresh_token: bool,
    pub refresh_calls: Mutex<u32>,
    pub api_tokens: Mutex<Vec<String>>,
}

impl FakeConnector {
    pub fn new(api: FakeApi) -> Self {
        Self {
            api: Arc::new(api),
            fail_refresh: false,
            rotate_refresh_token: false,
            refresh_calls: Mutex::new(0),
            api_tokens: Mutex::new(Vec::new()),
        }
    }

    pub fn refreshes(&self) -> u32 {
        *self.refresh_calls.lock().unwrap()
    }
}

#[async_trait]
impl OAuthClient for FakeConnector {
    fn authorize_url(&self, state: &str) -> AppResult<String> {
        Ok(format!(
            "https://accounts.example.com/authorize?client_id=test&state={}",
            state
        ))
    }

    async fn exchange_code(&self, code: &str) -> AppResult<Token> {
        if code == "bad-code" {
            return Err(AppError::Upstream {
                status: 400,
                message: "invalid_grant".to_string(),
            });
        }
        Ok(token(&format!("access-{}", code), now_timestamp() + 3600))
    }

    async fn refresh(&self, refresh_token: &str) -> AppResult<Token> {
        *self.refresh_calls.lock().unwrap() += 1;
        if self.fail_refresh {
            return Err(AppError::Upstream {
                status: 400,
                message: "invalid_grant".to_string(),
            });
        }
        let mut fresh = token("refreshed-access", now_timestamp() + 3600);
        fresh.refresh_token = if self.rotate_refresh_token {
            "rotated-refresh".to_string()
        } else {
            refresh_token.to_string()
        };
        Ok(fresh)
    }
}

impl SpotifyConnector for FakeConnector {
    fn api(&self, access_token: &str) -> Arc<dyn MusicApi> {
        self.api_tokens
            .lock()
            .unwrap()
            .push(access_token.to_string());
        self.api.clone()
    }
}

pub fn token(access_token: &str, expires_at: i64) -> Token {
    Token {
        access_token: access_token.to_string(),
        refresh_token: "refresh-token".to_string(),
        scope: "user-top-read".to_string(),
        expires_at,
    }
}

pub fn artist(id: &str, name: &str, genres: &[&str]) -> Artist {
    Artist {
        id: id.to_string(),
        name: name.to_string(),
        genres: genres.iter().map(|g| g.to_string()).collect(),
        images: vec![Image {
            url: format!("https://img.example.com/{}.jpg", id),
            width: None,
            height: None,
        }],
        popularity: Some(50),
    }
}

/// A full track object by the given artists.
pub fn track(id: &str, name: &str, artist_ids: &[&str]) -> Track {
    Track {
        id: Some(id.to_string()),
        name: name.to_string(),
        artists: artist_ids
            .iter()
            .map(|a| ArtistRef {
                id: Some(a.to_string()),
                name: format!("Artist {}", a),
            })
            .collect(),
        album: Some(AlbumRef {
            id: Some(format!("album-{}", id)),
            name: format!("Album of {}", name),
            images: vec![Image {
                url: format!("https://img.example.com/album-{}.jpg", id),
                width: Some(640),
                height: Some(640),
            }],
            release_date: Some("2020-01-01".to_string()),
        }),
        popularity: Some(40),
        duration_ms: Some(200_000),
        is_local: false,
    }
}

/// Tracks `prefix0..prefixN` by one artist.
pub fn numbered_tracks(prefix: &str, count: usize, artist_id: &str) -> Vec<Track> {
    (0..count)
        .map(|i| {
            let id = format!("{}{}", prefix, i);
            track(&id, &format!("Song {}", id), &[artist_id])
        })
        .collect()
}

pub fn test_config() -> Config {
    let vars: HashMap<&str, &str> = [
        ("SPOTIFY_API_AUTH_CLIENT_ID", "client"),
        ("SPOTIFY_API_AUTH_CLIENT_SECRET", "secret"),
        ("SPOTIFY_API_REDIRECT_URI", "http://127.0.0.1:8888/callback/"),
        ("DATABASE_PATH", ":memory:"),
    ]
    .into_iter()
    .collect();
    Config::from_lookup(|key| vars.get(key).map(|v| v.to_string())).unwrap()
}

pub fn database_with_user(user_id: &str) -> Database {
    let db = Database::open_in_memory().unwrap();
    db.upsert_user(user_id, None).unwrap();
    db
}
