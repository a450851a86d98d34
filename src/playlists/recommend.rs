//! Weighted-score recommendations.
//!
//! Candidates come from two seed passes. The genre pass searches for each of
//! the user's most frequent cached genres; the artist pass searches for each
//! of the user's top artists. Every search hit adds the pass weight to the
//! track's score, so a track found by several seeds accumulates all of them.
//! The ranking is a stable sort by descending score: equal scores keep the
//! order in which the tracks were first discovered.

use std::collections::{HashMap, HashSet};

use tracing::{debug, info, warn};

use super::{
    PlaylistOutcome,
    builder::{add_tracks, create_playlist, filter_owned},
};
use crate::{
    config::RecommendConfig,
    db::{Database, Song},
    error::{AppError, AppResult},
    management::SongCache,
    spotify::MusicApi,
    types::Track,
    utils::{TimeRange, parse_year_filter},
};

/// Upper bound of the number of recommendations per request.
pub const MAX_RECOMMENDATIONS: usize = 100;

#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationRequest {
    pub weight_genres: u32,
    pub weight_artists: u32,
    pub count: usize,
    /// `YYYY` or `YYYY-YYYY`.
    pub year: Option<String>,
    pub hipster: bool,
}

impl RecommendationRequest {
    /// Validates raw form values; absent weights take the configured defaults.
    pub fn parse(
        count: Option<&str>,
        weight_genres: Option<&str>,
        weight_artists: Option<&str>,
        year: Option<&str>,
        hipster: Option<&str>,
        config: &RecommendConfig,
    ) -> AppResult<Self> {
        let count = parse_number(count, "num_songs", 20)?;
        if count == 0 || count > MAX_RECOMMENDATIONS {
            return Err(AppError::InvalidInput(format!(
                "number of songs must be between 1 and {}",
                MAX_RECOMMENDATIONS
            )));
        }

        Ok(Self {
            weight_genres: parse_number(weight_genres, "weight_genres", config.weight_genres)?,
            weight_artists: parse_number(weight_artists, "weight_artists", config.weight_artists)?,
            count,
            year: parse_year_filter(year)?,
            hipster: matches!(
                hipster.map(|h| h.trim().to_ascii_lowercase()).as_deref(),
                Some("on" | "true" | "1" | "yes")
            ),
        })
    }
}

fn parse_number<T: std::str::FromStr>(raw: Option<&str>, field: &str, default: T) -> AppResult<T> {
    match raw.map(str::trim).filter(|r| !r.is_empty()) {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|_| AppError::InvalidInput(format!("{} must be a whole number", field))),
        None => Ok(default),
    }
}

/// Accumulated candidate scores in discovery order.
#[derive(Debug, Default, Clone)]
pub struct Scoreboard {
    order: Vec<String>,
    scores: HashMap<String, u64>,
}

impl Scoreboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, track_id: &str, weight: u32) {
        match self.scores.get_mut(track_id) {
            Some(score) => *score += u64::from(weight),
            None => {
                self.order.push(track_id.to_string());
                self.scores.insert(track_id.to_string(), u64::from(weight));
            }
        }
    }

    pub fn score(&self, track_id: &str) -> Option<u64> {
        self.scores.get(track_id).copied()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Candidates by descending score; ties keep discovery order.
    pub fn ranked(&self) -> Vec<(String, u64)> {
        let mut ranked: Vec<(String, u64)> = self
            .order
            .iter()
            .map(|id| (id.clone(), self.scores[id]))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked
    }
}

/// Walks the ranking and keeps the first `count` ids the user does not own.
pub fn select_candidates(
    ranked: &[(String, u64)],
    owned: &HashSet<String>,
    count: usize,
) -> Vec<String> {
    let ids = ranked.iter().map(|(id, _)| id.clone()).collect();
    let mut survivors = filter_owned(ids, owned);
    survivors.truncate(count);
    survivors
}

fn genre_query(genre: &str, year: Option<&str>) -> String {
    match year {
        Some(year) => format!("genre:\"{}\" year:{}", genre, year),
        None => format!("genre:\"{}\"", genre),
    }
}

fn artist_query(artist: &str, year: Option<&str>) -> String {
    match year {
        Some(year) => format!("artist:\"{}\" year:{}", artist, year),
        None => format!("artist:\"{}\"", artist),
    }
}

/// Tracks found for one seed. In hipster mode albums are searched instead
/// and expanded into their tracks; an album that cannot be expanded is
/// skipped.
async fn seed_tracks(
    api: &dyn MusicApi,
    query: &str,
    hipster: bool,
    limit: u32,
) -> AppResult<Vec<Track>> {
    if !hipster {
        return Ok(api.search_tracks(query, limit, 0).await?.items);
    }

    let albums = api
        .search_albums(&format!("{} tag:hipster", query), limit, 0)
        .await?;
    let mut tracks = Vec::new();
    for album in albums.items {
        match api.album_tracks(&album.id).await {
            Ok(album_tracks) => tracks.extend(album_tracks),
            Err(e) if e.is_unauthorized() => return Err(e),
            Err(e) => warn!("Skipping album {}: {}", album.id, e),
        }
    }
    Ok(tracks)
}

/// Scores every track found for `query`. A failing search is logged and
/// contributes nothing, unless the token itself was rejected.
async fn score_seed(
    api: &dyn MusicApi,
    scoreboard: &mut Scoreboard,
    query: &str,
    hipster: bool,
    limit: u32,
    weight: u32,
) -> AppResult<()> {
    match seed_tracks(api, query, hipster, limit).await {
        Ok(tracks) => {
            for track in &tracks {
                if let Some(track_id) = track.track_id() {
                    scoreboard.add(track_id, weight);
                }
            }
            debug!("Seed '{}' matched {} tracks", query, tracks.len());
            Ok(())
        }
        Err(e) if e.is_unauthorized() => Err(e),
        Err(e) => {
            warn!("Search for '{}' failed: {}", query, e);
            Ok(())
        }
    }
}

/// Runs the genre pass followed by the artist pass.
pub async fn score_candidates(
    api: &dyn MusicApi,
    db: &Database,
    config: &RecommendConfig,
    user_id: &str,
    request: &RecommendationRequest,
) -> AppResult<Scoreboard> {
    let mut scoreboard = Scoreboard::new();
    let year = request.year.as_deref();

    let genres = db.top_genres_for_user(user_id, config.top_genres)?;
    for (genre, _) in &genres {
        score_seed(
            api,
            &mut scoreboard,
            &genre_query(genre, year),
            request.hipster,
            config.search_limit,
            request.weight_genres,
        )
        .await?;
    }

    let artists = api
        .top_artists(TimeRange::default(), config.top_artists)
        .await?;
    for artist in &artists {
        score_seed(
            api,
            &mut scoreboard,
            &artist_query(&artist.name, year),
            false,
            config.search_limit,
            request.weight_artists,
        )
        .await?;
    }

    info!(
        "Scored {} candidates from {} genres and {} artists",
        scoreboard.len(),
        genres.len(),
        artists.len()
    );
    Ok(scoreboard)
}

/// Returns up to `request.count` cached songs the user did not own yet,
/// highest score first.
///
/// Survivors are chosen before any track is fetched; a candidate whose fetch
/// or caching fails is dropped, not replaced.
pub async fn get_recommendations(
    api: &dyn MusicApi,
    db: &Database,
    cache: &SongCache<'_>,
    config: &RecommendConfig,
    user_id: &str,
    request: &RecommendationRequest,
) -> AppResult<Vec<Song>> {
    let scoreboard = score_candidates(api, db, config, user_id, request).await?;
    let owned = db.user_track_ids(user_id)?;
    let survivors = select_candidates(&scoreboard.ranked(), &owned, request.count);

    let mut songs = Vec::with_capacity(survivors.len());
    for track_id in survivors {
        let track = match api.track(&track_id).await {
            Ok(track) => track,
            Err(e) if e.is_unauthorized() => return Err(e),
            Err(e) => {
                warn!("Skipping candidate {}: {}", track_id, e);
                continue;
            }
        };

        match cache.get_or_create_song(api, &track, user_id).await {
            Ok(Some(song)) => {
                debug!(
                    "Recommending {} (score {})",
                    song.track_id,
                    scoreboard.score(&track_id).unwrap_or_default()
                );
                songs.push(song);
            }
            Ok(None) => {}
            Err(e) if e.is_unauthorized() => return Err(e),
            Err(e) => warn!("Skipping candidate {}: {}", track_id, e),
        }
    }

    Ok(songs)
}

/// Creates a playlist called `name` from the recommendations.
pub async fn create_recommendation_playlist(
    api: &dyn MusicApi,
    db: &Database,
    cache: &SongCache<'_>,
    config: &RecommendConfig,
    user_id: &str,
    name: &str,
    request: &RecommendationRequest,
) -> AppResult<PlaylistOutcome> {
    let songs = get_recommendations(api, db, cache, config, user_id, request).await?;
    if songs.is_empty() {
        return Ok(PlaylistOutcome::NoTracks);
    }

    let track_ids: Vec<String> = songs.into_iter().map(|song| song.track_id).collect();
    let playlist_id = create_playlist(api, user_id, name, "Recommendations by tastemaker").await?;
    let added = add_tracks(api, &playlist_id, &track_ids).await?;

    Ok(PlaylistOutcome::Created {
        playlist_id,
        name: name.to_string(),
        added,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scores_sum_independent_of_order() {
        let mut a = Scoreboard::new();
        a.add("t", 10);
        a.add("t", 15);
        let mut b = Scoreboard::new();
        b.add("t", 15);
        b.add("t", 10);

        assert_eq!(a.score("t"), Some(25));
        assert_eq!(b.score("t"), Some(25));
    }

    #[test]
    fn ranking_is_stable_for_ties() {
        let mut board = Scoreboard::new();
        board.add("first", 10);
        board.add("second", 20);
        board.add("third", 10);
        board.add("fourth", 20);

        let ids: Vec<String> = board.ranked().into_iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["second", "fourth", "first", "third"]);
    }

    #[test]
    fn selection_skips_owned_and_respects_count() {
        let ranked = vec![
            ("a".to_string(), 30),
            ("b".to_string(), 20),
            ("c".to_string(), 10),
            ("d".to_string(), 5),
        ];
        let owned: HashSet<String> = ["b".to_string()].into_iter().collect();

        assert_eq!(select_candidates(&ranked, &owned, 2), vec!["a", "c"]);
        assert_eq!(select_candidates(&ranked, &owned, 10).len(), 3);
    }

    #[test]
    fn queries_carry_year_filter() {
        assert_eq!(genre_query("pop", None), "genre:\"pop\"");
        assert_eq!(genre_query("pop", Some("1990-1999")), "genre:\"pop\" year:1990-1999");
        assert_eq!(artist_query("ABBA", None), "artist:\"ABBA\"");
    }

    #[test]
    fn parse_uses_configured_weights() {
        let config = RecommendConfig::default();
        let request =
            RecommendationRequest::parse(Some("10"), None, Some("5"), Some("2001"), Some("on"), &config)
                .unwrap();

        assert_eq!(request.count, 10);
        assert_eq!(request.weight_genres, 20);
        assert_eq!(request.weight_artists, 5);
        assert_eq!(request.year.as_deref(), Some("2001"));
        assert!(request.hipster);

        assert!(RecommendationRequest::parse(None, None, None, Some("20x1"), None, &config).is_err());
        assert!(RecommendationRequest::parse(Some("0"), None, None, None, None, &config).is_err());
    }
}
