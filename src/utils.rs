use std::{collections::HashMap, fmt, hash::Hash, str::FromStr};

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::Utc;
use rand::{Rng, RngCore, distr::Alphanumeric, seq::SliceRandom};

use crate::{
    error::{AppError, AppResult},
    types::Track,
};

/// Generates an opaque, URL-safe session identifier.
pub fn generate_session_id() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Generates the `state` value sent along with an authorization request.
pub fn generate_oauth_state() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

/// Current Unix time in seconds.
pub fn now_timestamp() -> i64 {
    Utc::now().timestamp()
}

/// Shuffles in place with the thread-local RNG. Not reproducible across runs.
pub fn shuffle<T>(items: &mut [T]) {
    items.shuffle(&mut rand::rng());
}

/// Time window of the "top items" endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeRange {
    #[default]
    ShortTerm,
    MediumTerm,
    LongTerm,
}

impl TimeRange {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeRange::ShortTerm => "short_term",
            TimeRange::MediumTerm => "medium_term",
            TimeRange::LongTerm => "long_term",
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeRange {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "short_term" => Ok(TimeRange::ShortTerm),
            "medium_term" => Ok(TimeRange::MediumTerm),
            "long_term" => Ok(TimeRange::LongTerm),
            other => Err(AppError::InvalidInput(format!(
                "unknown time range '{}', expected short_term, medium_term or long_term",
                other
            ))),
        }
    }
}

/// Splits a comma-joined genre list, trimming whitespace and dropping empty
/// tokens. Duplicates are removed while keeping first-seen order; comparison
/// is case-sensitive.
pub fn normalize_genres<I, S>(genres: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for raw in genres {
        for token in raw.as_ref().split(',') {
            let token = token.trim();
            if !token.is_empty() && !out.iter().any(|g| g == token) {
                out.push(token.to_string());
            }
        }
    }
    out
}

/// Artist names of a track joined with ", ", "Unknown" for nameless entries.
pub fn join_artist_names(track: &Track) -> String {
    track
        .artists
        .iter()
        .map(|a| {
            if a.name.is_empty() {
                "Unknown"
            } else {
                a.name.as_str()
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn track_uri(track_id: &str) -> String {
    format!("spotify:track:{}", track_id)
}

/// Validates a search year filter: `YYYY` or `YYYY-YYYY`.
pub fn parse_year_filter(raw: Option<&str>) -> AppResult<Option<String>> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };

    let is_year = |s: &str| s.len() == 4 && s.chars().all(|c| c.is_ascii_digit());
    let valid = match raw.split_once('-') {
        Some((from, to)) => is_year(from) && is_year(to) && from <= to,
        None => is_year(raw),
    };

    if valid {
        Ok(Some(raw.to_string()))
    } else {
        Err(AppError::InvalidInput(format!(
            "year filter '{}' must look like 2001 or 1990-1999",
            raw
        )))
    }
}

/// Counts occurrences and returns `(item, count)` sorted by descending count.
/// Ties keep first-seen order.
pub fn rank_by_count<T, I>(items: I) -> Vec<(T, u64)>
where
    T: Eq + Hash + Clone,
    I: IntoIterator<Item = T>,
{
    let mut order: Vec<T> = Vec::new();
    let mut counts: HashMap<T, u64> = HashMap::new();
    for item in items {
        let count = counts.entry(item.clone()).or_insert(0);
        if *count == 0 {
            order.push(item);
        }
        *count += 1;
    }

    let mut ranked: Vec<(T, u64)> = order
        .into_iter()
        .map(|item| {
            let count = counts[&item];
            (item, count)
        })
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked
}

/// Rounds a 0..1 ratio to a percentage with two decimals.
pub fn as_percentage(value: Option<f64>) -> Option<f64> {
    value.map(|v| (v * 10_000.0).round() / 100.0)
}

/// Rounds to two decimals.
pub fn round2(value: Option<f64>) -> Option<f64> {
    value.map(|v| (v * 100.0).round() / 100.0)
}
