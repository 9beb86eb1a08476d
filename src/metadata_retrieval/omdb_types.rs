//! OMDb API response types for deserialization.
//!
//! These structures mirror the JSON response format from the OMDb API.
//! Top-level fields are optional because failure payloads only carry
//! `Response` and `Error`.

use serde::Deserialize;

/// Response of the search endpoint (`s=...&type=series`).
#[derive(Debug, Deserialize)]
pub(super) struct OmdbSearchResponse {
    /// "True" or "False"
    #[serde(rename = "Response")]
    pub response: Option<String>,
    /// Error message when `response` is "False"
    #[serde(rename = "Error")]
    pub error: Option<String>,
    /// One page of results
    #[serde(rename = "Search", default)]
    pub search: Vec<OmdbSearchItem>,
}

/// A single entry in the `Search` array.
#[derive(Debug, Deserialize)]
pub(super) struct OmdbSearchItem {
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Year", default)]
    pub year: Option<String>,
    #[serde(rename = "imdbID")]
    pub imdb_id: String,
}

/// Response of the season endpoint (`i=...&Season=N`).
#[derive(Debug, Deserialize)]
pub(super) struct OmdbSeasonResponse {
    #[serde(rename = "Response")]
    pub response: Option<String>,
    #[serde(rename = "Error")]
    pub error: Option<String>,
    /// Total season count, sent as a string
    #[serde(rename = "totalSeasons")]
    pub total_seasons: Option<String>,
    #[serde(rename = "Episodes", default)]
    pub episodes: Vec<OmdbEpisode>,
}

/// A single episode from a season payload.
#[derive(Debug, Clone, Deserialize)]
pub(super) struct OmdbEpisode {
    /// Episode number, sent as a string
    #[serde(rename = "Episode")]
    pub episode: Option<String>,
    #[serde(rename = "Title")]
    pub title: Option<String>,
    #[serde(rename = "Released")]
    pub released: Option<String>,
    #[serde(rename = "imdbID")]
    pub imdb_id: Option<String>,
    /// Rating as a string, "N/A" when unrated
    #[serde(rename = "imdbRating")]
    pub imdb_rating: Option<String>,
}

/// Returns true when a `Response` flag signals failure.
pub(super) fn is_failure(response: Option<&str>) -> bool {
    matches!(response, Some(flag) if flag.eq_ignore_ascii_case("false"))
}
