//! Data structures and traits for TV series metadata retrieval.
//!
//! This module provides structures to represent search candidates and
//! rated episodes, the transport seam used to talk to the OMDb API, and the
//! `SeriesSource` trait the presenter drives.

mod http;
mod omdb;
mod omdb_types;

pub use http::HttpTransport;
pub use omdb::{OmdbClient, SeasonPayload};

use crate::ProgressEvent;
use thiserror::Error;

/// Errors that can occur during metadata retrieval operations.
#[derive(Debug, Error)]
pub enum MetadataRetrievalError {
    /// Request to the metadata provider failed (timeout, connection, non-2xx)
    #[error("Request failed: {0}")]
    Transport(String),

    /// Failed to parse the provider's JSON response
    #[error("Failed to parse API response: {0}")]
    Parse(String),

    /// The API itself reported a failure for the lookup
    #[error("{0}")]
    Api(String),

    /// The API returned invalid or unexpected data
    #[error("API returned invalid data: {0}")]
    InvalidData(String),
}

/// A series returned by a search, before the user picks one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesCandidate {
    /// The series title
    pub title: String,
    /// Year or year range as reported by the API (e.g. "2008–2013")
    pub year: String,
    /// External identifier used for season lookups
    pub imdb_id: String,
}

impl SeriesCandidate {
    /// Label shown in candidate lists.
    pub fn display_label(&self) -> String {
        format!("{} ({})", self.title, self.year)
    }
}

/// A single episode with its (optional) rating.
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeRecord {
    /// The season number this episode belongs to
    pub season: u32,
    /// The episode number within the season, `None` if the API value was unusable
    pub episode: Option<u32>,
    /// The episode title
    pub title: String,
    /// Release date as reported by the API
    pub air_date: Option<String>,
    /// External identifier of the episode itself
    pub imdb_id: Option<String>,
    /// Rating, `None` when missing or unparseable (never zero)
    pub rating: Option<f64>,
}

/// Performs a single GET request against the metadata API.
///
/// Implementors return the raw response body. Non-2xx responses and network
/// failures must be reported as `MetadataRetrievalError::Transport`.
pub trait Transport: Send + Sync {
    fn get(&self, params: &[(&str, String)]) -> Result<String, MetadataRetrievalError>;
}

/// Source of series candidates and episode lists.
///
/// The presenter only talks to this trait, so the interactive flow can be
/// exercised against an in-memory source.
pub trait SeriesSource: Send + Sync {
    /// Searches for series matching the query, returning at most `max_results`.
    fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<SeriesCandidate>, MetadataRetrievalError>;

    /// Fetches every episode of every season of the given series.
    fn fetch_all_episodes(
        &self,
        imdb_id: &str,
        progress: &mut dyn FnMut(ProgressEvent),
    ) -> Result<Vec<EpisodeRecord>, MetadataRetrievalError>;
}
