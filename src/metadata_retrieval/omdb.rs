//! OMDb metadata client implementation.

use super::omdb_types::{OmdbEpisode, OmdbSearchResponse, OmdbSeasonResponse, is_failure};
use super::{
    EpisodeRecord, HttpTransport, MetadataRetrievalError, SeriesCandidate, SeriesSource,
    Transport,
};
use crate::ProgressEvent;
use crate::config::ClientConfig;
use crate::rating_grid::parse_rating;
use std::thread;
use tracing::{debug, info, warn};

/// Parsed payload of a single season lookup.
///
/// A payload with `is_failure() == true` is a valid response in which the API
/// reports that the lookup itself failed (unknown id, no such season).
#[derive(Debug)]
pub struct SeasonPayload {
    inner: OmdbSeasonResponse,
}

impl SeasonPayload {
    /// True when the API flagged the lookup as failed.
    pub fn is_failure(&self) -> bool {
        is_failure(self.inner.response.as_deref())
    }

    /// The API's error message, if any.
    pub fn error(&self) -> Option<&str> {
        self.inner.error.as_deref()
    }

    /// The `totalSeasons` field, parsed.
    pub fn total_seasons(&self) -> Result<u32, MetadataRetrievalError> {
        let raw = self.inner.total_seasons.as_deref().ok_or_else(|| {
            MetadataRetrievalError::InvalidData("Missing totalSeasons in API response".to_string())
        })?;

        raw.trim().parse().map_err(|_| {
            MetadataRetrievalError::InvalidData(format!("Invalid totalSeasons value '{}'", raw))
        })
    }

    /// Converts the payload's episodes into records for `season`.
    fn into_records(self, season: u32) -> Vec<EpisodeRecord> {
        self.inner
            .episodes
            .into_iter()
            .map(|episode| convert_episode(season, episode))
            .collect()
    }
}

/// Converts an OMDb episode to our internal record.
fn convert_episode(season: u32, episode: OmdbEpisode) -> EpisodeRecord {
    EpisodeRecord {
        season,
        episode: episode
            .episode
            .as_deref()
            .and_then(|raw| raw.trim().parse().ok()),
        title: episode.title.unwrap_or_else(|| "Unknown".to_string()),
        air_date: episode.released.filter(|date| date != "N/A"),
        imdb_id: episode.imdb_id,
        rating: episode.imdb_rating.as_deref().and_then(parse_rating),
    }
}

/// Client for the OMDb API.
///
/// All requests go through a `Transport`; `HttpTransport` is used in
/// production and tests substitute a scripted one.
pub struct OmdbClient<T: Transport = HttpTransport> {
    transport: T,
    config: ClientConfig,
}

impl OmdbClient<HttpTransport> {
    /// Creates a client talking HTTP to the configured base URL.
    pub fn from_config(config: ClientConfig) -> Result<Self, MetadataRetrievalError> {
        let transport = HttpTransport::new(&config.base_url, config.request_timeout)?;
        Ok(Self::new(transport, config))
    }
}

impl<T: Transport> OmdbClient<T> {
    /// Creates a client on top of an arbitrary transport.
    pub fn new(transport: T, config: ClientConfig) -> Self {
        Self { transport, config }
    }

    /// Issues one request with the API key attached and returns the body.
    fn request(&self, mut params: Vec<(&str, String)>) -> Result<String, MetadataRetrievalError> {
        params.insert(0, ("apikey", self.config.api_key.expose().to_string()));
        self.transport.get(&params)
    }

    /// Sleeps for the configured inter-request delay.
    fn pause(&self) {
        if !self.config.request_delay.is_zero() {
            thread::sleep(self.config.request_delay);
        }
    }

    /// Searches for series, paging until `max_results` are collected or the
    /// API reports no more results.
    ///
    /// A "no results" answer yields an empty list, not an error.
    pub fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<SeriesCandidate>, MetadataRetrievalError> {
        let mut results = Vec::new();
        let mut page = 1u32;

        while results.len() < max_results {
            if page > 1 {
                self.pause();
            }

            let body = self.request(vec![
                ("s", query.to_string()),
                ("type", "series".to_string()),
                ("page", page.to_string()),
            ])?;

            let data: OmdbSearchResponse = serde_json::from_str(&body)
                .map_err(|e| MetadataRetrievalError::Parse(e.to_string()))?;

            if is_failure(data.response.as_deref()) {
                debug!(
                    page,
                    error = data.error.as_deref().unwrap_or(""),
                    "Search ended"
                );
                break;
            }

            if data.search.is_empty() {
                break;
            }

            results.extend(data.search.into_iter().map(|item| SeriesCandidate {
                title: item.title,
                year: item.year.unwrap_or_else(|| "N/A".to_string()),
                imdb_id: item.imdb_id,
            }));
            page += 1;
        }

        results.truncate(max_results);
        info!(query, count = results.len(), "Search complete");

        Ok(results)
    }

    /// Fetches a single season.
    ///
    /// Transport failures are errors; an API-level failure is returned inside
    /// the payload.
    pub fn fetch_season(
        &self,
        imdb_id: &str,
        season: u32,
    ) -> Result<SeasonPayload, MetadataRetrievalError> {
        let body = self.request(vec![("i", imdb_id.to_string()), ("Season", season.to_string())])?;

        let inner: OmdbSeasonResponse = serde_json::from_str(&body)
            .map_err(|e| MetadataRetrievalError::Parse(e.to_string()))?;

        Ok(SeasonPayload { inner })
    }

    /// Fetches all episodes of a series, one season at a time.
    ///
    /// Season 1 decides whether the series is usable at all: if the API
    /// flags it as failed, the API's message is returned as
    /// `MetadataRetrievalError::Api` and no further request is made.
    pub fn fetch_all_episodes<F>(
        &self,
        imdb_id: &str,
        mut progress: F,
    ) -> Result<Vec<EpisodeRecord>, MetadataRetrievalError>
    where
        F: FnMut(ProgressEvent),
    {
        let first = self.fetch_season(imdb_id, 1)?;
        if first.is_failure() {
            return Err(MetadataRetrievalError::Api(
                first.error().unwrap_or("Unknown API error").to_string(),
            ));
        }

        let total_seasons = first.total_seasons()?;
        info!(imdb_id, total_seasons, "Fetching episodes");

        let mut episodes = Vec::new();
        let mut first = Some(first);

        for season in 1..=total_seasons {
            let payload = match first.take() {
                Some(payload) => payload,
                None => {
                    self.pause();
                    self.fetch_season(imdb_id, season)?
                }
            };

            if payload.is_failure() {
                warn!(
                    imdb_id,
                    season,
                    error = payload.error().unwrap_or(""),
                    "Season lookup failed, skipping"
                );
            }

            let records = payload.into_records(season);
            progress(ProgressEvent::SeasonFetched {
                season,
                total_seasons,
                episode_count: records.len(),
            });
            episodes.extend(records);
        }

        Ok(episodes)
    }
}

impl<T: Transport> SeriesSource for OmdbClient<T> {
    fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<SeriesCandidate>, MetadataRetrievalError> {
        OmdbClient::search(self, query, max_results)
    }

    fn fetch_all_episodes(
        &self,
        imdb_id: &str,
        progress: &mut dyn FnMut(ProgressEvent),
    ) -> Result<Vec<EpisodeRecord>, MetadataRetrievalError> {
        OmdbClient::fetch_all_episodes(self, imdb_id, progress)
    }
}
