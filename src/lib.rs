//! Series Heatmap - per-episode rating heatmaps for TV series
//!
//! This library searches a series in the OMDb database, ranks the candidates
//! against the user's query, fetches every season's episode ratings and lays
//! them out as a season by episode grid ready to be drawn as a heatmap.

mod config;
mod heatmap;
mod interactive;
mod metadata_retrieval;
mod presenter;
mod ranking;
mod rating_grid;

use thiserror::Error;

// Re-export error types
pub use config::ConfigError;
pub use metadata_retrieval::MetadataRetrievalError;
pub use presenter::InputError;
pub use rating_grid::GridError;

// Re-export configuration
pub use config::{
    ApiKey, ClientConfig, DEFAULT_BASE_URL, DEFAULT_REQUEST_DELAY, DEFAULT_REQUEST_TIMEOUT,
};

// Re-export the client and its data types
pub use metadata_retrieval::{
    EpisodeRecord, HttpTransport, OmdbClient, SeasonPayload, SeriesCandidate, SeriesSource,
    Transport,
};

// Re-export ranking, grid and rendering
pub use heatmap::HeatmapRenderer;
pub use ranking::{DEFAULT_TOP_N, partial_ratio, rank};
pub use rating_grid::{
    ColorScale, FIXED_SCALE_MAX, FIXED_SCALE_MIN, MAX_EPISODE_NUMBER, RatingGrid, ScalePolicy,
    build_grid, parse_rating,
};

// Re-export the interaction flow
pub use interactive::{InteractiveSession, SessionOptions};
pub use presenter::{Notice, PlotOutcome, Presenter, PresenterEvent, PresenterState};

/// Progress event emitted while fetching episodes
///
/// These events allow library users to track progress of the (potentially
/// slow) multi-request season walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// One season has been fetched
    SeasonFetched {
        season: u32,
        total_seasons: u32,
        episode_count: usize,
    },
}

/// Top-level error type for Series Heatmap operations
#[derive(Debug, Error)]
pub enum SeriesHeatmapError {
    /// Error in the startup configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Error during metadata retrieval
    #[error("{0}")]
    MetadataRetrieval(#[from] MetadataRetrievalError),

    /// Error while building the rating grid
    #[error("{0}")]
    Grid(#[from] GridError),

    /// Terminal interaction failed
    #[error("Terminal error: {0}")]
    Terminal(#[from] dialoguer::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Fetches a series' episodes and builds its rating grid in one call.
///
/// # Examples
///
/// ```no_run
/// use series_heatmap::{ClientConfig, OmdbClient, ProgressEvent, fetch_rating_grid};
/// use std::time::Duration;
///
/// let config = ClientConfig::validate(
///     Some("my-key"),
///     series_heatmap::DEFAULT_BASE_URL,
///     Duration::from_millis(500),
///     Duration::from_secs(10),
/// ).unwrap();
/// let client = OmdbClient::from_config(config).unwrap();
///
/// let grid = fetch_rating_grid(&client, "tt0903747", &mut |event| {
///     let ProgressEvent::SeasonFetched { season, total_seasons, .. } = event;
///     println!("Season {}/{}", season, total_seasons);
/// }).unwrap();
/// println!("{} seasons", grid.row_count());
/// ```
pub fn fetch_rating_grid<S>(
    source: &S,
    imdb_id: &str,
    progress: &mut dyn FnMut(ProgressEvent),
) -> Result<RatingGrid, SeriesHeatmapError>
where
    S: SeriesSource + ?Sized,
{
    let episodes = source.fetch_all_episodes(imdb_id, progress)?;
    Ok(build_grid(&episodes)?)
}
