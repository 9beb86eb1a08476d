//! Interaction flow state machine
//!
//! The presenter owns the search/select/plot flow independent of any
//! particular user interface. It moves between three states:
//!
//! - `Idle`: waiting for a query
//! - `Listing`: showing ranked candidates
//! - `Plotting`: a background worker is fetching episodes for the selection
//!
//! The episode fetch runs on a worker thread. The worker never touches
//! presenter state; it sends `WorkerMessage`s over a channel which only the
//! foreground loop consumes through `poll_plot`.

use crate::metadata_retrieval::{SeriesCandidate, SeriesSource};
use crate::ranking::rank;
use crate::rating_grid::RatingGrid;
use crate::{ProgressEvent, SeriesHeatmapError, fetch_rating_grid};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Input rejected by the presenter. Recovered locally with a warning.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InputError {
    /// The query was empty or whitespace only
    #[error("Please enter a series name.")]
    EmptyQuery,

    /// A plot was requested without choosing a series
    #[error("Please select a series from the list.")]
    NoSelection,

    /// A plot was requested before any search produced candidates
    #[error("Search for a series first.")]
    NothingListed,

    /// A plot is already being fetched
    #[error("Still fetching the previous series, please wait.")]
    PlotInFlight,
}

/// A user-visible message, by severity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Rejected input, nothing changed
    Warning(String),
    /// Informational, e.g. a search without results
    Info(String),
    /// A failed action
    Error(String),
}

impl Notice {
    pub fn message(&self) -> &str {
        match self {
            Notice::Warning(message) | Notice::Info(message) | Notice::Error(message) => message,
        }
    }
}

impl From<InputError> for Notice {
    fn from(error: InputError) -> Self {
        Notice::Warning(error.to_string())
    }
}

/// Current state of the interaction flow.
#[derive(Debug, Clone, PartialEq)]
pub enum PresenterState {
    /// Awaiting query text
    Idle,
    /// Ranked candidates are on display
    Listing { candidates: Vec<SeriesCandidate> },
    /// Episodes for `title` are being fetched in the background
    Plotting {
        candidates: Vec<SeriesCandidate>,
        title: String,
    },
}

/// A finished heatmap ready to be drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotOutcome {
    /// Display title of the series
    pub title: String,
    /// The rating grid
    pub grid: RatingGrid,
}

/// Something the foreground loop should show to the user.
#[derive(Debug, Clone, PartialEq)]
pub enum PresenterEvent {
    /// The worker made progress
    Progress(ProgressEvent),
    /// The worker finished successfully
    PlotReady(PlotOutcome),
    /// The worker failed
    Notice(Notice),
}

/// Messages sent from the worker to the foreground loop.
enum WorkerMessage {
    Progress(ProgressEvent),
    Finished(Result<RatingGrid, SeriesHeatmapError>),
}

/// Drives the search, selection and background plot flow.
pub struct Presenter<S: SeriesSource + 'static> {
    source: Arc<S>,
    max_results: usize,
    top_n: usize,
    state: PresenterState,
    worker: Option<Receiver<WorkerMessage>>,
}

impl<S: SeriesSource + 'static> Presenter<S> {
    /// Creates a presenter in the `Idle` state.
    ///
    /// `max_results` caps the raw search, `top_n` caps the ranked list.
    pub fn new(source: Arc<S>, max_results: usize, top_n: usize) -> Self {
        Self {
            source,
            max_results,
            top_n,
            state: PresenterState::Idle,
            worker: None,
        }
    }

    pub fn state(&self) -> &PresenterState {
        &self.state
    }

    /// Candidates currently listed (also while plotting).
    pub fn candidates(&self) -> &[SeriesCandidate] {
        match &self.state {
            PresenterState::Idle => &[],
            PresenterState::Listing { candidates }
            | PresenterState::Plotting { candidates, .. } => candidates,
        }
    }

    /// True while a background fetch is in flight. The plot trigger is
    /// disabled for that time.
    pub fn is_plotting(&self) -> bool {
        matches!(self.state, PresenterState::Plotting { .. })
    }

    /// Runs a search for `text` and lists the ranked candidates.
    ///
    /// An empty query is rejected without touching the current state. A
    /// search without results returns an informational notice and goes back
    /// to `Idle`.
    pub fn submit_query(&mut self, text: &str) -> Result<&[SeriesCandidate], Notice> {
        if self.is_plotting() {
            return Err(Notice::from(InputError::PlotInFlight));
        }

        let query = text.trim();
        if query.is_empty() {
            return Err(Notice::from(InputError::EmptyQuery));
        }

        let results = self
            .source
            .search(query, self.max_results)
            .map_err(|e| Notice::Error(e.to_string()))?;

        if results.is_empty() {
            info!(query, "No series found");
            self.state = PresenterState::Idle;
            return Err(Notice::Info(format!("No series found for '{}'.", query)));
        }

        let candidates = rank(query, &results, self.top_n);
        debug!(query, listed = candidates.len(), "Listing candidates");
        self.state = PresenterState::Listing { candidates };

        Ok(self.candidates())
    }

    /// Starts fetching the heatmap for the selected candidate.
    ///
    /// Only valid while `Listing`. A missing or out-of-range selection is
    /// rejected and the listing stays as it is.
    pub fn request_plot(&mut self, selection: Option<usize>) -> Result<(), Notice> {
        let candidate = match &self.state {
            PresenterState::Plotting { .. } => return Err(Notice::from(InputError::PlotInFlight)),
            PresenterState::Idle => return Err(Notice::from(InputError::NothingListed)),
            PresenterState::Listing { candidates } => selection
                .and_then(|index| candidates.get(index))
                .cloned()
                .ok_or(InputError::NoSelection)?,
        };

        self.start_worker(candidate)
    }

    /// Starts fetching the heatmap for a series known by id, skipping search.
    pub fn plot_candidate(&mut self, candidate: SeriesCandidate) -> Result<(), Notice> {
        if self.is_plotting() {
            return Err(Notice::from(InputError::PlotInFlight));
        }

        if let PresenterState::Idle = self.state {
            self.state = PresenterState::Listing {
                candidates: vec![candidate.clone()],
            };
        }

        self.start_worker(candidate)
    }

    /// Leaves the candidate list and waits for a new query.
    pub fn back_to_search(&mut self) -> Result<(), Notice> {
        if self.is_plotting() {
            return Err(Notice::from(InputError::PlotInFlight));
        }

        self.state = PresenterState::Idle;
        Ok(())
    }

    /// Waits up to `timeout` for a message from the worker.
    ///
    /// Must be called from the foreground loop. Returns `None` when nothing
    /// arrived in time or no fetch is in flight. Completion, successful or
    /// not, returns the flow to `Listing`.
    pub fn poll_plot(&mut self, timeout: Duration) -> Option<PresenterEvent> {
        let received = self.worker.as_ref()?.recv_timeout(timeout);

        match received {
            Ok(WorkerMessage::Progress(event)) => Some(PresenterEvent::Progress(event)),
            Ok(WorkerMessage::Finished(Ok(grid))) => {
                let title = self.finish_plot();
                info!(title = %title, seasons = grid.row_count(), "Heatmap ready");
                Some(PresenterEvent::PlotReady(PlotOutcome { title, grid }))
            }
            Ok(WorkerMessage::Finished(Err(e))) => {
                let title = self.finish_plot();
                warn!(title = %title, error = %e, "Heatmap fetch failed");
                Some(PresenterEvent::Notice(Notice::Error(e.to_string())))
            }
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => {
                self.finish_plot();
                Some(PresenterEvent::Notice(Notice::Error(
                    "The background fetch stopped unexpectedly.".to_string(),
                )))
            }
        }
    }

    fn start_worker(&mut self, candidate: SeriesCandidate) -> Result<(), Notice> {
        let (sender, receiver) = mpsc::channel();
        let source = Arc::clone(&self.source);
        let imdb_id = candidate.imdb_id.clone();

        info!(imdb_id = %imdb_id, title = %candidate.title, "Starting background fetch");

        thread::Builder::new()
            .name("heatmap-fetch".to_string())
            .spawn(move || {
                let result = fetch_rating_grid(&*source, &imdb_id, &mut |event| {
                    // The receiver may already be gone; nothing to do then
                    let _ = sender.send(WorkerMessage::Progress(event));
                });
                let _ = sender.send(WorkerMessage::Finished(result));
            })
            .map_err(|e| Notice::Error(format!("Failed to start background fetch: {}", e)))?;

        let candidates = match std::mem::replace(&mut self.state, PresenterState::Idle) {
            PresenterState::Listing { candidates }
            | PresenterState::Plotting { candidates, .. } => candidates,
            PresenterState::Idle => Vec::new(),
        };

        self.state = PresenterState::Plotting {
            candidates,
            title: candidate.title,
        };
        self.worker = Some(receiver);

        Ok(())
    }

    /// Drops the worker channel and returns to `Listing`, yielding the title
    /// that was being plotted.
    fn finish_plot(&mut self) -> String {
        self.worker = None;

        match std::mem::replace(&mut self.state, PresenterState::Idle) {
            PresenterState::Plotting { candidates, title } => {
                self.state = PresenterState::Listing { candidates };
                title
            }
            other => {
                self.state = other;
                String::new()
            }
        }
    }
}
