//! Interactive terminal session
//!
//! A thin shell around the `Presenter`: it asks for a query, shows the
//! ranked candidates as a selectable list, waits for the background fetch
//! while printing progress, and draws the finished heatmap. Every failure of
//! a single action is reported and the session carries on.

use crate::heatmap::HeatmapRenderer;
use crate::metadata_retrieval::{SeriesCandidate, SeriesSource};
use crate::presenter::{Notice, Presenter, PresenterEvent, PresenterState};
use crate::{ProgressEvent, SeriesHeatmapError};
use crossterm::style::Stylize;
use dialoguer::console::Term;
use dialoguer::{Input, Select};
use std::io;
use std::time::Duration;

/// Typed at the query prompt to leave the session.
const QUIT_COMMAND: &str = ":q";

/// How long the foreground loop waits for worker messages per tick.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Startup options for an interactive session.
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    /// Query to run before the first prompt
    pub initial_query: Option<String>,
    /// Series id to plot right away, skipping search
    pub series_id: Option<String>,
    /// How heatmaps are drawn
    pub renderer: HeatmapRenderer,
}

/// A terminal session driving a `Presenter`.
pub struct InteractiveSession<S: SeriesSource + 'static> {
    presenter: Presenter<S>,
    options: SessionOptions,
    term: Term,
}

impl<S: SeriesSource + 'static> InteractiveSession<S> {
    pub fn new(presenter: Presenter<S>, options: SessionOptions) -> Self {
        Self {
            presenter,
            options,
            term: Term::stderr(),
        }
    }

    /// Runs the session until the user quits.
    ///
    /// Only terminal failures end the session early.
    pub fn run(&mut self) -> Result<(), SeriesHeatmapError> {
        if let Some(imdb_id) = self.options.series_id.take() {
            let candidate = SeriesCandidate {
                title: imdb_id.clone(),
                year: "N/A".to_string(),
                imdb_id,
            };
            if let Err(notice) = self.presenter.plot_candidate(candidate) {
                self.show_notice(&notice)?;
            }
        }

        loop {
            let keep_going = match self.presenter.state() {
                PresenterState::Idle => self.prompt_query()?,
                PresenterState::Listing { .. } => self.prompt_selection()?,
                PresenterState::Plotting { title, .. } => {
                    let title = title.clone();
                    self.wait_for_plot(&title)?;
                    true
                }
            };

            if !keep_going {
                return Ok(());
            }
        }
    }

    /// Asks for a query and searches. Returns `false` when the user quits.
    fn prompt_query(&mut self) -> Result<bool, SeriesHeatmapError> {
        let query = match self.options.initial_query.take() {
            Some(query) => query,
            None => Input::<String>::new()
                .with_prompt(format!("Series name ({} to quit)", QUIT_COMMAND))
                .allow_empty(true)
                .interact_text_on(&self.term)?,
        };

        if query.trim() == QUIT_COMMAND {
            return Ok(false);
        }

        if !query.trim().is_empty() {
            self.term
                .write_line(&format!("Searching for '{}'...", query.trim()))?;
        }
        if let Err(notice) = self.presenter.submit_query(&query) {
            self.show_notice(&notice)?;
        }

        Ok(true)
    }

    /// Shows the candidate list and acts on the choice. Returns `false` when
    /// the user quits.
    fn prompt_selection(&mut self) -> Result<bool, SeriesHeatmapError> {
        let mut items: Vec<String> = self
            .presenter
            .candidates()
            .iter()
            .map(SeriesCandidate::display_label)
            .collect();
        let new_search = items.len();
        let quit = new_search + 1;
        items.push("« New search".to_string());
        items.push("Quit".to_string());

        let selection = Select::new()
            .with_prompt("Pick a series to plot (Esc to cancel)")
            .items(&items)
            .default(0)
            .interact_on_opt(&self.term)?;

        match selection {
            Some(index) if index == quit => Ok(false),
            Some(index) if index == new_search => {
                if let Err(notice) = self.presenter.back_to_search() {
                    self.show_notice(&notice)?;
                }
                Ok(true)
            }
            selection => {
                if let Err(notice) = self.presenter.request_plot(selection) {
                    self.show_notice(&notice)?;
                }
                Ok(true)
            }
        }
    }

    /// Consumes worker messages until the fetch for `title` completes.
    fn wait_for_plot(&mut self, title: &str) -> Result<(), SeriesHeatmapError> {
        self.term
            .write_line(&format!("Fetching episode ratings for '{}'...", title))?;

        loop {
            let Some(event) = self.presenter.poll_plot(POLL_INTERVAL) else {
                if !self.presenter.is_plotting() {
                    return Ok(());
                }
                continue;
            };

            match event {
                PresenterEvent::Progress(ProgressEvent::SeasonFetched {
                    season,
                    total_seasons,
                    episode_count,
                }) => {
                    self.term.write_line(&format!(
                        "  [{}/{}] Season {}: {} episode(s)",
                        season, total_seasons, season, episode_count
                    ))?;
                }
                PresenterEvent::PlotReady(outcome) => {
                    let mut stdout = io::stdout().lock();
                    self.options
                        .renderer
                        .render(&outcome.grid, &outcome.title, &mut stdout)?;
                    return Ok(());
                }
                PresenterEvent::Notice(notice) => {
                    self.show_notice(&notice)?;
                    return Ok(());
                }
            }
        }
    }

    fn show_notice(&self, notice: &Notice) -> Result<(), SeriesHeatmapError> {
        let line = notice_line(notice, self.options.renderer.color);
        self.term.write_line(&line)?;
        Ok(())
    }
}

/// Formats a notice with a severity label, styled only when `color` is set.
fn notice_line(notice: &Notice, color: bool) -> String {
    let label = match notice {
        Notice::Warning(_) => "Warning:",
        Notice::Info(_) => "Info:",
        Notice::Error(_) => "Error:",
    };

    if !color {
        return format!("{} {}", label, notice.message());
    }

    let label = match notice {
        Notice::Warning(_) => label.yellow().bold(),
        Notice::Info(_) => label.cyan().bold(),
        Notice::Error(_) => label.red().bold(),
    };
    format!("{} {}", label, notice.message())
}
