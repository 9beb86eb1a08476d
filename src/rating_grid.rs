//! Season by episode rating grid
//!
//! Turns a flat list of episode records into a dense matrix with one row per
//! season and one column per episode slot. Cells without a usable rating stay
//! empty; they are never filled with a placeholder number.

use crate::metadata_retrieval::EpisodeRecord;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;

/// Lower bound of the fixed color scale.
pub const FIXED_SCALE_MIN: f64 = 5.0;

/// Upper bound of the fixed color scale.
pub const FIXED_SCALE_MAX: f64 = 9.5;

/// Highest episode number accepted as a grid column. Larger values are
/// treated like an unparseable episode number.
pub const MAX_EPISODE_NUMBER: u32 = 1000;

/// Sentinel the API uses for unrated episodes.
const NOT_AVAILABLE: &str = "N/A";

/// Errors that can occur while building a rating grid
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GridError {
    /// None of the episodes carried a usable rating
    #[error("No valid episode ratings available")]
    NoValidRatings,
}

/// Parses a raw rating string.
///
/// Returns `None` for the "N/A" sentinel, for anything that is not a number
/// and for non-finite values.
pub fn parse_rating(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case(NOT_AVAILABLE) {
        return None;
    }

    raw.parse::<f64>().ok().filter(|rating| rating.is_finite())
}

/// How the color scale bounds are chosen for a heatmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScalePolicy {
    /// Use the lowest and highest rating present in the grid
    #[default]
    Observed,
    /// Always use `FIXED_SCALE_MIN..=FIXED_SCALE_MAX`
    Fixed,
}

/// Inclusive value range mapped onto the color palette.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorScale {
    pub min: f64,
    pub max: f64,
}

impl ColorScale {
    /// Position of `value` within the scale, clamped to `0.0..=1.0`.
    ///
    /// A degenerate scale (min == max) places every value in the middle.
    pub fn normalize(&self, value: f64) -> f64 {
        let span = self.max - self.min;
        if span <= f64::EPSILON {
            return 0.5;
        }

        ((value - self.min) / span).clamp(0.0, 1.0)
    }
}

/// Ratings arranged by season (rows) and episode number (columns).
#[derive(Debug, Clone, PartialEq)]
pub struct RatingGrid {
    /// Season numbers, ascending; one per row
    seasons: Vec<u32>,
    /// Number of episode columns (highest episode number seen)
    episode_columns: u32,
    /// Row-major cells; `None` means "no value"
    cells: Vec<Vec<Option<f64>>>,
}

impl RatingGrid {
    /// Season numbers in row order.
    pub fn seasons(&self) -> &[u32] {
        &self.seasons
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.seasons.len()
    }

    /// Number of columns.
    pub fn column_count(&self) -> usize {
        self.episode_columns as usize
    }

    /// Rating at `(row, column)`, both zero-based.
    pub fn get(&self, row: usize, column: usize) -> Option<f64> {
        self.cells.get(row)?.get(column).copied().flatten()
    }

    /// Rating for a 1-based season and episode number.
    pub fn rating(&self, season: u32, episode: u32) -> Option<f64> {
        let row = self.seasons.iter().position(|s| *s == season)?;
        let column = (episode as usize).checked_sub(1)?;
        self.get(row, column)
    }

    /// Iterates over rows as `(season, cells)`.
    pub fn rows(&self) -> impl Iterator<Item = (u32, &[Option<f64>])> {
        self.seasons
            .iter()
            .copied()
            .zip(self.cells.iter().map(Vec::as_slice))
    }

    /// Lowest and highest rating present in the grid.
    pub fn observed_range(&self) -> (f64, f64) {
        self.cells
            .iter()
            .flatten()
            .flatten()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            })
    }

    /// Color scale bounds under the given policy.
    pub fn color_scale(&self, policy: ScalePolicy) -> ColorScale {
        match policy {
            ScalePolicy::Fixed => ColorScale {
                min: FIXED_SCALE_MIN,
                max: FIXED_SCALE_MAX,
            },
            ScalePolicy::Observed => {
                let (min, max) = self.observed_range();
                ColorScale { min, max }
            }
        }
    }
}

/// Builds a rating grid from episode records.
///
/// Records with season 0, a missing or zero episode number, an episode number
/// above `MAX_EPISODE_NUMBER`, or no rating contribute no value. A season
/// gets a row only when at least one of its episodes is rated. Columns span
/// every episode number seen in those seasons, rated or not, so an unrated
/// finale still shows up as an empty slot. When the same episode appears
/// twice the later record wins.
///
/// # Errors
///
/// Returns `GridError::NoValidRatings` when no record carries a usable rating.
pub fn build_grid(episodes: &[EpisodeRecord]) -> Result<RatingGrid, GridError> {
    let mut ratings: BTreeMap<u32, BTreeMap<u32, f64>> = BTreeMap::new();
    let mut last_episode: BTreeMap<u32, u32> = BTreeMap::new();

    for record in episodes {
        let Some(episode) = record.episode else {
            continue;
        };
        if record.season == 0 || episode == 0 || episode > MAX_EPISODE_NUMBER {
            debug!(season = record.season, episode, "Skipping episode outside the grid");
            continue;
        }

        let last = last_episode.entry(record.season).or_default();
        *last = (*last).max(episode);

        if let Some(rating) = record.rating.filter(|r| r.is_finite()) {
            ratings
                .entry(record.season)
                .or_default()
                .insert(episode, rating);
        }
    }

    if ratings.is_empty() {
        return Err(GridError::NoValidRatings);
    }

    let episode_columns = ratings
        .keys()
        .filter_map(|season| last_episode.get(season).copied())
        .max()
        .unwrap_or_default();

    let mut seasons = Vec::with_capacity(ratings.len());
    let mut cells = Vec::with_capacity(ratings.len());

    // BTreeMap iteration is already ascending by season
    for (season, season_ratings) in ratings {
        let mut row = vec![None; episode_columns as usize];
        for (episode, rating) in season_ratings {
            row[episode as usize - 1] = Some(rating);
        }
        seasons.push(season);
        cells.push(row);
    }

    Ok(RatingGrid {
        seasons,
        episode_columns,
        cells,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(season: u32, episode: &str, rating: &str) -> EpisodeRecord {
        EpisodeRecord {
            season,
            episode: episode.parse().ok(),
            title: format!("S{}E{}", season, episode),
            air_date: None,
            imdb_id: None,
            rating: parse_rating(rating),
        }
    }

    #[test]
    fn test_parse_rating() {
        assert_eq!(parse_rating("8.2"), Some(8.2));
        assert_eq!(parse_rating(" 9 "), Some(9.0));
        assert_eq!(parse_rating("N/A"), None);
        assert_eq!(parse_rating("n/a"), None);
        assert_eq!(parse_rating(""), None);
        assert_eq!(parse_rating("great"), None);
        assert_eq!(parse_rating("NaN"), None);
        assert_eq!(parse_rating("inf"), None);
    }

    #[test]
    fn test_ragged_grid_leaves_missing_cells_empty() {
        let episodes = vec![
            record(1, "1", "8.2"),
            record(1, "2", "N/A"),
            record(2, "1", "9.0"),
        ];

        let grid = build_grid(&episodes).unwrap();

        assert_eq!(grid.row_count(), 2);
        assert_eq!(grid.column_count(), 2);
        assert_eq!(grid.rating(1, 1), Some(8.2));
        assert_eq!(grid.rating(1, 2), None);
        assert_eq!(grid.rating(2, 1), Some(9.0));
        assert_eq!(grid.rating(2, 2), None);
    }

    #[test]
    fn test_ragged_grid_column_count_from_longest_season() {
        let episodes = vec![
            record(1, "1", "8.2"),
            record(1, "2", "7.9"),
            record(1, "3", "8.8"),
            record(2, "1", "9.0"),
        ];

        let grid = build_grid(&episodes).unwrap();

        assert_eq!(grid.row_count(), 2);
        assert_eq!(grid.column_count(), 3);
        assert_eq!(grid.get(1, 0), Some(9.0));
        assert_eq!(grid.get(1, 1), None);
        assert_eq!(grid.get(1, 2), None);
    }

    #[test]
    fn test_rows_sorted_by_season() {
        let episodes = vec![
            record(3, "1", "7.0"),
            record(1, "1", "8.0"),
            record(2, "1", "9.0"),
        ];

        let grid = build_grid(&episodes).unwrap();

        assert_eq!(grid.seasons(), &[1, 2, 3]);
        let firsts: Vec<_> = grid.rows().map(|(_, cells)| cells[0]).collect();
        assert_eq!(firsts, vec![Some(8.0), Some(9.0), Some(7.0)]);
    }

    #[test]
    fn test_gap_in_season_numbers_produces_no_empty_row() {
        let episodes = vec![record(1, "1", "7.0"), record(4, "2", "8.0")];

        let grid = build_grid(&episodes).unwrap();

        assert_eq!(grid.seasons(), &[1, 4]);
        assert_eq!(grid.rating(4, 1), None);
        assert_eq!(grid.rating(4, 2), Some(8.0));
    }

    #[test]
    fn test_unparseable_records_are_dropped() {
        let episodes = vec![
            record(1, "abc", "8.0"),
            record(0, "1", "8.0"),
            record(1, "0", "8.0"),
            record(1, "2", "7.5"),
        ];

        let grid = build_grid(&episodes).unwrap();

        assert_eq!(grid.row_count(), 1);
        assert_eq!(grid.column_count(), 2);
        assert_eq!(grid.rating(1, 1), None);
        assert_eq!(grid.rating(1, 2), Some(7.5));
    }

    #[test]
    fn test_oversized_episode_number_is_dropped() {
        let mut bogus = record(1, "1", "8.0");
        bogus.episode = Some(4_000_000_000);
        let episodes = vec![bogus, record(1, "3", "7.5")];

        let grid = build_grid(&episodes).unwrap();

        assert_eq!(grid.column_count(), 3);
        assert_eq!(grid.rating(1, 3), Some(7.5));
    }

    #[test]
    fn test_episode_number_at_limit_is_kept() {
        let limit = MAX_EPISODE_NUMBER.to_string();
        let grid = build_grid(&[record(2, &limit, "6.0")]).unwrap();

        assert_eq!(grid.column_count(), MAX_EPISODE_NUMBER as usize);
        assert_eq!(grid.rating(2, MAX_EPISODE_NUMBER), Some(6.0));
    }

    #[test]
    fn test_only_oversized_episodes_has_no_valid_ratings() {
        let mut bogus = record(1, "1", "8.0");
        bogus.episode = Some(u32::MAX);
        assert_eq!(build_grid(&[bogus]), Err(GridError::NoValidRatings));
    }

    #[test]
    fn test_season_without_ratings_gets_no_row() {
        let episodes = vec![
            record(1, "1", "8.0"),
            record(2, "1", "N/A"),
            record(2, "9", "N/A"),
        ];

        let grid = build_grid(&episodes).unwrap();

        assert_eq!(grid.seasons(), &[1]);
        assert_eq!(grid.column_count(), 1);
    }

    #[test]
    fn test_empty_input_has_no_valid_ratings() {
        assert_eq!(build_grid(&[]), Err(GridError::NoValidRatings));
    }

    #[test]
    fn test_all_missing_ratings_has_no_valid_ratings() {
        let episodes = vec![record(1, "1", "N/A"), record(1, "2", "")];
        assert_eq!(build_grid(&episodes), Err(GridError::NoValidRatings));
    }

    #[test]
    fn test_later_duplicate_wins() {
        let episodes = vec![record(1, "1", "6.0"), record(1, "1", "7.0")];
        let grid = build_grid(&episodes).unwrap();
        assert_eq!(grid.rating(1, 1), Some(7.0));
    }

    #[test]
    fn test_color_scale_policies() {
        let episodes = vec![record(1, "1", "6.5"), record(1, "2", "9.1")];
        let grid = build_grid(&episodes).unwrap();

        assert_eq!(
            grid.color_scale(ScalePolicy::Observed),
            ColorScale { min: 6.5, max: 9.1 }
        );
        assert_eq!(
            grid.color_scale(ScalePolicy::Fixed),
            ColorScale {
                min: FIXED_SCALE_MIN,
                max: FIXED_SCALE_MAX
            }
        );
    }

    #[test]
    fn test_normalize_clamps_and_handles_degenerate_scale() {
        let scale = ColorScale { min: 5.0, max: 9.0 };
        assert_eq!(scale.normalize(7.0), 0.5);
        assert_eq!(scale.normalize(2.0), 0.0);
        assert_eq!(scale.normalize(10.0), 1.0);

        let flat = ColorScale { min: 8.0, max: 8.0 };
        assert_eq!(flat.normalize(8.0), 0.5);
    }
}
