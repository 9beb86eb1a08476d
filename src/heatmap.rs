//! Terminal heatmap rendering
//!
//! Draws a `RatingGrid` as a table: one row per season, one column per
//! episode, each rated cell annotated with its value on a red-yellow-green
//! background. Empty cells get a neutral placeholder and are never colored.

use crate::rating_grid::{ColorScale, RatingGrid, ScalePolicy};
use crossterm::style::{Color, Stylize};
use std::io::{self, Write};

/// Width of a single episode cell in characters.
const CELL_WIDTH: usize = 5;

/// Placeholder for cells without a rating.
const MISSING_CELL: &str = "·";

/// Axis captions above the table.
const SEASON_AXIS: &str = "Season";
const EPISODE_AXIS: &str = "Episode";

/// Number of swatches drawn in the legend.
const LEGEND_STEPS: usize = 20;

/// Red-yellow-green diverging palette, low to high.
const PALETTE: [(u8, u8, u8); 11] = [
    (165, 0, 38),
    (215, 48, 39),
    (244, 109, 67),
    (253, 174, 97),
    (254, 224, 139),
    (255, 255, 191),
    (217, 239, 139),
    (166, 217, 106),
    (102, 189, 99),
    (26, 152, 80),
    (0, 104, 55),
];

/// Renders rating grids to a terminal or any writer.
#[derive(Debug, Clone, Copy)]
pub struct HeatmapRenderer {
    /// How the color scale bounds are chosen
    pub scale: ScalePolicy,
    /// Emit ANSI colors; plain text otherwise
    pub color: bool,
}

impl Default for HeatmapRenderer {
    fn default() -> Self {
        Self {
            scale: ScalePolicy::default(),
            color: true,
        }
    }
}

impl HeatmapRenderer {
    pub fn new(scale: ScalePolicy, color: bool) -> Self {
        Self { scale, color }
    }

    /// Writes the heatmap for `grid` under the heading `title`.
    pub fn render<W: Write>(
        &self,
        grid: &RatingGrid,
        title: &str,
        out: &mut W,
    ) -> io::Result<()> {
        let scale = grid.color_scale(self.scale);
        let label_width = grid
            .seasons()
            .iter()
            .map(|season| season_label(*season).len())
            .max()
            .unwrap_or(0);

        if self.color {
            writeln!(out, "{}", title.bold())?;
        } else {
            writeln!(out, "{}", title)?;
        }
        writeln!(out)?;

        // Axis captions, then the episode header
        writeln!(out, "{:<label_width$} {}", SEASON_AXIS, EPISODE_AXIS)?;
        write!(out, "{:label_width$} ", "")?;
        for episode in 1..=grid.column_count() {
            write!(out, "{:^CELL_WIDTH$}", format!("E{}", episode))?;
        }
        writeln!(out)?;

        for (season, cells) in grid.rows() {
            write!(out, "{:<label_width$} ", season_label(season))?;
            for cell in cells {
                self.write_cell(out, *cell, &scale)?;
            }
            writeln!(out)?;
        }

        writeln!(out)?;
        self.write_legend(out, &scale)
    }

    fn write_cell<W: Write>(
        &self,
        out: &mut W,
        cell: Option<f64>,
        scale: &ColorScale,
    ) -> io::Result<()> {
        match cell {
            Some(rating) => {
                let text = format!("{:^CELL_WIDTH$}", format!("{:.1}", rating));
                if self.color {
                    let background = palette_color(scale.normalize(rating));
                    write!(
                        out,
                        "{}",
                        text.with(text_color_for(background)).on(to_color(background))
                    )
                } else {
                    write!(out, "{}", text)
                }
            }
            None => {
                let text = format!("{:^CELL_WIDTH$}", MISSING_CELL);
                if self.color {
                    write!(out, "{}", text.dark_grey())
                } else {
                    write!(out, "{}", text)
                }
            }
        }
    }

    fn write_legend<W: Write>(&self, out: &mut W, scale: &ColorScale) -> io::Result<()> {
        let policy = match self.scale {
            ScalePolicy::Observed => "observed",
            ScalePolicy::Fixed => "fixed",
        };

        write!(out, "Rating {:.1} ", scale.min)?;
        if self.color {
            for step in 0..LEGEND_STEPS {
                let position = step as f64 / (LEGEND_STEPS - 1) as f64;
                write!(out, "{}", " ".on(to_color(palette_color(position))))?;
            }
        } else {
            write!(out, "..")?;
        }
        writeln!(out, " {:.1} ({} scale)", scale.max, policy)
    }
}

fn season_label(season: u32) -> String {
    format!("Season {}", season)
}

/// Interpolates the palette at `position` in `0.0..=1.0`.
fn palette_color(position: f64) -> (u8, u8, u8) {
    let position = position.clamp(0.0, 1.0);
    let scaled = position * (PALETTE.len() - 1) as f64;
    let index = (scaled.floor() as usize).min(PALETTE.len() - 2);
    let fraction = scaled - index as f64;

    let (r0, g0, b0) = PALETTE[index];
    let (r1, g1, b1) = PALETTE[index + 1];
    let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * fraction).round() as u8;

    (lerp(r0, r1), lerp(g0, g1), lerp(b0, b1))
}

/// Black on light backgrounds, white on dark ones.
fn text_color_for((r, g, b): (u8, u8, u8)) -> Color {
    let luminance = 0.299 * r as f64 + 0.587 * g as f64 + 0.114 * b as f64;
    if luminance > 140.0 {
        Color::Black
    } else {
        Color::White
    }
}

fn to_color((r, g, b): (u8, u8, u8)) -> Color {
    Color::Rgb { r, g, b }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata_retrieval::EpisodeRecord;
    use crate::rating_grid::build_grid;

    fn record(season: u32, episode: u32, rating: Option<f64>) -> EpisodeRecord {
        EpisodeRecord {
            season,
            episode: Some(episode),
            title: String::new(),
            air_date: None,
            imdb_id: None,
            rating,
        }
    }

    fn render_plain(grid: &RatingGrid, scale: ScalePolicy) -> String {
        let mut out = Vec::new();
        HeatmapRenderer::new(scale, false)
            .render(grid, "Breaking Bad", &mut out)
            .unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_plain_render_layout() {
        let grid = build_grid(&[
            record(1, 1, Some(8.2)),
            record(1, 2, None),
            record(2, 1, Some(9.0)),
        ])
        .unwrap();

        let output = render_plain(&grid, ScalePolicy::Observed);
        let lines: Vec<&str> = output.lines().collect();

        assert_eq!(lines[0], "Breaking Bad");
        assert_eq!(lines[2], "Season   Episode");
        assert!(lines[3].contains("E1") && lines[3].contains("E2"));
        assert!(lines[4].starts_with("Season 1"));
        assert!(lines[4].contains("8.2"));
        assert!(lines[4].contains(MISSING_CELL));
        assert!(lines[5].starts_with("Season 2"));
        assert!(lines[5].contains("9.0"));
        assert!(lines[5].contains(MISSING_CELL));
        assert!(output.contains("Rating 8.2 .. 9.0 (observed scale)"));
    }

    #[test]
    fn test_plain_render_has_no_escape_codes() {
        let grid = build_grid(&[record(1, 1, Some(7.0))]).unwrap();
        let output = render_plain(&grid, ScalePolicy::Fixed);

        assert!(!output.contains('\u{1b}'));
        assert!(output.contains("Rating 5.0 .. 9.5 (fixed scale)"));
    }

    #[test]
    fn test_colored_render_only_colors_rated_cells() {
        let grid = build_grid(&[record(1, 1, Some(7.0)), record(1, 3, Some(8.0))]).unwrap();

        let mut out = Vec::new();
        HeatmapRenderer::default()
            .render(&grid, "Lost", &mut out)
            .unwrap();
        let output = String::from_utf8(out).unwrap();

        assert!(output.contains('\u{1b}'));
        assert!(output.contains("7.0"));
        assert!(output.contains("8.0"));
        assert_eq!(output.matches(MISSING_CELL).count(), 1);
    }

    #[test]
    fn test_palette_endpoints() {
        assert_eq!(palette_color(0.0), PALETTE[0]);
        assert_eq!(palette_color(1.0), PALETTE[PALETTE.len() - 1]);
        assert_eq!(palette_color(0.5), PALETTE[5]);
        assert_eq!(palette_color(-3.0), PALETTE[0]);
    }

    #[test]
    fn test_text_color_contrast() {
        assert_eq!(text_color_for((255, 255, 191)), Color::Black);
        assert_eq!(text_color_for((0, 104, 55)), Color::White);
    }
}
