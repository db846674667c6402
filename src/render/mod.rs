//! Chart models and their SVG renderers.
//!
//! [`boxplot::BoxplotChart`] and [`timeseries::TimeSeriesChart`] hold
//! everything a chart shows; the `draw_*` functions turn them into SVG files
//! with `plotters`.

pub mod boxplot;
pub mod timeseries;

use plotters::coord::types::RangedCoordf64;
use plotters::prelude::*;

use crate::dataset::Degree;
use crate::error::{AnalysisError, Result};

pub const CHART_SIZE: (u32, u32) = (1400, 800);
pub const FONT: &str = "sans-serif";

pub const GREEN: RGBColor = RGBColor(0, 128, 0);
pub const DARK_GREEN: RGBColor = RGBColor(0, 100, 0);
pub const BLUE: RGBColor = RGBColor(0, 0, 255);
pub const DARK_BLUE: RGBColor = RGBColor(0, 0, 139);

/// Fill and marker color of a scenario degree.
pub fn degree_color(degree: Degree) -> RGBColor {
    match degree {
        Degree::Amb => GREEN,
        Degree::Mod => BLUE,
    }
}

/// Median line color of a scenario degree.
pub fn degree_dark_color(degree: Degree) -> RGBColor {
    match degree {
        Degree::Amb => DARK_GREEN,
        Degree::Mod => DARK_BLUE,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerShape {
    Circle,
    Cross,
    Diamond,
}

/// Marker shape for per-study points of the time-series chart.
pub fn degree_marker(degree: Degree) -> MarkerShape {
    match degree {
        Degree::Amb => MarkerShape::Circle,
        Degree::Mod => MarkerShape::Cross,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LegendGlyph {
    Patch { color: RGBColor, alpha: f64 },
    Line { color: RGBColor, dashed: bool },
    Marker { color: RGBColor, shape: MarkerShape },
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegendEntry {
    pub label: String,
    pub glyph: LegendGlyph,
}

impl LegendEntry {
    pub fn new(label: impl Into<String>, glyph: LegendGlyph) -> Self {
        Self {
            label: label.into(),
            glyph,
        }
    }
}

/// Splits a polyline into dashes covering `dash` (0.0–1.0) of each segment.
pub fn dash_segments(points: &[(f64, f64)], dash: f64) -> Vec<[(f64, f64); 2]> {
    points
        .windows(2)
        .map(|w| {
            let (a, b) = (w[0], w[1]);
            [a, (a.0 + (b.0 - a.0) * dash, a.1 + (b.1 - a.1) * dash)]
        })
        .collect()
}

/// Pads a value range by 5% on each side; a flat or empty range becomes ±1.
pub fn padded_range(values: impl IntoIterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values
        .into_iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if !lo.is_finite() || !hi.is_finite() {
        return (-1.0, 1.0);
    }
    if (hi - lo).abs() < f64::EPSILON {
        return (lo - 1.0, hi + 1.0);
    }
    let pad = (hi - lo) * 0.05;
    (lo - pad, hi + pad)
}

pub(crate) type SvgContext<'a, 'b> =
    ChartContext<'a, SVGBackend<'b>, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

pub(crate) fn render_error(err: impl std::fmt::Display) -> AnalysisError {
    AnalysisError::Render(err.to_string())
}

/// Pixel offsets of a diamond marker centered on its anchor.
pub(crate) fn diamond(size: i32) -> Vec<(i32, i32)> {
    vec![(0, -size), (size, 0), (0, size), (-size, 0)]
}

/// Registers a legend row backed by an empty series.
pub(crate) fn add_legend<'a, 'b: 'a>(
    ctx: &mut SvgContext<'a, 'b>,
    entry: &LegendEntry,
) -> Result<()> {
    let anno = ctx
        .draw_series(std::iter::empty::<Circle<(f64, f64), i32>>())
        .map_err(render_error)?
        .label(entry.label.as_str());

    match entry.glyph {
        LegendGlyph::Patch { color, alpha } => {
            anno.legend(move |(x, y)| {
                Rectangle::new([(x, y - 6), (x + 18, y + 6)], color.mix(alpha).filled())
            });
        }
        LegendGlyph::Line {
            color,
            dashed: false,
        } => {
            anno.legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 18, y)], color.stroke_width(2)));
        }
        LegendGlyph::Line {
            color,
            dashed: true,
        } => {
            anno.legend(move |(x, y)| {
                EmptyElement::at((x, y))
                    + PathElement::new(vec![(0, 0), (6, 0)], color.stroke_width(2))
                    + PathElement::new(vec![(10, 0), (16, 0)], color.stroke_width(2))
            });
        }
        LegendGlyph::Marker {
            color,
            shape: MarkerShape::Circle,
        } => {
            anno.legend(move |(x, y)| Circle::new((x + 9, y), 4, color.filled()));
        }
        LegendGlyph::Marker {
            color,
            shape: MarkerShape::Cross,
        } => {
            anno.legend(move |(x, y)| Cross::new((x + 9, y), 4, color.stroke_width(2)));
        }
        LegendGlyph::Marker {
            color,
            shape: MarkerShape::Diamond,
        } => {
            anno.legend(move |(x, y)| {
                EmptyElement::at((x + 9, y)) + Polygon::new(diamond(5), color.filled())
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degree_colors() {
        assert_eq!(degree_color(Degree::Amb), GREEN);
        assert_eq!(degree_color(Degree::Mod), BLUE);
        assert_eq!(degree_dark_color(Degree::Mod), DARK_BLUE);
        assert_eq!(degree_marker(Degree::Mod), MarkerShape::Cross);
    }

    #[test]
    fn test_dash_segments() {
        let dashes = dash_segments(&[(0.0, 0.0), (2.0, 4.0), (4.0, 4.0)], 0.5);
        assert_eq!(dashes, vec![[(0.0, 0.0), (1.0, 2.0)], [(2.0, 4.0), (3.0, 4.0)]]);
        assert!(dash_segments(&[(0.0, 0.0)], 0.5).is_empty());
    }

    #[test]
    fn test_legend_entries_for_every_glyph() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("legend.svg");
        let entries = [
            LegendEntry::new("patch", LegendGlyph::Patch { color: GREEN, alpha: 0.3 }),
            LegendEntry::new("solid", LegendGlyph::Line { color: BLACK, dashed: false }),
            LegendEntry::new("dashed", LegendGlyph::Line { color: DARK_BLUE, dashed: true }),
            LegendEntry::new("circle", LegendGlyph::Marker { color: GREEN, shape: MarkerShape::Circle }),
            LegendEntry::new("cross", LegendGlyph::Marker { color: BLUE, shape: MarkerShape::Cross }),
            LegendEntry::new("diamond", LegendGlyph::Marker { color: BLACK, shape: MarkerShape::Diamond }),
        ];
        {
            let root = SVGBackend::new(&path, (400, 300)).into_drawing_area();
            let mut ctx = ChartBuilder::on(&root)
                .build_cartesian_2d(0.0f64..1.0, 0.0f64..1.0)
                .unwrap();
            for entry in &entries {
                add_legend(&mut ctx, entry).unwrap();
            }
            ctx.configure_series_labels().draw().unwrap();
            root.present().unwrap();
        }

        let svg = std::fs::read_to_string(&path).unwrap();
        for entry in &entries {
            assert!(svg.contains(entry.label.as_str()), "{}", entry.label);
        }
    }

    #[test]
    fn test_padded_range() {
        assert_eq!(padded_range([0.0, 10.0]), (-0.5, 10.5));
        assert_eq!(padded_range([3.0]), (2.0, 4.0));
        assert_eq!(padded_range(std::iter::empty()), (-1.0, 1.0));
    }
}
