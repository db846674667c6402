use plotters::prelude::*;
use std::path::Path;
use tracing::info;

use super::{
    CHART_SIZE, FONT, LegendEntry, LegendGlyph, MarkerShape, add_legend, dash_segments,
    degree_color, degree_dark_color, degree_marker, padded_range, render_error,
};
use crate::analyzers::types::{ScenarioMeans, StudyMeans};
use crate::config::YearRange;
use crate::dataset::{Degree, Indicator};
use crate::error::Result;
use crate::stats::SummaryStats;

pub const BAND_ALPHA: f64 = 0.25;
const ENVELOPE_ALPHA: f64 = 0.1;

/// Everything drawn for one scenario degree.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioLayer {
    pub degree: Degree,
    /// Per-study means, one point per study and year with data.
    pub points: Vec<(f64, f64)>,
    pub median: Vec<(f64, f64)>,
    /// `(year, 25%, 75%)`.
    pub band: Vec<(f64, f64, f64)>,
    pub min: Vec<(f64, f64)>,
    pub max: Vec<(f64, f64)>,
}

impl ScenarioLayer {
    fn new(means: &StudyMeans, summary: &SummaryStats) -> Self {
        let points = means
            .values
            .iter()
            .flat_map(|row| {
                means
                    .years
                    .iter()
                    .zip(row)
                    .filter_map(|(year, v)| v.map(|v| (*year as f64, v)))
            })
            .collect();
        let as_f64 = |series: Vec<(i32, f64)>| -> Vec<(f64, f64)> {
            series.into_iter().map(|(y, v)| (y as f64, v)).collect()
        };

        ScenarioLayer {
            degree: means.degree,
            points,
            median: as_f64(summary.series(|c| c.median)),
            band: summary
                .years
                .iter()
                .zip(&summary.columns)
                .filter_map(|(year, c)| Some((*year as f64, c.q25?, c.q75?)))
                .collect(),
            min: as_f64(summary.series(|c| c.min)),
            max: as_f64(summary.series(|c| c.max)),
        }
    }

    /// Closed outline of the interquartile band: 75% forward, 25% back.
    pub fn band_outline(&self) -> Vec<(f64, f64)> {
        self.band
            .iter()
            .map(|(x, _, hi)| (*x, *hi))
            .chain(self.band.iter().rev().map(|(x, lo, _)| (*x, *lo)))
            .collect()
    }
}

/// Range-of-projections chart for one indicator.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeriesChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub years: YearRange,
    /// Ambitious first.
    pub layers: Vec<ScenarioLayer>,
    pub legend: Vec<LegendEntry>,
}

impl TimeSeriesChart {
    pub fn new(
        indicator: Indicator,
        means: &ScenarioMeans,
        ambitious: &SummaryStats,
        moderate: &SummaryStats,
        years: YearRange,
    ) -> Self {
        let layers = vec![
            ScenarioLayer::new(&means.ambitious, ambitious),
            ScenarioLayer::new(&means.moderate, moderate),
        ];

        let mut legend = Vec::new();
        for degree in [Degree::Mod, Degree::Amb] {
            legend.push(LegendEntry::new(
                format!("{} scenario", capitalize(degree.name())),
                LegendGlyph::Marker {
                    color: degree_color(degree),
                    shape: degree_marker(degree),
                },
            ));
        }
        for degree in [Degree::Mod, Degree::Amb] {
            legend.push(LegendEntry::new(
                format!("Median ({})", degree.name()),
                LegendGlyph::Line {
                    color: degree_dark_color(degree),
                    dashed: true,
                },
            ));
        }
        for degree in [Degree::Mod, Degree::Amb] {
            legend.push(LegendEntry::new(
                format!("Range ({})", degree.name()),
                LegendGlyph::Patch {
                    color: degree_color(degree),
                    alpha: BAND_ALPHA,
                },
            ));
        }

        TimeSeriesChart {
            title: format!("Range of projections for {} scenarios", indicator.title()),
            x_label: "Year".to_string(),
            y_label: "Change in %".to_string(),
            years,
            layers,
            legend,
        }
    }

    pub fn y_range(&self) -> (f64, f64) {
        padded_range(self.layers.iter().flat_map(|l| {
            l.points
                .iter()
                .map(|p| p.1)
                .chain(l.band.iter().flat_map(|b| [b.1, b.2]))
        }))
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Draws the chart to an SVG file at `path`.
pub fn draw_time_series(chart: &TimeSeriesChart, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let (y_min, y_max) = chart.y_range();
    let x_min = chart.years.start as f64 - 0.5;
    let x_max = chart.years.end as f64 + 0.5;

    let root = SVGBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(render_error)?;

    let mut ctx = ChartBuilder::on(&root)
        .caption(&chart.title, (FONT, 26))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)
        .map_err(render_error)?;

    let x_label = |x: &f64| format!("{x:.0}");
    ctx.configure_mesh()
        .x_desc(chart.x_label.as_str())
        .y_desc(chart.y_label.as_str())
        .x_labels(chart.years.len())
        .x_label_formatter(&x_label)
        .label_style((FONT, 14))
        .draw()
        .map_err(render_error)?;

    for layer in &chart.layers {
        let color = degree_color(layer.degree);
        let dark = degree_dark_color(layer.degree);

        if layer.band.len() > 1 {
            ctx.draw_series(std::iter::once(Polygon::new(
                layer.band_outline(),
                color.mix(BAND_ALPHA).filled(),
            )))
            .map_err(render_error)?;
        }

        for envelope in [&layer.min, &layer.max] {
            ctx.draw_series(LineSeries::new(envelope.iter().copied(), color.mix(ENVELOPE_ALPHA)))
                .map_err(render_error)?;
        }

        let drawn = match degree_marker(layer.degree) {
            MarkerShape::Cross => ctx
                .draw_series(
                    layer
                        .points
                        .iter()
                        .map(|p| Cross::new(*p, 4, color.stroke_width(2))),
                )
                .map(|_| ()),
            _ => ctx
                .draw_series(layer.points.iter().map(|p| Circle::new(*p, 4, color.filled())))
                .map(|_| ()),
        };
        drawn.map_err(render_error)?;

        ctx.draw_series(
            dash_segments(&layer.median, 0.5)
                .into_iter()
                .map(|seg| PathElement::new(seg.to_vec(), dark.stroke_width(2))),
        )
        .map_err(render_error)?;
    }

    for entry in &chart.legend {
        add_legend(&mut ctx, entry)?;
    }
    ctx.configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(WHITE.mix(0.9))
        .border_style(BLACK)
        .label_font((FONT, 14))
        .draw()
        .map_err(render_error)?;

    root.present().map_err(render_error)?;
    info!(path = %path.display(), "Time series rendered");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chart() -> TimeSeriesChart {
        let make = |degree, values: Vec<Vec<Option<f64>>>| StudyMeans {
            indicator: Indicator::Gdp,
            degree,
            years: vec![2020, 2021, 2022],
            codes: (1..=values.len()).map(|i| format!("d{i:02}")).collect(),
            values,
        };
        let means = ScenarioMeans {
            ambitious: make(
                Degree::Amb,
                vec![
                    vec![Some(1.0), Some(2.0), Some(3.0)],
                    vec![Some(2.0), None, Some(5.0)],
                    vec![None, None, None],
                ],
            ),
            moderate: make(
                Degree::Mod,
                vec![
                    vec![Some(0.5), Some(1.0), None],
                    vec![None, None, None],
                    vec![None, None, None],
                ],
            ),
        };
        let amb = SummaryStats::describe(&means.ambitious);
        let moderate = SummaryStats::describe(&means.moderate);
        TimeSeriesChart::new(
            Indicator::Gdp,
            &means,
            &amb,
            &moderate,
            YearRange {
                start: 2020,
                end: 2022,
            },
        )
    }

    #[test]
    fn test_chart_model() {
        let chart = chart();
        assert_eq!(chart.title, "Range of projections for GDP scenarios");

        let labels: Vec<_> = chart.legend.iter().map(|e| e.label.as_str()).collect();
        assert_eq!(
            labels,
            vec![
                "Moderate scenario",
                "Ambitious scenario",
                "Median (moderate)",
                "Median (ambitious)",
                "Range (moderate)",
                "Range (ambitious)",
            ]
        );

        let amb = &chart.layers[0];
        assert_eq!(amb.degree, Degree::Amb);
        assert_eq!(amb.points.len(), 5);
        assert_eq!(amb.median, vec![(2020.0, 1.5), (2021.0, 2.0), (2022.0, 4.0)]);
        assert_eq!(chart.layers[1].median.len(), 2);
    }

    #[test]
    fn test_band_outline_closes() {
        let chart = chart();
        let outline = chart.layers[0].band_outline();
        assert_eq!(outline.len(), 6);
        assert_eq!(outline[0], (2020.0, 1.75));
        assert_eq!(outline[5], (2020.0, 1.25));
    }

    #[test]
    fn test_draw_writes_svg() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("time_ser_gdp.svg");

        draw_time_series(&chart(), &path).unwrap();

        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.contains("Median (ambitious)"));
    }
}
