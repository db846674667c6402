use plotters::prelude::*;
use std::path::Path;
use tracing::info;

use super::{
    CHART_SIZE, FONT, LegendEntry, LegendGlyph, MarkerShape, SvgContext, add_legend, degree_color,
    diamond, padded_range, render_error,
};
use crate::analyzers::boxplot::{BoxStats, BoxplotGroup};
use crate::dataset::Degree;
use crate::error::Result;

/// Half the box height in category units.
const BOX_HALF_HEIGHT: f64 = 0.125;
pub const BOX_ALPHA: f64 = 0.3;

#[derive(Debug, Clone, PartialEq)]
pub struct BoxCategory {
    pub label: String,
    pub degree: Degree,
    pub stats: Option<BoxStats>,
}

/// Horizontal boxplot: one box per indicator and degree, value on the x axis.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxplotChart {
    pub title: String,
    pub x_label: String,
    /// Top to bottom.
    pub categories: Vec<BoxCategory>,
    pub legend: Vec<LegendEntry>,
}

impl BoxplotChart {
    pub fn new(groups: &[BoxplotGroup], year: i32) -> Self {
        let categories = groups
            .iter()
            .map(|g| BoxCategory {
                label: g.label.clone(),
                degree: g.degree,
                stats: g.stats.clone(),
            })
            .collect();

        let legend = vec![
            LegendEntry::new(
                "moderate scenarios",
                LegendGlyph::Patch {
                    color: degree_color(Degree::Mod),
                    alpha: BOX_ALPHA,
                },
            ),
            LegendEntry::new(
                "ambitious scenarios",
                LegendGlyph::Patch {
                    color: degree_color(Degree::Amb),
                    alpha: BOX_ALPHA,
                },
            ),
            LegendEntry::new(
                "median",
                LegendGlyph::Line {
                    color: BLACK,
                    dashed: false,
                },
            ),
            LegendEntry::new(
                "outliers",
                LegendGlyph::Marker {
                    color: BLACK,
                    shape: MarkerShape::Diamond,
                },
            ),
        ];

        BoxplotChart {
            title: format!("Boxplot of scenarios per indicator for {year}"),
            x_label: "Change in %".to_string(),
            categories,
            legend,
        }
    }

    /// Padded extent of every whisker and outlier.
    pub fn x_range(&self) -> (f64, f64) {
        padded_range(self.categories.iter().filter_map(|c| c.stats.as_ref()).flat_map(|s| {
            [s.whisker_low, s.whisker_high]
                .into_iter()
                .chain(s.outliers.iter().copied())
        }))
    }

    /// Vertical center of the `i`-th category; the first one sits on top.
    fn center(&self, i: usize) -> f64 {
        (self.categories.len() - 1 - i) as f64
    }
}

/// Draws the chart to an SVG file at `path`.
pub fn draw_boxplot(chart: &BoxplotChart, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let n = chart.categories.len().max(1);
    let (x_min, x_max) = chart.x_range();
    let root = SVGBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(render_error)?;

    let mut ctx = ChartBuilder::on(&root)
        .caption(&chart.title, (FONT, 26))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(170)
        .build_cartesian_2d(x_min..x_max, -0.5f64..(n as f64 - 0.5))
        .map_err(render_error)?;

    let labels: Vec<String> = chart.categories.iter().map(|c| c.label.clone()).collect();
    let y_label = |y: &f64| -> String {
        let rounded = y.round();
        if (y - rounded).abs() > 1e-6 || rounded < 0.0 {
            return String::new();
        }
        labels
            .len()
            .checked_sub(1 + rounded as usize)
            .and_then(|i| labels.get(i).cloned())
            .unwrap_or_default()
    };

    ctx.configure_mesh()
        .disable_y_mesh()
        .x_desc(chart.x_label.as_str())
        .y_labels(n)
        .y_label_formatter(&y_label)
        .label_style((FONT, 16))
        .draw()
        .map_err(render_error)?;

    for (i, category) in chart.categories.iter().enumerate() {
        if let Some(stats) = &category.stats {
            draw_box(&mut ctx, stats, chart.center(i), degree_color(category.degree))?;
        }
    }

    for entry in &chart.legend {
        add_legend(&mut ctx, entry)?;
    }
    ctx.configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(WHITE.mix(0.9))
        .border_style(BLACK)
        .label_font((FONT, 16))
        .draw()
        .map_err(render_error)?;

    root.present().map_err(render_error)?;
    info!(path = %path.display(), boxes = chart.categories.len(), "Boxplot rendered");
    Ok(())
}

fn draw_box(ctx: &mut SvgContext<'_, '_>, stats: &BoxStats, y: f64, color: RGBColor) -> Result<()> {
    let (top, bottom) = (y + BOX_HALF_HEIGHT, y - BOX_HALF_HEIGHT);
    let cap = BOX_HALF_HEIGHT / 2.0;

    ctx.draw_series([
        Rectangle::new([(stats.q1, bottom), (stats.q3, top)], color.mix(BOX_ALPHA).filled()),
        Rectangle::new([(stats.q1, bottom), (stats.q3, top)], BLACK.stroke_width(1)),
    ])
    .map_err(render_error)?;

    ctx.draw_series([
        PathElement::new(vec![(stats.whisker_low, y), (stats.q1, y)], BLACK.stroke_width(1)),
        PathElement::new(vec![(stats.q3, y), (stats.whisker_high, y)], BLACK.stroke_width(1)),
        PathElement::new(
            vec![(stats.whisker_low, y - cap), (stats.whisker_low, y + cap)],
            BLACK.stroke_width(1),
        ),
        PathElement::new(
            vec![(stats.whisker_high, y - cap), (stats.whisker_high, y + cap)],
            BLACK.stroke_width(1),
        ),
        PathElement::new(
            vec![(stats.median, bottom), (stats.median, top)],
            BLACK.stroke_width(2),
        ),
    ])
    .map_err(render_error)?;

    ctx.draw_series(
        stats
            .outliers
            .iter()
            .map(|v| EmptyElement::at((*v, y)) + Polygon::new(diamond(5), BLACK.filled())),
    )
    .map_err(render_error)?;

    Ok(())
}
