//! The three analysis pipelines and their render/export adapters.
//!
//! `time_series`, `boxplots` and `correlation` are pure functions of a loaded
//! [`Workbook`]; `render_*` and `export_*` write their results to disk, and
//! [`run`] wires loading, analysis and output together.

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use std::path::PathBuf;
use tracing::{debug, info};

use crate::analyzers::aggregate::scenario_means;
use crate::analyzers::boxplot::BoxplotGroup;
use crate::analyzers::correlation::{
    CorrelationInput, CorrelationMatrix, correlation_input, pearson_matrix,
};
use crate::analyzers::types::{ScenarioMeans, Table};
use crate::config::AnalysisConfig;
use crate::dataset::{Degree, Indicator, Workbook};
use crate::output::{export_tables, format_table, print_json};
use crate::parser::load_workbook;
use crate::render::boxplot::{BoxplotChart, draw_boxplot};
use crate::render::timeseries::{TimeSeriesChart, draw_time_series};
use crate::stats::SummaryStats;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pipeline {
    TimeSeries,
    Boxplot,
    Correlation,
}

impl Pipeline {
    pub const ALL: [Pipeline; 3] = [Pipeline::TimeSeries, Pipeline::Boxplot, Pipeline::Correlation];

    /// Name used in the exported workbook file name.
    pub fn file_key(&self) -> &'static str {
        match self {
            Pipeline::TimeSeries => "time_ser",
            Pipeline::Boxplot => "boxplot",
            Pipeline::Correlation => "corr",
        }
    }
}

/// Study means and summaries of one indicator over the full year range.
#[derive(Debug, Clone)]
pub struct IndicatorSeries {
    pub indicator: Indicator,
    pub means: ScenarioMeans,
    pub ambitious: SummaryStats,
    pub moderate: SummaryStats,
}

impl IndicatorSeries {
    pub fn summary(&self, degree: Degree) -> &SummaryStats {
        match degree {
            Degree::Amb => &self.ambitious,
            Degree::Mod => &self.moderate,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TimeSeriesResults {
    pub series: Vec<IndicatorSeries>,
}

impl TimeSeriesResults {
    /// `gdp_a`, `gdp_a_sum`, `gdp_m`, `gdp_m_sum`, `job_a`, ...
    pub fn sheets(&self) -> Vec<(String, Table)> {
        let mut sheets = Vec::new();
        for s in &self.series {
            for degree in Degree::ALL {
                let stem = format!("{}_{}", s.indicator.key(), degree.short());
                sheets.push((stem.clone(), s.means.get(degree).to_table()));
                sheets.push((format!("{stem}_sum"), s.summary(degree).to_table()));
            }
        }
        sheets
    }
}

#[derive(Debug, Clone)]
pub struct BoxplotResults {
    pub year: i32,
    /// gdp_amb, gdp_mod, job_amb, job_mod, co2_amb, co2_mod.
    pub groups: Vec<BoxplotGroup>,
}

impl BoxplotResults {
    pub fn sheets(&self) -> Vec<(String, Table)> {
        self.groups
            .iter()
            .flat_map(|g| {
                [
                    (g.sheet_name(), g.to_table()),
                    (format!("{}_sum", g.sheet_name()), g.summary.to_table()),
                ]
            })
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct CorrelationResults {
    pub input: CorrelationInput,
    pub matrix: CorrelationMatrix,
}

impl CorrelationResults {
    pub fn sheets(&self) -> Vec<(String, Table)> {
        vec![
            ("val".to_string(), self.input.to_table()),
            ("corr".to_string(), self.matrix.to_table()),
        ]
    }
}

/// Study means and per-year summaries of every indicator.
pub fn time_series(workbook: &Workbook, config: &AnalysisConfig) -> TimeSeriesResults {
    let series = Indicator::ALL
        .iter()
        .map(|indicator| {
            let means = scenario_means(workbook.get(*indicator), &config.study_codes);
            IndicatorSeries {
                indicator: *indicator,
                ambitious: SummaryStats::describe(&means.ambitious),
                moderate: SummaryStats::describe(&means.moderate),
                means,
            }
        })
        .collect();

    TimeSeriesResults { series }
}

/// Boxplot categories of every indicator and degree for `year`.
pub fn boxplots(
    workbook: &Workbook,
    year: i32,
    config: &AnalysisConfig,
) -> crate::error::Result<BoxplotResults> {
    let mut groups = Vec::new();
    for indicator in Indicator::ALL {
        let means = scenario_means(workbook.get(indicator), &config.study_codes);
        for degree in Degree::ALL {
            let group = BoxplotGroup::from_means(means.get(degree), year)?;
            debug!(label = %group.label, "Boxplot group assembled");
            groups.push(group);
        }
    }
    Ok(BoxplotResults { year, groups })
}

/// Pearson correlation of gdp, job and co2 study means for `year`.
pub fn correlation(
    workbook: &Workbook,
    year: i32,
    config: &AnalysisConfig,
) -> crate::error::Result<CorrelationResults> {
    let means = |indicator| scenario_means(workbook.get(indicator), &config.study_codes);
    let input = correlation_input(
        &means(Indicator::Gdp),
        &means(Indicator::Job),
        &means(Indicator::Co2),
        year,
    )?;
    let matrix = pearson_matrix(&input);
    Ok(CorrelationResults { input, matrix })
}

/// One SVG per indicator: `<charts_dir>/time_ser_<indicator>.svg`.
pub fn render_time_series(
    results: &TimeSeriesResults,
    config: &AnalysisConfig,
) -> crate::error::Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for s in &results.series {
        let chart = TimeSeriesChart::new(
            s.indicator,
            &s.means,
            &s.ambitious,
            &s.moderate,
            config.year_range,
        );
        let path = config
            .charts_dir
            .join(format!("time_ser_{}.svg", s.indicator.key()));
        draw_time_series(&chart, &path)?;
        paths.push(path);
    }
    Ok(paths)
}

/// `<charts_dir>/boxplot_<year>.svg`
pub fn render_boxplots(
    results: &BoxplotResults,
    config: &AnalysisConfig,
) -> crate::error::Result<PathBuf> {
    let chart = BoxplotChart::new(&results.groups, results.year);
    let path = config.charts_dir.join(format!("boxplot_{}.svg", results.year));
    draw_boxplot(&chart, &path)?;
    Ok(path)
}

/// Writes `results_<pipeline>_<date>.xlsx` into the output directory.
pub fn export(
    pipeline: Pipeline,
    sheets: &[(String, Table)],
    config: &AnalysisConfig,
    date: NaiveDate,
) -> crate::error::Result<PathBuf> {
    let borrowed: Vec<(String, &Table)> = sheets.iter().map(|(n, t)| (n.clone(), t)).collect();
    export_tables(
        &config.output_dir,
        pipeline.file_key(),
        date,
        &borrowed,
        config.export_csv,
    )
}

/// Logs the correlation matrix the way it is read in a console.
pub fn log_correlation(results: &CorrelationResults) -> crate::error::Result<()> {
    let table = results.matrix.to_table();
    info!(
        year = results.matrix.year,
        rows = results.input.rows.len(),
        "Correlation matrix (Pearson method)\n{}",
        format_table(&table)
    );
    print_json(&table)
}

/// Loads the workbook once and runs each requested pipeline start to finish.
///
/// Returns every file written.
#[tracing::instrument(skip(config), fields(input = %config.input.display(), year = config.year))]
pub fn run(pipelines: &[Pipeline], config: &AnalysisConfig) -> Result<Vec<PathBuf>> {
    config.validate().context("Invalid configuration")?;
    let workbook = load_workbook(&config.input, config)
        .with_context(|| format!("Failed to load {}", config.input.display()))?;
    let date = Local::now().date_naive();
    let mut written = Vec::new();

    for pipeline in pipelines {
        info!(pipeline = pipeline.file_key(), "Running pipeline");
        match pipeline {
            Pipeline::TimeSeries => {
                let results = time_series(&workbook, config);
                if config.render_charts {
                    written.extend(
                        render_time_series(&results, config)
                            .context("Failed to render time series charts")?,
                    );
                }
                written.push(
                    export(*pipeline, &results.sheets(), config, date)
                        .context("Failed to export time series results")?,
                );
            }
            Pipeline::Boxplot => {
                let results = boxplots(&workbook, config.year, config)?;
                if config.render_charts {
                    written.push(
                        render_boxplots(&results, config).context("Failed to render boxplot")?,
                    );
                }
                written.push(
                    export(*pipeline, &results.sheets(), config, date)
                        .context("Failed to export boxplot results")?,
                );
            }
            Pipeline::Correlation => {
                let results = correlation(&workbook, config.year, config)?;
                log_correlation(&results)?;
                written.push(
                    export(*pipeline, &results.sheets(), config, date)
                        .context("Failed to export correlation results")?,
                );
            }
        }
    }

    info!(files = written.len(), "All pipelines finished");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::YearRange;
    use crate::dataset::{Dataset, ScenarioRow};
    use std::collections::BTreeMap;

    fn row(study: usize, degree: Degree, values: Vec<Option<f64>>) -> ScenarioRow {
        ScenarioRow {
            key: format!("d{:02}_x", study + 1),
            studies: vec![study],
            country: "EU".into(),
            degree,
            scenario: "s".into(),
            metadata: BTreeMap::new(),
            values,
        }
    }

    fn config() -> AnalysisConfig {
        AnalysisConfig {
            year_range: YearRange {
                start: 2020,
                end: 2021,
            },
            year: 2021,
            ..Default::default()
        }
    }

    fn workbook() -> Workbook {
        let make = |indicator, scale: f64| Dataset {
            indicator,
            years: vec![2020, 2021],
            rows: vec![
                row(0, Degree::Amb, vec![Some(1.0 * scale), Some(2.0 * scale)]),
                row(1, Degree::Amb, vec![Some(2.0 * scale), Some(3.0 * scale)]),
                row(2, Degree::Amb, vec![None, Some(5.0 * scale)]),
                row(0, Degree::Mod, vec![Some(0.5 * scale), Some(1.0 * scale)]),
                row(1, Degree::Mod, vec![Some(0.7 * scale), Some(1.5 * scale)]),
            ],
        };
        Workbook {
            gdp: make(Indicator::Gdp, 1.0),
            job: make(Indicator::Job, 2.0),
            co2: make(Indicator::Co2, -1.0),
        }
    }

    #[test]
    fn test_time_series_sheet_names() {
        let results = time_series(&workbook(), &config());
        let names: Vec<String> = results.sheets().into_iter().map(|(n, _)| n).collect();
        assert_eq!(
            names,
            vec![
                "gdp_a", "gdp_a_sum", "gdp_m", "gdp_m_sum", "job_a", "job_a_sum", "job_m",
                "job_m_sum", "co2_a", "co2_a_sum", "co2_m", "co2_m_sum",
            ]
        );
        assert_eq!(results.series[0].means.ambitious.values.len(), 27);
    }

    #[test]
    fn test_boxplot_labels() {
        let results = boxplots(&workbook(), 2021, &config()).unwrap();
        let labels: Vec<&str> = results.groups.iter().map(|g| g.label.as_str()).collect();
        assert_eq!(
            labels,
            vec![
                "gdp_amb (n=3)",
                "gdp_mod (n=2)",
                "job_amb (n=3)",
                "job_mod (n=2)",
                "co2_amb (n=3)",
                "co2_mod (n=2)",
            ]
        );
    }

    #[test]
    fn test_correlation_of_scaled_indicators() {
        let results = correlation(&workbook(), 2021, &config()).unwrap();
        assert_eq!(results.input.rows.len(), 54);

        let r = results.matrix.get(Indicator::Gdp, Indicator::Job).unwrap();
        assert!((r - 1.0).abs() < 1e-12);
        let r = results.matrix.get(Indicator::Gdp, Indicator::Co2).unwrap();
        assert!((r + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_file_keys() {
        assert_eq!(Pipeline::TimeSeries.file_key(), "time_ser");
        assert_eq!(Pipeline::Correlation.file_key(), "corr");
    }
}
