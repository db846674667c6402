use serde::Serialize;

use crate::analyzers::types::{StudyMeans, Table};
use crate::analyzers::utility::{mean, present, quantile, sample_stddev, sorted};
use crate::dataset::{Degree, Indicator};

/// Row labels of an exported summary, in order.
pub const SUMMARY_ROWS: [&str; 8] = ["count", "mean", "std", "min", "25%", "50%", "75%", "max"];

/// Descriptive statistics of one year column across studies.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ColumnSummary {
    /// Studies with a value for this year.
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub q25: Option<f64>,
    pub median: Option<f64>,
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

impl ColumnSummary {
    /// Describes a column, ignoring missing values.
    pub fn from_values(values: &[Option<f64>]) -> Self {
        let data = sorted(&present(values));
        let avg = mean(&data);

        ColumnSummary {
            count: data.len(),
            mean: avg,
            std: avg.and_then(|m| sample_stddev(&data, m)),
            min: data.first().copied(),
            q25: quantile(&data, 0.25),
            median: quantile(&data, 0.5),
            q75: quantile(&data, 0.75),
            max: data.last().copied(),
        }
    }

    /// Values in [`SUMMARY_ROWS`] order.
    pub fn as_row(&self) -> [Option<f64>; 8] {
        [
            Some(self.count as f64),
            self.mean,
            self.std,
            self.min,
            self.q25,
            self.median,
            self.q75,
            self.max,
        ]
    }
}

/// Per-year summary of a [`StudyMeans`] frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryStats {
    pub indicator: Indicator,
    pub degree: Degree,
    pub years: Vec<i32>,
    pub columns: Vec<ColumnSummary>,
}

impl SummaryStats {
    pub fn describe(means: &StudyMeans) -> Self {
        let columns = (0..means.years.len())
            .map(|col| {
                let values: Vec<Option<f64>> = means.values.iter().map(|row| row[col]).collect();
                ColumnSummary::from_values(&values)
            })
            .collect();

        SummaryStats {
            indicator: means.indicator,
            degree: means.degree,
            years: means.years.clone(),
            columns,
        }
    }

    pub fn column(&self, year: i32) -> Option<&ColumnSummary> {
        let col = self.years.iter().position(|y| *y == year)?;
        self.columns.get(col)
    }

    /// Sum of the per-year counts.
    pub fn total_count(&self) -> usize {
        self.columns.iter().map(|c| c.count).sum()
    }

    /// `gdp_amb (n=3)`: boxplot category label with the sample count.
    pub fn label(&self) -> String {
        group_label(self.indicator, self.degree, self.total_count())
    }

    /// `(year, value)` points of one statistic, skipping years without data.
    pub fn series(&self, pick: impl Fn(&ColumnSummary) -> Option<f64>) -> Vec<(i32, f64)> {
        self.years
            .iter()
            .zip(&self.columns)
            .filter_map(|(year, c)| pick(c).map(|v| (*year, v)))
            .collect()
    }

    /// Statistics as rows, years as columns.
    pub fn to_table(&self) -> Table {
        let mut table = Table::new("stat", self.years.iter().map(i32::to_string).collect());
        for (i, name) in SUMMARY_ROWS.iter().enumerate() {
            table.push_row(*name, self.columns.iter().map(|c| c.as_row()[i]).collect());
        }
        table
    }
}

pub fn group_label(indicator: Indicator, degree: Degree, count: usize) -> String {
    format!("{}_{} (n={})", indicator.key(), degree.key(), count)
}
