//! Box statistics of study means for one year, per indicator and degree.

use serde::Serialize;

use crate::analyzers::types::{StudyMeans, Table};
use crate::analyzers::utility::{present, quantile, sorted};
use crate::dataset::{Degree, Indicator};
use crate::error::{AnalysisError, Result};
use crate::stats::SummaryStats;

/// Whisker reach as a multiple of the interquartile range.
pub const WHISKER_IQR: f64 = 1.5;

/// Quartiles, whiskers and outliers of one box.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxStats {
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    /// Lowest value within `q1 - 1.5 * IQR`.
    pub whisker_low: f64,
    /// Highest value within `q3 + 1.5 * IQR`.
    pub whisker_high: f64,
    pub outliers: Vec<f64>,
}

impl BoxStats {
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let data = sorted(values);
        let q1 = quantile(&data, 0.25)?;
        let median = quantile(&data, 0.5)?;
        let q3 = quantile(&data, 0.75)?;
        let iqr = q3 - q1;
        let (low_fence, high_fence) = (q1 - WHISKER_IQR * iqr, q3 + WHISKER_IQR * iqr);

        let inside: Vec<f64> = data
            .iter()
            .copied()
            .filter(|v| (low_fence..=high_fence).contains(v))
            .collect();
        let outliers = data
            .iter()
            .copied()
            .filter(|v| !(low_fence..=high_fence).contains(v))
            .collect();

        Some(BoxStats {
            q1,
            median,
            q3,
            whisker_low: inside.first().copied().unwrap_or(q1),
            whisker_high: inside.last().copied().unwrap_or(q3),
            outliers,
        })
    }
}

/// One category of the boxplot, e.g. `gdp_amb (n=12)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxplotGroup {
    pub indicator: Indicator,
    pub degree: Degree,
    pub year: i32,
    pub label: String,
    pub means: StudyMeans,
    pub summary: SummaryStats,
    /// `None` when no study has a value for the year.
    pub stats: Option<BoxStats>,
}

impl BoxplotGroup {
    /// Builds the group from the full-range means of one indicator and degree.
    pub fn from_means(means: &StudyMeans, year: i32) -> Result<Self> {
        let slice = means.year_slice(year).ok_or_else(|| {
            AnalysisError::DataFormat(format!(
                "year {year} is not among the {} projection years",
                means.indicator
            ))
        })?;
        let summary = SummaryStats::describe(&slice);
        let values = present(&slice.values.iter().map(|row| row[0]).collect::<Vec<_>>());

        Ok(BoxplotGroup {
            indicator: means.indicator,
            degree: means.degree,
            year,
            label: summary.label(),
            stats: BoxStats::from_values(&values),
            means: slice,
            summary,
        })
    }

    /// Study values under a single `val` column, as exported.
    pub fn to_table(&self) -> Table {
        let mut table = Table::new("study", vec!["val".to_string()]);
        for (code, row) in self.means.codes.iter().zip(&self.means.values) {
            table.push_row(code.clone(), row.clone());
        }
        table
    }

    /// Exported sheet name stem: `gdp_a`, `co2_m`, ...
    pub fn sheet_name(&self) -> String {
        format!("{}_{}", self.indicator.key(), self.degree.short())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_study_codes;

    #[test]
    fn test_box_stats_without_outliers() {
        let stats = BoxStats::from_values(&[4.0, 1.0, 3.0, 2.0]).unwrap();
        assert_eq!(stats.q1, 1.75);
        assert_eq!(stats.median, 2.5);
        assert_eq!(stats.q3, 3.25);
        assert_eq!(stats.whisker_low, 1.0);
        assert_eq!(stats.whisker_high, 4.0);
        assert!(stats.outliers.is_empty());
    }

    #[test]
    fn test_box_stats_flags_outlier() {
        let stats = BoxStats::from_values(&[1.0, 2.0, 3.0, 4.0, 50.0]).unwrap();
        assert_eq!(stats.outliers, vec![50.0]);
        assert_eq!(stats.whisker_high, 4.0);
    }

    #[test]
    fn test_box_stats_empty() {
        assert_eq!(BoxStats::from_values(&[]), None);
    }

    #[test]
    fn test_group_label_and_table() {
        let codes = default_study_codes();
        let mut values = vec![vec![None, None]; 27];
        values[0] = vec![Some(1.0), Some(5.0)];
        values[1] = vec![Some(1.0), Some(6.0)];
        values[2] = vec![None, Some(7.0)];
        let means = StudyMeans {
            indicator: Indicator::Job,
            degree: Degree::Amb,
            years: vec![2020, 2030],
            codes,
            values,
        };

        let group = BoxplotGroup::from_means(&means, 2030).unwrap();
        assert_eq!(group.label, "job_amb (n=3)");
        assert_eq!(group.sheet_name(), "job_a");
        assert_eq!(group.stats.as_ref().unwrap().median, 6.0);

        let table = group.to_table();
        assert_eq!(table.n_rows(), 27);
        assert_eq!(table.get("d03", "val"), Some(7.0));
        assert_eq!(table.get("d04", "val"), None);

        assert!(matches!(
            BoxplotGroup::from_means(&means, 2050),
            Err(AnalysisError::DataFormat(_))
        ));
    }
}
