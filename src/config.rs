//! Analysis settings.
//!
//! Stored as a JSON object on disk; every field is optional:
//! ```json
//! {
//!   "input": "data_source.xlsx",
//!   "study_codes": ["d01", "d02", "d03"],
//!   "year_range": { "start": 2020, "end": 2050 },
//!   "year": 2030
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::error::{AnalysisError, Result};

/// Number of studies in the meta-analysis.
pub const STUDY_COUNT: usize = 27;

/// Widest accepted projection range, in years.
pub const MAX_YEAR_SPAN: usize = 1000;

/// Inclusive range of projection years.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearRange {
    pub start: i32,
    pub end: i32,
}

impl YearRange {
    pub fn contains(&self, year: i32) -> bool {
        (self.start..=self.end).contains(&year)
    }

    pub fn years(&self) -> Vec<i32> {
        (self.start..=self.end).collect()
    }

    pub fn len(&self) -> usize {
        let span = i64::from(self.end) - i64::from(self.start) + 1;
        usize::try_from(span.max(0)).unwrap_or(usize::MAX)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for YearRange {
    fn default() -> Self {
        Self {
            start: 2020,
            end: 2050,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Source workbook with the `gdp`, `job` and `co2` sheets.
    pub input: PathBuf,
    /// Ordered study codes; every aggregate has exactly one row per code.
    pub study_codes: Vec<String>,
    pub year_range: YearRange,
    /// Year used by the boxplot and correlation pipelines.
    pub year: i32,
    pub output_dir: PathBuf,
    pub charts_dir: PathBuf,
    pub render_charts: bool,
    /// Also write every exported table as `<sheet>.csv` next to the workbook.
    pub export_csv: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("data_source.xlsx"),
            study_codes: default_study_codes(),
            year_range: YearRange::default(),
            year: 2030,
            output_dir: PathBuf::from("."),
            charts_dir: PathBuf::from("charts"),
            render_charts: true,
            export_csv: false,
        }
    }
}

/// `d01` through `d27`.
pub fn default_study_codes() -> Vec<String> {
    (1..=STUDY_COUNT).map(|i| format!("d{i:02}")).collect()
}

impl AnalysisConfig {
    /// Loads the config from a JSON file at `path` and validates it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: AnalysisConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.study_codes.is_empty() {
            return Err(AnalysisError::Config("study_codes is empty".into()));
        }
        let mut seen = HashSet::new();
        for code in &self.study_codes {
            if !seen.insert(code.as_str()) {
                return Err(AnalysisError::Config(format!(
                    "study code '{code}' listed twice"
                )));
            }
        }
        if self.year_range.is_empty() {
            return Err(AnalysisError::Config(format!(
                "year_range {}..={} is empty",
                self.year_range.start, self.year_range.end
            )));
        }
        if self.year_range.len() > MAX_YEAR_SPAN {
            return Err(AnalysisError::Config(format!(
                "year_range {}..={} spans more than {MAX_YEAR_SPAN} years",
                self.year_range.start, self.year_range.end
            )));
        }
        if !self.year_range.contains(self.year) {
            return Err(AnalysisError::Config(format!(
                "year {} outside {}..={}",
                self.year, self.year_range.start, self.year_range.end
            )));
        }
        Ok(())
    }
}
