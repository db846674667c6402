//! In-memory form of the source workbook.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// The quantity being projected; one sheet per indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Indicator {
    Gdp,
    Job,
    Co2,
}

impl Indicator {
    pub const ALL: [Indicator; 3] = [Indicator::Gdp, Indicator::Job, Indicator::Co2];

    /// Sheet name and short key used in labels.
    pub fn key(&self) -> &'static str {
        match self {
            Indicator::Gdp => "gdp",
            Indicator::Job => "job",
            Indicator::Co2 => "co2",
        }
    }

    /// Human title used in chart captions.
    pub fn title(&self) -> &'static str {
        match self {
            Indicator::Gdp => "GDP",
            Indicator::Job => "job creation",
            Indicator::Co2 => "CO2 emissions",
        }
    }
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Scenario ambition level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Degree {
    Amb,
    Mod,
}

impl Degree {
    /// Ambitious first: every stacked output follows this order.
    pub const ALL: [Degree; 2] = [Degree::Amb, Degree::Mod];

    pub fn key(&self) -> &'static str {
        match self {
            Degree::Amb => "amb",
            Degree::Mod => "mod",
        }
    }

    /// One-letter suffix used in exported sheet names (`gdp_a`, `gdp_m`).
    pub fn short(&self) -> &'static str {
        match self {
            Degree::Amb => "a",
            Degree::Mod => "m",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Degree::Amb => "ambitious",
            Degree::Mod => "moderate",
        }
    }

    /// Parses the `degree` cell; surrounding whitespace and case are ignored.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "amb" => Some(Degree::Amb),
            "mod" => Some(Degree::Mod),
            _ => None,
        }
    }
}

impl fmt::Display for Degree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// One scenario projection row of a sheet.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioRow {
    /// Raw row key from the first column, e.g. `d04_eu_1`.
    pub key: String,
    /// Positions into the configured study codes this row belongs to.
    pub studies: Vec<usize>,
    pub country: String,
    pub degree: Degree,
    pub scenario: String,
    /// Remaining non-year columns (title, author, proxy, ...).
    pub metadata: BTreeMap<String, String>,
    /// One value per configured year, missing cells are `None`.
    pub values: Vec<Option<f64>>,
}

/// A parsed indicator sheet.
#[derive(Debug, Clone, Serialize)]
pub struct Dataset {
    pub indicator: Indicator,
    pub years: Vec<i32>,
    pub rows: Vec<ScenarioRow>,
}

impl Dataset {
    pub fn rows_for(&self, degree: Degree) -> impl Iterator<Item = &ScenarioRow> {
        self.rows.iter().filter(move |r| r.degree == degree)
    }
}

/// The three indicator sheets of one source workbook.
#[derive(Debug, Clone, Serialize)]
pub struct Workbook {
    pub gdp: Dataset,
    pub job: Dataset,
    pub co2: Dataset,
}

impl Workbook {
    pub fn get(&self, indicator: Indicator) -> &Dataset {
        match indicator {
            Indicator::Gdp => &self.gdp,
            Indicator::Job => &self.job,
            Indicator::Co2 => &self.co2,
        }
    }
}

/// Maps raw row keys to the study codes they contain.
///
/// Built once while loading so aggregation never does string matching.
#[derive(Debug, Clone)]
pub struct StudyIndex<'a> {
    codes: &'a [String],
}

impl<'a> StudyIndex<'a> {
    pub fn new(codes: &'a [String]) -> Self {
        Self { codes }
    }

    /// Positions of every study code contained in `key`, in code order.
    pub fn studies_for(&self, key: &str) -> Vec<usize> {
        self.codes
            .iter()
            .enumerate()
            .filter(|(_, code)| key.contains(code.as_str()))
            .map(|(i, _)| i)
            .collect()
    }
}
