//! Workbook loader for the `gdp`, `job` and `co2` projection sheets.

use calamine::{Data, Reader, open_workbook_auto};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::{debug, info, warn};

use crate::config::AnalysisConfig;
use crate::dataset::{Dataset, Degree, Indicator, ScenarioRow, StudyIndex, Workbook};
use crate::error::{AnalysisError, Result};

const NA_MARKERS: &[&str] = &["na", "n/a", "nan", "-nan", "null", "#n/a", "-"];

/// Opens the workbook at `path` and parses its three indicator sheets.
///
/// # Errors
///
/// [`AnalysisError::Io`] if the file does not exist, [`AnalysisError::Workbook`]
/// if it is not a readable spreadsheet, and a data-format error if a sheet or
/// column is missing or a year cell is not numeric.
pub fn load_workbook(path: impl AsRef<Path>, config: &AnalysisConfig) -> Result<Workbook> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} not found", path.display()),
        )
        .into());
    }

    info!(path = %path.display(), "Loading workbook");
    let mut workbook = open_workbook_auto(path)?;
    let sheet_names = workbook.sheet_names();

    let mut load = |indicator: Indicator| -> Result<Dataset> {
        let name = indicator.key();
        if !sheet_names.iter().any(|s| s == name) {
            return Err(AnalysisError::MissingSheet(name.to_string()));
        }
        let range = workbook.worksheet_range(name)?;
        let dataset = parse_sheet(indicator, range.rows(), config)?;
        info!(indicator = name, rows = dataset.rows.len(), "Sheet parsed");
        Ok(dataset)
    };

    Ok(Workbook {
        gdp: load(Indicator::Gdp)?,
        job: load(Indicator::Job)?,
        co2: load(Indicator::Co2)?,
    })
}

/// Parses one sheet grid: header in the first row, row key in the first column.
pub fn parse_sheet<'a, I>(indicator: Indicator, rows: I, config: &AnalysisConfig) -> Result<Dataset>
where
    I: IntoIterator<Item = &'a [Data]>,
{
    let sheet = indicator.key();
    let mut rows = rows.into_iter();
    let header: Vec<String> = match rows.next() {
        Some(cells) => cells.iter().map(cell_text).collect(),
        None => return Err(AnalysisError::DataFormat(format!("sheet '{sheet}' is empty"))),
    };

    let column = |name: &str| -> Result<usize> {
        header
            .iter()
            .skip(1)
            .position(|h| h == name)
            .map(|p| p + 1)
            .ok_or_else(|| AnalysisError::MissingColumn {
                sheet: sheet.to_string(),
                column: name.to_string(),
            })
    };
    let country_col = column("country")?;
    let degree_col = column("degree")?;
    let scenario_col = column("scenario")?;

    let mut year_cols: HashMap<i32, usize> = HashMap::new();
    for (col, text) in header.iter().enumerate().skip(1) {
        if let Some(year) = parse_year(text) {
            year_cols.insert(year, col);
        }
    }
    let years = config.year_range.years();
    let value_cols = years
        .iter()
        .map(|year| {
            year_cols
                .get(year)
                .copied()
                .ok_or_else(|| AnalysisError::MissingColumn {
                    sheet: sheet.to_string(),
                    column: year.to_string(),
                })
        })
        .collect::<Result<Vec<usize>>>()?;

    let metadata_cols: Vec<usize> = (1..header.len())
        .filter(|c| {
            *c != country_col
                && *c != degree_col
                && *c != scenario_col
                && !year_cols.values().any(|y| y == c)
                && !header[*c].is_empty()
        })
        .collect();

    let index = StudyIndex::new(&config.study_codes);
    let mut parsed = Vec::new();

    for (line, cells) in rows.enumerate() {
        if cells.iter().all(|c| matches!(c, Data::Empty)) {
            continue;
        }
        let text_at = |col: usize| cells.get(col).map(cell_text).unwrap_or_default();

        let key = text_at(0);
        if key.is_empty() {
            return Err(AnalysisError::DataFormat(format!(
                "sheet '{sheet}', line {}: missing row key",
                line + 2
            )));
        }

        let raw_degree = text_at(degree_col);
        let degree = Degree::parse(&raw_degree).ok_or_else(|| AnalysisError::InvalidDegree {
            sheet: sheet.to_string(),
            row: key.clone(),
            value: raw_degree.clone(),
        })?;

        let values = value_cols
            .iter()
            .zip(&years)
            .map(|(col, year)| match cells.get(*col) {
                None => Ok(None),
                Some(cell) => parse_number(cell).map_err(|value| AnalysisError::NonNumeric {
                    sheet: sheet.to_string(),
                    row: key.clone(),
                    column: year.to_string(),
                    value,
                }),
            })
            .collect::<Result<Vec<_>>>()?;

        let studies = index.studies_for(&key);
        if studies.is_empty() {
            warn!(sheet, row = %key, "Row key matches no study code");
        }

        let metadata: BTreeMap<String, String> = metadata_cols
            .iter()
            .map(|c| (header[*c].clone(), text_at(*c)))
            .collect();

        parsed.push(ScenarioRow {
            key,
            studies,
            country: text_at(country_col),
            degree,
            scenario: text_at(scenario_col),
            metadata,
            values,
        });
    }

    debug!(sheet, rows = parsed.len(), years = years.len(), "Parsed sheet grid");

    Ok(Dataset {
        indicator,
        years,
        rows: parsed,
    })
}

/// Interprets a cell as a percentage value.
///
/// Returns `Ok(None)` for empty, error and NA cells, and `Err` with the raw
/// text when the cell holds something that is not a number. Text cells
/// written with a decimal comma (`"5,3"`) are accepted.
pub fn parse_number(cell: &Data) -> std::result::Result<Option<f64>, String> {
    match cell {
        Data::Empty | Data::Error(_) => Ok(None),
        Data::Float(f) if f.is_nan() => Ok(None),
        Data::Float(f) => Ok(Some(*f)),
        Data::Int(i) => Ok(Some(*i as f64)),
        Data::String(s) => parse_decimal_text(s),
        other => Err(other.to_string()),
    }
}

fn parse_decimal_text(raw: &str) -> std::result::Result<Option<f64>, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || NA_MARKERS.contains(&trimmed.to_ascii_lowercase().as_str()) {
        return Ok(None);
    }
    trimmed
        .replace(',', ".")
        .parse::<f64>()
        .map(Some)
        .map_err(|_| raw.to_string())
}

/// Text form of a header or label cell. Whole floats lose their `.0`.
pub fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.is_finite() => format!("{}", *f as i64),
        other => other.to_string().trim().to_string(),
    }
}

fn parse_year(text: &str) -> Option<i32> {
    if let Ok(year) = text.parse::<i32>() {
        return Some(year);
    }
    text.parse::<f64>()
        .ok()
        .filter(|f| f.fract() == 0.0)
        .map(|f| f as i32)
}
