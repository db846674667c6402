//! Output formatting and persistence for result tables.
//!
//! Supports aligned text, JSON logging, dated workbook export with one sheet
//! per table, CSV copies, and reading an exported sheet back.

use calamine::{Reader, open_workbook_auto};
use chrono::NaiveDate;
use csv::WriterBuilder;
use rust_xlsxwriter::{Workbook, XlsxError};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::analyzers::types::Table;
use crate::error::{AnalysisError, Result};
use crate::parser::{cell_text, parse_number};

/// Logs a table as pretty-printed JSON at debug level.
pub fn print_json(table: &Table) -> Result<()> {
    debug!("{}", serde_json::to_string_pretty(table)?);
    Ok(())
}

/// Renders a table as aligned text, four decimals, `NaN` for missing cells.
pub fn format_table(table: &Table) -> String {
    let cell = |v: &Option<f64>| v.map_or_else(|| "NaN".to_string(), |v| format!("{v:.4}"));
    let width = table
        .columns
        .iter()
        .map(String::len)
        .chain(table.cells.iter().flatten().map(|v| cell(v).len()))
        .max()
        .unwrap_or(0);
    let label_width = table
        .index
        .iter()
        .chain(std::iter::once(&table.index_label))
        .map(String::len)
        .max()
        .unwrap_or(0);

    let mut out = format!("{:<label_width$}", "");
    for column in &table.columns {
        let _ = write!(out, "  {column:>width$}");
    }
    for (label, row) in table.index.iter().zip(&table.cells) {
        let _ = write!(out, "\n{label:<label_width$}");
        for value in row {
            let _ = write!(out, "  {:>width$}", cell(value));
        }
    }
    out
}

/// `results_<pipeline>_<YYYYMMDD>.xlsx`
pub fn dated_filename(pipeline: &str, date: NaiveDate) -> String {
    format!("results_{}_{}.xlsx", pipeline, date.format("%Y%m%d"))
}

/// Writes each table to its own named sheet.
///
/// The first row holds the index label and the column labels, the first column
/// the row labels. Missing cells stay blank.
pub fn write_workbook(path: impl AsRef<Path>, sheets: &[(String, &Table)]) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut workbook = Workbook::new();
    for (name, table) in sheets {
        let sheet = workbook.add_worksheet();
        sheet.set_name(name.as_str()).map_err(export_error)?;

        sheet
            .write_string(0, 0, table.index_label.as_str())
            .map_err(export_error)?;
        for (c, column) in table.columns.iter().enumerate() {
            sheet
                .write_string(0, (c + 1) as u16, column.as_str())
                .map_err(export_error)?;
        }

        for (r, (label, row)) in table.index.iter().zip(&table.cells).enumerate() {
            let excel_row = (r + 1) as u32;
            sheet
                .write_string(excel_row, 0, label.as_str())
                .map_err(export_error)?;
            for (c, value) in row.iter().enumerate() {
                if let Some(v) = value {
                    sheet
                        .write_number(excel_row, (c + 1) as u16, *v)
                        .map_err(export_error)?;
                }
            }
        }
        debug!(sheet = %name, rows = table.n_rows(), "Sheet written");
    }

    workbook.save(path).map_err(export_error)?;
    info!(path = %path.display(), sheets = sheets.len(), "Workbook exported");
    Ok(())
}

fn export_error(err: XlsxError) -> AnalysisError {
    match err {
        XlsxError::IoError(e) => AnalysisError::Io(e),
        other => AnalysisError::Export(other),
    }
}

/// Reads a sheet written by [`write_workbook`] back into a [`Table`].
pub fn read_table(path: impl AsRef<Path>, sheet: &str) -> Result<Table> {
    let path = path.as_ref();
    let mut workbook = open_workbook_auto(path)?;
    if !workbook.sheet_names().iter().any(|s| s == sheet) {
        return Err(AnalysisError::MissingSheet(sheet.to_string()));
    }
    let range = workbook.worksheet_range(sheet)?;
    let mut rows = range.rows();

    let header: Vec<String> = rows
        .next()
        .map(|cells| cells.iter().map(cell_text).collect())
        .ok_or_else(|| AnalysisError::DataFormat(format!("sheet '{sheet}' is empty")))?;
    let (index_label, columns) = match header.split_first() {
        Some((first, rest)) => (first.clone(), rest.to_vec()),
        None => (String::new(), Vec::new()),
    };

    let mut table = Table::new(index_label, columns);
    for cells in rows {
        let label = cells.first().map(cell_text).unwrap_or_default();
        let values = (1..=table.columns.len())
            .map(|c| match cells.get(c) {
                None => Ok(None),
                Some(cell) => parse_number(cell).map_err(|value| AnalysisError::NonNumeric {
                    sheet: sheet.to_string(),
                    row: label.clone(),
                    column: table.columns[c - 1].clone(),
                    value,
                }),
            })
            .collect::<Result<Vec<_>>>()?;
        table.push_row(label, values);
    }

    Ok(table)
}

/// Writes a table as CSV with the same layout as the exported sheet.
pub fn write_table_csv(path: impl AsRef<Path>, table: &Table) -> Result<()> {
    let mut writer = WriterBuilder::new().from_path(path.as_ref())?;

    let mut header = vec![table.index_label.clone()];
    header.extend(table.columns.iter().cloned());
    writer.write_record(&header)?;

    for (label, row) in table.index.iter().zip(&table.cells) {
        let mut record = vec![label.clone()];
        record.extend(row.iter().map(|v| v.map(|v| v.to_string()).unwrap_or_default()));
        writer.write_record(&record)?;
    }
    writer.flush()?;

    Ok(())
}

/// Exports the tables of one pipeline to `<dir>/results_<pipeline>_<date>.xlsx`,
/// plus one CSV per sheet when `csv` is set. Returns the workbook path.
pub fn export_tables(
    dir: impl AsRef<Path>,
    pipeline: &str,
    date: NaiveDate,
    sheets: &[(String, &Table)],
    csv: bool,
) -> Result<PathBuf> {
    let dir = dir.as_ref();
    let path = dir.join(dated_filename(pipeline, date));
    write_workbook(&path, sheets)?;

    if csv {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| pipeline.to_string());
        for (name, table) in sheets {
            let csv_path = dir.join(format!("{stem}_{name}.csv"));
            write_table_csv(&csv_path, table)?;
            debug!(path = %csv_path.display(), "CSV written");
        }
    }

    Ok(path)
}
