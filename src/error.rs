//! Error kinds surfaced by the loader, exporter and renderer.

use thiserror::Error;

/// Errors produced by the analysis library.
///
/// The first five variants form the data-format family: the workbook was
/// readable but does not match the expected schema.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("sheet '{0}' not found in workbook")]
    MissingSheet(String),

    #[error("sheet '{sheet}' has no '{column}' column")]
    MissingColumn { sheet: String, column: String },

    #[error("sheet '{sheet}', row '{row}': degree '{value}' is neither 'amb' nor 'mod'")]
    InvalidDegree {
        sheet: String,
        row: String,
        value: String,
    },

    #[error("sheet '{sheet}', row '{row}', column '{column}': '{value}' is not numeric")]
    NonNumeric {
        sheet: String,
        row: String,
        column: String,
        value: String,
    },

    #[error("data format error: {0}")]
    DataFormat(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("workbook read error: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("workbook write error: {0}")]
    Export(#[from] rust_xlsxwriter::XlsxError),

    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("chart rendering failed: {0}")]
    Render(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl AnalysisError {
    /// Returns `true` for schema problems in the input workbook.
    pub fn is_data_format(&self) -> bool {
        matches!(
            self,
            AnalysisError::MissingSheet(_)
                | AnalysisError::MissingColumn { .. }
                | AnalysisError::InvalidDegree { .. }
                | AnalysisError::NonNumeric { .. }
                | AnalysisError::DataFormat(_)
        )
    }
}

impl From<serde_json::Error> for AnalysisError {
    fn from(err: serde_json::Error) -> Self {
        AnalysisError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_format_family() {
        assert!(AnalysisError::MissingSheet("gdp".into()).is_data_format());
        assert!(
            AnalysisError::NonNumeric {
                sheet: "job".into(),
                row: "d01_a".into(),
                column: "2030".into(),
                value: "abc".into(),
            }
            .is_data_format()
        );
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert!(!AnalysisError::from(io).is_data_format());
    }

    #[test]
    fn test_messages_name_the_location() {
        let err = AnalysisError::MissingColumn {
            sheet: "co2".into(),
            column: "degree".into(),
        };
        assert_eq!(err.to_string(), "sheet 'co2' has no 'degree' column");
    }
}
