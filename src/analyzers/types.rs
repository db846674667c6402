//! Data types shared by the aggregation pipelines.

use serde::Serialize;

use crate::dataset::{Degree, Indicator};

/// A labelled numeric table, the unit of export.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    /// Header of the row-label column.
    pub index_label: String,
    pub columns: Vec<String>,
    pub index: Vec<String>,
    pub cells: Vec<Vec<Option<f64>>>,
}

impl Table {
    pub fn new(index_label: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            index_label: index_label.into(),
            columns,
            index: Vec::new(),
            cells: Vec::new(),
        }
    }

    /// Appends a row; short rows are padded with missing cells.
    pub fn push_row(&mut self, label: impl Into<String>, mut values: Vec<Option<f64>>) {
        values.resize(self.columns.len(), None);
        self.index.push(label.into());
        self.cells.push(values);
    }

    pub fn get(&self, row: &str, column: &str) -> Option<f64> {
        let r = self.index.iter().position(|l| l == row)?;
        let c = self.columns.iter().position(|l| l == column)?;
        self.cells[r][c]
    }

    pub fn n_rows(&self) -> usize {
        self.index.len()
    }
}

/// Mean of one indicator per study code and year, for one scenario degree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudyMeans {
    pub indicator: Indicator,
    pub degree: Degree,
    pub years: Vec<i32>,
    /// Every configured study code, in order, including studies without rows.
    pub codes: Vec<String>,
    /// `values[study][year]`.
    pub values: Vec<Vec<Option<f64>>>,
}

impl StudyMeans {
    /// `gdp_amb`, `co2_mod`, ...
    pub fn label(&self) -> String {
        format!("{}_{}", self.indicator.key(), self.degree.key())
    }

    pub fn year_position(&self, year: i32) -> Option<usize> {
        self.years.iter().position(|y| *y == year)
    }

    /// Values of all studies for one year, in study order.
    pub fn column(&self, year: i32) -> Option<Vec<Option<f64>>> {
        let col = self.year_position(year)?;
        Some(self.values.iter().map(|row| row[col]).collect())
    }

    pub fn value(&self, code: &str, year: i32) -> Option<f64> {
        let row = self.codes.iter().position(|c| c == code)?;
        let col = self.year_position(year)?;
        self.values[row][col]
    }

    /// Restricts the means to a single year column.
    pub fn year_slice(&self, year: i32) -> Option<StudyMeans> {
        let column = self.column(year)?;
        Some(StudyMeans {
            indicator: self.indicator,
            degree: self.degree,
            years: vec![year],
            codes: self.codes.clone(),
            values: column.into_iter().map(|v| vec![v]).collect(),
        })
    }

    pub fn to_table(&self) -> Table {
        let mut table = Table::new("study", self.years.iter().map(i32::to_string).collect());
        for (code, row) in self.codes.iter().zip(&self.values) {
            table.push_row(code.clone(), row.clone());
        }
        table
    }
}

/// Ambitious and moderate study means of one indicator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioMeans {
    pub ambitious: StudyMeans,
    pub moderate: StudyMeans,
}

impl ScenarioMeans {
    pub fn get(&self, degree: Degree) -> &StudyMeans {
        match degree {
            Degree::Amb => &self.ambitious,
            Degree::Mod => &self.moderate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn means() -> StudyMeans {
        StudyMeans {
            indicator: Indicator::Gdp,
            degree: Degree::Amb,
            years: vec![2020, 2030],
            codes: vec!["d01".into(), "d02".into()],
            values: vec![vec![Some(1.0), Some(6.0)], vec![None, Some(2.0)]],
        }
    }

    #[test]
    fn test_study_means_lookup() {
        let m = means();
        assert_eq!(m.label(), "gdp_amb");
        assert_eq!(m.value("d01", 2030), Some(6.0));
        assert_eq!(m.value("d02", 2020), None);
        assert_eq!(m.column(2030), Some(vec![Some(6.0), Some(2.0)]));
        assert_eq!(m.column(2040), None);
    }

    #[test]
    fn test_year_slice_keeps_every_study() {
        let slice = means().year_slice(2020).unwrap();
        assert_eq!(slice.years, vec![2020]);
        assert_eq!(slice.values, vec![vec![Some(1.0)], vec![None]]);
    }

    #[test]
    fn test_to_table() {
        let table = means().to_table();
        assert_eq!(table.columns, vec!["2020", "2030"]);
        assert_eq!(table.index, vec!["d01", "d02"]);
        assert_eq!(table.get("d01", "2030"), Some(6.0));
        assert_eq!(table.get("d02", "2020"), None);
    }

    #[test]
    fn test_push_row_pads() {
        let mut table = Table::new("study", vec!["a".into(), "b".into()]);
        table.push_row("x", vec![Some(1.0)]);
        assert_eq!(table.cells[0], vec![Some(1.0), None]);
        assert_eq!(table.n_rows(), 1);
    }
}
