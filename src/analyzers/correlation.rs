//! Cross-indicator Pearson correlation of study means for one year.

use serde::Serialize;

use crate::analyzers::types::{ScenarioMeans, Table};
use crate::analyzers::utility::pearson;
use crate::dataset::{Degree, Indicator};
use crate::error::{AnalysisError, Result};

/// One study under one scenario degree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationRow {
    pub study: String,
    pub degree: Degree,
    pub gdp: Option<f64>,
    pub job: Option<f64>,
    pub co2: Option<f64>,
}

impl CorrelationRow {
    pub fn get(&self, indicator: Indicator) -> Option<f64> {
        match indicator {
            Indicator::Gdp => self.gdp,
            Indicator::Job => self.job,
            Indicator::Co2 => self.co2,
        }
    }

    /// `d01_amb`: unique across the stacked degrees.
    pub fn label(&self) -> String {
        format!("{}_{}", self.study, self.degree.key())
    }
}

/// Per-study values of the three indicators, ambitious rows first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationInput {
    pub year: i32,
    pub rows: Vec<CorrelationRow>,
}

impl CorrelationInput {
    pub fn column(&self, indicator: Indicator) -> Vec<Option<f64>> {
        self.rows.iter().map(|r| r.get(indicator)).collect()
    }

    pub fn to_table(&self) -> Table {
        let mut table = Table::new(
            "study",
            Indicator::ALL.iter().map(|i| i.key().to_string()).collect(),
        );
        for row in &self.rows {
            table.push_row(row.label(), vec![row.gdp, row.job, row.co2]);
        }
        table
    }
}

/// Symmetric matrix over gdp, job and co2.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub year: i32,
    /// `None` where a pair has fewer than two complete rows or no variance.
    pub values: [[Option<f64>; 3]; 3],
}

impl CorrelationMatrix {
    pub fn get(&self, a: Indicator, b: Indicator) -> Option<f64> {
        self.values[position(a)][position(b)]
    }

    pub fn to_table(&self) -> Table {
        let keys: Vec<String> = Indicator::ALL.iter().map(|i| i.key().to_string()).collect();
        let mut table = Table::new("indicator", keys.clone());
        for (key, row) in keys.into_iter().zip(&self.values) {
            table.push_row(key, row.to_vec());
        }
        table
    }
}

fn position(indicator: Indicator) -> usize {
    match indicator {
        Indicator::Gdp => 0,
        Indicator::Job => 1,
        Indicator::Co2 => 2,
    }
}

/// Aligns the study means of the three indicators for `year`.
///
/// Rows are matched by study code and degree; every configured study appears
/// once per degree, with missing values where an indicator has no data.
pub fn correlation_input(
    gdp: &ScenarioMeans,
    job: &ScenarioMeans,
    co2: &ScenarioMeans,
    year: i32,
) -> Result<CorrelationInput> {
    let mut rows = Vec::new();

    for degree in Degree::ALL {
        let columns = [gdp.get(degree), job.get(degree), co2.get(degree)]
            .iter()
            .map(|m| {
                m.column(year)
                    .map(|c| (m.codes.clone(), c))
                    .ok_or_else(|| {
                        AnalysisError::DataFormat(format!(
                            "year {year} is not among the {} projection years",
                            m.indicator
                        ))
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        let (codes, gdp_col) = &columns[0];
        let lookup = |idx: usize, code: &str| -> Option<f64> {
            let (codes, col) = &columns[idx];
            codes.iter().position(|c| c == code).and_then(|p| col[p])
        };

        for (code, gdp_value) in codes.iter().zip(gdp_col) {
            rows.push(CorrelationRow {
                study: code.clone(),
                degree,
                gdp: *gdp_value,
                job: lookup(1, code),
                co2: lookup(2, code),
            });
        }
    }

    Ok(CorrelationInput { year, rows })
}

/// Pairwise-complete Pearson correlation matrix.
pub fn pearson_matrix(input: &CorrelationInput) -> CorrelationMatrix {
    let columns: Vec<Vec<Option<f64>>> = Indicator::ALL
        .iter()
        .map(|i| input.column(*i))
        .collect();
    let mut values = [[None; 3]; 3];

    for i in 0..3 {
        values[i][i] = pearson(&columns[i], &columns[i]).map(|_| 1.0);
        for j in (i + 1)..3 {
            let r = pearson(&columns[i], &columns[j]);
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    CorrelationMatrix {
        year: input.year,
        values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::types::StudyMeans;

    fn means(indicator: Indicator, amb: Vec<Option<f64>>, moderate: Vec<Option<f64>>) -> ScenarioMeans {
        let make = |degree, values: Vec<Option<f64>>| StudyMeans {
            indicator,
            degree,
            years: vec![2030],
            codes: (1..=values.len()).map(|i| format!("d{i:02}")).collect(),
            values: values.into_iter().map(|v| vec![v]).collect(),
        };
        ScenarioMeans {
            ambitious: make(Degree::Amb, amb),
            moderate: make(Degree::Mod, moderate),
        }
    }

    fn input() -> CorrelationInput {
        let gdp = means(
            Indicator::Gdp,
            vec![Some(1.0), Some(2.0), None],
            vec![Some(3.0), Some(4.0), Some(5.0)],
        );
        let job = means(
            Indicator::Job,
            vec![Some(2.0), Some(4.1), Some(1.0)],
            vec![Some(5.9), Some(8.0), None],
        );
        let co2 = means(
            Indicator::Co2,
            vec![Some(-1.0), Some(-3.0), Some(0.5)],
            vec![Some(-2.0), Some(-7.0), Some(-4.0)],
        );
        correlation_input(&gdp, &job, &co2, 2030).unwrap()
    }

    #[test]
    fn test_rows_stack_ambitious_first() {
        let input = input();
        assert_eq!(input.rows.len(), 6);
        assert_eq!(input.rows[0].label(), "d01_amb");
        assert_eq!(input.rows[3].label(), "d01_mod");
        assert_eq!(input.rows[2].gdp, None);
        assert_eq!(input.rows[2].job, Some(1.0));
        assert_eq!(input.rows[5].job, None);
    }

    #[test]
    fn test_matrix_symmetric_unit_diagonal() {
        let matrix = pearson_matrix(&input());
        for a in Indicator::ALL {
            assert_eq!(matrix.get(a, a), Some(1.0));
            for b in Indicator::ALL {
                assert_eq!(matrix.get(a, b), matrix.get(b, a));
                let r = matrix.get(a, b).unwrap();
                assert!((-1.0..=1.0).contains(&r));
            }
        }
    }

    #[test]
    fn test_matrix_uses_complete_pairs_only() {
        let input = input();
        let matrix = pearson_matrix(&input);
        let expected = pearson(&input.column(Indicator::Gdp), &input.column(Indicator::Job));
        assert_eq!(matrix.get(Indicator::Gdp, Indicator::Job), expected);
    }

    #[test]
    fn test_degenerate_column_is_missing() {
        let constant = means(Indicator::Gdp, vec![Some(1.0), Some(1.0)], vec![Some(1.0), None]);
        let job = means(Indicator::Job, vec![Some(1.0), Some(2.0)], vec![Some(3.0), Some(4.0)]);
        let co2 = means(Indicator::Co2, vec![Some(0.0), Some(2.0)], vec![Some(1.0), Some(5.0)]);
        let matrix = pearson_matrix(&correlation_input(&constant, &job, &co2, 2030).unwrap());

        assert_eq!(matrix.get(Indicator::Gdp, Indicator::Gdp), None);
        assert_eq!(matrix.get(Indicator::Gdp, Indicator::Job), None);
        assert_eq!(matrix.get(Indicator::Job, Indicator::Job), Some(1.0));
    }

    #[test]
    fn test_unknown_year() {
        let gdp = means(Indicator::Gdp, vec![Some(1.0)], vec![Some(1.0)]);
        assert!(matches!(
            correlation_input(&gdp, &gdp, &gdp, 2040),
            Err(AnalysisError::DataFormat(_))
        ));
    }

    #[test]
    fn test_tables() {
        let input = input();
        let table = input.to_table();
        assert_eq!(table.columns, vec!["gdp", "job", "co2"]);
        assert_eq!(table.get("d02_mod", "job"), Some(8.0));

        let matrix = pearson_matrix(&input).to_table();
        assert_eq!(matrix.index, vec!["gdp", "job", "co2"]);
        assert_eq!(matrix.get("co2", "co2"), Some(1.0));
    }
}
