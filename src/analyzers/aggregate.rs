use crate::analyzers::types::{ScenarioMeans, StudyMeans};
use crate::analyzers::utility::mean;
use crate::dataset::{Dataset, Degree};
use tracing::debug;

/// Averages the rows of one scenario degree into one row per study code.
///
/// Every code in `study_codes` produces a row, in that order. A study with no
/// rows under `degree` gets a row of missing values rather than being dropped,
/// and missing cells never contribute to a mean.
pub fn study_means(dataset: &Dataset, degree: Degree, study_codes: &[String]) -> StudyMeans {
    let n_years = dataset.years.len();
    let mut series: Vec<Vec<Vec<f64>>> = vec![vec![Vec::new(); n_years]; study_codes.len()];
    let mut matched = vec![0usize; study_codes.len()];

    for row in dataset.rows_for(degree) {
        for &study in &row.studies {
            let Some(columns) = series.get_mut(study) else {
                continue;
            };
            matched[study] += 1;

            for (column, value) in columns.iter_mut().zip(&row.values) {
                if let Some(v) = value {
                    column.push(*v);
                }
            }
        }
    }

    for (code, count) in study_codes.iter().zip(&matched) {
        if *count == 0 {
            debug!(
                indicator = dataset.indicator.key(),
                degree = degree.key(),
                study = %code,
                "Study has no rows, keeping it as missing"
            );
        }
    }

    StudyMeans {
        indicator: dataset.indicator,
        degree,
        years: dataset.years.clone(),
        codes: study_codes.to_vec(),
        values: series
            .iter()
            .map(|columns| columns.iter().map(|c| mean(c)).collect())
            .collect(),
    }
}

/// Study means for both scenario degrees of a dataset.
pub fn scenario_means(dataset: &Dataset, study_codes: &[String]) -> ScenarioMeans {
    ScenarioMeans {
        ambitious: study_means(dataset, Degree::Amb, study_codes),
        moderate: study_means(dataset, Degree::Mod, study_codes),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_study_codes;
    use crate::dataset::{Indicator, ScenarioRow};
    use std::collections::BTreeMap;

    fn row(key: &str, studies: Vec<usize>, degree: Degree, values: Vec<Option<f64>>) -> ScenarioRow {
        ScenarioRow {
            key: key.to_string(),
            studies,
            country: "EU".to_string(),
            degree,
            scenario: "s".to_string(),
            metadata: BTreeMap::new(),
            values,
        }
    }

    fn dataset(rows: Vec<ScenarioRow>) -> Dataset {
        Dataset {
            indicator: Indicator::Gdp,
            years: vec![2030, 2040],
            rows,
        }
    }

    #[test]
    fn test_two_rows_average() {
        let ds = dataset(vec![
            row("d01_a", vec![0], Degree::Amb, vec![Some(5.0), None]),
            row("d01_b", vec![0], Degree::Amb, vec![Some(7.0), Some(1.0)]),
        ]);
        let means = study_means(&ds, Degree::Amb, &default_study_codes());

        assert_eq!(means.value("d01", 2030), Some(6.0));
        assert_eq!(means.value("d01", 2040), Some(1.0));
    }

    #[test]
    fn test_always_one_row_per_study() {
        let ds = dataset(vec![
            row("d01", vec![0], Degree::Amb, vec![Some(1.0), Some(1.0)]),
            row("d01", vec![0], Degree::Amb, vec![Some(2.0), Some(2.0)]),
            row("d05", vec![4], Degree::Mod, vec![Some(3.0), Some(3.0)]),
        ]);
        let codes = default_study_codes();

        for degree in Degree::ALL {
            let means = study_means(&ds, degree, &codes);
            assert_eq!(means.values.len(), 27);
            assert_eq!(means.codes, codes);
        }
    }

    #[test]
    fn test_study_without_rows_is_missing() {
        let ds = dataset(vec![row("d05", vec![4], Degree::Mod, vec![Some(3.0), None])]);
        let means = study_means(&ds, Degree::Amb, &default_study_codes());

        assert_eq!(means.values.len(), 27);
        assert!(means.values.iter().flatten().all(Option::is_none));
    }

    #[test]
    fn test_degree_filter() {
        let ds = dataset(vec![
            row("d02", vec![1], Degree::Amb, vec![Some(10.0), None]),
            row("d02", vec![1], Degree::Mod, vec![Some(2.0), None]),
        ]);
        let both = scenario_means(&ds, &default_study_codes());

        assert_eq!(both.ambitious.value("d02", 2030), Some(10.0));
        assert_eq!(both.moderate.value("d02", 2030), Some(2.0));
    }

    #[test]
    fn test_row_shared_by_two_studies() {
        let ds = dataset(vec![
            row("d03+d04", vec![2, 3], Degree::Amb, vec![Some(4.0), None]),
            row("d04", vec![3], Degree::Amb, vec![Some(8.0), None]),
        ]);
        let means = study_means(&ds, Degree::Amb, &default_study_codes());

        assert_eq!(means.value("d03", 2030), Some(4.0));
        assert_eq!(means.value("d04", 2030), Some(6.0));
    }
}
