//! Study-mean aggregation and the analyses built on it.
//!
//! This module groups raw scenario rows into per-study means, assembles the
//! boxplot categories for one year and computes the Pearson correlation of the
//! three indicators.

pub mod aggregate;
pub mod boxplot;
pub mod correlation;
pub mod types;
pub mod utility;
