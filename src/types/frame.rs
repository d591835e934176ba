//! Column-oriented feature windows

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// One scored record: feature name to numeric value
pub type FeatureRow = HashMap<String, f64>;

/// A window of feature observations stored by column.
///
/// Missing cells are kept as `None` so a column keeps the row alignment of
/// the window it came from. NaN is treated as missing when values are read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureFrame {
    columns: BTreeMap<String, Vec<Option<f64>>>,
    rows: usize,
}

impl FeatureFrame {
    /// Create an empty frame
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a frame from row maps; a key missing from a row becomes a
    /// missing cell in that column.
    pub fn from_rows(rows: &[FeatureRow]) -> Self {
        let mut names: Vec<&String> = rows.iter().flat_map(|r| r.keys()).collect();
        names.sort();
        names.dedup();

        let columns = names
            .into_iter()
            .map(|name| {
                let cells = rows.iter().map(|r| r.get(name).copied()).collect();
                (name.clone(), cells)
            })
            .collect();

        Self {
            columns,
            rows: rows.len(),
        }
    }

    /// Add or replace a column of dense values
    pub fn with_column(mut self, name: &str, values: Vec<f64>) -> Self {
        self.insert_column(name, values.into_iter().map(Some).collect());
        self
    }

    /// Add or replace a column with explicit missing cells
    pub fn insert_column(&mut self, name: &str, cells: Vec<Option<f64>>) {
        self.rows = self.rows.max(cells.len());
        self.columns.insert(name.to_string(), cells);
    }

    /// Raw cells of a column
    pub fn column(&self, name: &str) -> Option<&[Option<f64>]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    /// Values of a column with missing and NaN cells dropped
    pub fn values(&self, name: &str) -> Option<Vec<f64>> {
        self.columns.get(name).map(|cells| {
            cells
                .iter()
                .filter_map(|c| c.filter(|v| !v.is_nan()))
                .collect()
        })
    }

    /// Column names in sorted order
    pub fn feature_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    /// Number of rows in the window
    pub fn row_count(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, f64)]) -> FeatureRow {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_from_rows_keeps_alignment() {
        let rows = vec![
            row(&[("amount", 10.0), ("age", 30.0)]),
            row(&[("amount", 20.0)]),
        ];
        let frame = FeatureFrame::from_rows(&rows);

        assert_eq!(frame.row_count(), 2);
        assert_eq!(frame.column("age").unwrap(), &[Some(30.0), None]);
        assert_eq!(frame.values("amount").unwrap(), vec![10.0, 20.0]);
        assert_eq!(frame.feature_names().collect::<Vec<_>>(), vec!["age", "amount"]);
    }

    #[test]
    fn test_values_drop_missing_and_nan() {
        let mut frame = FeatureFrame::new();
        frame.insert_column("v", vec![Some(1.0), None, Some(f64::NAN), Some(2.0)]);

        assert_eq!(frame.values("v").unwrap(), vec![1.0, 2.0]);
        assert!(frame.values("missing").is_none());
    }
}
