//! Record batch model for streamed dataset chunks
//!
//! A batch is one row group yielded by the backend iterator: an ordered set
//! of named columns, each either scalar (one number per row) or nested (one
//! sub-sequence per row, e.g. a per-event waveform). Missing scalar values
//! arrive as NaN and are removed at ingestion, before a batch ever reaches
//! the chunk store.

use std::io::Write;

use crate::strax::error::{Result, StraxError};

/// A single named column of a batch
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    /// One value per row
    Scalar(Vec<f64>),
    /// One sub-sequence per row; sub-sequence lengths vary freely
    Nested(Vec<Vec<f64>>),
}

impl Column {
    /// Number of rows in this column
    pub fn len(&self) -> usize {
        match self {
            Column::Scalar(values) => values.len(),
            Column::Nested(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self, Column::Scalar(_))
    }

    pub fn is_nested(&self) -> bool {
        matches!(self, Column::Nested(_))
    }
}

/// An immutable row group: ordered mapping from column name to column data
///
/// All columns have the same row count. Column order is the schema order
/// reported by the backend and is preserved for table views and selectors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordBatch {
    columns: Vec<(String, Column)>,
}

impl RecordBatch {
    /// Create an empty batch
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a batch from named columns, validating equal row counts
    pub fn from_columns(columns: Vec<(String, Column)>) -> Result<Self> {
        if let Some((first_name, first)) = columns.first() {
            let expected = first.len();
            for (name, column) in &columns {
                if column.len() != expected {
                    return Err(StraxError::Malformed(format!(
                        "column '{}' has {} rows, expected {} (from '{}')",
                        name,
                        column.len(),
                        expected,
                        first_name
                    )));
                }
            }
        }
        Ok(Self { columns })
    }

    /// Row count of the batch (0 for a batch with no columns)
    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, |(_, c)| c.len())
    }

    /// Column names in schema order
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|(name, _)| name.clone()).collect()
    }

    /// Look up a column by name
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| c)
    }

    /// Iterate columns in schema order
    pub fn columns(&self) -> impl Iterator<Item = (&str, &Column)> {
        self.columns.iter().map(|(n, c)| (n.as_str(), c))
    }

    /// Remove every row with a missing value in any scalar column
    ///
    /// Missing means NaN. Nested cells are never considered missing, which
    /// matches how the upstream pipeline treats array-valued cells. The
    /// any-row policy is lossy; partial rows are not recoverable downstream.
    pub fn drop_missing_rows(&self) -> RecordBatch {
        let n = self.row_count();
        let mut keep = vec![true; n];
        for (_, column) in &self.columns {
            if let Column::Scalar(values) = column {
                for (i, v) in values.iter().enumerate() {
                    if v.is_nan() {
                        keep[i] = false;
                    }
                }
            }
        }

        let columns = self
            .columns
            .iter()
            .map(|(name, column)| {
                let filtered = match column {
                    Column::Scalar(values) => Column::Scalar(
                        values
                            .iter()
                            .zip(&keep)
                            .filter(|(_, k)| **k)
                            .map(|(v, _)| *v)
                            .collect(),
                    ),
                    Column::Nested(rows) => Column::Nested(
                        rows.iter()
                            .zip(&keep)
                            .filter(|(_, k)| **k)
                            .map(|(r, _)| r.clone())
                            .collect(),
                    ),
                };
                (name.clone(), filtered)
            })
            .collect();

        RecordBatch { columns }
    }

    /// Append the derived columns computed at ingestion
    ///
    /// For every nested column `c`: `mean(c)` and `std(c)` (row-wise
    /// aggregates) and `index(c)` (a 0..len index sequence per row). A
    /// batch-wide `_index` column carries the row ordinal. Existing names
    /// are left untouched, so a second pass adds nothing.
    pub fn with_derived_columns(mut self) -> RecordBatch {
        let nested: Vec<(String, Vec<Vec<f64>>)> = self
            .columns
            .iter()
            .filter_map(|(name, column)| match column {
                Column::Nested(rows) => Some((name.clone(), rows.clone())),
                Column::Scalar(_) => None,
            })
            .collect();

        for (name, rows) in nested {
            let mean_name = format!("mean({})", name);
            let std_name = format!("std({})", name);
            let index_name = format!("index({})", name);

            if self.column(&mean_name).is_none() {
                let means = rows.iter().map(|r| mean(r)).collect();
                self.columns.push((mean_name, Column::Scalar(means)));
            }
            if self.column(&std_name).is_none() {
                let stds = rows.iter().map(|r| std(r)).collect();
                self.columns.push((std_name, Column::Scalar(stds)));
            }
            if self.column(&index_name).is_none() {
                let indices = rows
                    .iter()
                    .map(|r| (0..r.len()).map(|i| i as f64).collect())
                    .collect();
                self.columns.push((index_name, Column::Nested(indices)));
            }
        }

        if self.column("_index").is_none() {
            let ordinals = (0..self.row_count()).map(|i| i as f64).collect();
            self.columns
                .push(("_index".to_string(), Column::Scalar(ordinals)));
        }

        self
    }

    /// Full ingestion step applied to every raw batch from the backend
    pub fn ingest(&self) -> RecordBatch {
        self.drop_missing_rows().with_derived_columns()
    }

    /// Write the batch as CSV, nested cells space-separated within a field
    pub fn write_csv<W: Write>(&self, writer: W) -> csv::Result<()> {
        let mut out = csv::Writer::from_writer(writer);
        out.write_record(self.columns.iter().map(|(name, _)| name.as_str()))?;
        for row in 0..self.row_count() {
            let record: Vec<String> = self
                .columns
                .iter()
                .map(|(_, column)| match column {
                    Column::Scalar(values) => values[row].to_string(),
                    Column::Nested(rows) => rows[row]
                        .iter()
                        .map(|v| v.to_string())
                        .collect::<Vec<_>>()
                        .join(" "),
                })
                .collect();
            out.write_record(&record)?;
        }
        out.flush()?;
        Ok(())
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation
fn std(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn waveform_batch() -> RecordBatch {
        RecordBatch::from_columns(vec![
            (
                "area".to_string(),
                Column::Scalar(vec![1.0, f64::NAN, 3.0, 4.0]),
            ),
            (
                "wave".to_string(),
                Column::Nested(vec![
                    vec![0.0, 1.0, 2.0],
                    vec![5.0],
                    vec![2.0, 2.0],
                    vec![1.0, 3.0, 5.0, 7.0],
                ]),
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_from_columns_rejects_ragged_batches() {
        let result = RecordBatch::from_columns(vec![
            ("a".to_string(), Column::Scalar(vec![1.0, 2.0])),
            ("b".to_string(), Column::Scalar(vec![1.0])),
        ]);
        assert!(matches!(result, Err(StraxError::Malformed(_))));
    }

    #[test]
    fn test_drop_missing_rows_any_policy() {
        let dropped = waveform_batch().drop_missing_rows();
        assert_eq!(dropped.row_count(), 3);
        match dropped.column("area") {
            Some(Column::Scalar(values)) => {
                assert_eq!(values, &vec![1.0, 3.0, 4.0]);
                assert!(values.iter().all(|v| !v.is_nan()));
            }
            other => panic!("unexpected column: {:?}", other),
        }
        // Idempotent: a second drop removes nothing
        assert_eq!(dropped.drop_missing_rows().row_count(), 3);
    }

    #[test]
    fn test_nested_cells_are_not_missing() {
        let batch = RecordBatch::from_columns(vec![(
            "wave".to_string(),
            Column::Nested(vec![vec![f64::NAN], vec![1.0]]),
        )])
        .unwrap();
        assert_eq!(batch.drop_missing_rows().row_count(), 2);
    }

    #[test]
    fn test_derived_columns() {
        let ingested = waveform_batch().ingest();
        assert_eq!(ingested.row_count(), 3);

        let means = match ingested.column("mean(wave)") {
            Some(Column::Scalar(values)) => values.clone(),
            other => panic!("unexpected column: {:?}", other),
        };
        assert_eq!(means.len(), ingested.row_count());
        assert_eq!(means[0], 1.0);
        assert_eq!(means[1], 2.0);
        assert_eq!(means[2], 4.0);

        match ingested.column("std(wave)") {
            Some(Column::Scalar(values)) => {
                assert_eq!(values.len(), ingested.row_count());
                assert!((values[0] - (2.0f64 / 3.0).sqrt()).abs() < 1e-12);
            }
            other => panic!("unexpected column: {:?}", other),
        }

        let wave_rows = match ingested.column("wave") {
            Some(Column::Nested(rows)) => rows.clone(),
            other => panic!("unexpected column: {:?}", other),
        };
        match ingested.column("index(wave)") {
            Some(Column::Nested(rows)) => {
                for (indices, data) in rows.iter().zip(&wave_rows) {
                    assert_eq!(indices.len(), data.len());
                    assert_eq!(indices.first().copied(), Some(0.0));
                    assert_eq!(indices.last().copied(), Some(data.len() as f64 - 1.0));
                }
            }
            other => panic!("unexpected column: {:?}", other),
        }

        match ingested.column("_index") {
            Some(Column::Scalar(values)) => assert_eq!(values, &vec![0.0, 1.0, 2.0]),
            other => panic!("unexpected column: {:?}", other),
        }
    }

    #[test]
    fn test_derived_columns_computed_once() {
        let ingested = waveform_batch().ingest();
        let twice = ingested.clone().with_derived_columns();
        assert_eq!(twice.column_names(), ingested.column_names());
    }

    #[test]
    fn test_write_csv() {
        let batch = RecordBatch::from_columns(vec![
            ("x".to_string(), Column::Scalar(vec![1.0, 2.5])),
            (
                "wave".to_string(),
                Column::Nested(vec![vec![1.0, 2.0], vec![3.0]]),
            ),
        ])
        .unwrap();

        let mut buffer = Vec::new();
        batch.write_csv(&mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "x,wave");
        assert_eq!(lines[1], "1,1 2");
        assert_eq!(lines[2], "2.5,3");
    }
}
