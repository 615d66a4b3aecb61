//! Dense row-major feature matrix.

use crate::error::DataError;
use serde::{Deserialize, Serialize};

/// Numeric observations, one row per sample and one column per variable.
///
/// Serializes as a list of rows so it can be handed to a backend as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<f64>>", into = "Vec<Vec<f64>>")]
pub struct FeatureMatrix {
    n_cols: usize,
    values: Vec<f64>,
}

impl FeatureMatrix {
    /// An empty matrix with a fixed column count.
    pub fn new(n_cols: usize) -> Self {
        Self {
            n_cols,
            values: Vec::new(),
        }
    }

    /// Build from rows; every row must have the same length.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self, DataError> {
        let n_cols = rows.first().map_or(0, Vec::len);
        let mut matrix = Self::new(n_cols);
        for row in rows {
            matrix.push_row(row)?;
        }
        Ok(matrix)
    }

    pub fn push_row(&mut self, row: Vec<f64>) -> Result<(), DataError> {
        if row.len() != self.n_cols {
            return Err(DataError::RaggedRow {
                row: self.n_rows(),
                expected: self.n_cols,
                found: row.len(),
            });
        }
        self.values.extend(row);
        Ok(())
    }

    pub fn n_rows(&self) -> usize {
        if self.n_cols == 0 {
            0
        } else {
            self.values.len() / self.n_cols
        }
    }

    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn row(&self, index: usize) -> Option<&[f64]> {
        let start = index.checked_mul(self.n_cols)?;
        self.values.get(start..start + self.n_cols)
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        // chunks_exact panics on a zero chunk size.
        self.values.chunks_exact(self.n_cols.max(1))
    }

    /// Copy of the given rows, in the given order. Out-of-range indices are skipped.
    pub fn select_rows(&self, indices: &[usize]) -> FeatureMatrix {
        let mut selected = FeatureMatrix::new(self.n_cols);
        for &idx in indices {
            if let Some(row) = self.row(idx) {
                selected.values.extend_from_slice(row);
            }
        }
        selected
    }
}

impl TryFrom<Vec<Vec<f64>>> for FeatureMatrix {
    type Error = DataError;

    fn try_from(rows: Vec<Vec<f64>>) -> Result<Self, Self::Error> {
        Self::from_rows(rows)
    }
}

impl From<FeatureMatrix> for Vec<Vec<f64>> {
    fn from(matrix: FeatureMatrix) -> Self {
        matrix.rows().map(<[f64]>::to_vec).collect()
    }
}
