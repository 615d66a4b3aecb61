//! Record encoding: derived columns, selection, ordinal and one-hot encoding.

use super::RecordBatch;
use crate::error::DatasetError;
use causalab_core::FeatureMatrix;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

/// A column computed as the mean of other columns, skipping missing values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedMean {
    pub name: String,
    pub sources: Vec<String>,
}

/// What to do with a row that has a missing or unmapped value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingPolicy {
    #[default]
    DropRows,
    Reject,
}

/// How to turn records into a numeric matrix.
///
/// Output columns are `keep` minus the one-hot columns, in `keep` order,
/// followed by the one-hot indicators in `one_hot` order. Each one-hot column
/// expands to `<column>_<category>` for every sorted category except the
/// first. A missing one-hot value encodes as all zeros and never drops the
/// row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EncodingPlan {
    #[serde(default)]
    pub derived_means: Vec<DerivedMean>,
    pub keep: Vec<String>,
    /// Column to (category to code). Unmapped categories count as missing.
    #[serde(default)]
    pub ordinal: BTreeMap<String, BTreeMap<String, f64>>,
    #[serde(default)]
    pub one_hot: Vec<String>,
    #[serde(default)]
    pub missing: MissingPolicy,
}

/// Encoded dataset ready for discovery.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreparedDataset {
    pub labels: Vec<String>,
    pub matrix: FeatureMatrix,
    /// Rows removed under [`MissingPolicy::DropRows`].
    pub dropped_rows: usize,
}

enum ColumnEncoder<'a> {
    Numeric { source: usize },
    Ordinal { source: usize, codes: &'a BTreeMap<String, f64> },
    Indicator { source: usize, category: String },
}

/// Apply `plan` to `batch`.
pub fn prepare(batch: &RecordBatch, plan: &EncodingPlan) -> Result<PreparedDataset, DatasetError> {
    let (columns, rows) = with_derived(batch, &plan.derived_means)?;
    let position = |name: &str| {
        columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| DatasetError::MissingColumn(name.to_string()))
    };

    let mut labels = Vec::new();
    let mut encoders = Vec::new();
    for name in plan.keep.iter().filter(|n| !plan.one_hot.contains(*n)) {
        let source = position(name)?;
        labels.push(name.clone());
        encoders.push(match plan.ordinal.get(name) {
            Some(codes) => ColumnEncoder::Ordinal { source, codes },
            None => ColumnEncoder::Numeric { source },
        });
    }
    for name in &plan.one_hot {
        let source = position(name)?;
        let categories: BTreeSet<String> = rows.iter().filter_map(|r| value_key(&r[source])).collect();
        for category in categories.into_iter().skip(1) {
            labels.push(format!("{name}_{category}"));
            encoders.push(ColumnEncoder::Indicator { source, category });
        }
    }

    let mut matrix = FeatureMatrix::new(labels.len());
    let mut dropped_rows = 0;
    'rows: for (index, row) in rows.iter().enumerate() {
        let mut encoded = Vec::with_capacity(encoders.len());
        for (label, encoder) in labels.iter().zip(&encoders) {
            match encode_cell(row, encoder, label, index)? {
                Some(value) => encoded.push(value),
                None if plan.missing == MissingPolicy::DropRows => {
                    dropped_rows += 1;
                    continue 'rows;
                }
                None => {
                    return Err(DatasetError::MissingValue {
                        column: label.clone(),
                        row: index,
                    });
                }
            }
        }
        matrix.push_row(encoded)?;
    }

    if matrix.is_empty() {
        return Err(DatasetError::Empty);
    }
    info!(
        rows = matrix.n_rows(),
        columns = labels.len(),
        dropped_rows,
        "Prepared dataset"
    );
    Ok(PreparedDataset {
        labels,
        matrix,
        dropped_rows,
    })
}

/// Append derived mean columns to a copy of the batch.
fn with_derived(
    batch: &RecordBatch,
    derived: &[DerivedMean],
) -> Result<(Vec<String>, Vec<Vec<serde_json::Value>>), DatasetError> {
    let mut columns = batch.columns.clone();
    let mut rows = batch.rows.clone();
    for mean in derived {
        let sources = mean
            .sources
            .iter()
            .map(|s| batch.column_index(s))
            .collect::<Result<Vec<_>, _>>()?;
        for (index, row) in rows.iter_mut().enumerate() {
            let mut values = Vec::with_capacity(sources.len());
            for (&source, name) in sources.iter().zip(&mean.sources) {
                if let Some(v) = numeric(&row[source], name, index)? {
                    values.push(v);
                }
            }
            let cell = if values.is_empty() {
                serde_json::Value::Null
            } else {
                let avg = values.iter().sum::<f64>() / values.len() as f64;
                serde_json::Number::from_f64(avg)
                    .map(serde_json::Value::Number)
                    .unwrap_or(serde_json::Value::Null)
            };
            row.push(cell);
        }
        debug!(column = %mean.name, sources = ?mean.sources, "Derived mean column");
        columns.push(mean.name.clone());
    }
    Ok((columns, rows))
}

fn encode_cell(
    row: &[serde_json::Value],
    encoder: &ColumnEncoder<'_>,
    label: &str,
    index: usize,
) -> Result<Option<f64>, DatasetError> {
    match encoder {
        ColumnEncoder::Numeric { source } => numeric(&row[*source], label, index),
        ColumnEncoder::Ordinal { source, codes } => {
            Ok(value_key(&row[*source]).and_then(|k| codes.get(&k).copied()))
        }
        // A missing category sets no indicator.
        ColumnEncoder::Indicator { source, category } => {
            let hit = value_key(&row[*source]).is_some_and(|k| &k == category);
            Ok(Some(if hit { 1.0 } else { 0.0 }))
        }
    }
}

/// Read a cell as a number. Null and blank strings are missing; booleans
/// are 0/1; numeric strings are parsed.
fn numeric(value: &serde_json::Value, column: &str, row: usize) -> Result<Option<f64>, DatasetError> {
    match value {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::Bool(b) => Ok(Some(if *b { 1.0 } else { 0.0 })),
        serde_json::Value::Number(n) => Ok(n.as_f64()),
        serde_json::Value::String(s) if s.trim().is_empty() => Ok(None),
        serde_json::Value::String(s) => {
            s.trim()
                .parse::<f64>()
                .map(Some)
                .map_err(|_| DatasetError::NonNumeric {
                    column: column.to_string(),
                    row,
                    value: s.clone(),
                })
        }
        other => Err(DatasetError::NonNumeric {
            column: column.to_string(),
            row,
            value: other.to_string(),
        }),
    }
}

/// Category key of a cell. Integral numbers print without a fraction so that
/// `4` and `4.0` share a key.
pub(crate) fn value_key(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) if s.trim().is_empty() => None,
        serde_json::Value::String(s) => Some(s.trim().to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        serde_json::Value::Number(n) => match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => Some(format!("{}", f as i64)),
            _ => Some(n.to_string()),
        },
        other => Some(other.to_string()),
    }
}
