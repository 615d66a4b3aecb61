//! Dataset loading and preparation.
//!
//! Datasets arrive as JSON records (one object per row), either as JSON lines
//! or as a single JSON array. [`encode`] turns a [`RecordBatch`] into the
//! numeric matrix and label list the discovery backends consume.

pub mod catalog;
pub mod encode;

pub use catalog::DatasetKind;
pub use encode::{DerivedMean, EncodingPlan, MissingPolicy, PreparedDataset, prepare};

use crate::error::DatasetError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// A batch of records in columnar-header form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordBatch {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<serde_json::Value>>,
}

impl RecordBatch {
    /// Build a batch from JSON objects. Columns are ordered by first
    /// appearance; keys a record lacks are null.
    pub fn from_records(records: Vec<serde_json::Value>) -> Result<Self, DatasetError> {
        let mut objects = Vec::with_capacity(records.len());
        let mut columns: Vec<String> = Vec::new();
        for (row, record) in records.into_iter().enumerate() {
            let serde_json::Value::Object(object) = record else {
                return Err(DatasetError::NotAnObject { row });
            };
            for key in object.keys() {
                if !columns.contains(key) {
                    columns.push(key.clone());
                }
            }
            objects.push(object);
        }

        let rows = objects
            .into_iter()
            .map(|mut object| {
                columns
                    .iter()
                    .map(|c| object.remove(c).unwrap_or(serde_json::Value::Null))
                    .collect()
            })
            .collect();
        Ok(Self { columns, rows })
    }

    /// Parse newline-delimited JSON objects. Blank lines are skipped.
    pub fn from_json_lines(content: &str) -> Result<Self, DatasetError> {
        let mut records = Vec::new();
        for (index, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let record = serde_json::from_str(line).map_err(|source| DatasetError::InvalidLine {
                line: index + 1,
                source,
            })?;
            records.push(record);
        }
        Self::from_records(records)
    }

    /// Parse a JSON array of objects.
    pub fn from_json_array(content: &str) -> Result<Self, DatasetError> {
        let records: Vec<serde_json::Value> = serde_json::from_str(content)?;
        Self::from_records(records)
    }

    /// Load a `.jsonl`/`.ndjson` file as JSON lines, anything else as a JSON array.
    pub fn load(path: &Path) -> Result<Self, DatasetError> {
        let content = std::fs::read_to_string(path)?;
        let is_lines = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("jsonl") || e.eq_ignore_ascii_case("ndjson"));
        let batch = if is_lines {
            Self::from_json_lines(&content)?
        } else {
            Self::from_json_array(&content)?
        };
        debug!(
            path = %path.display(),
            rows = batch.row_count(),
            columns = batch.column_count(),
            "Loaded records"
        );
        Ok(batch)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column_index(&self, name: &str) -> Result<usize, DatasetError> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| DatasetError::MissingColumn(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_from_records_fills_missing_keys() {
        let batch = RecordBatch::from_records(vec![
            json!({ "a": 1, "b": "x" }),
            json!({ "a": 2, "c": true }),
        ])
        .unwrap();
        assert_eq!(batch.columns, vec!["a", "b", "c"]);
        assert_eq!(batch.rows[1], vec![json!(2), json!(null), json!(true)]);
    }

    #[test]
    fn test_rejects_non_object() {
        let err = RecordBatch::from_records(vec![json!({ "a": 1 }), json!([1, 2])]).unwrap_err();
        assert!(matches!(err, DatasetError::NotAnObject { row: 1 }));
    }

    #[test]
    fn test_json_lines() {
        let batch = RecordBatch::from_json_lines("{\"a\": 1}\n\n{\"a\": 2}\n").unwrap();
        assert_eq!(batch.row_count(), 2);

        let err = RecordBatch::from_json_lines("{\"a\": 1}\n{oops}\n").unwrap_err();
        assert!(matches!(err, DatasetError::InvalidLine { line: 2, .. }));
    }

    #[test]
    fn test_load_by_extension() {
        let dir = tempfile::tempdir().unwrap();

        let lines = dir.path().join("data.jsonl");
        std::fs::write(&lines, "{\"a\": 1}\n{\"a\": 2}\n").unwrap();
        assert_eq!(RecordBatch::load(&lines).unwrap().row_count(), 2);

        let array = dir.path().join("data.json");
        std::fs::write(&array, "[{\"a\": 1}, {\"a\": 2}, {\"a\": 3}]").unwrap();
        assert_eq!(RecordBatch::load(&array).unwrap().row_count(), 3);
    }

    #[test]
    fn test_column_index() {
        let batch = RecordBatch::from_records(vec![json!({ "a": 1 })]).unwrap();
        assert_eq!(batch.column_index("a").unwrap(), 0);
        assert!(matches!(
            batch.column_index("z"),
            Err(DatasetError::MissingColumn(_))
        ));
    }
}
