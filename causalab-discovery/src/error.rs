//! Error types for the causalab-discovery crate.

use causalab_core::AdapterError;
use thiserror::Error;

/// Failure to invoke a discovery backend.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("Python runtime error: {0}")]
    Python(String),

    #[error("Backend timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("Invalid backend output: {0}")]
    InvalidOutput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl DiscoveryError {
    pub fn python(msg: impl Into<String>) -> Self {
        Self::Python(msg.into())
    }

    /// Attribute this failure to `backend` for the search layer.
    pub fn into_adapter_error(self, backend: &str) -> AdapterError {
        match self {
            Self::Timeout { timeout_secs } => AdapterError::Timeout {
                backend: backend.to_string(),
                timeout_secs,
            },
            other => AdapterError::backend(backend, other.to_string()),
        }
    }
}

/// Failure to load or encode a dataset.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON on line {line}: {source}")]
    InvalidLine {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid JSON dataset: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Record {row} is not a JSON object")]
    NotAnObject { row: usize },

    #[error("Column not found: {0}")]
    MissingColumn(String),

    #[error("Missing value in column '{column}' at row {row}")]
    MissingValue { column: String, row: usize },

    #[error("Non-numeric value {value} in column '{column}' at row {row}")]
    NonNumeric {
        column: String,
        row: usize,
        value: String,
    },

    #[error("No rows left after encoding")]
    Empty,

    #[error("Unknown dataset '{0}'")]
    UnknownDataset(String),

    #[error("Matrix error: {0}")]
    Matrix(#[from] causalab_core::DataError),
}
