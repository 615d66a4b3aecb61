//! Error types for the causalab core library.
//!
//! Uses `thiserror` for public API error types. Graph misuse, adapter
//! failures, search setup problems and configuration loading each get their
//! own enum; `CausalabError` wraps them for callers that want a single type.

/// Top-level error type for the causalab core library.
#[derive(Debug, thiserror::Error)]
pub enum CausalabError {
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("Adapter error: {0}")]
    Adapter(#[from] AdapterError),

    #[error("Search error: {0}")]
    Search(#[from] SearchError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Data error: {0}")]
    Data(#[from] DataError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Misuse of the graph API.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    #[error("Invalid edge {from} -> {to}: {reason}")]
    InvalidEdge {
        from: String,
        to: String,
        reason: String,
    },
}

impl GraphError {
    pub(crate) fn invalid_edge(from: &str, to: &str, reason: impl Into<String>) -> Self {
        Self::InvalidEdge {
            from: from.to_string(),
            to: to.to_string(),
            reason: reason.into(),
        }
    }
}

/// Failure of a discovery backend or of normalizing its output.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AdapterError {
    #[error("Backend '{backend}' failed: {message}")]
    Backend { backend: String, message: String },

    #[error("Backend '{backend}' returned a {rows}x{cols} structure for {expected} labels")]
    ShapeMismatch {
        backend: String,
        expected: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Invalid parameters for '{backend}': {reason}")]
    InvalidParams { backend: String, reason: String },

    #[error("Backend '{backend}' timed out after {timeout_secs}s")]
    Timeout { backend: String, timeout_secs: u64 },

    #[error("Graph construction failed: {0}")]
    Graph(#[from] GraphError),
}

impl AdapterError {
    pub fn backend(backend: &str, message: impl Into<String>) -> Self {
        Self::Backend {
            backend: backend.to_string(),
            message: message.into(),
        }
    }

    pub fn invalid_params(backend: &str, reason: impl Into<String>) -> Self {
        Self::InvalidParams {
            backend: backend.to_string(),
            reason: reason.into(),
        }
    }
}

/// Invalid search setup, detected before any backend is invoked.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SearchError {
    #[error("n_splits must be at least 2, got {n_splits}")]
    TooFewSplits { n_splits: usize },

    #[error("Cannot split {rows} rows into {n_splits} folds")]
    TooManySplits { n_splits: usize, rows: usize },

    #[error("Data has {columns} columns but {labels} labels were given")]
    LabelMismatch { columns: usize, labels: usize },

    #[error("Hyperparameter '{name}' has no candidate values")]
    EmptyParameter { name: String },
}

/// Malformed numeric input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DataError {
    #[error("Row {row} has {found} values, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
}

/// Errors from loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("Invalid configuration value for '{field}': {reason}")]
    Invalid { field: String, reason: String },
}

/// Convenience result alias for core operations.
pub type Result<T> = std::result::Result<T, CausalabError>;
