//! # causalab Core
//!
//! Graph evaluation and hyperparameter search for causal-discovery experiments.
//! Provides the canonical graph model, the structural comparator, the adapter
//! seam for discovery backends, seeded cross-validated grid search, and
//! layered configuration.

pub mod adapter;
pub mod compare;
pub mod config;
pub mod error;
pub mod graph;
pub mod matrix;
pub mod search;

// Re-export commonly used types at the crate root.
pub use adapter::{AlgorithmAdapter, ForbiddenEdges, ParamSet};
pub use compare::{ConfusionCounts, Evaluation, evaluate};
pub use config::{CausalabConfig, load_config};
pub use error::{
    AdapterError, CausalabError, ConfigError, DataError, GraphError, Result, SearchError,
};
pub use graph::GraphModel;
pub use matrix::FeatureMatrix;
pub use search::{
    BestConfiguration, CombinationScore, CombinationStatus, CrossValidatedSearch, FoldScore,
    HyperparameterGrid, KFold, SearchOutcome, SearchReport, SingleRun, evaluate_once, search,
};
