//! # causalab Discovery
//!
//! Everything that touches a real causal-discovery library: the Python
//! subprocess runtime, the backend request protocol, one adapter per
//! algorithm, and the built-in datasets with their true graphs.

pub mod adapters;
pub mod backend;
pub mod dataset;
pub mod error;
pub mod runtime;

pub use adapters::{DirectLingamAdapter, IcaLingamAdapter, PcAdapter, adapter_for};
pub use backend::{Algorithm, BackendRequest, DiscoveryBackend, PythonBackend};
pub use dataset::{DatasetKind, EncodingPlan, PreparedDataset, RecordBatch};
pub use error::{DatasetError, DiscoveryError};
pub use runtime::{PythonInfo, PythonRuntime};
