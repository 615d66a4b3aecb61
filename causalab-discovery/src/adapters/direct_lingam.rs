//! DirectLiNGAM adapter.
//!
//! DirectLiNGAM estimates a causal order, so its adjacency matrix is acyclic
//! and is used as-is.

use super::{invoke, output_field};
use crate::backend::{Algorithm, DiscoveryBackend};
use causalab_core::adapter::{check_columns, graph_from_adjacency, parse_params};
use causalab_core::{AdapterError, AlgorithmAdapter, FeatureMatrix, GraphModel, ParamSet};
use serde::{Deserialize, Serialize};

/// Independence measures DirectLiNGAM understands.
pub const MEASURES: &[&str] = &["pwling", "pwling_fast", "kernel"];

/// DirectLiNGAM hyperparameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DirectLingamParams {
    /// Independence measure; `None` or `"default"` uses the library default.
    #[serde(default)]
    pub measure: Option<String>,
}

impl DirectLingamParams {
    /// Resolve `"default"` to `None` and reject unknown measures.
    fn normalize(&self) -> Result<Self, AdapterError> {
        match self.measure.as_deref() {
            None | Some("default") => Ok(Self { measure: None }),
            Some(m) if MEASURES.contains(&m) => Ok(Self {
                measure: Some(m.to_string()),
            }),
            Some(m) => Err(AdapterError::invalid_params(
                "direct_lingam",
                format!("unknown measure '{m}', expected one of {MEASURES:?} or 'default'"),
            )),
        }
    }
}

pub struct DirectLingamAdapter<B> {
    backend: B,
}

impl<B: DiscoveryBackend> DirectLingamAdapter<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }
}

impl<B: DiscoveryBackend> AlgorithmAdapter for DirectLingamAdapter<B> {
    fn name(&self) -> &str {
        Algorithm::DirectLingam.as_str()
    }

    fn run(
        &self,
        data: &FeatureMatrix,
        labels: &[String],
        params: &ParamSet,
    ) -> Result<GraphModel, AdapterError> {
        let name = self.name();
        let params = parse_params::<DirectLingamParams>(name, params)?.normalize()?;
        check_columns(name, data, labels)?;

        let output = invoke(&self.backend, Algorithm::DirectLingam, data, &params, Vec::new())?;
        let adjacency: Vec<Vec<f64>> = output_field(name, &output, "adjacency")?;
        graph_from_adjacency(name, &adjacency, labels)
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::CannedBackend;
    use super::*;
    use crate::error::DiscoveryError;
    use pretty_assertions::assert_eq;

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn data() -> FeatureMatrix {
        FeatureMatrix::from_rows((0..8).map(|r| vec![r as f64, 1.0, -(r as f64)]).collect())
            .unwrap()
    }

    fn measure(value: &str) -> ParamSet {
        ParamSet::from([("measure".to_string(), serde_json::json!(value))])
    }

    #[test]
    fn test_adjacency_to_graph() {
        let backend = CannedBackend::ok(serde_json::json!({
            "adjacency": [[0.0, 0.0, 0.0], [1.3, 0.0, 0.0], [0.0, -0.4, 0.0]]
        }));
        let graph = DirectLingamAdapter::new(&backend)
            .run(&data(), &labels(&["A", "B", "C"]), &measure("pwling"))
            .unwrap();
        assert_eq!(graph.edges(), vec![("B", "A"), ("C", "B")]);
        assert_eq!(backend.last_request()["params"]["measure"], "pwling");
    }

    #[test]
    fn test_default_measure_is_omitted() {
        let backend = CannedBackend::ok(serde_json::json!({
            "adjacency": [[0.0, 0.0, 0.0], [0.0, 0.0, 0.0], [0.0, 0.0, 0.0]]
        }));
        DirectLingamAdapter::new(&backend)
            .run(&data(), &labels(&["A", "B", "C"]), &measure("default"))
            .unwrap();
        assert_eq!(
            backend.last_request()["params"],
            serde_json::json!({ "measure": null })
        );
    }

    #[test]
    fn test_unknown_measure() {
        let backend = CannedBackend::ok(serde_json::Value::Null);
        let err = DirectLingamAdapter::new(&backend)
            .run(&data(), &labels(&["A", "B", "C"]), &measure("entropy"))
            .unwrap_err();
        assert!(matches!(err, AdapterError::InvalidParams { .. }));
    }

    #[test]
    fn test_label_count_mismatch() {
        let backend = CannedBackend::ok(serde_json::Value::Null);
        let err = DirectLingamAdapter::new(&backend)
            .run(&data(), &labels(&["A", "B"]), &ParamSet::new())
            .unwrap_err();
        assert!(matches!(err, AdapterError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_backend_failure() {
        let backend = CannedBackend::failing(|| DiscoveryError::python("singular matrix"));
        let err = DirectLingamAdapter::new(&backend)
            .run(&data(), &labels(&["A", "B", "C"]), &ParamSet::new())
            .unwrap_err();
        assert!(err.to_string().contains("singular matrix"));
    }
}
