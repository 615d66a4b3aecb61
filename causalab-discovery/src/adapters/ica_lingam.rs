//! ICA-LiNGAM adapter.

use super::{invoke, output_field};
use crate::backend::{Algorithm, DiscoveryBackend};
use causalab_core::adapter::{check_columns, graph_from_adjacency, parse_params};
use causalab_core::{AdapterError, AlgorithmAdapter, FeatureMatrix, GraphModel, ParamSet};
use serde::{Deserialize, Serialize};

/// ICA-LiNGAM hyperparameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IcaLingamParams {
    /// FastICA iteration limit.
    #[serde(default = "default_max_iter")]
    pub max_iter: u32,
    #[serde(default)]
    pub random_state: Option<u64>,
}

impl Default for IcaLingamParams {
    fn default() -> Self {
        Self {
            max_iter: default_max_iter(),
            random_state: None,
        }
    }
}

fn default_max_iter() -> u32 {
    500
}

pub struct IcaLingamAdapter<B> {
    backend: B,
}

impl<B: DiscoveryBackend> IcaLingamAdapter<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }
}

impl<B: DiscoveryBackend> AlgorithmAdapter for IcaLingamAdapter<B> {
    fn name(&self) -> &str {
        Algorithm::IcaLingam.as_str()
    }

    fn run(
        &self,
        data: &FeatureMatrix,
        labels: &[String],
        params: &ParamSet,
    ) -> Result<GraphModel, AdapterError> {
        let name = self.name();
        let params: IcaLingamParams = parse_params(name, params)?;
        if params.max_iter == 0 {
            return Err(AdapterError::invalid_params(name, "max_iter must be positive"));
        }
        check_columns(name, data, labels)?;

        let output = invoke(&self.backend, Algorithm::IcaLingam, data, &params, Vec::new())?;
        let adjacency: Vec<Vec<f64>> = output_field(name, &output, "adjacency")?;
        graph_from_adjacency(name, &adjacency, labels)
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::CannedBackend;
    use super::*;
    use pretty_assertions::assert_eq;

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn data() -> FeatureMatrix {
        FeatureMatrix::from_rows((0..8).map(|r| vec![r as f64, 2.0 * r as f64]).collect())
            .unwrap()
    }

    #[test]
    fn test_adjacency_to_graph() {
        let backend = CannedBackend::ok(serde_json::json!({
            "adjacency": [[0.0, 0.8], [0.0, 0.0]]
        }));
        let graph = IcaLingamAdapter::new(&backend)
            .run(&data(), &labels(&["A", "B"]), &ParamSet::new())
            .unwrap();
        assert_eq!(graph.edges(), vec![("A", "B")]);
    }

    #[test]
    fn test_params_forwarded() {
        let backend = CannedBackend::ok(serde_json::json!({ "adjacency": [[0.0, 0.0], [0.0, 0.0]] }));
        let params = ParamSet::from([("max_iter".to_string(), serde_json::json!(1500))]);
        IcaLingamAdapter::new(&backend)
            .run(&data(), &labels(&["A", "B"]), &params)
            .unwrap();
        assert_eq!(
            backend.last_request()["params"],
            serde_json::json!({ "max_iter": 1500, "random_state": null })
        );
    }

    #[test]
    fn test_rejects_non_integer_max_iter() {
        let backend = CannedBackend::ok(serde_json::Value::Null);
        let params = ParamSet::from([("max_iter".to_string(), serde_json::json!("many"))]);
        let err = IcaLingamAdapter::new(&backend)
            .run(&data(), &labels(&["A", "B"]), &params)
            .unwrap_err();
        assert!(matches!(err, AdapterError::InvalidParams { .. }));
    }

    #[test]
    fn test_malformed_output() {
        let backend = CannedBackend::ok(serde_json::json!({ "adjacency": "nope" }));
        let err = IcaLingamAdapter::new(&backend)
            .run(&data(), &labels(&["A", "B"]), &ParamSet::new())
            .unwrap_err();
        assert!(matches!(err, AdapterError::Backend { .. }));
    }
}
