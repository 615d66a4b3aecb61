//! PC (Fisher-z) adapter, optionally with root-variable background knowledge.
//!
//! The backend returns causal-learn's endpoint matrix: for `i < j`,
//! `(g[i][j], g[j][i])` is `(-1, 1)` for `i -> j`, `(1, -1)` for `j -> i`,
//! `(-1, -1)` or `(1, 1)` for an undirected or bidirected pair, and `(0, 0)`
//! for no adjacency.

use super::{invoke, output_field};
use crate::backend::{Algorithm, DiscoveryBackend};
use causalab_core::adapter::{check_columns, check_square, parse_params};
use causalab_core::{
    AdapterError, AlgorithmAdapter, FeatureMatrix, ForbiddenEdges, GraphModel, ParamSet,
};
use serde::{Deserialize, Serialize};

/// PC hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PcParams {
    /// Significance level of the conditional independence tests.
    #[serde(default = "default_alpha")]
    pub alpha: f64,
    /// Order-independent skeleton discovery.
    #[serde(default)]
    pub stable: bool,
    /// Collider orientation rule (0, 1 or 2).
    #[serde(default = "default_uc_rule")]
    pub uc_rule: u8,
}

impl Default for PcParams {
    fn default() -> Self {
        Self {
            alpha: default_alpha(),
            stable: false,
            uc_rule: default_uc_rule(),
        }
    }
}

fn default_alpha() -> f64 {
    0.1
}

fn default_uc_rule() -> u8 {
    2
}

impl PcParams {
    fn validate(&self) -> Result<(), AdapterError> {
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(AdapterError::invalid_params(
                "pc",
                format!("alpha must be in (0, 1), got {}", self.alpha),
            ));
        }
        if self.uc_rule > 2 {
            return Err(AdapterError::invalid_params(
                "pc",
                format!("uc_rule must be 0, 1 or 2, got {}", self.uc_rule),
            ));
        }
        Ok(())
    }
}

/// PC adapter. With background knowledge, forbidden edges are passed to the
/// backend and also stripped from its output before acyclic reduction.
pub struct PcAdapter<B> {
    backend: B,
    forbidden: Option<ForbiddenEdges>,
}

impl<B: DiscoveryBackend> PcAdapter<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            forbidden: None,
        }
    }

    pub fn with_background(backend: B, forbidden: ForbiddenEdges) -> Self {
        Self {
            backend,
            forbidden: Some(forbidden),
        }
    }

    pub fn forbidden(&self) -> Option<&ForbiddenEdges> {
        self.forbidden.as_ref()
    }
}

impl<B: DiscoveryBackend> AlgorithmAdapter for PcAdapter<B> {
    fn name(&self) -> &str {
        Algorithm::Pc.as_str()
    }

    fn run(
        &self,
        data: &FeatureMatrix,
        labels: &[String],
        params: &ParamSet,
    ) -> Result<GraphModel, AdapterError> {
        let name = self.name();
        let params: PcParams = parse_params(name, params)?;
        params.validate()?;
        check_columns(name, data, labels)?;

        let forbidden = self
            .forbidden
            .as_ref()
            .map(|f| f.index_pairs(labels))
            .unwrap_or_default();
        let output = invoke(&self.backend, Algorithm::Pc, data, &params, forbidden)?;
        let endpoints: Vec<Vec<i64>> = output_field(name, &output, "graph")?;

        let mut graph = decode_endpoints(&endpoints, labels)?;
        if let Some(forbidden) = &self.forbidden {
            graph = forbidden.apply(&graph);
        }
        Ok(graph.to_dag())
    }
}

/// Decode an endpoint matrix into directed edges. Undirected and bidirected
/// pairs become both directions, lower index first.
fn decode_endpoints(endpoints: &[Vec<i64>], labels: &[String]) -> Result<GraphModel, AdapterError> {
    check_square("pc", endpoints, labels)?;
    let mut graph = GraphModel::with_nodes(labels.iter().cloned());
    let n = labels.len();
    for i in 0..n {
        for j in (i + 1)..n {
            let (a, b) = (&labels[i], &labels[j]);
            match (endpoints[i][j], endpoints[j][i]) {
                (0, 0) => {}
                (-1, 1) => graph.add_edge(a, b)?,
                (1, -1) => graph.add_edge(b, a)?,
                (-1, -1) | (1, 1) => {
                    graph.add_edge(a, b)?;
                    graph.add_edge(b, a)?;
                }
                (x, y) => {
                    return Err(AdapterError::backend(
                        "pc",
                        format!("unexpected endpoint pair ({x}, {y}) between '{a}' and '{b}'"),
                    ));
                }
            }
        }
    }
    Ok(graph)
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

    fn data(cols: usize) -> FeatureMatrix {
        FeatureMatrix::from_rows((0..10).map(|r| vec![r as f64; cols]).collect()).unwrap()
    }

    #[test]
    fn test_decodes_directed_and_undirected() {
        // A -> B, B - C (undirected), A and C not adjacent.
        let backend = CannedBackend::ok(serde_json::json!({
            "graph": [[0, -1, 0], [1, 0, -1], [0, -1, 0]]
        }));
        let adapter = PcAdapter::new(&backend);
        let graph = adapter
            .run(&data(3), &labels(&["A", "B", "C"]), &ParamSet::new())
            .unwrap();
        // B - C collapses to B -> C.
        assert_eq!(graph.edges(), vec![("A", "B"), ("B", "C")]);
        assert!(graph.is_acyclic());
    }

    #[test]
    fn test_reverse_orientation() {
        let backend = CannedBackend::ok(serde_json::json!({ "graph": [[0, 1], [-1, 0]] }));
        let graph = PcAdapter::new(&backend)
            .run(&data(2), &labels(&["A", "B"]), &ParamSet::new())
            .unwrap();
        assert_eq!(graph.edges(), vec![("B", "A")]);
    }

    #[test]
    fn test_defaults_are_sent_to_backend() {
        let backend = CannedBackend::ok(serde_json::json!({ "graph": [[0, 0], [0, 0]] }));
        PcAdapter::new(&backend)
            .run(&data(2), &labels(&["A", "B"]), &ParamSet::new())
            .unwrap();
        let request = backend.last_request();
        assert_eq!(request["algorithm"], "pc");
        assert_eq!(
            request["params"],
            serde_json::json!({ "alpha": 0.1, "stable": false, "uc_rule": 2 })
        );
        assert_eq!(request["forbidden"], serde_json::json!([]));
    }

    #[test]
    fn test_background_knowledge_filters_output() {
        // Backend ignores the constraint and reports income -> age.
        let backend = CannedBackend::ok(serde_json::json!({
            "graph": [[0, 1], [-1, 0]]
        }));
        let names = labels(&["age", "income"]);
        let forbidden = ForbiddenEdges::roots(&names, &["age"]);
        let adapter = PcAdapter::with_background(&backend, forbidden);
        let graph = adapter.run(&data(2), &names, &ParamSet::new()).unwrap();
        assert_eq!(graph.edge_count(), 0);
        assert_eq!(backend.last_request()["forbidden"], serde_json::json!([[1, 0]]));
    }

    #[test]
    fn test_background_keeps_allowed_direction_of_undirected_pair() {
        let backend = CannedBackend::ok(serde_json::json!({
            "graph": [[0, -1], [-1, 0]]
        }));
        let names = labels(&["income", "age"]);
        let adapter = PcAdapter::with_background(&backend, ForbiddenEdges::roots(&names, &["age"]));
        let graph = adapter.run(&data(2), &names, &ParamSet::new()).unwrap();
        assert_eq!(graph.edges(), vec![("age", "income")]);
    }

    #[test]
    fn test_invalid_params() {
        let backend = CannedBackend::ok(serde_json::Value::Null);
        let adapter = PcAdapter::new(&backend);
        let names = labels(&["A", "B"]);

        let alpha = ParamSet::from([("alpha".to_string(), serde_json::json!(1.5))]);
        assert!(matches!(
            adapter.run(&data(2), &names, &alpha),
            Err(AdapterError::InvalidParams { .. })
        ));

        let unknown = ParamSet::from([("max_iter".to_string(), serde_json::json!(10))]);
        assert!(matches!(
            adapter.run(&data(2), &names, &unknown),
            Err(AdapterError::InvalidParams { .. })
        ));
        assert!(backend.requests.borrow().is_empty());
    }

    #[test]
    fn test_shape_mismatch() {
        let backend = CannedBackend::ok(serde_json::json!({ "graph": [[0, 0], [0, 0]] }));
        let err = PcAdapter::new(&backend)
            .run(&data(3), &labels(&["A", "B", "C"]), &ParamSet::new())
            .unwrap_err();
        assert!(matches!(err, AdapterError::ShapeMismatch { expected: 3, .. }));
    }

    #[test]
    fn test_unknown_endpoint_pair() {
        let backend = CannedBackend::ok(serde_json::json!({ "graph": [[0, 2], [1, 0]] }));
        let err = PcAdapter::new(&backend)
            .run(&data(2), &labels(&["A", "B"]), &ParamSet::new())
            .unwrap_err();
        assert!(matches!(err, AdapterError::Backend { .. }));
    }

    #[test]
    fn test_backend_timeout() {
        let backend = CannedBackend::failing(|| DiscoveryError::Timeout { timeout_secs: 9 });
        let err = PcAdapter::new(&backend)
            .run(&data(2), &labels(&["A", "B"]), &ParamSet::new())
            .unwrap_err();
        assert!(matches!(err, AdapterError::Timeout { timeout_secs: 9, .. }));
    }
}
