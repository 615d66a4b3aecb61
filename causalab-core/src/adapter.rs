//! The seam between the search layer and causal-discovery backends.
//!
//! An [`AlgorithmAdapter`] turns a backend's native output into a
//! [`GraphModel`] over the caller's labels. Each backend gets its own
//! implementation; the helpers here cover the normalization steps they share.

use crate::error::AdapterError;
use crate::graph::GraphModel;
use crate::matrix::FeatureMatrix;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// One hyperparameter combination: parameter name to value.
pub type ParamSet = BTreeMap<String, serde_json::Value>;

/// A causal-discovery backend normalized to the canonical graph form.
pub trait AlgorithmAdapter {
    /// Short backend name used in logs and errors.
    fn name(&self) -> &str;

    /// Estimate a graph from `data`, whose column `i` is `labels[i]`.
    ///
    /// Fails with [`AdapterError`] when the backend fails, the parameters are
    /// not understood, or the backend output does not match `labels.len()`.
    fn run(
        &self,
        data: &FeatureMatrix,
        labels: &[String],
        params: &ParamSet,
    ) -> Result<GraphModel, AdapterError>;
}

impl<A: AlgorithmAdapter + ?Sized> AlgorithmAdapter for &A {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn run(
        &self,
        data: &FeatureMatrix,
        labels: &[String],
        params: &ParamSet,
    ) -> Result<GraphModel, AdapterError> {
        (**self).run(data, labels, params)
    }
}

impl<A: AlgorithmAdapter + ?Sized> AlgorithmAdapter for Box<A> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn run(
        &self,
        data: &FeatureMatrix,
        labels: &[String],
        params: &ParamSet,
    ) -> Result<GraphModel, AdapterError> {
        (**self).run(data, labels, params)
    }
}

/// Deserialize a [`ParamSet`] into an adapter's typed parameter struct.
pub fn parse_params<P: DeserializeOwned>(
    backend: &str,
    params: &ParamSet,
) -> Result<P, AdapterError> {
    let object: serde_json::Map<String, serde_json::Value> = params
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    serde_json::from_value(serde_json::Value::Object(object))
        .map_err(|e| AdapterError::invalid_params(backend, e.to_string()))
}

/// Reject input whose column count differs from the label count.
pub fn check_columns(
    backend: &str,
    data: &FeatureMatrix,
    labels: &[String],
) -> Result<(), AdapterError> {
    if data.n_cols() != labels.len() {
        return Err(AdapterError::ShapeMismatch {
            backend: backend.to_string(),
            expected: labels.len(),
            rows: data.n_rows(),
            cols: data.n_cols(),
        });
    }
    Ok(())
}

/// Reject a backend matrix that is not `labels.len()` square.
pub fn check_square<T>(
    backend: &str,
    matrix: &[Vec<T>],
    labels: &[String],
) -> Result<(), AdapterError> {
    let expected = labels.len();
    let rows = matrix.len();
    let bad_row = matrix.iter().find(|row| row.len() != expected);
    if rows != expected || bad_row.is_some() {
        return Err(AdapterError::ShapeMismatch {
            backend: backend.to_string(),
            expected,
            rows,
            cols: bad_row.map_or(expected, Vec::len),
        });
    }
    Ok(())
}

/// Build a graph from a weighted adjacency matrix.
///
/// A non-zero entry `[i][j]` becomes the edge `labels[i] -> labels[j]`.
/// The diagonal and NaN entries are ignored. Edges are inserted row-major.
pub fn graph_from_adjacency(
    backend: &str,
    adjacency: &[Vec<f64>],
    labels: &[String],
) -> Result<GraphModel, AdapterError> {
    check_square(backend, adjacency, labels)?;
    let mut graph = GraphModel::with_nodes(labels.iter().cloned());
    for (i, row) in adjacency.iter().enumerate() {
        for (j, weight) in row.iter().enumerate() {
            if i != j && weight.abs() > 0.0 {
                graph.add_edge(&labels[i], &labels[j])?;
            }
        }
    }
    Ok(graph)
}

/// Background knowledge: directed pairs that must not appear in an estimate.
///
/// Immutable once built; construct it with [`ForbiddenEdges::from_pairs`] or
/// [`ForbiddenEdges::roots`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForbiddenEdges {
    pairs: BTreeSet<(String, String)>,
}

impl ForbiddenEdges {
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, S)>,
        S: Into<String>,
    {
        Self {
            pairs: pairs
                .into_iter()
                .map(|(from, to)| (from.into(), to.into()))
                .collect(),
        }
    }

    /// Forbid every edge into each root variable present in `labels`.
    pub fn roots(labels: &[String], roots: &[&str]) -> Self {
        let mut pairs = BTreeSet::new();
        for root in roots.iter().filter(|r| labels.iter().any(|l| l == *r)) {
            for label in labels.iter().filter(|l| l.as_str() != *root) {
                pairs.insert((label.clone(), root.to_string()));
            }
        }
        Self { pairs }
    }

    pub fn forbids(&self, from: &str, to: &str) -> bool {
        self.pairs.contains(&(from.to_string(), to.to_string()))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(f, t)| (f.as_str(), t.as_str()))
    }

    /// Forbidden pairs as positional indices into `labels`, for backends that
    /// take background knowledge natively. Pairs naming unknown labels are
    /// skipped.
    pub fn index_pairs(&self, labels: &[String]) -> Vec<(usize, usize)> {
        let position = |name: &str| labels.iter().position(|l| l == name);
        self.iter()
            .filter_map(|(from, to)| Some((position(from)?, position(to)?)))
            .collect()
    }

    /// Copy of `graph` without any forbidden edge.
    pub fn apply(&self, graph: &GraphModel) -> GraphModel {
        let mut filtered = GraphModel::with_nodes(graph.nodes());
        for (from, to) in graph.edges() {
            if !self.forbids(from, to) {
                // Endpoints come from `graph`, so the insert cannot fail.
                let _ = filtered.add_edge(from, to);
            }
        }
        filtered
    }
}
