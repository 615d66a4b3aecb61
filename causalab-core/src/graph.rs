//! Directed graph over named variables.
//!
//! Uses petgraph's `StableDiGraph` so that indices survive removals. Each edge
//! carries an insertion sequence number, because the graph reuses freed edge
//! slots. Edges are reported in insertion order; that order is the backend's
//! native edge order and drives the 2-cycle tie-break in
//! [`GraphModel::to_dag`].

use crate::error::GraphError;
use petgraph::algo::tarjan_scc;
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::visit::{EdgeRef, IntoEdgeReferences};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// A directed graph whose nodes are unique variable labels.
///
/// No self-loops and no parallel edges. The graph may contain cycles; use
/// [`GraphModel::to_dag`] to collapse 2-cycles.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "GraphSnapshot", into = "GraphSnapshot")]
pub struct GraphModel {
    graph: StableDiGraph<String, u64>,
    index: HashMap<String, NodeIndex>,
    next_seq: u64,
}

/// Plain serialized form of a [`GraphModel`].
#[derive(Debug, Clone, Serialize, Deserialize)]
struct GraphSnapshot {
    nodes: Vec<String>,
    edges: Vec<(String, String)>,
}

impl GraphModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a graph containing the given nodes and no edges.
    pub fn with_nodes<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut graph = Self::new();
        for label in labels {
            graph.add_node(label);
        }
        graph
    }

    /// Create a graph from a node list and an edge list.
    pub fn from_edges<I, S>(labels: I, edges: &[(&str, &str)]) -> Result<Self, GraphError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut graph = Self::with_nodes(labels);
        for (from, to) in edges {
            graph.add_edge(from, to)?;
        }
        Ok(graph)
    }

    /// Add a node. Adding an existing label is a no-op.
    pub fn add_node(&mut self, label: impl Into<String>) {
        let label = label.into();
        if self.index.contains_key(&label) {
            return;
        }
        let idx = self.graph.add_node(label.clone());
        self.index.insert(label, idx);
    }

    /// Add the directed edge `from -> to`.
    ///
    /// Both endpoints must already be nodes and must differ. Adding an edge
    /// that already exists is a no-op.
    pub fn add_edge(&mut self, from: &str, to: &str) -> Result<(), GraphError> {
        let source = self.node(from).ok_or_else(|| {
            GraphError::invalid_edge(from, to, format!("endpoint '{from}' is not in the graph"))
        })?;
        let target = self.node(to).ok_or_else(|| {
            GraphError::invalid_edge(from, to, format!("endpoint '{to}' is not in the graph"))
        })?;
        if source == target {
            return Err(GraphError::invalid_edge(from, to, "self-loops are not allowed"));
        }
        if self.graph.find_edge(source, target).is_none() {
            self.graph.add_edge(source, target, self.next_seq);
            self.next_seq += 1;
        }
        Ok(())
    }

    pub fn has_node(&self, label: &str) -> bool {
        self.index.contains_key(label)
    }

    pub fn has_edge(&self, from: &str, to: &str) -> bool {
        match (self.node(from), self.node(to)) {
            (Some(source), Some(target)) => self.graph.find_edge(source, target).is_some(),
            _ => false,
        }
    }

    /// Remove the edge `from -> to`. Returns whether an edge was removed.
    pub fn remove_edge(&mut self, from: &str, to: &str) -> bool {
        let (Some(source), Some(target)) = (self.node(from), self.node(to)) else {
            return false;
        };
        match self.graph.find_edge(source, target) {
            Some(edge) => self.graph.remove_edge(edge).is_some(),
            None => false,
        }
    }

    /// Node labels in insertion order.
    pub fn nodes(&self) -> Vec<&str> {
        self.graph
            .node_indices()
            .map(|idx| self.graph[idx].as_str())
            .collect()
    }

    /// Edges as `(from, to)` label pairs in insertion order.
    pub fn edges(&self) -> Vec<(&str, &str)> {
        let mut edges: Vec<_> = self.graph.edge_references().collect();
        edges.sort_by_key(|edge| *edge.weight());
        edges
            .into_iter()
            .map(|edge| {
                (
                    self.graph[edge.source()].as_str(),
                    self.graph[edge.target()].as_str(),
                )
            })
            .collect()
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Collapse every 2-cycle to a single edge.
    ///
    /// Edges are visited in insertion order; an edge is dropped when its
    /// reverse has already been kept. The first edge of each pair survives.
    pub fn to_dag(&self) -> GraphModel {
        let mut dag = GraphModel::with_nodes(self.nodes());
        for (from, to) in self.edges() {
            if dag.has_edge(to, from) {
                continue;
            }
            // Endpoints come from this graph, so the insert cannot fail.
            let _ = dag.add_edge(from, to);
        }
        dag
    }

    /// Rename nodes. Labels absent from `mapping` keep their name.
    pub fn relabel(&self, mapping: &HashMap<String, String>) -> Result<GraphModel, GraphError> {
        let rename = |label: &str| -> String {
            mapping
                .get(label)
                .cloned()
                .unwrap_or_else(|| label.to_string())
        };
        let mut renamed = GraphModel::with_nodes(self.nodes().into_iter().map(&rename));
        for (from, to) in self.edges() {
            renamed.add_edge(&rename(from), &rename(to))?;
        }
        Ok(renamed)
    }

    /// Strongly connected components with more than one node.
    pub fn find_cycles(&self) -> Vec<Vec<&str>> {
        tarjan_scc(&self.graph)
            .into_iter()
            .filter(|scc| scc.len() > 1)
            .map(|scc| scc.into_iter().map(|idx| self.graph[idx].as_str()).collect())
            .collect()
    }

    pub fn is_acyclic(&self) -> bool {
        self.find_cycles().is_empty()
    }

    /// Directed edge set, for set comparisons.
    pub(crate) fn edge_set(&self) -> BTreeSet<(&str, &str)> {
        self.edges().into_iter().collect()
    }

    fn node(&self, label: &str) -> Option<NodeIndex> {
        self.index.get(label).copied()
    }
}

impl PartialEq for GraphModel {
    fn eq(&self, other: &Self) -> bool {
        let nodes: BTreeSet<&str> = self.nodes().into_iter().collect();
        let other_nodes: BTreeSet<&str> = other.nodes().into_iter().collect();
        nodes == other_nodes && self.edge_set() == other.edge_set()
    }
}

impl Eq for GraphModel {}

impl From<GraphModel> for GraphSnapshot {
    fn from(graph: GraphModel) -> Self {
        Self {
            nodes: graph.nodes().into_iter().map(String::from).collect(),
            edges: graph
                .edges()
                .into_iter()
                .map(|(from, to)| (from.to_string(), to.to_string()))
                .collect(),
        }
    }
}

impl TryFrom<GraphSnapshot> for GraphModel {
    type Error = GraphError;

    fn try_from(snapshot: GraphSnapshot) -> Result<Self, Self::Error> {
        let mut graph = GraphModel::with_nodes(snapshot.nodes);
        for (from, to) in &snapshot.edges {
            graph.add_edge(from, to)?;
        }
        Ok(graph)
    }
}
