//! Structural comparison of an estimated graph against a reference graph.
//!
//! Edges are compared as directed pairs over the union of both node sets.
//! SHD is `FP + FN`: a reversed edge counts once as a false positive and
//! once as a false negative, so it costs 2. The same rule is used for single
//! runs and for every fold of a grid search.

use crate::graph::GraphModel;
use serde::{Deserialize, Serialize};

/// Directed-edge confusion counts for one comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionCounts {
    pub true_positives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
}

impl ConfusionCounts {
    /// Count directed edges shared by, or unique to, each graph.
    pub fn between(estimated: &GraphModel, truth: &GraphModel) -> Self {
        let estimated_edges = estimated.edge_set();
        let true_edges = truth.edge_set();
        let true_positives = estimated_edges.intersection(&true_edges).count();
        Self {
            true_positives,
            false_positives: estimated_edges.len() - true_positives,
            false_negatives: true_edges.len() - true_positives,
        }
    }

    /// Structural Hamming distance, `FP + FN`.
    pub fn shd(&self) -> usize {
        self.false_positives + self.false_negatives
    }

    /// `TP / (TP + FN)`, or 0 when the reference has no edges.
    pub fn recall(&self) -> f64 {
        ratio(
            self.true_positives,
            self.true_positives + self.false_negatives,
        )
    }

    /// `TP / (TP + FP)`, or 0 when the estimate has no edges.
    pub fn precision(&self) -> f64 {
        ratio(
            self.true_positives,
            self.true_positives + self.false_positives,
        )
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Result of comparing one estimated graph against the truth.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub shd: usize,
    pub recall: f64,
    pub precision: f64,
    pub counts: ConfusionCounts,
}

impl Evaluation {
    /// `(shd, recall, precision)`.
    pub fn as_tuple(&self) -> (usize, f64, f64) {
        (self.shd, self.recall, self.precision)
    }
}

/// Compare `estimated` against `truth`.
///
/// Never fails: nodes present in only one graph simply contribute no edges
/// to the other side, and zero denominators yield 0.
pub fn evaluate(estimated: &GraphModel, truth: &GraphModel) -> Evaluation {
    let counts = ConfusionCounts::between(estimated, truth);
    Evaluation {
        shd: counts.shd(),
        recall: counts.recall(),
        precision: counts.precision(),
        counts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn graph(nodes: &[&str], edges: &[(&str, &str)]) -> GraphModel {
        GraphModel::from_edges(nodes.iter().copied(), edges).unwrap()
    }

    #[test]
    fn test_reversed_edge_scenario() {
        let truth = graph(&["A", "B", "C"], &[("A", "B"), ("B", "C")]);
        let estimate = graph(&["A", "B", "C"], &[("A", "B"), ("C", "B")]);
        let eval = evaluate(&estimate, &truth);
        assert_eq!(
            eval.counts,
            ConfusionCounts {
                true_positives: 1,
                false_positives: 1,
                false_negatives: 1,
            }
        );
        assert_eq!(eval.shd, 2);
        assert_eq!(eval.recall, 0.5);
        assert_eq!(eval.precision, 0.5);
    }

    #[test]
    fn test_identical_graphs() {
        let g = graph(&["A", "B", "C"], &[("A", "B"), ("B", "C")]);
        assert_eq!(evaluate(&g, &g).as_tuple(), (0, 1.0, 1.0));
    }

    #[test]
    fn test_empty_truth_gives_zero_recall() {
        let estimate = graph(&["A", "B"], &[("A", "B")]);
        let truth = graph(&["A", "B"], &[]);
        let eval = evaluate(&estimate, &truth);
        assert_eq!(eval.counts.true_positives, 0);
        assert_eq!(eval.counts.false_negatives, 0);
        assert_eq!(eval.recall, 0.0);
        assert_eq!(eval.precision, 0.0);
        assert_eq!(eval.shd, 1);
    }

    #[test]
    fn test_both_empty() {
        let g = graph(&["A"], &[]);
        assert_eq!(evaluate(&g, &g).as_tuple(), (0, 0.0, 0.0));
    }

    #[test]
    fn test_disjoint_node_sets() {
        let estimate = graph(&["X", "Y"], &[("X", "Y")]);
        let truth = graph(&["A", "B", "C"], &[("A", "B"), ("B", "C")]);
        let eval = evaluate(&estimate, &truth);
        assert_eq!(eval.shd, 3);
        assert_eq!(eval.counts.true_positives, 0);
    }

    #[test]
    fn test_partial_overlap() {
        let truth = graph(
            &["A", "B", "C", "D"],
            &[("A", "B"), ("B", "C"), ("C", "D"), ("A", "D")],
        );
        let estimate = graph(&["A", "B", "C", "D"], &[("A", "B"), ("B", "C"), ("B", "D")]);
        let eval = evaluate(&estimate, &truth);
        assert_eq!(eval.shd, 3);
        assert_eq!(eval.recall, 0.5);
        assert!((eval.precision - 2.0 / 3.0).abs() < 1e-12);
    }
}
