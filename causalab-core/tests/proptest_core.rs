//! Property-based tests for graph comparison and search using proptest.

use proptest::prelude::*;

use causalab_core::search::KFold;
use causalab_core::{
    AdapterError, AlgorithmAdapter, FeatureMatrix, GraphModel, HyperparameterGrid, ParamSet,
    SearchOutcome, evaluate, search,
};

const LABELS: [&str; 6] = ["A", "B", "C", "D", "E", "F"];

fn build_graph(edges: &[(usize, usize)]) -> GraphModel {
    let mut graph = GraphModel::with_nodes(LABELS);
    for &(from, to) in edges {
        if from != to {
            graph.add_edge(LABELS[from], LABELS[to]).unwrap();
        }
    }
    graph
}

fn edge_strategy() -> impl Strategy<Value = Vec<(usize, usize)>> {
    prop::collection::vec((0..LABELS.len(), 0..LABELS.len()), 0..20)
}

// --- Comparator properties ---

proptest! {
    #[test]
    fn self_comparison_is_perfect(edges in edge_strategy()) {
        let graph = build_graph(&edges);
        prop_assume!(graph.edge_count() > 0);
        let eval = evaluate(&graph, &graph);
        prop_assert_eq!(eval.shd, 0);
        prop_assert_eq!(eval.recall, 1.0);
        prop_assert_eq!(eval.precision, 1.0);
    }

    #[test]
    fn empty_truth_gives_zero_recall(edges in edge_strategy()) {
        let graph = build_graph(&edges);
        let empty = GraphModel::with_nodes(LABELS);
        let eval = evaluate(&graph, &empty);
        prop_assert_eq!(eval.counts.true_positives, 0);
        prop_assert_eq!(eval.counts.false_negatives, 0);
        prop_assert_eq!(eval.recall, 0.0);
        prop_assert_eq!(eval.shd, graph.edge_count());
    }

    #[test]
    fn precision_and_recall_swap_with_arguments(
        a in edge_strategy(),
        b in edge_strategy(),
    ) {
        let a = build_graph(&a);
        let b = build_graph(&b);
        prop_assert_eq!(evaluate(&a, &b).precision, evaluate(&b, &a).recall);
        prop_assert_eq!(evaluate(&a, &b).shd, evaluate(&b, &a).shd);
    }

    #[test]
    fn shd_is_false_positives_plus_false_negatives(
        a in edge_strategy(),
        b in edge_strategy(),
    ) {
        let eval = evaluate(&build_graph(&a), &build_graph(&b));
        prop_assert_eq!(
            eval.shd,
            eval.counts.false_positives + eval.counts.false_negatives
        );
        prop_assert!((0.0..=1.0).contains(&eval.recall));
        prop_assert!((0.0..=1.0).contains(&eval.precision));
    }
}

// --- DAG normalization properties ---

proptest! {
    #[test]
    fn to_dag_is_idempotent(edges in edge_strategy()) {
        let graph = build_graph(&edges);
        let once = graph.to_dag();
        let twice = once.to_dag();
        prop_assert_eq!(twice.edges(), once.edges());
        prop_assert_eq!(twice, once);
    }

    #[test]
    fn to_dag_removes_every_two_cycle(edges in edge_strategy()) {
        let graph = build_graph(&edges);
        let dag = graph.to_dag();
        for (from, to) in dag.edges() {
            prop_assert!(graph.has_edge(from, to));
            prop_assert!(!dag.has_edge(to, from));
        }
        // Each 2-cycle loses exactly one edge.
        let two_cycles = graph
            .edges()
            .iter()
            .filter(|(from, to)| graph.has_edge(to, from))
            .count()
            / 2;
        prop_assert_eq!(dag.edge_count(), graph.edge_count() - two_cycles);
        prop_assert_eq!(dag.node_count(), graph.node_count());
    }
}

// --- Fold properties ---

proptest! {
    #[test]
    fn folds_are_reproducible_and_disjoint(
        rows in 2usize..200,
        n_splits in 2usize..10,
        seed in any::<u64>(),
    ) {
        prop_assume!(n_splits <= rows);
        let kfold = KFold::new(n_splits, seed);
        let first = kfold.split(rows).unwrap();
        let second = kfold.split(rows).unwrap();
        prop_assert_eq!(&first, &second);

        let mut seen: Vec<usize> = first.iter().flat_map(|f| f.held_out.clone()).collect();
        seen.sort_unstable();
        prop_assert_eq!(seen, (0..rows).collect::<Vec<_>>());

        let min = first.iter().map(|f| f.held_out.len()).min().unwrap();
        let max = first.iter().map(|f| f.held_out.len()).max().unwrap();
        prop_assert!(max - min <= 1);
    }
}

// --- Search properties ---

/// Adds `A -> B` only when the first training row is even, so the score
/// depends on how the rows were partitioned.
struct RowSensitiveAdapter;

impl AlgorithmAdapter for RowSensitiveAdapter {
    fn name(&self) -> &str {
        "row-sensitive"
    }

    fn run(
        &self,
        data: &FeatureMatrix,
        labels: &[String],
        params: &ParamSet,
    ) -> Result<GraphModel, AdapterError> {
        let mut graph = GraphModel::with_nodes(labels.iter().cloned());
        let offset = params.get("offset").and_then(|v| v.as_u64()).unwrap_or(0);
        let first = data.row(0).map_or(0.0, |r| r[0]) as u64;
        if (first + offset) % 2 == 0 {
            graph.add_edge("A", "B")?;
        }
        Ok(graph)
    }
}

struct AlwaysFails;

impl AlgorithmAdapter for AlwaysFails {
    fn name(&self) -> &str {
        "always-fails"
    }

    fn run(
        &self,
        _data: &FeatureMatrix,
        _labels: &[String],
        _params: &ParamSet,
    ) -> Result<GraphModel, AdapterError> {
        Err(AdapterError::backend("always-fails", "singular matrix"))
    }
}

fn two_column_data(rows: usize) -> (FeatureMatrix, Vec<String>) {
    let matrix =
        FeatureMatrix::from_rows((0..rows).map(|i| vec![i as f64, 0.0]).collect()).unwrap();
    (matrix, vec!["A".to_string(), "B".to_string()])
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn fixed_seed_gives_identical_selection(seed in any::<u64>(), rows in 6usize..40) {
        let (data, labels) = two_column_data(rows);
        let truth = GraphModel::from_edges(["A", "B"], &[("A", "B")]).unwrap();
        let grid = HyperparameterGrid::new().with_param("offset", [0, 1, 2]);
        let first = search(&data, &labels, &grid, &truth, &RowSensitiveAdapter, 3, seed).unwrap();
        let second = search(&data, &labels, &grid, &truth, &RowSensitiveAdapter, 3, seed).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn total_failure_never_raises(seed in any::<u64>(), n_splits in 2usize..6) {
        let (data, labels) = two_column_data(12);
        let truth = GraphModel::from_edges(["A", "B"], &[("A", "B")]).unwrap();
        let grid = HyperparameterGrid::new().with_param("offset", [0, 1]);
        let report = search(&data, &labels, &grid, &truth, &AlwaysFails, n_splits, seed).unwrap();
        prop_assert_eq!(&report.outcome, &SearchOutcome::NoConfigurationSucceeded);
        prop_assert_eq!(report.failed_combinations().count(), 2);
    }
}
