//! Cross-validated hyperparameter search over a discovery backend.
//!
//! Every combination of the grid is run on the training rows of every fold
//! and scored by SHD against the reference graph. A fold whose backend call
//! fails is logged and left out of its combination's mean; a combination
//! with no successful fold is marked [`CombinationStatus::AllFoldsFailed`]
//! and cannot win. Execution is sequential because backends are not assumed
//! to be re-entrant.

pub mod folds;
pub mod grid;

pub use folds::{Fold, KFold};
pub use grid::{HyperparameterGrid, describe};

use crate::adapter::{AlgorithmAdapter, ParamSet};
use crate::compare::{Evaluation, evaluate};
use crate::error::{AdapterError, SearchError};
use crate::graph::GraphModel;
use crate::matrix::FeatureMatrix;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Outcome of one (combination, fold) cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FoldScore {
    Scored { fold: usize, evaluation: Evaluation },
    Failed { fold: usize, error: String },
}

impl FoldScore {
    pub fn fold(&self) -> usize {
        match self {
            Self::Scored { fold, .. } | Self::Failed { fold, .. } => *fold,
        }
    }

    pub fn evaluation(&self) -> Option<&Evaluation> {
        match self {
            Self::Scored { evaluation, .. } => Some(evaluation),
            Self::Failed { .. } => None,
        }
    }
}

/// Aggregate status of one combination.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CombinationStatus {
    Scored { mean_shd: f64 },
    AllFoldsFailed,
}

/// All fold results for one parameter combination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinationScore {
    pub params: ParamSet,
    pub folds: Vec<FoldScore>,
    pub status: CombinationStatus,
}

impl CombinationScore {
    fn from_folds(params: ParamSet, folds: Vec<FoldScore>) -> Self {
        let shds: Vec<f64> = folds
            .iter()
            .filter_map(FoldScore::evaluation)
            .map(|e| e.shd as f64)
            .collect();
        let status = match mean(&shds) {
            Some(mean_shd) => CombinationStatus::Scored { mean_shd },
            None => CombinationStatus::AllFoldsFailed,
        };
        Self {
            params,
            folds,
            status,
        }
    }

    pub fn mean_shd(&self) -> Option<f64> {
        match self.status {
            CombinationStatus::Scored { mean_shd } => Some(mean_shd),
            CombinationStatus::AllFoldsFailed => None,
        }
    }

    pub fn successful_folds(&self) -> impl Iterator<Item = &Evaluation> {
        self.folds.iter().filter_map(FoldScore::evaluation)
    }
}

/// The winning combination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestConfiguration {
    pub params: ParamSet,
    pub mean_shd: f64,
    /// SHD per fold, `None` where the fold failed.
    pub per_fold_shd: Vec<Option<usize>>,
    /// Mean recall over the winner's successful folds.
    pub recall_at_best: f64,
    /// Mean precision over the winner's successful folds.
    pub precision_at_best: f64,
}

impl BestConfiguration {
    fn from_score(score: &CombinationScore, mean_shd: f64) -> Self {
        let recalls: Vec<f64> = score.successful_folds().map(|e| e.recall).collect();
        let precisions: Vec<f64> = score.successful_folds().map(|e| e.precision).collect();
        Self {
            params: score.params.clone(),
            mean_shd,
            per_fold_shd: score
                .folds
                .iter()
                .map(|f| f.evaluation().map(|e| e.shd))
                .collect(),
            recall_at_best: mean(&recalls).unwrap_or(0.0),
            precision_at_best: mean(&precisions).unwrap_or(0.0),
        }
    }
}

/// Either a winner or the terminal signal that nothing succeeded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SearchOutcome {
    Best(BestConfiguration),
    NoConfigurationSucceeded,
}

/// Full result of a search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchReport {
    pub adapter: String,
    pub n_splits: usize,
    pub seed: u64,
    pub outcome: SearchOutcome,
    pub all_scores: Vec<CombinationScore>,
}

impl SearchReport {
    pub fn best(&self) -> Option<&BestConfiguration> {
        match &self.outcome {
            SearchOutcome::Best(best) => Some(best),
            SearchOutcome::NoConfigurationSucceeded => None,
        }
    }

    /// Combinations with no successful fold.
    pub fn failed_combinations(&self) -> impl Iterator<Item = &CombinationScore> {
        self.all_scores
            .iter()
            .filter(|s| s.status == CombinationStatus::AllFoldsFailed)
    }
}

/// K-fold cross-validated grid search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossValidatedSearch {
    pub kfold: KFold,
}

impl CrossValidatedSearch {
    pub fn new(n_splits: usize, seed: u64) -> Self {
        Self {
            kfold: KFold::new(n_splits, seed),
        }
    }

    /// Run every (combination, fold) cell and select the minimum mean SHD.
    ///
    /// Only setup problems are returned as errors; backend failures are
    /// recorded in the report.
    pub fn run<A: AlgorithmAdapter + ?Sized>(
        &self,
        data: &FeatureMatrix,
        labels: &[String],
        grid: &HyperparameterGrid,
        truth: &GraphModel,
        adapter: &A,
    ) -> Result<SearchReport, SearchError> {
        if data.n_cols() != labels.len() {
            return Err(SearchError::LabelMismatch {
                columns: data.n_cols(),
                labels: labels.len(),
            });
        }
        grid.validate()?;
        let folds = self.kfold.split(data.n_rows())?;
        let training_sets: Vec<FeatureMatrix> =
            folds.iter().map(|f| data.select_rows(&f.train)).collect();

        info!(
            adapter = adapter.name(),
            combinations = grid.size(),
            n_splits = self.kfold.n_splits,
            seed = self.kfold.seed,
            "Starting cross-validated search"
        );

        let mut all_scores = Vec::with_capacity(grid.size());
        for params in grid.combinations() {
            let label = describe(&params);
            let mut scores = Vec::with_capacity(folds.len());
            for (fold, train) in folds.iter().zip(&training_sets) {
                match adapter.run(train, labels, &params) {
                    Ok(estimate) => {
                        let evaluation = evaluate(&estimate, truth);
                        debug!(
                            params = %label,
                            fold = fold.index,
                            shd = evaluation.shd,
                            "Fold scored"
                        );
                        scores.push(FoldScore::Scored {
                            fold: fold.index,
                            evaluation,
                        });
                    }
                    Err(e) => {
                        warn!(params = %label, fold = fold.index, error = %e, "Fold failed");
                        scores.push(FoldScore::Failed {
                            fold: fold.index,
                            error: e.to_string(),
                        });
                    }
                }
            }

            let score = CombinationScore::from_folds(params, scores);
            match score.mean_shd() {
                Some(mean_shd) => info!(params = %label, mean_shd, "Combination scored"),
                None => warn!(params = %label, "All folds failed"),
            }
            all_scores.push(score);
        }

        let outcome = select_best(&all_scores);
        match &outcome {
            SearchOutcome::Best(best) => info!(
                params = %describe(&best.params),
                mean_shd = best.mean_shd,
                "Best configuration selected"
            ),
            SearchOutcome::NoConfigurationSucceeded => {
                warn!(adapter = adapter.name(), "No configuration succeeded")
            }
        }

        Ok(SearchReport {
            adapter: adapter.name().to_string(),
            n_splits: self.kfold.n_splits,
            seed: self.kfold.seed,
            outcome,
            all_scores,
        })
    }
}

/// Cross-validated grid search with an explicit seed.
///
/// See [`CrossValidatedSearch::run`].
pub fn search<A: AlgorithmAdapter + ?Sized>(
    data: &FeatureMatrix,
    labels: &[String],
    grid: &HyperparameterGrid,
    truth: &GraphModel,
    adapter: &A,
    n_splits: usize,
    seed: u64,
) -> Result<SearchReport, SearchError> {
    CrossValidatedSearch::new(n_splits, seed).run(data, labels, grid, truth, adapter)
}

/// Minimum mean SHD; the first combination wins ties.
fn select_best(scores: &[CombinationScore]) -> SearchOutcome {
    let mut best: Option<(&CombinationScore, f64)> = None;
    for score in scores {
        if let Some(mean_shd) = score.mean_shd() {
            if best.is_none_or(|(_, current)| mean_shd < current) {
                best = Some((score, mean_shd));
            }
        }
    }
    match best {
        Some((score, mean_shd)) => {
            SearchOutcome::Best(BestConfiguration::from_score(score, mean_shd))
        }
        None => SearchOutcome::NoConfigurationSucceeded,
    }
}

/// A single full-data run and its comparison against the truth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SingleRun {
    pub graph: GraphModel,
    pub evaluation: Evaluation,
}

/// Run `adapter` once on all rows and evaluate with the same rules as the search.
pub fn evaluate_once<A: AlgorithmAdapter + ?Sized>(
    data: &FeatureMatrix,
    labels: &[String],
    params: &ParamSet,
    truth: &GraphModel,
    adapter: &A,
) -> Result<SingleRun, AdapterError> {
    let graph = adapter.run(data, labels, params)?;
    let evaluation = evaluate(&graph, truth);
    info!(
        adapter = adapter.name(),
        shd = evaluation.shd,
        recall = evaluation.recall,
        precision = evaluation.precision,
        "Evaluated single run"
    );
    Ok(SingleRun { graph, evaluation })
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}
