//! Seeded k-fold partitioning of row indices.

use crate::error::SearchError;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

/// K-fold configuration. Rows are always shuffled with an explicit seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KFold {
    pub n_splits: usize,
    pub seed: u64,
}

/// One fold: the rows a backend may see and the rows held out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fold {
    pub index: usize,
    /// Ascending row indices used for discovery.
    pub train: Vec<usize>,
    /// Held-out rows, excluded from the fold's backend call.
    pub held_out: Vec<usize>,
}

impl Default for KFold {
    fn default() -> Self {
        Self {
            n_splits: 5,
            seed: 42,
        }
    }
}

impl KFold {
    pub fn new(n_splits: usize, seed: u64) -> Self {
        Self { n_splits, seed }
    }

    /// Partition `0..n_rows` into `n_splits` folds.
    ///
    /// The first `n_rows % n_splits` folds hold one extra row. The same seed
    /// always produces the same partition.
    pub fn split(&self, n_rows: usize) -> Result<Vec<Fold>, SearchError> {
        if self.n_splits < 2 {
            return Err(SearchError::TooFewSplits {
                n_splits: self.n_splits,
            });
        }
        if self.n_splits > n_rows {
            return Err(SearchError::TooManySplits {
                n_splits: self.n_splits,
                rows: n_rows,
            });
        }

        let mut order: Vec<usize> = (0..n_rows).collect();
        let mut rng = StdRng::seed_from_u64(self.seed);
        order.shuffle(&mut rng);

        let base = n_rows / self.n_splits;
        let extra = n_rows % self.n_splits;
        let mut folds = Vec::with_capacity(self.n_splits);
        let mut start = 0;
        for index in 0..self.n_splits {
            let size = base + usize::from(index < extra);
            let held_out = order[start..start + size].to_vec();
            let mut train: Vec<usize> = order[..start]
                .iter()
                .chain(&order[start + size..])
                .copied()
                .collect();
            train.sort_unstable();
            folds.push(Fold {
                index,
                train,
                held_out,
            });
            start += size;
        }
        Ok(folds)
    }
}
