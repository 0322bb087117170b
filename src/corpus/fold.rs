//! K-fold rotation over a token stream

use crate::corpus::stream::TokenStream;
use crate::error::{Result, TagTuneError};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// How stream positions are assigned to folds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SplitPolicy {
    /// Contiguous blocks of stream order, in K roughly-equal chunks.
    Sequential,
    /// Seeded pseudo-random assignment, fixed for the splitter's lifetime.
    Random { seed: u64 },
}

/// Rotating k-fold splitter over a base stream.
///
/// For the current pivot, [`held_out`](FoldSplitter::held_out) yields the
/// pivot fold and [`held_in`](FoldSplitter::held_in) yields every other fold;
/// both views preserve base stream order, together they cover the base stream
/// exactly, and rotating the pivot over `0..k` holds every example out
/// exactly once.
#[derive(Debug, Clone)]
pub struct FoldSplitter {
    base: TokenStream,
    /// Fold identifier per base stream position. Computed once at
    /// construction; never re-randomized.
    fold_of: Vec<usize>,
    k: usize,
    pivot: usize,
}

impl FoldSplitter {
    pub fn new(base: &TokenStream, k: usize, policy: SplitPolicy) -> Result<Self> {
        let n = base.len();
        if k < 2 {
            return Err(TagTuneError::ConfigError(format!(
                "fold count must be at least 2, got {k}"
            )));
        }
        if k > n {
            return Err(TagTuneError::ConfigError(format!(
                "fold count {k} exceeds the {n} available examples"
            )));
        }
        Ok(Self {
            base: base.clone(),
            fold_of: assign_folds(n, k, policy),
            k,
            pivot: 0,
        })
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn pivot(&self) -> usize {
        self.pivot
    }

    /// Select which fold is held out for evaluation.
    pub fn set_pivot(&mut self, pivot: usize) -> Result<()> {
        if pivot >= self.k {
            return Err(TagTuneError::ConfigError(format!(
                "pivot {} out of range for {} folds",
                pivot, self.k
            )));
        }
        self.pivot = pivot;
        Ok(())
    }

    /// Training view: all folds except the pivot, in base stream order.
    pub fn held_in(&self) -> TokenStream {
        self.select(|fold| fold != self.pivot)
    }

    /// Evaluation view: the pivot fold, in base stream order.
    pub fn held_out(&self) -> TokenStream {
        self.select(|fold| fold == self.pivot)
    }

    fn select(&self, keep: impl Fn(usize) -> bool) -> TokenStream {
        let positions: Vec<usize> = self
            .fold_of
            .iter()
            .enumerate()
            .filter(|(_, &fold)| keep(fold))
            .map(|(pos, _)| pos)
            .collect();
        self.base.subview(&positions)
    }
}

/// Deterministic fold assignment for `n` stream positions. The first
/// `n % k` folds receive one extra example.
fn assign_folds(n: usize, k: usize, policy: SplitPolicy) -> Vec<usize> {
    let order: Vec<usize> = match policy {
        SplitPolicy::Sequential => (0..n).collect(),
        SplitPolicy::Random { seed } => {
            let mut order: Vec<usize> = (0..n).collect();
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            order.shuffle(&mut rng);
            order
        }
    };

    let mut fold_of = vec![0; n];
    let base = n / k;
    let remainder = n % k;
    let mut current = 0;
    for fold in 0..k {
        let size = if fold < remainder { base + 1 } else { base };
        for &pos in &order[current..current + size] {
            fold_of[pos] = fold;
        }
        current += size;
    }
    fold_of
}
