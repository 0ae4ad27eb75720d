mod cross_validation;
mod selector;

pub use cross_validation::*;
pub use selector::*;

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{error::Error, utils::seeded_rng, Result};

/// How sample indices are dealt into folds. Every strategy yields folds
/// whose sizes differ by at most one; a new splitting rule is a new
/// variant here.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitStrategy {
    /// Shuffle `0..n` with the seeded RNG, then deal the shuffled
    /// sequence round-robin: shuffled position `p` goes to fold `p % k`.
    #[default]
    Shuffled,
    /// No shuffle, index `i` goes to fold `i % k`.
    Interleaved,
    /// No shuffle, `k` contiguous runs, the first `n % k` one longer.
    Contiguous,
}

// Maps every sample index to the fold it belongs to. Computed once
// from (len, nfolds, seed, strategy) and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawFoldAssignment")]
pub struct FoldAssignment {
    nfolds: usize,
    seed: u64,
    strategy: SplitStrategy,
    folds: Vec<usize>,
}

impl FoldAssignment {
    /// Splits `samples` into `nfolds` shuffled folds.
    pub fn build<T>(samples: &[T], nfolds: usize, seed: u64) -> Result<Self> {
        Self::build_with(samples.len(), nfolds, seed, SplitStrategy::Shuffled)
    }

    pub fn build_with(len: usize, nfolds: usize, seed: u64, strategy: SplitStrategy) -> Result<Self> {
        if nfolds < 2 {
            return Err(Error::invalid(format!(
                "nfolds must be at least 2, got {nfolds}"
            )));
        }
        if nfolds > len {
            return Err(Error::invalid(format!(
                "nfolds ({nfolds}) exceeds the number of samples ({len})"
            )));
        }

        let mut folds = vec![0; len];
        match strategy {
            SplitStrategy::Shuffled => {
                let mut order: Vec<usize> = (0..len).collect();
                order.shuffle(&mut seeded_rng(seed));
                for (position, index) in order.into_iter().enumerate() {
                    folds[index] = position % nfolds;
                }
            }
            SplitStrategy::Interleaved => {
                for (index, fold) in folds.iter_mut().enumerate() {
                    *fold = index % nfolds;
                }
            }
            SplitStrategy::Contiguous => {
                let base = len / nfolds;
                let extra = len % nfolds;
                let mut start = 0;
                for fold in 0..nfolds {
                    let size = base + usize::from(fold < extra);
                    folds[start..start + size].fill(fold);
                    start += size;
                }
            }
        }

        let assignment = Self {
            nfolds,
            seed,
            strategy,
            folds,
        };
        debug!(
            len,
            nfolds,
            seed,
            ?strategy,
            sizes = ?assignment.fold_sizes(),
            "built fold assignment"
        );
        Ok(assignment)
    }

    /// Samples whose fold is picked by `selector`, in their original order.
    pub fn get_view<'a, T>(
        &self,
        samples: &'a [T],
        selector: impl Into<FoldSelector>,
    ) -> Result<Vec<&'a T>> {
        if samples.len() != self.folds.len() {
            return Err(Error::invalid(format!(
                "assignment covers {} samples but {} were given",
                self.folds.len(),
                samples.len()
            )));
        }

        let indices = self.indices(selector)?;
        Ok(indices.into_iter().map(|i| &samples[i]).collect())
    }

    /// Sample indices picked by `selector`, ascending.
    pub fn indices(&self, selector: impl Into<FoldSelector>) -> Result<Vec<usize>> {
        let selector = selector.into();
        selector.validate(self.nfolds)?;

        Ok(self
            .folds
            .iter()
            .enumerate()
            .filter(|(_, fold)| selector.contains(**fold))
            .map(|(i, _)| i)
            .collect())
    }

    pub fn fold_indices(&self, fold: usize) -> Result<Vec<usize>> {
        self.indices(FoldSelector::Single(fold))
    }

    pub fn fold_of(&self, index: usize) -> Option<usize> {
        self.folds.get(index).copied()
    }

    pub fn fold_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.nfolds];
        for fold in &self.folds {
            sizes[*fold] += 1;
        }
        sizes
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn nfolds(&self) -> usize {
        self.nfolds
    }
    pub fn seed(&self) -> u64 {
        self.seed
    }
    pub fn strategy(&self) -> SplitStrategy {
        self.strategy
    }
    pub fn len(&self) -> usize {
        self.folds.len()
    }
    pub fn is_empty(&self) -> bool {
        self.folds.is_empty()
    }
    pub fn as_slice(&self) -> &[usize] {
        &self.folds
    }
}

#[derive(Deserialize)]
struct RawFoldAssignment {
    nfolds: usize,
    seed: u64,
    strategy: SplitStrategy,
    folds: Vec<usize>,
}

impl TryFrom<RawFoldAssignment> for FoldAssignment {
    type Error = Error;

    // a persisted assignment is only accepted if it is exactly what its
    // own (len, nfolds, seed, strategy) produce.
    fn try_from(raw: RawFoldAssignment) -> Result<Self> {
        let rebuilt = Self::build_with(raw.folds.len(), raw.nfolds, raw.seed, raw.strategy)?;
        if rebuilt.folds != raw.folds {
            return Err(Error::invalid(format!(
                "folds do not match {:?} with seed {} for {} samples",
                raw.strategy,
                raw.seed,
                raw.folds.len()
            )));
        }
        Ok(rebuilt)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use rand::random;

    use crate::Error;

    use super::{FoldAssignment, FoldSelector, SplitStrategy};

    const STRATEGIES: [SplitStrategy; 3] = [
        SplitStrategy::Shuffled,
        SplitStrategy::Interleaved,
        SplitStrategy::Contiguous,
    ];

    fn assert_partition(assignment: &FoldAssignment, n: usize, k: usize) {
        assert_eq!(assignment.len(), n);
        assert_eq!(assignment.nfolds(), k);

        let sizes = assignment.fold_sizes();
        assert_eq!(sizes.len(), k);
        assert_eq!(sizes.iter().sum::<usize>(), n);
        let min = *sizes.iter().min().unwrap();
        let max = *sizes.iter().max().unwrap();
        assert!(max - min <= 1, "sizes {sizes:?}");
        assert!(min >= 1);

        let mut seen = BTreeSet::new();
        for fold in 0..k {
            for i in assignment.fold_indices(fold).unwrap() {
                assert!(seen.insert(i), "index {i} in two folds");
            }
        }
        assert_eq!(seen, (0..n).collect());
    }

    #[test]
    fn partitions_every_index_once() {
        for n in 2..40 {
            for k in 2..=n {
                for strategy in STRATEGIES {
                    let assignment = FoldAssignment::build_with(n, k, 12345, strategy).unwrap();
                    assert_partition(&assignment, n, k);
                }
            }
        }
    }

    #[test]
    fn partitions_random_sizes() {
        for _ in 0..50 {
            let n = 2 + random::<usize>() % 500;
            let k = 2 + random::<usize>() % (n - 1);
            let seed = random::<u64>();
            let assignment = FoldAssignment::build_with(n, k, seed, SplitStrategy::Shuffled).unwrap();
            assert_partition(&assignment, n, k);
        }
    }

    #[test]
    fn same_inputs_same_assignment() {
        let samples: Vec<u32> = (0..97).collect();
        let a = FoldAssignment::build(&samples, 5, 12345).unwrap();
        let b = FoldAssignment::build(&samples, 5, 12345).unwrap();
        assert_eq!(a, b);

        let c = FoldAssignment::build(&samples, 5, 54321).unwrap();
        assert_ne!(a.as_slice(), c.as_slice());
    }

    #[test]
    fn unshuffled_strategies_layout() {
        let interleaved = FoldAssignment::build_with(7, 3, 0, SplitStrategy::Interleaved).unwrap();
        assert_eq!(interleaved.as_slice(), &[0, 1, 2, 0, 1, 2, 0]);

        let contiguous = FoldAssignment::build_with(7, 3, 0, SplitStrategy::Contiguous).unwrap();
        assert_eq!(contiguous.as_slice(), &[0, 0, 0, 1, 1, 2, 2]);
    }

    #[test]
    fn rejects_bad_fold_counts() {
        let samples = vec!["a"; 4];
        for k in [0, 1, 5] {
            let err = FoldAssignment::build(&samples, k, 0).unwrap_err();
            assert!(matches!(err, Error::InvalidArgument(_)));
        }
        assert!(FoldAssignment::build(&samples, 4, 0).is_ok());
    }

    #[test]
    fn complement_and_fold_cover_samples() {
        let samples: Vec<String> = (0..23).map(|i| format!("img{i}")).collect();
        let assignment = FoldAssignment::build(&samples, 5, 7).unwrap();

        for fold in 0..5 {
            let train = assignment
                .get_view(&samples, FoldSelector::AllExcept(fold))
                .unwrap();
            let val = assignment.get_view(&samples, fold).unwrap();

            let mut all: Vec<&String> = train.iter().chain(val.iter()).copied().collect();
            assert_eq!(all.len(), samples.len());
            all.sort();
            all.dedup();
            assert_eq!(all.len(), samples.len());
        }
    }

    #[test]
    fn view_keeps_original_order() {
        let samples: Vec<usize> = (0..50).collect();
        let assignment = FoldAssignment::build(&samples, 4, 99).unwrap();
        let view = assignment.get_view(&samples, vec![0usize, 2]).unwrap();
        assert!(view.windows(2).all(|w| w[0] < w[1]));
        for sample in view {
            assert!(matches!(assignment.fold_of(*sample), Some(0) | Some(2)));
        }
    }

    #[test]
    fn view_rejects_out_of_range_fold() {
        let samples: Vec<usize> = (0..10).collect();
        let assignment = FoldAssignment::build(&samples, 5, 0).unwrap();
        assert!(assignment.get_view(&samples, FoldSelector::only(5)).is_err());
        assert!(assignment.get_view(&samples, vec![1usize, 7]).is_err());
        assert!(assignment.get_view(&samples, FoldSelector::AllExcept(5)).is_err());
        assert!(assignment.get_view(&samples[..9], FoldSelector::only(0)).is_err());
    }

    #[test]
    fn empty_selector_gives_empty_view() {
        let samples: Vec<usize> = (0..10).collect();
        let assignment = FoldAssignment::build(&samples, 5, 0).unwrap();
        let view = assignment.get_view(&samples, Vec::<usize>::new()).unwrap();
        assert!(view.is_empty());
    }

    #[test]
    fn json_round_trip_and_validation() {
        let assignment = FoldAssignment::build_with(12, 3, 5, SplitStrategy::Shuffled).unwrap();
        let json = assignment.to_json().unwrap();
        assert_eq!(FoldAssignment::from_json(&json).unwrap(), assignment);

        let out_of_range =
            r#"{"nfolds":2,"seed":0,"strategy":"interleaved","folds":[0,1,2,0]}"#;
        assert!(FoldAssignment::from_json(out_of_range).is_err());

        let unbalanced = r#"{"nfolds":2,"seed":0,"strategy":"contiguous","folds":[0,0,0,1]}"#;
        assert!(FoldAssignment::from_json(unbalanced).is_err());

        // balanced and in range, but not what contiguous gives for these inputs
        let mismatched = r#"{"nfolds":2,"seed":5,"strategy":"contiguous","folds":[1,0,1,0]}"#;
        assert!(FoldAssignment::from_json(mismatched).is_err());
        let matching = r#"{"nfolds":2,"seed":5,"strategy":"contiguous","folds":[0,0,1,1]}"#;
        assert_eq!(
            FoldAssignment::from_json(matching).unwrap(),
            FoldAssignment::build_with(4, 2, 5, SplitStrategy::Contiguous).unwrap()
        );

        let too_many_folds = r#"{"nfolds":5,"seed":0,"strategy":"interleaved","folds":[0,1,2,3]}"#;
        assert!(FoldAssignment::from_json(too_many_folds).is_err());
    }
}
