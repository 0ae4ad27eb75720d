use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::Result;

use super::{FoldAssignment, FoldSelector, SplitStrategy};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrossValidationConfig {
    pub nfolds: usize,
    pub seed: u64,
    pub strategy: SplitStrategy,
}

impl Default for CrossValidationConfig {
    fn default() -> Self {
        Self {
            nfolds: 5,
            seed: 0,
            strategy: SplitStrategy::Shuffled,
        }
    }
}

/// The training and validation views of one fold.
#[derive(Debug)]
pub struct Split<'a, T> {
    pub fold: usize,
    pub train: Vec<&'a T>,
    pub val: Vec<&'a T>,
}

// CrossValidation owns a sample list together with its fold assignment
// and hands out the per-fold views a k-fold training driver consumes.
#[derive(Debug, Clone)]
pub struct CrossValidation<T> {
    samples: Vec<T>,
    assignment: FoldAssignment,
}

impl<T> CrossValidation<T> {
    pub fn builder() -> CrossValidationBuilder {
        CrossValidationBuilder::new()
    }

    pub fn from_config(config: CrossValidationConfig, samples: Vec<T>) -> Result<Self> {
        let assignment =
            FoldAssignment::build_with(samples.len(), config.nfolds, config.seed, config.strategy)?;
        Ok(Self {
            samples,
            assignment,
        })
    }

    /// Samples of the selected folds, in their original order.
    pub fn dataset(&self, selector: impl Into<FoldSelector>) -> Result<Vec<&T>> {
        self.assignment.get_view(&self.samples, selector)
    }

    /// Training view (every fold but `fold`) and validation view (`fold`).
    pub fn train_val(&self, fold: usize) -> Result<(Vec<&T>, Vec<&T>)> {
        let train = self.dataset(FoldSelector::AllExcept(fold))?;
        let val = self.dataset(FoldSelector::Single(fold))?;
        debug!(fold, train = train.len(), val = val.len(), "fold split");
        Ok((train, val))
    }

    pub fn splits(&self) -> impl Iterator<Item = Split<'_, T>> {
        (0..self.assignment.nfolds()).map(move |fold| {
            let mut train = Vec::new();
            let mut val = Vec::new();
            for (sample, f) in self.samples.iter().zip(self.assignment.as_slice()) {
                if *f == fold {
                    val.push(sample);
                } else {
                    train.push(sample);
                }
            }
            Split { fold, train, val }
        })
    }

    pub fn samples(&self) -> &[T] {
        &self.samples
    }
    pub fn assignment(&self) -> &FoldAssignment {
        &self.assignment
    }
    pub fn nfolds(&self) -> usize {
        self.assignment.nfolds()
    }
    pub fn into_samples(self) -> Vec<T> {
        self.samples
    }
}

pub struct CrossValidationBuilder {
    config: CrossValidationConfig,
}

impl Default for CrossValidationBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CrossValidationBuilder {
    /// Same as [`CrossValidation::builder`]; the sample type is only
    /// fixed at [`build`](Self::build).
    pub fn new() -> Self {
        Self {
            config: CrossValidationConfig::default(),
        }
    }

    pub fn config(mut self, config: CrossValidationConfig) -> Self {
        self.config = config;
        self
    }

    pub fn nfolds(mut self, value: usize) -> Self {
        self.config.nfolds = value;
        self
    }

    pub fn seed(mut self, value: u64) -> Self {
        self.config.seed = value;
        self
    }

    pub fn strategy(mut self, strategy: SplitStrategy) -> Self {
        self.config.strategy = strategy;
        self
    }

    pub fn build<T>(self, samples: Vec<T>) -> Result<CrossValidation<T>> {
        CrossValidation::from_config(self.config, samples)
    }
}
