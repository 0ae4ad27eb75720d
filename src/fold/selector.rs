use std::{collections::BTreeSet, ops::Range};

use crate::{error::Error, Result};

/// Which folds a dataset view is made of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FoldSelector {
    Single(usize),
    /// Every fold but this one, the usual training set of a k-fold run.
    AllExcept(usize),
    Set(BTreeSet<usize>),
}

impl FoldSelector {
    pub fn only(fold: usize) -> Self {
        Self::Single(fold)
    }

    pub fn all_except(fold: usize) -> Self {
        Self::AllExcept(fold)
    }

    pub fn contains(&self, fold: usize) -> bool {
        match self {
            Self::Single(f) => *f == fold,
            Self::AllExcept(f) => *f != fold,
            Self::Set(folds) => folds.contains(&fold),
        }
    }

    pub(crate) fn validate(&self, nfolds: usize) -> Result<()> {
        let out_of_range = match self {
            Self::Single(f) | Self::AllExcept(f) => (*f >= nfolds).then_some(*f),
            Self::Set(folds) => folds.iter().copied().find(|f| *f >= nfolds),
        };

        match out_of_range {
            Some(fold) => Err(Error::invalid(format!(
                "fold {fold} out of range [0, {nfolds})"
            ))),
            None => Ok(()),
        }
    }
}

impl From<usize> for FoldSelector {
    fn from(value: usize) -> Self {
        Self::Single(value)
    }
}

impl From<&[usize]> for FoldSelector {
    fn from(value: &[usize]) -> Self {
        Self::Set(value.iter().copied().collect())
    }
}

impl From<Vec<usize>> for FoldSelector {
    fn from(value: Vec<usize>) -> Self {
        Self::Set(value.into_iter().collect())
    }
}

impl From<BTreeSet<usize>> for FoldSelector {
    fn from(value: BTreeSet<usize>) -> Self {
        Self::Set(value)
    }
}

impl From<Range<usize>> for FoldSelector {
    fn from(value: Range<usize>) -> Self {
        Self::Set(value.collect())
    }
}

impl FromIterator<usize> for FoldSelector {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        Self::Set(iter.into_iter().collect())
    }
}
