use tracing::debug;

use crate::{
    error::Error,
    tensor::Tensor,
    transforms::{argmax, one_hot},
    Float, Result,
};

use super::{member_shape, Ensemble};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VoteInput {
    /// Members hold class labels or thresholded binary values.
    #[default]
    Labels,
    /// Members are one-hot along `channel_dim` with `num_classes` channels.
    OneHot {
        num_classes: usize,
        channel_dim: usize,
    },
}

/// Majority vote across the ensemble. Members must already be discrete;
/// this is not checked. On a tie the lowest value wins.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VoteEnsemble {
    input: VoteInput,
}

impl VoteEnsemble {
    pub fn new() -> Self {
        Self {
            input: VoteInput::Labels,
        }
    }

    /// Members are reduced by argmax along `channel_dim`, voted, and the
    /// winner is expanded back to `num_classes` one-hot channels.
    pub fn one_hot(num_classes: usize, channel_dim: usize) -> Self {
        Self {
            input: VoteInput::OneHot {
                num_classes,
                channel_dim,
            },
        }
    }

    pub fn input(&self) -> VoteInput {
        self.input
    }
}

impl Ensemble for VoteEnsemble {
    fn combine(&self, members: &[Tensor]) -> Result<Tensor> {
        let shape = member_shape(members)?;
        debug!(members = members.len(), ?shape, input = ?self.input, "vote ensemble");

        match self.input {
            VoteInput::Labels => Ok(vote_labels(members, shape)),
            VoteInput::OneHot {
                num_classes,
                channel_dim,
            } => {
                match shape.get(channel_dim) {
                    Some(channels) if *channels == num_classes => {}
                    Some(channels) => {
                        return Err(Error::invalid(format!(
                            "axis {channel_dim} has {channels} channels, expected {num_classes}"
                        )))
                    }
                    None => {
                        return Err(Error::invalid(format!(
                            "axis {channel_dim} out of range for shape {shape:?}"
                        )))
                    }
                }

                let labels = members
                    .iter()
                    .map(|member| argmax(member, channel_dim))
                    .collect::<Result<Vec<_>>>()?;
                let voted = vote_labels(&labels, labels[0].shape());
                one_hot(&voted, num_classes, channel_dim)
            }
        }
    }
}

// Most frequent value at each position, lowest value on ties.
fn vote_labels(members: &[Tensor], shape: &[usize]) -> Tensor {
    let mut out = Tensor::zeros(shape);
    let mut column: Vec<Float> = Vec::with_capacity(members.len());

    for (i, o) in out.data.iter_mut().enumerate() {
        column.clear();
        column.extend(members.iter().map(|member| member.data[i]));
        column.sort_by(|a, b| a.total_cmp(b));

        let mut best = column[0];
        let mut best_count = 0;
        let mut run_start = 0;
        for j in 1..=column.len() {
            if j == column.len() || column[j] != column[run_start] {
                // strictly greater keeps the earlier, lower value on ties
                if j - run_start > best_count {
                    best = column[run_start];
                    best_count = j - run_start;
                }
                run_start = j;
            }
        }
        *o = best;
    }
    out
}
