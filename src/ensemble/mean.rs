use tracing::debug;

use crate::{error::Error, tensor::Tensor, Float, Result};

use super::{check_len, member_shape, Ensemble, WeightBroadcast};

/// Weighted arithmetic mean across the ensemble axis,
/// `sum(w_i * pred_i) / sum(w_i)` at every position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeanEnsemble {
    weights: Option<Tensor>,
}

impl MeanEnsemble {
    /// Uniform weights, every member counts `1/M`.
    pub fn new() -> Self {
        Self { weights: None }
    }

    /// `weights` lines up with the stacked bundle from the ensemble axis
    /// on; see [`WeightBroadcast`].
    pub fn with_weights(weights: impl Into<Tensor>) -> Self {
        Self {
            weights: Some(weights.into()),
        }
    }

    pub fn weights(&self) -> Option<&Tensor> {
        self.weights.as_ref()
    }
}

impl Ensemble for MeanEnsemble {
    fn combine(&self, members: &[Tensor]) -> Result<Tensor> {
        let shape = member_shape(members)?;
        let m = members.len();
        debug!(members = m, ?shape, weighted = self.weights.is_some(), "mean ensemble");

        let mut out = Tensor::zeros(shape);
        let Some(weights) = &self.weights else {
            for member in members {
                for (o, v) in out.data.iter_mut().zip(&member.data) {
                    *o += v;
                }
            }
            let scale = 1.0 / m as Float;
            for o in out.data.iter_mut() {
                *o *= scale;
            }
            return Ok(out);
        };

        let mut stacked_shape = Vec::with_capacity(shape.len() + 1);
        stacked_shape.push(m);
        stacked_shape.extend_from_slice(shape);
        check_len(weights, "weights")?;
        let broadcast = WeightBroadcast::new(weights.shape(), &stacked_shape)?;

        let n = out.len();
        let mut wsum = vec![0.0; n];
        for (k, member) in members.iter().enumerate() {
            for (i, v) in member.data.iter().enumerate() {
                let w = weights.data[broadcast.weight_index(k * n + i)];
                out.data[i] += w * v;
                wsum[i] += w;
            }
        }

        for (i, (o, s)) in out.data.iter_mut().zip(&wsum).enumerate() {
            if *s == 0.0 {
                return Err(Error::invalid(format!(
                    "weights sum to zero across the ensemble at position {i}"
                )));
            }
            *o /= s;
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use crate::{Ensemble, Tensor};

    use super::MeanEnsemble;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn uniform_mean_of_identical_members() {
        let v = 0.37;
        let members = vec![Tensor::with_constant(&[2, 1, 3, 3], v); 3];
        let out = MeanEnsemble::new().combine(&members).unwrap();
        assert_eq!(out.shape(), &[2, 1, 3, 3]);
        assert!(out.data.iter().all(|x| close(*x, v)));
    }

    #[test]
    fn weighted_mean_of_scalars() {
        let members = [
            Tensor::from(vec![1.0]),
            Tensor::from(vec![2.0]),
            Tensor::from(vec![3.0]),
        ];
        let out = MeanEnsemble::with_weights(vec![1.0, 2.0, 3.0])
            .combine(&members)
            .unwrap();
        assert!(close(out.data[0], 14.0 / 6.0));
    }

    #[test]
    fn uniform_mean_matches_plain_average() {
        let members = [
            Tensor::from(vec![0.0, 1.0]),
            Tensor::from(vec![1.0, 1.0]),
            Tensor::from(vec![0.5, 0.0]),
            Tensor::from(vec![0.5, 0.0]),
        ];
        let out = MeanEnsemble::new().combine(&members).unwrap();
        assert!(close(out.data[0], 0.5));
        assert!(close(out.data[1], 0.5));
    }

    #[test]
    fn rank_three_weights_per_channel() {
        // members shaped [batch=1, channel=2, spatial=2]
        let a = Tensor::new(&[1, 2, 2], vec![1.0, 1.0, 0.0, 0.0]).unwrap();
        let b = Tensor::new(&[1, 2, 2], vec![0.0, 0.0, 1.0, 1.0]).unwrap();
        // member a trusted on channel 0, member b on channel 1
        let w = Tensor::new(&[2, 1, 2], vec![3.0, 1.0, 1.0, 3.0]).unwrap();

        let out = MeanEnsemble::with_weights(w).combine(&[a, b]).unwrap();
        assert!(close(out.data[0], 0.75));
        assert!(close(out.data[1], 0.75));
        assert!(close(out.data[2], 0.75));
        assert!(close(out.data[3], 0.75));
    }

    #[test]
    fn rejects_bad_inputs() {
        assert!(MeanEnsemble::new().combine(&[]).is_err());

        let a = Tensor::zeros(&[2]);
        let b = Tensor::zeros(&[3]);
        assert!(MeanEnsemble::new().combine(&[a.clone(), b]).is_err());

        let members = [a.clone(), a.clone()];
        assert!(MeanEnsemble::with_weights(vec![1.0, 2.0, 3.0])
            .combine(&members)
            .is_err());
        assert!(MeanEnsemble::with_weights(vec![1.0, -1.0])
            .combine(&members)
            .is_err());
    }

    #[test]
    fn rejects_data_shorter_than_shape() {
        let mut short = Tensor::zeros(&[3]);
        short.data.pop();
        let members = [Tensor::zeros(&[3]), short];
        assert!(MeanEnsemble::new().combine(&members).is_err());
        assert!(MeanEnsemble::with_weights(vec![1.0, 1.0])
            .combine(&members)
            .is_err());

        let mut weights = Tensor::from(vec![1.0, 1.0]);
        weights.data.pop();
        let members = [Tensor::zeros(&[3]), Tensor::zeros(&[3])];
        assert!(MeanEnsemble::with_weights(weights).combine(&members).is_err());
    }
}
