use crate::{error::Error, tensor::strides, Result};

// Maps positions of a stacked prediction bundle onto a weight tensor.
//
// Weight dimension k lines up with stacked dimension k, counting from the
// front: a rank-1 weight scales the ensemble axis, a rank-3 weight scales
// ensemble, batch and channel. Each weight dimension is either 1
// (broadcast) or equal to the stacked one. This is not numpy's trailing
// alignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeightBroadcast {
    // per leading stacked dim: (stacked stride, stacked size, weight stride)
    dims: Vec<(usize, usize, usize)>,
}

impl WeightBroadcast {
    pub fn new(weight_shape: &[usize], stacked_shape: &[usize]) -> Result<Self> {
        if weight_shape.len() > stacked_shape.len() {
            return Err(Error::invalid(format!(
                "weights of shape {weight_shape:?} have more dimensions than the stacked bundle {stacked_shape:?}"
            )));
        }

        let stacked_strides = strides(stacked_shape);
        let weight_strides = strides(weight_shape);
        let mut dims = Vec::with_capacity(weight_shape.len());
        for (k, (w, s)) in weight_shape.iter().zip(stacked_shape).enumerate() {
            let weight_stride = if *w == *s {
                weight_strides[k]
            } else if *w == 1 {
                0
            } else {
                return Err(Error::invalid(format!(
                    "weight dimension {k} has size {w}, expected 1 or {s} for bundle {stacked_shape:?}"
                )));
            };
            dims.push((stacked_strides[k], *s, weight_stride));
        }

        Ok(Self { dims })
    }

    /// Offset into the weight data for a flat index of the stacked bundle.
    pub fn weight_index(&self, stacked_index: usize) -> usize {
        self.dims
            .iter()
            .map(|(stride, size, weight_stride)| (stacked_index / stride) % size * weight_stride)
            .sum()
    }
}
