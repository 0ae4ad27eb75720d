mod serde;

use rand::Rng;

use crate::{error::Error, utils::randn, Float, Result};

// Tensor is the basic building block of all data handed to the
// combiners, transforms and metrics. It is a dense row-major array
// of numbers with an arbitrary shape. Predictions are conventionally
// laid out as [batch, channel, spatial...], a stacked prediction
// bundle as [member, batch, channel, spatial...].
#[derive(Debug, Clone, PartialEq, ::serde::Serialize)]
pub struct Tensor {
    shape: Vec<usize>,

    pub data: Vec<Float>,
}

impl From<Vec<Float>> for Tensor {
    fn from(value: Vec<Float>) -> Self {
        Self {
            shape: vec![value.len()],
            data: value,
        }
    }
}

impl From<&[Float]> for Tensor {
    fn from(value: &[Float]) -> Self {
        Self {
            shape: vec![value.len()],
            data: value.to_vec(),
        }
    }
}

impl Tensor {
    pub fn new(shape: &[usize], data: Vec<Float>) -> Result<Self> {
        let n = element_count(shape);
        if data.len() != n {
            return Err(Error::invalid(format!(
                "shape {shape:?} holds {n} elements but {} were given",
                data.len()
            )));
        }

        Ok(Self {
            shape: shape.to_vec(),
            data,
        })
    }

    pub fn with_constant(shape: &[usize], constant: Float) -> Self {
        let n = element_count(shape);

        Self {
            shape: shape.to_vec(),
            data: vec![constant; n],
        }
    }

    pub fn zeros(shape: &[usize]) -> Self {
        Self::with_constant(shape, 0.0)
    }

    /// Fills a tensor with samples from `N(mean, std)`.
    pub fn randn<R: Rng + ?Sized>(shape: &[usize], mean: Float, std: Float, rng: &mut R) -> Self {
        let n = element_count(shape);
        let mut data = Vec::with_capacity(n);
        for _ in 0..n {
            data.push(randn(rng, mean, std));
        }

        Self {
            shape: shape.to_vec(),
            data,
        }
    }

    fn get_index(&self, index: &[usize]) -> usize {
        debug_assert_eq!(index.len(), self.shape.len());

        let mut flat = 0;
        for (i, n) in index.iter().zip(&self.shape) {
            debug_assert!(i < n, "index {index:?} out of bounds for {:?}", self.shape);
            flat = flat * n + i;
        }
        flat
    }

    pub fn get(&self, index: &[usize]) -> Float {
        self.data[self.get_index(index)]
    }

    pub fn set(&mut self, index: &[usize], value: Float) {
        let index = self.get_index(index);
        self.data[index] = value
    }

    pub fn add(&mut self, index: &[usize], value: Float) {
        let index = self.get_index(index);
        self.data[index] += value
    }

    /// Same data under a new shape with the same element count.
    pub fn reshape(mut self, shape: &[usize]) -> Result<Self> {
        if element_count(shape) != self.data.len() {
            return Err(Error::invalid(format!(
                "cannot reshape {:?} into {shape:?}",
                self.shape
            )));
        }
        self.shape = shape.to_vec();
        Ok(self)
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }
    pub fn rank(&self) -> usize {
        self.shape.len()
    }
    pub fn len(&self) -> usize {
        self.data.len()
    }
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

pub fn element_count(shape: &[usize]) -> usize {
    shape.iter().product()
}

// row-major strides: the last axis is contiguous.
pub fn strides(shape: &[usize]) -> Vec<usize> {
    let mut strides = vec![1; shape.len()];
    for axis in (0..shape.len().saturating_sub(1)).rev() {
        strides[axis] = strides[axis + 1] * shape[axis + 1];
    }
    strides
}
