use crate::{error::Error, tensor::Tensor, utils::maxmin, Float, Result};

/// A post-processing step applied to one prediction tensor.
pub trait Transform {
    fn apply(&self, input: &Tensor) -> Result<Tensor>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    Sigmoid,
    Softmax { dim: usize },
}

/// Turns continuous model output into the discrete values a vote or a
/// Dice metric expects.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AsDiscrete {
    /// `1.0` where `x >= t`, `0.0` elsewhere.
    Threshold(Float),
    /// Index of the largest value along `dim`; the axis is kept with size 1.
    Argmax { dim: usize },
    /// Expands an index tensor whose `dim` axis has size 1 into
    /// `num_classes` one-hot channels.
    OneHot { num_classes: usize, dim: usize },
}

// Views a tensor as [outer, size, inner] around `dim`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct AxisView {
    pub outer: usize,
    pub size: usize,
    pub inner: usize,
}

impl AxisView {
    pub fn new(shape: &[usize], dim: usize) -> Result<Self> {
        if dim >= shape.len() {
            return Err(Error::invalid(format!(
                "axis {dim} out of range for shape {shape:?}"
            )));
        }
        Ok(Self {
            outer: shape[..dim].iter().product(),
            size: shape[dim],
            inner: shape[dim + 1..].iter().product(),
        })
    }

    pub fn index(&self, outer: usize, channel: usize, inner: usize) -> usize {
        (outer * self.size + channel) * self.inner + inner
    }
}

impl Transform for Activation {
    fn apply(&self, input: &Tensor) -> Result<Tensor> {
        match *self {
            Activation::Sigmoid => {
                let mut out = input.clone();
                for value in out.data.iter_mut() {
                    *value = 1.0 / (1.0 + (-*value).exp());
                }
                Ok(out)
            }
            Activation::Softmax { dim } => {
                let axis = AxisView::new(input.shape(), dim)?;
                let mut out = input.clone();
                let mut es = vec![0.0; axis.size];
                for o in 0..axis.outer {
                    for i in 0..axis.inner {
                        // subtract the max to keep exp() from overflowing
                        let mut amax = Float::NEG_INFINITY;
                        for c in 0..axis.size {
                            amax = amax.max(input.data[axis.index(o, c, i)]);
                        }
                        if amax == Float::NEG_INFINITY {
                            // every logit is -inf, no class is preferred
                            for c in 0..axis.size {
                                out.data[axis.index(o, c, i)] = 1.0 / axis.size as Float;
                            }
                            continue;
                        }
                        let mut esum = 0.0;
                        for (c, e) in es.iter_mut().enumerate() {
                            *e = (input.data[axis.index(o, c, i)] - amax).exp();
                            esum += *e;
                        }
                        for (c, e) in es.iter().enumerate() {
                            out.data[axis.index(o, c, i)] = e / esum;
                        }
                    }
                }
                Ok(out)
            }
        }
    }
}

impl Transform for AsDiscrete {
    fn apply(&self, input: &Tensor) -> Result<Tensor> {
        match *self {
            AsDiscrete::Threshold(t) => {
                let mut out = input.clone();
                for value in out.data.iter_mut() {
                    *value = if *value >= t { 1.0 } else { 0.0 };
                }
                Ok(out)
            }
            AsDiscrete::Argmax { dim } => argmax(input, dim),
            AsDiscrete::OneHot { num_classes, dim } => one_hot(input, num_classes, dim),
        }
    }
}

pub fn argmax(input: &Tensor, dim: usize) -> Result<Tensor> {
    let axis = AxisView::new(input.shape(), dim)?;
    if axis.size == 0 {
        return Err(Error::invalid(format!("cannot take argmax over empty axis {dim}")));
    }

    let mut shape = input.shape().to_vec();
    shape[dim] = 1;
    let mut out = Tensor::zeros(&shape);
    let mut column = vec![0.0; axis.size];
    for o in 0..axis.outer {
        for i in 0..axis.inner {
            for (c, value) in column.iter_mut().enumerate() {
                *value = input.data[axis.index(o, c, i)];
            }
            if let Some(m) = maxmin(&column) {
                out.data[o * axis.inner + i] = m.max_index as Float;
            }
        }
    }
    Ok(out)
}

pub fn one_hot(input: &Tensor, num_classes: usize, dim: usize) -> Result<Tensor> {
    let axis = AxisView::new(input.shape(), dim)?;
    if axis.size != 1 {
        return Err(Error::invalid(format!(
            "one-hot input must have size 1 on axis {dim}, got {}",
            axis.size
        )));
    }

    let mut shape = input.shape().to_vec();
    shape[dim] = num_classes;
    let mut out = Tensor::zeros(&shape);
    let out_axis = AxisView::new(&shape, dim)?;
    for o in 0..axis.outer {
        for i in 0..axis.inner {
            let value = input.data[o * axis.inner + i];
            let class = value.round();
            if !(class >= 0.0 && (class as usize) < num_classes) {
                return Err(Error::invalid(format!(
                    "class {value} out of range [0, {num_classes})"
                )));
            }
            out.data[out_axis.index(o, class as usize, i)] = 1.0;
        }
    }
    Ok(out)
}

/// Applies transforms in order.
#[derive(Default)]
pub struct Compose {
    transforms: Vec<Box<dyn Transform>>,
}

impl Compose {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(mut self, transform: impl Transform + 'static) -> Self {
        self.transforms.push(Box::new(transform));
        self
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }
}

impl Transform for Compose {
    fn apply(&self, input: &Tensor) -> Result<Tensor> {
        let mut out = input.clone();
        for transform in &self.transforms {
            out = transform.apply(&out)?;
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use crate::Tensor;

    use super::{argmax, one_hot, Activation, AsDiscrete, Compose, Transform};

    #[test]
    fn threshold_is_inclusive() {
        let t = Tensor::from(vec![0.1, 0.5, 0.9]);
        let out = AsDiscrete::Threshold(0.5).apply(&t).unwrap();
        assert_eq!(out.data, vec![0.0, 1.0, 1.0]);
    }

    #[test]
    fn argmax_over_channels() {
        // [batch=1, channel=3, spatial=2]
        let t = Tensor::new(&[1, 3, 2], vec![0.1, 0.7, 0.8, 0.2, 0.1, 0.7]).unwrap();
        let out = argmax(&t, 1).unwrap();
        assert_eq!(out.shape(), &[1, 1, 2]);
        assert_eq!(out.data, vec![1.0, 0.0]);
    }

    #[test]
    fn argmax_first_maximum_wins() {
        let t = Tensor::new(&[2, 1], vec![0.5, 0.5]).unwrap();
        assert_eq!(argmax(&t, 0).unwrap().data, vec![0.0]);
        assert!(argmax(&t, 2).is_err());
    }

    #[test]
    fn one_hot_expands_channel() {
        let t = Tensor::new(&[1, 1, 3], vec![0.0, 2.0, 1.0]).unwrap();
        let out = one_hot(&t, 3, 1).unwrap();
        assert_eq!(out.shape(), &[1, 3, 3]);
        assert_eq!(
            out.data,
            vec![1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 1.0, 0.0]
        );
        assert!(one_hot(&t, 2, 1).is_err());
        assert!(one_hot(&out, 3, 1).is_err());
    }

    #[test]
    fn softmax_sums_to_one() {
        let t = Tensor::new(&[1, 3, 1], vec![1.0, 2.0, 3.0]).unwrap();
        let out = Activation::Softmax { dim: 1 }.apply(&t).unwrap();
        let sum: f32 = out.data.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);
        assert!(out.data[2] > out.data[1] && out.data[1] > out.data[0]);
    }

    #[test]
    fn softmax_of_all_negative_infinity_is_uniform() {
        let t = Tensor::new(&[1, 2, 2], vec![f32::NEG_INFINITY, 0.0, f32::NEG_INFINITY, 0.0])
            .unwrap();
        let out = Activation::Softmax { dim: 1 }.apply(&t).unwrap();
        // first column is all -inf, second is two equal logits
        assert!(out.data.iter().all(|v| (v - 0.5).abs() < 1e-6));
    }

    #[test]
    fn compose_sigmoid_then_threshold() {
        let post = Compose::new()
            .then(Activation::Sigmoid)
            .then(AsDiscrete::Threshold(0.5));
        assert_eq!(post.len(), 2);

        let t = Tensor::from(vec![-3.0, 0.0, 2.0]);
        assert_eq!(post.apply(&t).unwrap().data, vec![0.0, 1.0, 1.0]);
    }
}
