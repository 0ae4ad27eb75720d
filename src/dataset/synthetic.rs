//! Synthetic segmentation volumes: random spheres on a dark background,
//! and degraded copies of their labels that stand in for the output of an
//! imperfectly trained model.

use rand::Rng;
use tracing::trace;

use crate::{
    error::Error,
    tensor::Tensor,
    utils::{randf, randi, randn, seeded_rng},
    Float, Result,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphereVolume {
    depth: usize,
    height: usize,
    width: usize,
    num_objects: usize,
    radius_min: usize,
    radius_max: usize,
    noise_std: Float,
}

impl SphereVolume {
    pub fn builder() -> SphereVolumeBuilder {
        SphereVolumeBuilder::new()
    }

    /// Image and binary label, both shaped `[1, depth, height, width]`.
    pub fn generate(&self, seed: u64) -> (Tensor, Tensor) {
        let mut rng = seeded_rng(seed);
        let shape = [1, self.depth, self.height, self.width];
        let mut image = Tensor::zeros(&shape);
        let mut label = Tensor::zeros(&shape);

        let r_max = self.radius_max as i64;
        for _ in 0..self.num_objects {
            let cz = randi(&mut rng, r_max, self.depth as i64 - r_max);
            let cy = randi(&mut rng, r_max, self.height as i64 - r_max);
            let cx = randi(&mut rng, r_max, self.width as i64 - r_max);
            let radius = randi(&mut rng, self.radius_min as i64, r_max) as Float;
            let intensity = randf(&mut rng, 0.2, 1.0);
            trace!(cz, cy, cx, radius, intensity, "sphere");

            for z in 0..self.depth {
                for y in 0..self.height {
                    for x in 0..self.width {
                        let dz = z as Float - cz as Float;
                        let dy = y as Float - cy as Float;
                        let dx = x as Float - cx as Float;
                        if dz * dz + dy * dy + dx * dx <= radius * radius {
                            image.set(&[0, z, y, x], intensity);
                            label.set(&[0, z, y, x], 1.0);
                        }
                    }
                }
            }
        }

        if self.noise_std > 0.0 {
            for value in image.data.iter_mut() {
                *value += randn(&mut rng, 0.0, self.noise_std);
            }
        }

        (image, label)
    }
}

pub struct SphereVolumeBuilder {
    depth: usize,
    height: usize,
    width: usize,
    num_objects: usize,
    radius_min: usize,
    radius_max: usize,
    noise_std: Float,
}

impl SphereVolumeBuilder {
    fn new() -> Self {
        Self {
            depth: 32,
            height: 32,
            width: 32,
            num_objects: 5,
            radius_min: 2,
            radius_max: 6,
            noise_std: 0.0,
        }
    }

    pub fn size(mut self, depth: usize, height: usize, width: usize) -> Self {
        self.depth = depth;
        self.height = height;
        self.width = width;
        self
    }

    pub fn num_objects(mut self, value: usize) -> Self {
        self.num_objects = value;
        self
    }

    pub fn radius(mut self, min: usize, max: usize) -> Self {
        self.radius_min = min;
        self.radius_max = max;
        self
    }

    pub fn noise_std(mut self, value: Float) -> Self {
        self.noise_std = value;
        self
    }

    pub fn build(self) -> Result<SphereVolume> {
        if self.radius_min >= self.radius_max {
            return Err(Error::invalid(format!(
                "radius range [{}, {}) is empty",
                self.radius_min, self.radius_max
            )));
        }
        let smallest = self.depth.min(self.height).min(self.width);
        if smallest <= 2 * self.radius_max {
            return Err(Error::invalid(format!(
                "volume side {smallest} cannot fit spheres of radius {}",
                self.radius_max
            )));
        }
        if !(self.noise_std >= 0.0 && self.noise_std.is_finite()) {
            return Err(Error::invalid(format!(
                "noise std must be finite and non-negative, got {}",
                self.noise_std
            )));
        }

        Ok(SphereVolume {
            depth: self.depth,
            height: self.height,
            width: self.width,
            num_objects: self.num_objects,
            radius_min: self.radius_min,
            radius_max: self.radius_max,
            noise_std: self.noise_std,
        })
    }
}

/// Flips each voxel of a binary label with probability `flip_probability`.
pub fn corrupt_label<R: Rng + ?Sized>(
    label: &Tensor,
    flip_probability: Float,
    rng: &mut R,
) -> Result<Tensor> {
    if !(0.0..=1.0).contains(&flip_probability) {
        return Err(Error::invalid(format!(
            "flip probability must be in [0, 1], got {flip_probability}"
        )));
    }

    let mut out = label.clone();
    for value in out.data.iter_mut() {
        if rng.gen::<Float>() < flip_probability {
            *value = if *value > 0.5 { 0.0 } else { 1.0 };
        }
    }
    Ok(out)
}
