use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, StandardNormal, Uniform};

use crate::Float;

/// RNG used everywhere a seed must reproduce the same stream on every
/// platform and release. ChaCha8's output is part of its contract,
/// `StdRng`'s is not.
pub fn seeded_rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

pub fn gauss_random<R: Rng + ?Sized>(rng: &mut R) -> Float {
    StandardNormal.sample(rng)
}

pub fn randf<R: Rng + ?Sized>(rng: &mut R, a: Float, b: Float) -> Float {
    let uniform = Uniform::new(a, b);
    uniform.sample(rng)
}

pub fn randi<R: Rng + ?Sized>(rng: &mut R, a: i64, b: i64) -> i64 {
    let uniform = Uniform::new(a, b);
    uniform.sample(rng)
}

pub fn randn<R: Rng + ?Sized>(rng: &mut R, mu: Float, std: Float) -> Float {
    mu + gauss_random(rng) * std
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinMax {
    pub min_value: Float,
    pub min_index: usize,
    pub max_value: Float,
    pub max_index: usize,
}

// return max and min of a given non-empty array.
// the first occurrence wins on equal values.
pub fn maxmin(values: &[Float]) -> Option<MinMax> {
    if values.is_empty() {
        return None;
    }

    let mut maxv = values[0];
    let mut minv = values[0];
    let mut maxi = 0;
    let mut mini = 0;
    for (i, value) in values.iter().copied().enumerate() {
        if value > maxv {
            maxv = value;
            maxi = i;
        }
        if value < minv {
            minv = value;
            mini = i;
        }
    }
    Some(MinMax {
        min_value: minv,
        min_index: mini,
        max_value: maxv,
        max_index: maxi,
    })
}

#[cfg(test)]
mod tests {
    use super::{maxmin, randf, randi, seeded_rng};

    #[test]
    fn maxmin_first_occurrence_wins() {
        let m = maxmin(&[1.0, 3.0, -2.0, 3.0, -2.0]).unwrap();
        assert_eq!(m.max_index, 1);
        assert_eq!(m.min_index, 2);
        assert_eq!(m.max_value, 3.0);
        assert_eq!(m.min_value, -2.0);
        assert!(maxmin(&[]).is_none());
    }

    #[test]
    fn seeded_streams_repeat() {
        let mut a = seeded_rng(42);
        let mut b = seeded_rng(42);
        for _ in 0..20 {
            assert_eq!(randi(&mut a, 0, 100), randi(&mut b, 0, 100));
            let x = randf(&mut a, -1.0, 1.0);
            assert_eq!(x, randf(&mut b, -1.0, 1.0));
            assert!((-1.0..1.0).contains(&x));
        }
    }
}
