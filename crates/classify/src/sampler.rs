use std::path::Path;

use rand::rngs::StdRng;
use rand::seq::index;
use rand::{Rng, SeedableRng};
use tabletop_core::PointCloud;

use crate::error::{ClassifyError, Result};

/// Draws a fixed-size, normalised point set from an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointSampler {
    pub num_points: usize,
    pub seed: u64,
}

impl Default for PointSampler {
    fn default() -> Self {
        Self {
            num_points: 1024,
            seed: 0,
        }
    }
}

impl PointSampler {
    pub fn new(num_points: usize, seed: u64) -> Self {
        Self { num_points, seed }
    }

    /// Samples `num_points` finite points of `cloud`, without replacement
    /// when there are enough and with replacement otherwise, then centres the
    /// sample on its mean and scales it into the unit sphere.
    ///
    /// `stream` separates the random streams of objects in one batch.
    pub fn sample(&self, cloud: &PointCloud, stream: u64, source: &Path) -> Result<Vec<[f32; 3]>> {
        let finite: Vec<[f32; 3]> = cloud
            .iter_points()
            .filter(|p| p.iter().all(|v| v.is_finite()))
            .collect();
        if finite.is_empty() || self.num_points == 0 {
            return Err(ClassifyError::EmptyObject(source.to_path_buf()));
        }

        let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(stream));
        let n = finite.len();
        let sample: Vec<[f32; 3]> = if n >= self.num_points {
            index::sample(&mut rng, n, self.num_points)
                .into_iter()
                .map(|i| finite[i])
                .collect()
        } else {
            (0..self.num_points)
                .map(|_| finite[rng.gen_range(0..n)])
                .collect()
        };

        Ok(normalize(sample))
    }
}

/// Centres on the mean and divides by the largest distance from it.
pub fn normalize(mut points: Vec<[f32; 3]>) -> Vec<[f32; 3]> {
    if points.is_empty() {
        return points;
    }

    let count = points.len() as f64;
    let mut mean = [0.0f64; 3];
    for p in &points {
        for a in 0..3 {
            mean[a] += p[a] as f64;
        }
    }
    let mean = mean.map(|s| (s / count) as f32);

    let mut max_norm = 0.0f32;
    for p in points.iter_mut() {
        for a in 0..3 {
            p[a] -= mean[a];
        }
        max_norm = max_norm.max((p[0] * p[0] + p[1] * p[1] + p[2] * p[2]).sqrt());
    }

    if max_norm > 0.0 {
        for p in points.iter_mut() {
            for v in p.iter_mut() {
                *v /= max_norm;
            }
        }
    }
    points
}
