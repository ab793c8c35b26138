use nalgebra::{Matrix3, SymmetricEigen, Vector3};
use rand::rngs::StdRng;
use rand::seq::index;
use rand::{RngCore, SeedableRng};
use rayon::prelude::*;
use tabletop_core::PointCloud;
use thiserror::Error;

/// A 3D plane `n . x + d = 0` with unit normal `n`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneModel {
    pub normal: [f32; 3],
    pub d: f32,
}

impl PlaneModel {
    /// `[a, b, c, d]` of `ax + by + cz + d = 0`.
    pub fn coefficients(&self) -> [f32; 4] {
        [self.normal[0], self.normal[1], self.normal[2], self.d]
    }

    #[inline]
    pub fn signed_distance(&self, point: &[f32; 3]) -> f32 {
        self.normal[0] * point[0] + self.normal[1] * point[1] + self.normal[2] * point[2] + self.d
    }

    #[inline]
    pub fn distance_to_point(&self, point: &[f32; 3]) -> f32 {
        self.signed_distance(point).abs()
    }
}

impl Default for PlaneModel {
    fn default() -> Self {
        Self {
            normal: [0.0, 0.0, 1.0],
            d: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RansacParams {
    /// Maximum point-to-plane distance of an inlier.
    pub distance_threshold: f32,
    /// Points drawn per hypothesis; 3 gives an exact fit, more a least-squares fit.
    pub sample_size: usize,
    pub iterations: usize,
}

impl RansacParams {
    pub fn new(distance_threshold: f32, sample_size: usize, iterations: usize) -> Self {
        Self {
            distance_threshold,
            sample_size,
            iterations,
        }
    }

    fn validate(&self) -> Result<(), PlaneError> {
        if !(self.distance_threshold.is_finite() && self.distance_threshold > 0.0) {
            return Err(PlaneError::InvalidParameters(format!(
                "distance threshold must be positive, got {}",
                self.distance_threshold
            )));
        }
        if self.sample_size < 3 {
            return Err(PlaneError::InvalidParameters(format!(
                "sample size must be at least 3, got {}",
                self.sample_size
            )));
        }
        if self.iterations == 0 {
            return Err(PlaneError::InvalidParameters(
                "iterations must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum PlaneError {
    #[error("invalid RANSAC parameters: {0}")]
    InvalidParameters(String),
}

/// [`segment_plane`] with a seed drawn from the thread RNG.
pub fn segment_plane_random(
    cloud: &PointCloud,
    params: &RansacParams,
) -> Result<(PlaneModel, Vec<usize>), PlaneError> {
    let seed = rand::thread_rng().next_u64();
    segment_plane(cloud, params, seed)
}

/// Finds the dominant plane of `cloud` with RANSAC.
///
/// Every hypothesis is fitted to `sample_size` distinct points; the one with
/// the most inliers wins (earliest on ties) and is refined by a least-squares
/// fit to its inliers. Returns the plane and the ascending inlier indices.
///
/// Samples are drawn up front from a `StdRng` seeded with `seed`, so the
/// result is reproducible. Clouds of 10k+ points are scored in parallel.
/// A cloud with fewer than `sample_size` points yields the default plane and
/// no inliers.
pub fn segment_plane(
    cloud: &PointCloud,
    params: &RansacParams,
    seed: u64,
) -> Result<(PlaneModel, Vec<usize>), PlaneError> {
    params.validate()?;

    let n = cloud.len();
    if n < params.sample_size {
        log::debug!(
            "RANSAC skipped: {} points, {} needed per sample",
            n,
            params.sample_size
        );
        return Ok((PlaneModel::default(), Vec::new()));
    }

    let points = cloud.points();
    let threshold = params.distance_threshold;

    let mut rng = StdRng::seed_from_u64(seed);
    let samples: Vec<Vec<usize>> = (0..params.iterations)
        .map(|_| index::sample(&mut rng, n, params.sample_size).into_vec())
        .collect();

    let hypothesis = |sample: &Vec<usize>| -> Option<(PlaneModel, usize)> {
        let model = fit_plane(&points, sample)?;
        Some((model, count_inliers(&points, &model, threshold)))
    };

    let best = if n >= 10_000 && samples.len() >= 16 {
        samples
            .par_iter()
            .filter_map(hypothesis)
            .reduce_with(|a, b| if a.1 >= b.1 { a } else { b })
    } else {
        let mut best: Option<(PlaneModel, usize)> = None;
        for (iter, sample) in samples.iter().enumerate() {
            let Some((model, count)) = hypothesis(sample) else {
                continue;
            };
            if best.map_or(true, |(_, c)| count > c) {
                best = Some((model, count));

                // stop once 99.9% sure an all-inlier sample was drawn
                let w = count as f64 / n as f64;
                if w > 0.5 {
                    let needed =
                        (1.0 - 0.999f64).ln() / (1.0 - w.powi(params.sample_size as i32)).ln();
                    if (iter as f64) > needed {
                        break;
                    }
                }
            }
        }
        best
    };

    let Some((model, _)) = best else {
        log::debug!("RANSAC found no non-degenerate sample");
        return Ok((PlaneModel::default(), Vec::new()));
    };

    let inliers: Vec<usize> = (0..n)
        .filter(|&j| model.distance_to_point(&points[j]) <= threshold)
        .collect();
    let refined = fit_plane(&points, &inliers).unwrap_or(model);

    log::debug!(
        "RANSAC plane {:?}: {} of {} points within {}",
        refined.coefficients(),
        inliers.len(),
        n,
        threshold
    );
    Ok((refined, inliers))
}

#[inline]
fn count_inliers(points: &[[f32; 3]], model: &PlaneModel, threshold: f32) -> usize {
    points
        .iter()
        .filter(|p| model.distance_to_point(p) <= threshold)
        .count()
}

/// Plane through the points at `indices`: exact for three points, least
/// squares otherwise. `None` for degenerate (collinear or coincident) input.
fn fit_plane(points: &[[f32; 3]], indices: &[usize]) -> Option<PlaneModel> {
    match indices {
        [a, b, c] => plane_from_three_points(&points[*a], &points[*b], &points[*c]),
        _ if indices.len() > 3 => plane_least_squares(points, indices),
        _ => None,
    }
}

fn plane_from_three_points(p0: &[f32; 3], p1: &[f32; 3], p2: &[f32; 3]) -> Option<PlaneModel> {
    let v1 = [p1[0] - p0[0], p1[1] - p0[1], p1[2] - p0[2]];
    let v2 = [p2[0] - p0[0], p2[1] - p0[1], p2[2] - p0[2]];

    let nx = v1[1] * v2[2] - v1[2] * v2[1];
    let ny = v1[2] * v2[0] - v1[0] * v2[2];
    let nz = v1[0] * v2[1] - v1[1] * v2[0];

    let len = (nx * nx + ny * ny + nz * nz).sqrt();
    if len < 1e-10 {
        return None;
    }

    let normal = [nx / len, ny / len, nz / len];
    let d = -(normal[0] * p0[0] + normal[1] * p0[1] + normal[2] * p0[2]);
    Some(PlaneModel { normal, d })
}

fn plane_least_squares(points: &[[f32; 3]], indices: &[usize]) -> Option<PlaneModel> {
    let count = indices.len() as f64;
    let centroid = indices
        .iter()
        .fold(Vector3::<f64>::zeros(), |acc, &i| {
            acc + Vector3::new(points[i][0] as f64, points[i][1] as f64, points[i][2] as f64)
        })
        / count;

    let covariance = indices.iter().fold(Matrix3::<f64>::zeros(), |acc, &i| {
        let d = Vector3::new(points[i][0] as f64, points[i][1] as f64, points[i][2] as f64)
            - centroid;
        acc + d * d.transpose()
    });

    let eigen = SymmetricEigen::new(covariance);
    let (smallest, _) = eigen
        .eigenvalues
        .iter()
        .enumerate()
        .min_by(|a, b| a.1.total_cmp(b.1))?;

    // two vanishing eigenvalues: the points are collinear
    let mut sorted: Vec<f64> = eigen.eigenvalues.iter().copied().collect();
    sorted.sort_by(|a, b| a.total_cmp(b));
    if sorted[1] <= 1e-12 * sorted[2].max(f64::MIN_POSITIVE) {
        return None;
    }

    let normal = eigen.eigenvectors.column(smallest).normalize();
    if !normal.iter().all(|v| v.is_finite()) {
        return None;
    }
    let d = -normal.dot(&centroid);

    Some(PlaneModel {
        normal: [normal[0] as f32, normal[1] as f32, normal[2] as f32],
        d: d as f32,
    })
}
