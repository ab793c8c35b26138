use rayon::prelude::*;
use tabletop_core::{Normals, PointCloud};
use tabletop_spatial::KdTree;

/// Neighbourhood used by [`estimate_normals_hybrid`]: at most `max_nn`
/// nearest neighbours, all within `radius`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalSearch {
    pub radius: f32,
    pub max_nn: usize,
}

impl Default for NormalSearch {
    fn default() -> Self {
        Self {
            radius: 0.05,
            max_nn: 25,
        }
    }
}

/// Normal assigned when a neighbourhood is too small or degenerate.
const FALLBACK_NORMAL: [f32; 3] = [0.0, 0.0, 1.0];

/// Estimate surface normals by PCA over the `k` nearest neighbours of every
/// point, oriented towards the origin.
pub fn estimate_normals(cloud: &PointCloud, k: usize) -> Normals {
    estimate_normals_with_viewpoint(cloud, k, [0.0, 0.0, 0.0])
}

/// Same as [`estimate_normals`] but orients normals toward `viewpoint`.
pub fn estimate_normals_with_viewpoint(
    cloud: &PointCloud,
    k: usize,
    viewpoint: [f32; 3],
) -> Normals {
    if cloud.is_empty() || k == 0 {
        return Normals::from_vectors(&[]);
    }

    let points = cloud.points();
    let tree = KdTree::from_points(&points);

    let normals: Vec<[f32; 3]> = points
        .par_iter()
        .map(|point| {
            let neighbours = tree.knn_indices(point, k);
            let normal = pca_normal(&points, &neighbours).unwrap_or(FALLBACK_NORMAL);
            let to_view = [
                viewpoint[0] - point[0],
                viewpoint[1] - point[1],
                viewpoint[2] - point[2],
            ];
            if dot(&normal, &to_view) < 0.0 {
                negate(normal)
            } else {
                normal
            }
        })
        .collect();

    Normals::from_vectors(&normals)
}

/// PCA normals over a hybrid radius/kNN neighbourhood.
///
/// Points with fewer than three neighbours get `[0, 0, 1]`. The sign of each
/// normal is whatever the eigen-decomposition produced; follow up with
/// [`orient_normals_to_direction`] for a consistent orientation.
pub fn estimate_normals_hybrid(cloud: &PointCloud, search: NormalSearch) -> Normals {
    if cloud.is_empty() || search.max_nn == 0 {
        return Normals::from_vectors(&vec![FALLBACK_NORMAL; cloud.len()]);
    }

    let points = cloud.points();
    let tree = KdTree::from_points(&points);

    let normals: Vec<[f32; 3]> = points
        .par_iter()
        .map(|point| {
            let neighbours = tree.hybrid_search(point, search.radius, search.max_nn);
            if neighbours.len() < 3 {
                return FALLBACK_NORMAL;
            }
            pca_normal(&points, &neighbours).unwrap_or(FALLBACK_NORMAL)
        })
        .collect();

    Normals::from_vectors(&normals)
}

/// Flip every normal whose dot product with `direction` is negative.
///
/// Zero-length normals are replaced by the normalised `direction`.
pub fn orient_normals_to_direction(normals: &Normals, direction: [f32; 3]) -> Normals {
    let len = dot(&direction, &direction).sqrt();
    let unit = if len > 0.0 {
        direction.map(|v| v / len)
    } else {
        FALLBACK_NORMAL
    };

    let oriented: Vec<[f32; 3]> = (0..normals.len())
        .map(|i| {
            let n = normals.normal(i);
            if dot(&n, &n) == 0.0 {
                unit
            } else if dot(&n, &direction) < 0.0 {
                negate(n)
            } else {
                n
            }
        })
        .collect();

    Normals::from_vectors(&oriented)
}

fn dot(a: &[f32; 3], b: &[f32; 3]) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn negate(v: [f32; 3]) -> [f32; 3] {
    [-v[0], -v[1], -v[2]]
}

/// Unit normal of the neighbourhood `indices`: the eigenvector of the
/// smallest eigenvalue of its covariance. `None` when empty.
fn pca_normal(points: &[[f32; 3]], indices: &[usize]) -> Option<[f32; 3]> {
    if indices.is_empty() {
        return None;
    }

    let count = indices.len() as f64;
    let mut mean = [0.0f64; 3];
    for &i in indices {
        for a in 0..3 {
            mean[a] += points[i][a] as f64;
        }
    }
    let mean = mean.map(|s| s / count);

    // upper triangle: xx xy xz yy yz zz
    let mut cov = [0.0f64; 6];
    for &i in indices {
        let d = [0, 1, 2].map(|a| points[i][a] as f64 - mean[a]);
        cov[0] += d[0] * d[0];
        cov[1] += d[0] * d[1];
        cov[2] += d[0] * d[2];
        cov[3] += d[1] * d[1];
        cov[4] += d[1] * d[2];
        cov[5] += d[2] * d[2];
    }

    let v = smallest_eigenvector_3x3(cov);
    Some(v.map(|c| c as f32))
}

/// Eigenvector of the smallest eigenvalue of a symmetric 3x3 matrix given as
/// its upper triangle `[a00, a01, a02, a11, a12, a22]`.
///
/// Eigenvalues come from Cardano's trigonometric solution; the eigenvector is
/// the largest cross product of two rows of `A - λI`.
fn smallest_eigenvector_3x3(m: [f64; 6]) -> [f64; 3] {
    let [a00, a01, a02, a11, a12, a22] = m;

    let mean = (a00 + a11 + a22) / 3.0;
    let b00 = a00 - mean;
    let b11 = a11 - mean;
    let b22 = a22 - mean;

    let p = (b00 * b00 + b11 * b11 + b22 * b22 + 2.0 * (a01 * a01 + a02 * a02 + a12 * a12)) / 6.0;
    if p < 1e-30 {
        // scalar multiple of identity: any direction is an eigenvector
        return [0.0, 0.0, 1.0];
    }

    let half_det = (b00 * (b11 * b22 - a12 * a12) - a01 * (a01 * b22 - a12 * a02)
        + a02 * (a01 * a12 - b11 * a02))
        / 2.0;
    let sqrt_p = p.sqrt();
    let phi = (half_det / (p * sqrt_p)).clamp(-1.0, 1.0).acos() / 3.0;

    // phi in [0, pi/3] makes this the smallest root
    let lambda = mean + 2.0 * sqrt_p * (phi + 2.0 * std::f64::consts::FRAC_PI_3).cos();

    let rows = [
        [a00 - lambda, a01, a02],
        [a01, a11 - lambda, a12],
        [a02, a12, a22 - lambda],
    ];

    let cross = |u: &[f64; 3], v: &[f64; 3]| {
        [
            u[1] * v[2] - u[2] * v[1],
            u[2] * v[0] - u[0] * v[2],
            u[0] * v[1] - u[1] * v[0],
        ]
    };
    let norm_sq = |v: &[f64; 3]| v[0] * v[0] + v[1] * v[1] + v[2] * v[2];

    let best = [(0, 1), (0, 2), (1, 2)]
        .iter()
        .map(|&(i, j)| cross(&rows[i], &rows[j]))
        .max_by(|a, b| norm_sq(a).total_cmp(&norm_sq(b)))
        .unwrap_or([0.0, 0.0, 1.0]);

    let len_sq = norm_sq(&best);
    if len_sq < 1e-30 {
        return [0.0, 0.0, 1.0];
    }
    let inv = 1.0 / len_sq.sqrt();
    best.map(|c| c * inv)
}
