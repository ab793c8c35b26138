use nalgebra::{Matrix3, Rotation3, Vector3};

use crate::{Normals, PointCloud};

/// Rigid motion `p' = R * p + t`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RigidTransform {
    pub rotation: [[f32; 3]; 3],
    pub translation: [f32; 3],
}

impl RigidTransform {
    pub fn identity() -> Self {
        Self {
            rotation: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
            translation: [0.0, 0.0, 0.0],
        }
    }

    pub fn from_translation(translation: [f32; 3]) -> Self {
        Self {
            translation,
            ..Self::identity()
        }
    }

    /// Rotation about the origin by `degrees` around x, then y, then z
    /// (fixed axes, `R = Rz * Ry * Rx`), followed by `translation`.
    pub fn from_euler_degrees(degrees: [f32; 3], translation: [f32; 3]) -> Self {
        let rotation = Rotation3::from_euler_angles(
            degrees[0].to_radians(),
            degrees[1].to_radians(),
            degrees[2].to_radians(),
        );

        Self {
            rotation: mat3_to_arrays(rotation.matrix()),
            translation,
        }
    }

    pub fn is_identity(&self, eps: f32) -> bool {
        let id = Self::identity();
        for r in 0..3 {
            for c in 0..3 {
                if (self.rotation[r][c] - id.rotation[r][c]).abs() > eps {
                    return false;
                }
            }
        }
        self.translation.iter().all(|t| t.abs() <= eps)
    }

    /// Apply the rigid transform to a single point: R * p + t
    pub fn apply_to_point(&self, p: &[f32; 3]) -> [f32; 3] {
        let r = self.rotate(p);
        let t = &self.translation;
        [r[0] + t[0], r[1] + t[1], r[2] + t[2]]
    }

    /// Rotation only, for direction vectors such as normals.
    pub fn rotate(&self, v: &[f32; 3]) -> [f32; 3] {
        let r = &self.rotation;
        [
            r[0][0] * v[0] + r[0][1] * v[1] + r[0][2] * v[2],
            r[1][0] * v[0] + r[1][1] * v[1] + r[1][2] * v[2],
            r[2][0] * v[0] + r[2][1] * v[1] + r[2][2] * v[2],
        ]
    }

    /// Compose two transforms: apply `self` first, then `other`.
    ///
    /// Result: R_new = other.R * self.R, t_new = other.R * self.t + other.t
    pub fn then(&self, other: &RigidTransform) -> RigidTransform {
        let r_self = mat3_from_arrays(&self.rotation);
        let r_other = mat3_from_arrays(&other.rotation);
        let t_self = Vector3::from(self.translation);
        let t_other = Vector3::from(other.translation);

        let r_new = r_other * r_self;
        let t_new = r_other * t_self + t_other;

        RigidTransform {
            rotation: mat3_to_arrays(&r_new),
            translation: [t_new[0], t_new[1], t_new[2]],
        }
    }
}

impl Default for RigidTransform {
    fn default() -> Self {
        Self::identity()
    }
}

/// Apply a rigid transform to all points (and normals) in a cloud, returning
/// a new cloud. Colours are carried over unchanged.
pub fn apply_transform(cloud: &PointCloud, transform: &RigidTransform) -> PointCloud {
    let n = cloud.len();
    let mut x = Vec::with_capacity(n);
    let mut y = Vec::with_capacity(n);
    let mut z = Vec::with_capacity(n);

    for p in cloud.iter_points() {
        let tp = transform.apply_to_point(&p);
        x.push(tp[0]);
        y.push(tp[1]);
        z.push(tp[2]);
    }

    let normals = cloud.normals.as_ref().map(|normals| {
        let rotated: Vec<[f32; 3]> = (0..normals.len())
            .map(|i| transform.rotate(&normals.normal(i)))
            .collect();
        Normals::from_vectors(&rotated)
    });

    PointCloud {
        x,
        y,
        z,
        normals,
        colors: cloud.colors.clone(),
    }
}

fn mat3_from_arrays(m: &[[f32; 3]; 3]) -> Matrix3<f32> {
    Matrix3::new(
        m[0][0], m[0][1], m[0][2], m[1][0], m[1][1], m[1][2], m[2][0], m[2][1], m[2][2],
    )
}

fn mat3_to_arrays(m: &Matrix3<f32>) -> [[f32; 3]; 3] {
    [
        [m[(0, 0)], m[(0, 1)], m[(0, 2)]],
        [m[(1, 0)], m[(1, 1)], m[(1, 2)]],
        [m[(2, 0)], m[(2, 1)], m[(2, 2)]],
    ]
}
