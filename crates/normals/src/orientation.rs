//! Selection of points whose normals are perpendicular to a reference axis.
//!
//! With the reference pointing along the scan's horizontal axis, the kept
//! points are those lying on horizontal surfaces such as a table top.

use tabletop_core::Normals;
use thiserror::Error;

/// Default angular tolerance in degrees.
pub const DEFAULT_TOLERANCE_DEG: f32 = 0.05;

/// Default reference axis.
pub const DEFAULT_REFERENCE: [f32; 3] = [1.0, 0.0, 0.0];

#[derive(Debug, Error, PartialEq)]
pub enum OrientationError {
    #[error("normal {index} has zero or non-finite length")]
    DegenerateNormal { index: usize },

    #[error("reference direction has zero or non-finite length")]
    DegenerateReference,
}

/// Angle in degrees between `normal` and `reference`, in `[0, 180]`.
pub fn angle_between_deg(normal: [f32; 3], reference: [f32; 3]) -> f32 {
    let dot = normal[0] as f64 * reference[0] as f64
        + normal[1] as f64 * reference[1] as f64
        + normal[2] as f64 * reference[2] as f64;
    let cos = dot / (norm(normal) * norm(reference));
    cos.clamp(-1.0, 1.0).acos().to_degrees() as f32
}

/// Indices (ascending) of the normals whose angle to `reference` is within
/// `tolerance_deg` of 90 degrees, exclusive.
///
/// All inputs are validated before any angle is computed.
pub fn horizontal_indices(
    normals: &Normals,
    reference: [f32; 3],
    tolerance_deg: f32,
) -> Result<Vec<usize>, OrientationError> {
    if !is_usable(reference) {
        return Err(OrientationError::DegenerateReference);
    }
    if let Some(index) = (0..normals.len()).find(|&i| !is_usable(normals.normal(i))) {
        return Err(OrientationError::DegenerateNormal { index });
    }

    Ok((0..normals.len())
        .filter(|&i| (angle_between_deg(normals.normal(i), reference) - 90.0).abs() < tolerance_deg)
        .collect())
}

fn norm(v: [f32; 3]) -> f64 {
    v.iter().map(|&c| c as f64 * c as f64).sum::<f64>().sqrt()
}

fn is_usable(v: [f32; 3]) -> bool {
    v.iter().all(|c| c.is_finite()) && norm(v) > 0.0
}
