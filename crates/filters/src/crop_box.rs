use tabletop_core::{Aabb, PointCloud};

use crate::error::FilterError;

/// Indices of the points inside the closed box `[min, max]`.
pub fn crop_box_indices(
    cloud: &PointCloud,
    min: [f32; 3],
    max: [f32; 3],
) -> Result<Vec<usize>, FilterError> {
    let bounds = checked_bounds(min, max)?;
    Ok((0..cloud.len())
        .filter(|&i| bounds.contains(&cloud.point(i)))
        .collect())
}

/// Keeps the points inside the closed box `[min, max]`, carrying normals
/// and colours along.
pub fn crop_box(
    cloud: &PointCloud,
    min: [f32; 3],
    max: [f32; 3],
) -> Result<PointCloud, FilterError> {
    let keep = crop_box_indices(cloud, min, max)?;
    Ok(cloud.select(&keep))
}

fn checked_bounds(min: [f32; 3], max: [f32; 3]) -> Result<Aabb, FilterError> {
    Aabb::from_bounds(min, max).ok_or_else(|| {
        let axis = (0..3)
            .find(|&a| !(min[a].is_finite() && max[a].is_finite() && min[a] <= max[a]))
            .unwrap_or(0);
        FilterError::InvalidRange {
            axis,
            min: min[axis],
            max: max[axis],
        }
    })
}
