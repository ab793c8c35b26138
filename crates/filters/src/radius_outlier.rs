use tabletop_core::PointCloud;
use tabletop_spatial::KdTree;

use crate::error::FilterError;

/// Indices of the points with at least `min_neighbors` other points within
/// `radius`, i.e. a self-inclusive count strictly above `min_neighbors`.
/// `min_neighbors = 0` keeps every point.
pub fn radius_outlier_indices(
    cloud: &PointCloud,
    radius: f32,
    min_neighbors: usize,
) -> Result<Vec<usize>, FilterError> {
    if !(radius.is_finite() && radius > 0.0) {
        return Err(FilterError::InvalidRadius(radius));
    }
    if cloud.is_empty() {
        return Ok(Vec::new());
    }

    let tree = KdTree::build(cloud);
    Ok((0..cloud.len())
        .filter(|&i| tree.radius_count(&cloud.point(i), radius) > min_neighbors)
        .collect())
}

/// Removes points with fewer than `min_neighbors` other points within `radius`.
pub fn radius_outlier_removal(
    cloud: &PointCloud,
    radius: f32,
    min_neighbors: usize,
) -> Result<PointCloud, FilterError> {
    let keep = radius_outlier_indices(cloud, radius, min_neighbors)?;
    Ok(cloud.select(&keep))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn radius_outlier_removes_isolated_points() {
        let cloud = PointCloud::from_xyz(
            vec![0.0, 0.1, 0.2, 100.0],
            vec![0.0; 4],
            vec![0.0; 4],
        );
        // the isolated point has no neighbours
        let result = radius_outlier_removal(&cloud, 0.5, 2).unwrap();
        assert_eq!(result.len(), 3);
        assert!(result.x.iter().all(|&x| x < 1.0));
    }

    #[test]
    fn radius_outlier_keeps_dense_cluster() {
        let cloud = PointCloud::from_xyz(
            vec![0.0, 0.1, 0.2, 0.3, 0.4],
            vec![0.0; 5],
            vec![0.0; 5],
        );
        assert_eq!(radius_outlier_removal(&cloud, 1.0, 4).unwrap().len(), 5);
        assert!(radius_outlier_removal(&cloud, 1.0, 5).unwrap().is_empty());
    }

    #[test]
    fn radius_outlier_indices_are_ascending() {
        let cloud = PointCloud::from_xyz(
            vec![50.0, 0.0, 0.1, 80.0, 0.2],
            vec![0.0; 5],
            vec![0.0; 5],
        );
        assert_eq!(radius_outlier_indices(&cloud, 0.5, 2).unwrap(), vec![1, 2, 4]);
    }

    #[test]
    fn radius_outlier_does_not_count_the_point_itself() {
        let pair = PointCloud::from_xyz(vec![0.0, 0.1], vec![0.0; 2], vec![0.0; 2]);
        assert_eq!(radius_outlier_indices(&pair, 0.5, 0).unwrap(), vec![0, 1]);
        assert_eq!(radius_outlier_indices(&pair, 0.5, 1).unwrap(), vec![0, 1]);
        assert!(radius_outlier_indices(&pair, 0.5, 2).unwrap().is_empty());
    }

    #[test]
    fn radius_outlier_empty_cloud() {
        assert!(radius_outlier_removal(&PointCloud::new(), 1.0, 2)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn radius_outlier_rejects_bad_radius() {
        let cloud = PointCloud::from_points(&[[0.0; 3]]);
        assert_eq!(
            radius_outlier_removal(&cloud, 0.0, 1).unwrap_err(),
            FilterError::InvalidRadius(0.0)
        );
    }

    proptest! {
        #[test]
        fn radius_outlier_never_increases_count(
            pts in prop::collection::vec(
                (-100.0f32..100.0f32, -100.0f32..100.0f32, -100.0f32..100.0f32),
                0..300
            ),
            radius in 0.01f32..10.0f32,
            min_neighbors in 1usize..10,
        ) {
            let points: Vec<[f32; 3]> = pts.iter().map(|p| [p.0, p.1, p.2]).collect();
            let cloud = PointCloud::from_points(&points);
            let result = radius_outlier_removal(&cloud, radius, min_neighbors).unwrap();
            prop_assert!(result.len() <= cloud.len());
        }
    }
}
