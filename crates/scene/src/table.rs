use tabletop_core::PointCloud;
use tabletop_filters::radius_outlier_removal;
use tabletop_normals::{estimate_normals_hybrid, horizontal_indices, orient_normals_to_direction};
use tabletop_segmentation::{segment_plane, PlaneModel};

use crate::config::SceneConfig;
use crate::error::SceneError;

/// The table plane as found in the raw scan frame.
#[derive(Debug, Clone, PartialEq)]
pub struct TableDetection {
    pub plane: PlaneModel,
    /// Centroid of the plane's inliers.
    pub center: [f32; 3],
    pub inlier_count: usize,
    /// Points left after the orientation and outlier filters.
    pub candidate_count: usize,
}

/// Finds the table top in a full-resolution scan.
///
/// Points whose normal is perpendicular to the configured reference axis are
/// kept, sparse ones are dropped by radius outlier removal, and RANSAC picks
/// the dominant plane among the rest.
pub fn detect_table(
    cloud: &PointCloud,
    config: &SceneConfig,
) -> Result<TableDetection, SceneError> {
    let normals = estimate_normals_hybrid(cloud, config.normals.search());
    let normals = orient_normals_to_direction(&normals, config.normals.orient_to);

    let horizontal = horizontal_indices(
        &normals,
        config.orientation.reference,
        config.orientation.tolerance_deg,
    )?;
    log::debug!(
        "{} of {} points have horizontal normals",
        horizontal.len(),
        cloud.len()
    );
    if horizontal.is_empty() {
        return Err(SceneError::TableNotFound("no point has a horizontal normal"));
    }

    let mut oriented = cloud.clone();
    oriented.normals = Some(normals);
    let horizontal_cloud = oriented.select(&horizontal);

    let candidates = radius_outlier_removal(
        &horizontal_cloud,
        config.table_outliers.radius,
        config.table_outliers.min_neighbors,
    )?;
    log::debug!(
        "{} table candidates after radius outlier removal",
        candidates.len()
    );

    let (plane, inliers) =
        segment_plane(&candidates, &config.table_plane.to_params(), config.seed)?;
    if inliers.is_empty() {
        return Err(SceneError::TableNotFound(
            "too few candidate points for a plane fit",
        ));
    }

    let center = candidates
        .select(&inliers)
        .centroid()
        .ok_or(SceneError::TableNotFound("table inliers have no finite centroid"))?;

    log::info!(
        "table plane {:?} with {} inliers, centre {:?}",
        plane.coefficients(),
        inliers.len(),
        center
    );

    Ok(TableDetection {
        plane,
        center,
        inlier_count: inliers.len(),
        candidate_count: candidates.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{OrientationSection, RadiusOutlierSection};
    use approx::assert_abs_diff_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn test_config() -> SceneConfig {
        SceneConfig {
            orientation: OrientationSection {
                reference: [1.0, 0.0, 0.0],
                tolerance_deg: 5.0,
            },
            table_outliers: RadiusOutlierSection {
                min_neighbors: 20,
                radius: 0.05,
            },
            ..SceneConfig::default()
        }
    }

    fn table_scene(center: [f32; 2], height: f32) -> PointCloud {
        let mut rng = StdRng::seed_from_u64(11);
        let mut points = Vec::new();
        for i in 0..60 {
            for j in 0..60 {
                points.push([
                    center[0] - 0.3 + i as f32 * 0.01,
                    center[1] - 0.3 + j as f32 * 0.01,
                    height + rng.gen_range(-1e-4f32..1e-4),
                ]);
            }
        }
        // a vertical wall whose normals point along x
        for j in 0..30 {
            for k in 0..30 {
                points.push([
                    center[0] + 0.5 + rng.gen_range(-1e-4f32..1e-4),
                    center[1] - 0.15 + j as f32 * 0.01,
                    height + 0.05 + k as f32 * 0.01,
                ]);
            }
        }
        PointCloud::from_points(&points)
    }

    #[test]
    fn finds_table_centre() {
        let cloud = table_scene([0.4, -0.2], 0.75);
        let table = detect_table(&cloud, &test_config()).unwrap();

        assert!(table.plane.normal[2].abs() > 0.99);
        assert_abs_diff_eq!(table.center[0], 0.4 - 0.005, epsilon = 0.01);
        assert_abs_diff_eq!(table.center[1], -0.2 - 0.005, epsilon = 0.01);
        assert_abs_diff_eq!(table.center[2], 0.75, epsilon = 1e-3);
        assert!(table.inlier_count >= 3000);
    }

    #[test]
    fn scene_without_horizontal_surface() {
        let points: Vec<[f32; 3]> = (0..20)
            .flat_map(|j| (0..20).map(move |k| [0.0, j as f32 * 0.01, k as f32 * 0.01 + 1e-6 * j as f32]))
            .collect();
        let err = detect_table(&PointCloud::from_points(&points), &test_config()).unwrap_err();
        assert!(matches!(err, SceneError::TableNotFound(_)));
    }
}
