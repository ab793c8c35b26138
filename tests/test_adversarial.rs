//! Adversarial edge-case integration tests.
//!
//! Degenerate, boundary and malformed inputs across the crate stack: no
//! panics, and errors where the input is unusable.

use std::io::Write;

use tabletop_core::{Normals, PointCloud};
use tempfile::NamedTempFile;

// ────────────────── PointCloud core ──────────────────

#[test]
fn empty_cloud_operations() {
    let cloud = PointCloud::new();
    assert!(cloud.is_empty());
    assert!(cloud.aabb().is_empty());
    assert!(cloud.centroid().is_none());
    assert!(cloud.select(&[]).is_empty());
    assert!(cloud.select_inverse(&[]).is_empty());
}

#[test]
fn cloud_with_non_finite_values() {
    let cloud = PointCloud::from_xyz(
        vec![f32::INFINITY, f32::NAN, 1.0],
        vec![0.0, 0.0, 2.0],
        vec![0.0, 0.0, 3.0],
    );
    let aabb = cloud.aabb();
    assert_eq!(aabb.min, [1.0, 2.0, 3.0]);
    assert_eq!(aabb.max, [1.0, 2.0, 3.0]);
}

#[test]
fn select_and_select_inverse_are_complements() {
    let cloud = PointCloud::from_xyz(
        vec![0.0, 1.0, 2.0, 3.0, 4.0],
        vec![10.0, 11.0, 12.0, 13.0, 14.0],
        vec![20.0, 21.0, 22.0, 23.0, 24.0],
    );
    let selected = cloud.select(&[1, 3]);
    let inverse = cloud.select_inverse(&[1, 3]);
    assert_eq!(selected.x, vec![1.0, 3.0]);
    assert_eq!(inverse.x, vec![0.0, 2.0, 4.0]);
}

// ────────────────── Spatial ──────────────────

#[test]
fn kdtree_degenerate_queries() {
    use tabletop_spatial::KdTree;

    let tree = KdTree::build(&PointCloud::from_points(&[[1.0, 2.0, 3.0]]));
    assert_eq!(tree.knn_indices(&[0.0; 3], 10), vec![0]);
    assert!(tree.knn_indices(&[f32::INFINITY, 0.0, 0.0], 1).is_empty());
    assert!(tree.radius_search(&[1.0, 2.0, 3.0], 0.0).is_empty());
    assert!(tree.radius_search(&[1.0, 2.0, 3.0], f32::INFINITY).is_empty());
}

// ────────────────── Filters ──────────────────

#[test]
fn voxel_downsample_degenerate_inputs() {
    use tabletop_filters::{voxel_downsample, FilterError};

    assert!(voxel_downsample(&PointCloud::new(), 0.1).unwrap().is_empty());
    let single = PointCloud::from_points(&[[0.5, 0.5, 0.5]]);
    assert_eq!(voxel_downsample(&single, 0.1).unwrap().len(), 1);
    assert_eq!(
        voxel_downsample(&single, 0.0),
        Err(FilterError::InvalidVoxelSize(0.0))
    );
    assert!(voxel_downsample(&single, f32::NAN).is_err());
}

#[test]
fn crop_box_inverted_range() {
    use tabletop_filters::{crop_box, FilterError};

    let cloud = PointCloud::from_points(&[[0.0; 3]]);
    assert!(matches!(
        crop_box(&cloud, [0.0, 1.0, 0.0], [1.0, 0.0, 1.0]),
        Err(FilterError::InvalidRange { axis: 1, .. })
    ));
}

#[test]
fn radius_outlier_on_single_point() {
    use tabletop_filters::radius_outlier_removal;

    let cloud = PointCloud::from_points(&[[0.0; 3]]);
    assert_eq!(radius_outlier_removal(&cloud, 1.0, 0).unwrap().len(), 1);
    assert!(radius_outlier_removal(&cloud, 1.0, 1).unwrap().is_empty());
    assert!(radius_outlier_removal(&cloud, -1.0, 1).is_err());
}

// ────────────────── Normals and orientation ──────────────────

#[test]
fn normals_of_identical_points_are_finite() {
    use tabletop_normals::estimate_normals;

    let cloud = PointCloud::from_points(&[[1.0, 1.0, 1.0]; 5]);
    let normals = estimate_normals(&cloud, 4);
    assert_eq!(normals.len(), 5);
    for i in 0..normals.len() {
        assert!(normals.normal(i).iter().all(|v| v.is_finite()));
    }
}

#[test]
fn orientation_rejects_degenerate_vectors() {
    use tabletop_normals::{horizontal_indices, OrientationError};

    let normals = Normals::from_vectors(&[[0.0, 0.0, 1.0], [0.0, 0.0, 0.0]]);
    assert_eq!(
        horizontal_indices(&normals, [1.0, 0.0, 0.0], 0.05),
        Err(OrientationError::DegenerateNormal { index: 1 })
    );
    assert_eq!(
        horizontal_indices(&normals, [0.0; 3], 0.05),
        Err(OrientationError::DegenerateReference)
    );
}

// ────────────────── Segmentation ──────────────────

#[test]
fn ransac_with_too_few_points() {
    use tabletop_segmentation::{segment_plane, PlaneModel, RansacParams};

    let params = RansacParams::new(0.01, 3, 10);
    for n in 0..3 {
        let cloud = PointCloud::from_points(&vec![[n as f32, 0.0, 0.0]; n]);
        let (model, inliers) = segment_plane(&cloud, &params, 0).unwrap();
        assert_eq!(model, PlaneModel::default());
        assert!(inliers.is_empty());
    }
}

#[test]
fn ransac_on_exactly_three_points() {
    use tabletop_segmentation::{segment_plane, RansacParams};

    let cloud = PointCloud::from_points(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.5, 1.0, 0.0]]);
    let (model, inliers) = segment_plane(&cloud, &RansacParams::new(0.01, 3, 10), 0).unwrap();
    assert!(model.normal.iter().all(|v| v.is_finite()));
    assert_eq!(inliers, vec![0, 1, 2]);
}

#[test]
fn ransac_rejects_bad_parameters() {
    use tabletop_segmentation::{segment_plane, PlaneError, RansacParams};

    let cloud = PointCloud::from_points(&[[0.0; 3]; 10]);
    for params in [
        RansacParams::new(-0.1, 3, 10),
        RansacParams::new(0.1, 2, 10),
        RansacParams::new(0.1, 3, 0),
    ] {
        assert!(matches!(
            segment_plane(&cloud, &params, 0),
            Err(PlaneError::InvalidParameters(_))
        ));
    }
}

#[test]
fn dbscan_min_points_larger_than_cloud() {
    use tabletop_segmentation::dbscan;

    let cloud = PointCloud::from_xyz(vec![0.0, 0.1], vec![0.0; 2], vec![0.0; 2]);
    let labels = dbscan(&cloud, 0.5, 100);
    assert_eq!(labels.num_clusters(), 0);
    assert_eq!(labels.noise_count(), 2);
}

// ────────────────── IO ──────────────────

fn temp_file(suffix: &str, contents: &[u8]) -> NamedTempFile {
    let mut tmp = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    tmp.write_all(contents).unwrap();
    tmp.flush().unwrap();
    tmp
}

#[test]
fn corrupted_headers_are_errors() {
    let ply = temp_file(".ply", b"not_a_ply_file\ngarbage data here\n");
    assert!(tabletop_io::read_point_cloud(ply.path()).is_err());

    let pcd = temp_file(".pcd", b"# this is not a valid PCD\ngarbage\n");
    assert!(tabletop_io::read_point_cloud(pcd.path()).is_err());

    let off = temp_file(".off", b"OFF\nthree 1 0\n");
    assert!(tabletop_io::read_point_cloud(off.path()).is_err());
}

#[test]
fn truncated_binary_ply_is_an_error() {
    let tmp = temp_file(
        ".ply",
        b"ply\nformat binary_little_endian 1.0\nelement vertex 100\nproperty float x\nproperty float y\nproperty float z\nend_header\n",
    );
    assert!(tabletop_io::read_ply(tmp.path()).is_err());
}

#[test]
fn truncated_off_is_an_error() {
    let tmp = temp_file(".off", b"OFF\n4 0 0\n0 0 0\n1 0 0\n");
    assert!(tabletop_io::read_off(tmp.path()).is_err());
}

#[test]
fn oversized_point_counts_are_errors() {
    use tabletop_io::IoError;

    let pcd = temp_file(
        ".pcd",
        b"VERSION 0.7\nFIELDS x y z\nSIZE 4 4 4\nTYPE F F F\nCOUNT 1 1 1\n\
          WIDTH 1\nHEIGHT 1\nPOINTS 1537228672809129302\nDATA binary\n\0\0\0\0",
    );
    assert!(matches!(
        tabletop_io::read_point_cloud(pcd.path()),
        Err(IoError::Malformed { .. })
    ));

    let ascii_pcd = temp_file(
        ".pcd",
        b"FIELDS x y z\nSIZE 4 4 4\nTYPE F F F\nPOINTS 1000000000000000\nDATA ascii\n0 0 0\n",
    );
    assert!(tabletop_io::read_point_cloud(ascii_pcd.path()).is_err());

    let ply = temp_file(
        ".ply",
        b"ply\nformat binary_little_endian 1.0\nelement vertex 1537228672809129302\n\
          property float x\nproperty float y\nproperty float z\nend_header\n\0\0\0\0",
    );
    assert!(matches!(
        tabletop_io::read_ply(ply.path()),
        Err(IoError::Malformed { .. })
    ));

    let off = temp_file(".off", b"OFF\n1000000000000000 0 0\n0 0 0\n");
    assert!(matches!(
        tabletop_io::read_off(off.path()),
        Err(IoError::Malformed { .. })
    ));
}

#[test]
fn unknown_extension_is_unsupported() {
    use tabletop_io::IoError;

    let tmp = temp_file(".xyz", b"0 0 0\n");
    assert!(matches!(
        tabletop_io::read_point_cloud(tmp.path()),
        Err(IoError::UnsupportedFormat(_))
    ));
}

// ────────────────── Scene and classification ──────────────────

#[test]
fn segmenting_three_points_finds_no_table() {
    use tabletop_scene::{SceneError, SceneSegmenter};

    let cloud = PointCloud::from_points(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.5, 1.0, 0.0]]);
    assert!(matches!(
        SceneSegmenter::default().segment(&cloud),
        Err(SceneError::TableNotFound(_))
    ));
}

#[test]
fn sampling_an_object_without_finite_points_fails() {
    use std::path::Path;
    use tabletop_classify::{ClassifyError, PointSampler};

    let cloud = PointCloud::from_points(&[[f32::NAN, 0.0, 0.0]]);
    assert!(matches!(
        PointSampler::default().sample(&cloud, 0, Path::new("soda_1.off")),
        Err(ClassifyError::EmptyObject(_))
    ));
}

#[test]
fn malformed_weights_are_rejected() {
    use tabletop_classify::{ClassifyError, PointNet};

    assert!(matches!(
        PointNet::from_json_str("{\"point_mlp\": 3}"),
        Err(ClassifyError::Weights(_))
    ));
    assert!(matches!(
        PointNet::from_json_str(r#"{"point_mlp": [], "head": []}"#),
        Err(ClassifyError::ShapeMismatch(_))
    ));
}
