use std::path::Path;

use tabletop_core::{apply_transform, Aabb, PointCloud, RigidTransform};
use tabletop_filters::FilterError;
use tabletop_io::IoError;
use tabletop_segmentation::{segment_plane, PlaneModel, RansacParams};

use crate::error::SceneError;

/// Loads a scan from a `.pcd`, `.ply` or `.off` file.
pub fn load(path: impl AsRef<Path>) -> Result<PointCloud, IoError> {
    tabletop_io::read_point_cloud(path)
}

/// Voxel down-sampling; positions, normals and colours are averaged per voxel.
pub fn pre_process(cloud: &PointCloud, voxel_size: f32) -> Result<PointCloud, SceneError> {
    tabletop_filters::voxel_downsample(cloud, voxel_size).map_err(|e| match e {
        FilterError::InvalidVoxelSize(size) => SceneError::InvalidVoxelSize(size),
        other => SceneError::Filter(other),
    })
}

/// Rotates about the origin by `rotation_degrees` (x, then y, then z) and
/// then translates.
pub fn transform(
    cloud: &PointCloud,
    rotation_degrees: [f32; 3],
    translation: [f32; 3],
) -> PointCloud {
    apply_transform(
        cloud,
        &RigidTransform::from_euler_degrees(rotation_degrees, translation),
    )
}

/// Keeps the points inside the closed box `[min, max]`.
pub fn crop(cloud: &PointCloud, min: [f32; 3], max: [f32; 3]) -> Result<PointCloud, FilterError> {
    tabletop_filters::crop_box(cloud, min, max)
}

/// A scan being prepared for segmentation.
///
/// Each step replaces the held cloud; the last crop box is remembered so it
/// can be drawn or exported with the result.
#[derive(Debug, Clone, Default)]
pub struct ScanProcessor {
    cloud: PointCloud,
    crop_box: Option<Aabb>,
}

impl ScanProcessor {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SceneError> {
        let path = path.as_ref();
        let cloud = load(path)?;
        log::info!("loaded {} points from {}", cloud.len(), path.display());
        Ok(Self::from_cloud(cloud))
    }

    pub fn from_cloud(cloud: PointCloud) -> Self {
        Self {
            cloud,
            crop_box: None,
        }
    }

    pub fn cloud(&self) -> &PointCloud {
        &self.cloud
    }

    pub fn into_cloud(self) -> PointCloud {
        self.cloud
    }

    pub fn crop_box(&self) -> Option<&Aabb> {
        self.crop_box.as_ref()
    }

    pub fn pre_process(&mut self, voxel_size: f32) -> Result<(), SceneError> {
        let before = self.cloud.len();
        self.cloud = pre_process(&self.cloud, voxel_size)?;
        log::debug!(
            "down-sampled {} -> {} points (voxel {})",
            before,
            self.cloud.len(),
            voxel_size
        );
        Ok(())
    }

    pub fn transform(&mut self, rotation_degrees: [f32; 3], translation: [f32; 3]) {
        self.apply(&RigidTransform::from_euler_degrees(rotation_degrees, translation));
    }

    pub fn apply(&mut self, transform: &RigidTransform) {
        self.cloud = apply_transform(&self.cloud, transform);
    }

    pub fn crop(&mut self, min: [f32; 3], max: [f32; 3]) -> Result<(), SceneError> {
        let before = self.cloud.len();
        self.cloud = crop(&self.cloud, min, max)?;
        self.crop_box = Aabb::from_bounds(min, max);
        log::debug!("cropped {} -> {} points", before, self.cloud.len());
        Ok(())
    }

    /// Fits the dominant plane and returns it with the points off the plane.
    pub fn remove_plane(
        &self,
        params: &RansacParams,
        seed: u64,
    ) -> Result<(PlaneModel, PointCloud), SceneError> {
        let (plane, inliers) = segment_plane(&self.cloud, params, seed)?;
        if inliers.is_empty() {
            log::warn!(
                "no plane found in {} points; keeping all of them",
                self.cloud.len()
            );
        }
        Ok((plane, self.cloud.select_inverse(&inliers)))
    }
}
