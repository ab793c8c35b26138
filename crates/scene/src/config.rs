//! Tunable parameters of the scene pipeline.
//!
//! Defaults reproduce the calibration of the reference tabletop scans.

use serde::{Deserialize, Serialize};
use tabletop_core::RigidTransform;
use tabletop_normals::NormalSearch;
use tabletop_segmentation::RansacParams;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Edge length of the down-sampling voxel grid.
    pub voxel_size: f32,
    pub normals: NormalsSection,
    pub orientation: OrientationSection,
    pub table_outliers: RadiusOutlierSection,
    pub table_plane: TablePlaneSection,
    /// Rigid motions applied in order after centring the table at the origin.
    pub calibration: Vec<CalibrationStep>,
    pub crop: CropSection,
    pub plane_removal: PlaneRemovalSection,
    pub clustering: ClusteringSection,
    /// Base seed for every RANSAC run of the pipeline.
    pub seed: u64,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            voxel_size: 0.009,
            normals: NormalsSection::default(),
            orientation: OrientationSection::default(),
            table_outliers: RadiusOutlierSection::default(),
            table_plane: TablePlaneSection::default(),
            calibration: vec![
                CalibrationStep::rotation([-120.0, 0.0, 0.0]),
                CalibrationStep::rotation([0.0, 0.0, -120.0]),
                CalibrationStep::rotation([0.0, -7.0, 0.0]),
            ],
            crop: CropSection::default(),
            plane_removal: PlaneRemovalSection::default(),
            clustering: ClusteringSection::default(),
            seed: 0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalsSection {
    pub radius: f32,
    pub max_nn: usize,
    /// Normals are flipped to agree with this direction.
    pub orient_to: [f32; 3],
}

impl NormalsSection {
    pub fn search(&self) -> NormalSearch {
        NormalSearch {
            radius: self.radius,
            max_nn: self.max_nn,
        }
    }
}

impl Default for NormalsSection {
    fn default() -> Self {
        Self {
            radius: 0.05,
            max_nn: 25,
            orient_to: [0.0, 0.0, 1.0],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrientationSection {
    pub reference: [f32; 3],
    pub tolerance_deg: f32,
}

impl Default for OrientationSection {
    fn default() -> Self {
        Self {
            reference: tabletop_normals::orientation::DEFAULT_REFERENCE,
            tolerance_deg: tabletop_normals::orientation::DEFAULT_TOLERANCE_DEG,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadiusOutlierSection {
    pub min_neighbors: usize,
    pub radius: f32,
}

impl Default for RadiusOutlierSection {
    fn default() -> Self {
        Self {
            min_neighbors: 150,
            radius: 0.3,
        }
    }
}

/// RANSAC settings for finding the table among the horizontal points.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TablePlaneSection {
    pub distance_threshold: f32,
    pub sample_size: usize,
    pub iterations: usize,
}

impl Default for TablePlaneSection {
    fn default() -> Self {
        Self {
            distance_threshold: 0.03,
            sample_size: 4,
            iterations: 100,
        }
    }
}

impl TablePlaneSection {
    pub fn to_params(&self) -> RansacParams {
        RansacParams::new(self.distance_threshold, self.sample_size, self.iterations)
    }
}

/// RANSAC settings for removing the table from the cropped scene.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaneRemovalSection {
    pub distance_threshold: f32,
    pub sample_size: usize,
    pub iterations: usize,
}

impl Default for PlaneRemovalSection {
    fn default() -> Self {
        Self {
            distance_threshold: 0.01,
            sample_size: 3,
            iterations: 100,
        }
    }
}

impl PlaneRemovalSection {
    pub fn to_params(&self) -> RansacParams {
        RansacParams::new(self.distance_threshold, self.sample_size, self.iterations)
    }
}

/// One rigid motion: rotation in degrees about x, then y, then z, followed
/// by a translation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalibrationStep {
    #[serde(default)]
    pub rotation_deg: [f32; 3],
    #[serde(default)]
    pub translation: [f32; 3],
}

impl CalibrationStep {
    pub fn rotation(rotation_deg: [f32; 3]) -> Self {
        Self {
            rotation_deg,
            translation: [0.0; 3],
        }
    }

    pub fn to_transform(&self) -> RigidTransform {
        RigidTransform::from_euler_degrees(self.rotation_deg, self.translation)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CropSection {
    pub min: [f32; 3],
    pub max: [f32; 3],
}

impl Default for CropSection {
    fn default() -> Self {
        Self {
            min: [-0.6, -0.5, -0.025],
            max: [0.6, 0.5, 0.5],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteringSection {
    pub eps: f32,
    pub min_points: usize,
}

impl Default for ClusteringSection {
    fn default() -> Self {
        Self {
            eps: 0.031,
            min_points: 60,
        }
    }
}

/// Camera pose of the default scene view, written next to exported scenes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    pub field_of_view: f32,
    pub front: [f64; 3],
    pub lookat: [f64; 3],
    pub up: [f64; 3],
    pub zoom: f64,
    pub bbox_min: [f32; 3],
    pub bbox_max: [f32; 3],
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            field_of_view: 60.0,
            front: [0.483_578_151_991_971_3, 0.615_484_838_673_639_4, 0.622_358_887_041_001_5],
            lookat: [0.254_700_842_869_064_6, 0.231_515_832_595_772_94, 0.253_846_669_085_591_67],
            up: [-0.403_799_610_651_158_2, -0.473_972_674_668_485_36, 0.782_493_308_665_048_9],
            zoom: 0.88,
            bbox_min: [-0.7, -0.7, -0.25],
            bbox_max: [0.7, 0.7, 0.5],
        }
    }
}
