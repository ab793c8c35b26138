use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum FilterError {
    #[error("invalid crop range on axis {axis}: min {min} > max {max} or bound not finite")]
    InvalidRange { axis: usize, min: f32, max: f32 },

    #[error("voxel size must be positive and finite, got {0}")]
    InvalidVoxelSize(f32),

    #[error("search radius must be positive and finite, got {0}")]
    InvalidRadius(f32),
}
