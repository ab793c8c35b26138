use tabletop_filters::FilterError;
use tabletop_io::IoError;
use tabletop_normals::OrientationError;
use tabletop_segmentation::PlaneError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SceneError {
    #[error(transparent)]
    Io(#[from] IoError),

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error(transparent)]
    Orientation(#[from] OrientationError),

    #[error(transparent)]
    Plane(#[from] PlaneError),

    #[error("voxel size must be positive and finite, got {0}")]
    InvalidVoxelSize(f32),

    #[error("no table plane found: {0}")]
    TableNotFound(&'static str),

    #[error("failed to encode view file: {0}")]
    Json(#[from] serde_json::Error),
}
