#![forbid(unsafe_code)]

pub mod estimate;
pub mod orientation;

pub use estimate::{
    estimate_normals, estimate_normals_hybrid, estimate_normals_with_viewpoint,
    orient_normals_to_direction, NormalSearch,
};
pub use orientation::{horizontal_indices, OrientationError};
