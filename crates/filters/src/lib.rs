#![forbid(unsafe_code)]

pub mod crop_box;
pub mod error;
pub mod radius_outlier;
pub mod voxel_downsample;

pub use crop_box::{crop_box, crop_box_indices};
pub use error::FilterError;
pub use radius_outlier::{radius_outlier_indices, radius_outlier_removal};
pub use voxel_downsample::voxel_downsample;
