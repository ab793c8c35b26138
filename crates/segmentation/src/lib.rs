#![forbid(unsafe_code)]

pub mod dbscan;
pub mod ransac_plane;

pub use dbscan::{dbscan, ClusterLabels, NOISE};
pub use ransac_plane::{segment_plane, segment_plane_random, PlaneError, PlaneModel, RansacParams};
