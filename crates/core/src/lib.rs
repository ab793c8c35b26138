#![forbid(unsafe_code)]

pub mod bbox;
pub mod cloud;
pub mod transform;

pub use bbox::Aabb;
pub use cloud::{Colors, Normals, PointCloud};
pub use transform::{apply_transform, RigidTransform};
