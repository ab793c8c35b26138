use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tabletop_core::{Aabb, PointCloud};
use tabletop_io::{write_ply_binary, IoError};

use crate::config::ViewConfig;
use crate::error::SceneError;
use crate::objects::ObjectRecord;

/// Writes every object to `dir/object_<id>.ply`, creating `dir` if needed.
pub fn write_objects(
    dir: impl AsRef<Path>,
    objects: &[ObjectRecord],
) -> Result<Vec<PathBuf>, SceneError> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir).map_err(IoError::from)?;

    let mut written = Vec::with_capacity(objects.len());
    for object in objects {
        let path = dir.join(format!("object_{}.ply", object.label));
        write_ply_binary(&path, &object.points)?;
        written.push(path);
    }
    log::info!("wrote {} objects to {}", written.len(), dir.display());
    Ok(written)
}

/// Writes all objects, in their colours, as one PLY cloud.
pub fn write_scene(path: impl AsRef<Path>, objects: &[ObjectRecord]) -> Result<(), SceneError> {
    let mut scene = PointCloud::new();
    for object in objects {
        scene.merge(&object.points);
    }
    write_ply_binary(path, &scene)?;
    Ok(())
}

#[derive(Serialize)]
struct ViewTrajectory {
    class_name: &'static str,
    interval: u32,
    is_loop: bool,
    trajectory: Vec<ViewPose>,
    version_major: u32,
    version_minor: u32,
}

#[derive(Serialize)]
struct ViewPose {
    boundingbox_max: [f32; 3],
    boundingbox_min: [f32; 3],
    field_of_view: f32,
    front: [f64; 3],
    lookat: [f64; 3],
    up: [f64; 3],
    zoom: f64,
}

/// Writes the camera pose as a viewer trajectory JSON file.
///
/// The bounding box is the configured view box grown to contain `bounds`.
pub fn write_view(
    path: impl AsRef<Path>,
    view: &ViewConfig,
    bounds: &Aabb,
) -> Result<(), SceneError> {
    let mut bbox = Aabb::from_bounds(view.bbox_min, view.bbox_max).unwrap_or_else(Aabb::empty);
    if !bounds.is_empty() {
        bbox.expand_with_point(bounds.min);
        bbox.expand_with_point(bounds.max);
    }
    let (boundingbox_min, boundingbox_max) = if bbox.is_empty() {
        ([0.0; 3], [0.0; 3])
    } else {
        (bbox.min, bbox.max)
    };

    let trajectory = ViewTrajectory {
        class_name: "ViewTrajectory",
        interval: 29,
        is_loop: false,
        trajectory: vec![ViewPose {
            boundingbox_max,
            boundingbox_min,
            field_of_view: view.field_of_view,
            front: view.front,
            lookat: view.lookat,
            up: view.up,
            zoom: view.zoom,
        }],
        version_major: 1,
        version_minor: 0,
    };

    let json = serde_json::to_string_pretty(&trajectory)?;
    fs::write(path, json).map_err(IoError::from)?;
    Ok(())
}
