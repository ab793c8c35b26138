#![forbid(unsafe_code)]

pub mod error;
pub mod off;
pub mod pcd;
pub mod ply;

use std::path::Path;

use tabletop_core::PointCloud;

pub use error::{IoError, Result};
pub use off::read_off;
pub use pcd::{read_pcd, write_pcd, write_pcd_binary};
pub use ply::{read_ply, write_ply, write_ply_binary};

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default()
}

/// Reads a point cloud, choosing the format from the file extension
/// (`.pcd`, `.ply` or `.off`, case-insensitive).
pub fn read_point_cloud(path: impl AsRef<Path>) -> Result<PointCloud> {
    let path = path.as_ref();
    let cloud = match extension(path).as_str() {
        "pcd" => read_pcd(path)?,
        "ply" => read_ply(path)?,
        "off" => read_off(path)?,
        other => return Err(IoError::UnsupportedFormat(format!(".{}", other))),
    };
    log::debug!("read {} points from {}", cloud.len(), path.display());
    Ok(cloud)
}

/// Writes a point cloud, choosing the format from the file extension.
///
/// `.pcd` and `.ply` are written in their binary encodings.
pub fn write_point_cloud(path: impl AsRef<Path>, cloud: &PointCloud) -> Result<()> {
    let path = path.as_ref();
    match extension(path).as_str() {
        "pcd" => write_pcd_binary(path, cloud)?,
        "ply" => write_ply_binary(path, cloud)?,
        other => return Err(IoError::UnsupportedFormat(format!(".{}", other))),
    }
    log::debug!("wrote {} points to {}", cloud.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn dispatch_roundtrips_by_extension() {
        let dir = tempdir().unwrap();
        let cloud = PointCloud::from_points(&[[0.0, 1.0, 2.0], [3.0, 4.0, 5.0]]);

        for name in ["a.pcd", "b.PLY"] {
            let path = dir.path().join(name);
            write_point_cloud(&path, &cloud).unwrap();
            assert_eq!(read_point_cloud(&path).unwrap(), cloud);
        }
    }

    #[test]
    fn unknown_extension_is_unsupported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scan.xyz");
        std::fs::write(&path, "0 0 0\n").unwrap();
        assert!(matches!(
            read_point_cloud(&path),
            Err(IoError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            write_point_cloud(dir.path().join("out.off"), &PointCloud::new()),
            Err(IoError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        assert!(matches!(
            read_point_cloud("/nonexistent/scene.ply"),
            Err(IoError::Io(_))
        ));
    }
}
