use tabletop_core::{Colors, Normals, PointCloud};
use tabletop_io::{read_point_cloud, write_pcd, write_ply, write_point_cloud};
use tempfile::tempdir;

fn coloured_cloud_with_normals() -> PointCloud {
    let mut cloud = PointCloud::from_xyz(
        vec![1.0, 2.0, -3.5],
        vec![4.0, 5.25, 6.0],
        vec![7.0, 8.0, 9.125],
    );
    cloud.normals = Some(Normals::from_vectors(&[
        [0.0, 0.0, 1.0],
        [0.0, 1.0, 0.0],
        [0.6, 0.8, 0.0],
    ]));
    cloud.colors = Some(Colors {
        r: vec![255, 0, 10],
        g: vec![0, 128, 20],
        b: vec![7, 255, 30],
    });
    cloud
}

fn assert_close(a: &PointCloud, b: &PointCloud) {
    assert_eq!(a.len(), b.len());
    for i in 0..a.len() {
        for axis in 0..3 {
            assert!((a.point(i)[axis] - b.point(i)[axis]).abs() < 1e-4);
        }
    }
}

#[test]
fn binary_writers_roundtrip_every_channel() {
    let dir = tempdir().unwrap();
    let cloud = coloured_cloud_with_normals();

    for name in ["cloud.pcd", "cloud.ply", "CLOUD.PLY"] {
        let path = dir.path().join(name);
        write_point_cloud(&path, &cloud).unwrap();
        let loaded = read_point_cloud(&path).unwrap();
        assert_eq!(loaded, cloud, "{name}");
    }
}

#[test]
fn ascii_writers_roundtrip() {
    let dir = tempdir().unwrap();
    let cloud = coloured_cloud_with_normals();

    let pcd = dir.path().join("ascii.pcd");
    write_pcd(&pcd, &cloud).unwrap();
    let loaded = read_point_cloud(&pcd).unwrap();
    assert_close(&loaded, &cloud);
    assert_eq!(loaded.colors, cloud.colors);

    let ply = dir.path().join("ascii.ply");
    write_ply(&ply, &cloud).unwrap();
    let loaded = read_point_cloud(&ply).unwrap();
    assert_close(&loaded, &cloud);
    assert_eq!(loaded.colors, cloud.colors);
    assert!(loaded.normals.is_some());
}

#[test]
fn empty_cloud_roundtrip() {
    let dir = tempdir().unwrap();
    for name in ["empty.pcd", "empty.ply"] {
        let path = dir.path().join(name);
        write_point_cloud(&path, &PointCloud::new()).unwrap();
        assert!(read_point_cloud(&path).unwrap().is_empty());
    }
}

#[test]
fn off_mesh_vertices_are_read() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cereal_box.off");
    std::fs::write(
        &path,
        "OFF\n# a unit square\n4 2 0\n0 0 0\n1 0 0\n1 1 0\n0 1 0\n3 0 1 2\n3 0 2 3\n",
    )
    .unwrap();

    let cloud = read_point_cloud(&path).unwrap();
    assert_eq!(cloud.len(), 4);
    assert_eq!(cloud.point(2), [1.0, 1.0, 0.0]);
}

#[test]
fn writing_off_is_unsupported() {
    let dir = tempdir().unwrap();
    assert!(write_point_cloud(dir.path().join("out.off"), &PointCloud::new()).is_err());
}
