use hashbrown::HashMap;
use tabletop_core::{Colors, Normals, PointCloud};

use crate::error::FilterError;

#[derive(Default, Clone, Copy)]
struct VoxelAccum {
    pos: [f64; 3],
    normal: [f64; 3],
    color: [f64; 3],
    n: usize,
}

/// Replaces the points of every occupied voxel by their average.
///
/// The grid is anchored half a voxel below the cloud's minimum corner.
/// Normals are averaged and re-normalised; colours are averaged and rounded.
/// Output voxels are ordered by grid coordinate, so the result does not
/// depend on hash iteration order. Non-finite points are dropped.
pub fn voxel_downsample(cloud: &PointCloud, voxel_size: f32) -> Result<PointCloud, FilterError> {
    if !(voxel_size.is_finite() && voxel_size > 0.0) {
        return Err(FilterError::InvalidVoxelSize(voxel_size));
    }

    let bounds = cloud.aabb();
    if bounds.is_empty() {
        return Ok(PointCloud::new());
    }

    let size = voxel_size as f64;
    let origin = bounds.min.map(|m| m as f64 - 0.5 * size);

    let mut bins: HashMap<[i64; 3], VoxelAccum> = HashMap::new();

    for i in 0..cloud.len() {
        let p = cloud.point(i);
        if !p.iter().all(|v| v.is_finite()) {
            continue;
        }

        let key = [0, 1, 2].map(|a| ((p[a] as f64 - origin[a]) / size).floor() as i64);
        let entry = bins.entry(key).or_default();
        for a in 0..3 {
            entry.pos[a] += p[a] as f64;
        }
        if let Some(ref normals) = cloud.normals {
            let nrm = normals.normal(i);
            for a in 0..3 {
                entry.normal[a] += nrm[a] as f64;
            }
        }
        if let Some(ref colors) = cloud.colors {
            let c = colors.color(i);
            for a in 0..3 {
                entry.color[a] += c[a] as f64;
            }
        }
        entry.n += 1;
    }

    let mut voxels: Vec<([i64; 3], VoxelAccum)> = bins.into_iter().collect();
    voxels.sort_unstable_by_key(|(key, _)| *key);

    let points: Vec<[f32; 3]> = voxels
        .iter()
        .map(|(_, acc)| acc.pos.map(|s| (s / acc.n as f64) as f32))
        .collect();
    let mut out = PointCloud::from_points(&points);

    if cloud.normals.is_some() {
        let normals: Vec<[f32; 3]> = voxels
            .iter()
            .map(|(_, acc)| {
                let norm = acc.normal.iter().map(|v| v * v).sum::<f64>().sqrt();
                if norm > 0.0 {
                    acc.normal.map(|v| (v / norm) as f32)
                } else {
                    [0.0; 3]
                }
            })
            .collect();
        out.normals = Some(Normals::from_vectors(&normals));
    }

    if cloud.colors.is_some() {
        let mean = |channel: usize| -> Vec<u8> {
            voxels
                .iter()
                .map(|(_, acc)| (acc.color[channel] / acc.n as f64).round() as u8)
                .collect()
        };
        out.colors = Some(Colors {
            r: mean(0),
            g: mean(1),
            b: mean(2),
        });
    }

    Ok(out)
}
