use tabletop_core::PointCloud;
use tabletop_segmentation::ClusterLabels;

/// Pastel qualitative palette used to tell objects apart.
pub const PALETTE: [[u8; 3]; 9] = [
    [251, 180, 174],
    [179, 205, 227],
    [204, 235, 197],
    [222, 203, 228],
    [254, 217, 166],
    [255, 255, 204],
    [229, 216, 189],
    [253, 218, 236],
    [242, 242, 242],
];

/// Colour for a cluster id; ids wrap around the palette (`id % 9`).
pub fn palette_color(cluster_id: i32) -> [u8; 3] {
    PALETTE[cluster_id.rem_euclid(PALETTE.len() as i32) as usize]
}

/// One object segmented from the table.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectRecord {
    /// Cluster id as text.
    pub label: String,
    pub cluster_id: i32,
    /// The object's points, painted with `color`.
    pub points: PointCloud,
    pub color: [u8; 3],
    /// Mean of the object's points.
    pub centroid: [f32; 3],
}

/// Builds one record per cluster of `labels`, in cluster-id order.
pub fn build_objects(cloud: &PointCloud, labels: &ClusterLabels) -> Vec<ObjectRecord> {
    labels
        .cluster_indices()
        .into_iter()
        .enumerate()
        .filter_map(|(id, indices)| {
            let cluster_id = id as i32;
            let color = palette_color(cluster_id);
            let mut points = cloud.select(&indices);
            points.paint_uniform(color);
            let centroid = points.centroid()?;
            Some(ObjectRecord {
                label: cluster_id.to_string(),
                cluster_id,
                points,
                color,
                centroid,
            })
        })
        .collect()
}
