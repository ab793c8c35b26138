use tabletop_core::{Aabb, PointCloud, RigidTransform};
use tabletop_segmentation::{dbscan, ClusterLabels, PlaneModel};

use crate::config::SceneConfig;
use crate::error::SceneError;
use crate::objects::{build_objects, ObjectRecord};
use crate::processing::ScanProcessor;
use crate::table::{detect_table, TableDetection};

/// Result of segmenting one scan.
#[derive(Debug, Clone)]
pub struct Segmentation {
    /// Points above the table inside the crop box, in the table frame.
    pub clutter: PointCloud,
    /// Cluster label of every clutter point.
    pub labels: ClusterLabels,
    pub objects: Vec<ObjectRecord>,
    /// Table plane removed from the cropped scene, in the table frame.
    pub table_plane: PlaneModel,
    pub table: TableDetection,
    /// Motion from the scan frame to the table frame.
    pub to_table_frame: RigidTransform,
    pub crop_box: Aabb,
}

impl Segmentation {
    pub fn num_objects(&self) -> usize {
        self.objects.len()
    }
}

/// Splits a tabletop scan into the objects standing on the table.
#[derive(Debug, Clone, Default)]
pub struct SceneSegmenter {
    config: SceneConfig,
}

impl SceneSegmenter {
    pub fn new(config: SceneConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    /// Scan-to-table-frame motion: centre the table at the origin, then apply
    /// the calibration steps in order.
    pub fn table_frame(&self, table_center: [f32; 3]) -> RigidTransform {
        let centring = RigidTransform::from_translation(table_center.map(|c| -c));
        self.config
            .calibration
            .iter()
            .fold(centring, |acc, step| acc.then(&step.to_transform()))
    }

    pub fn segment(&self, raw: &PointCloud) -> Result<Segmentation, SceneError> {
        let config = &self.config;

        let mut processor = ScanProcessor::from_cloud(raw.clone());
        processor.pre_process(config.voxel_size)?;

        // normals are only reliable on the full-resolution scan
        let table = detect_table(raw, config)?;

        let to_table_frame = self.table_frame(table.center);
        processor.apply(&to_table_frame);
        processor.crop(config.crop.min, config.crop.max)?;
        let crop_box = processor
            .crop_box()
            .cloned()
            .unwrap_or_else(Aabb::empty);
        log::info!("{} points inside the crop box", processor.cloud().len());

        let (table_plane, clutter) =
            processor.remove_plane(&config.plane_removal.to_params(), config.seed.wrapping_add(1))?;
        log::info!(
            "{} points left after removing the table plane",
            clutter.len()
        );
        if clutter.is_empty() {
            log::warn!("nothing left on the table to cluster");
        }

        let labels = dbscan(&clutter, config.clustering.eps, config.clustering.min_points);
        let objects = build_objects(&clutter, &labels);
        log::info!(
            "{} objects, {} noise points",
            objects.len(),
            labels.noise_count()
        );

        Ok(Segmentation {
            clutter,
            labels,
            objects,
            table_plane,
            table,
            to_table_frame,
            crop_box,
        })
    }
}
