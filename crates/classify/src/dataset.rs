use std::path::{Path, PathBuf};

use tabletop_core::PointCloud;

use crate::error::Result;
use crate::vocabulary::LabelVocabulary;

const OBJECT_EXTENSIONS: [&str; 3] = ["off", "ply", "pcd"];

/// One object file and its ground-truth class.
#[derive(Debug, Clone)]
pub struct ObjectSample {
    pub path: PathBuf,
    pub cloud: PointCloud,
    pub label: usize,
}

/// Object files to classify, in path order.
#[derive(Debug, Clone)]
pub struct ObjectDataset {
    vocabulary: LabelVocabulary,
    samples: Vec<ObjectSample>,
}

impl ObjectDataset {
    /// Loads every `.off`, `.ply` and `.pcd` file directly inside `dir`.
    pub fn from_dir(dir: impl AsRef<Path>, vocabulary: LabelVocabulary) -> Result<Self> {
        let dir = dir.as_ref();
        let pattern = format!("{}/*", glob::Pattern::escape(&dir.to_string_lossy()));

        let mut paths = Vec::new();
        for entry in glob::glob(&pattern)? {
            let path = entry?;
            let is_object = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| OBJECT_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
                .unwrap_or(false);
            if is_object && path.is_file() {
                paths.push(path);
            }
        }
        log::info!("found {} object files in {}", paths.len(), dir.display());

        Self::from_paths(paths, vocabulary)
    }

    /// Loads the given files; the class of each comes from its file name.
    pub fn from_paths(mut paths: Vec<PathBuf>, vocabulary: LabelVocabulary) -> Result<Self> {
        paths.sort();
        let samples = paths
            .into_iter()
            .map(|path| -> Result<ObjectSample> {
                let label = vocabulary.infer_from_path(&path)?;
                let cloud = tabletop_io::read_point_cloud(&path)?;
                Ok(ObjectSample { path, cloud, label })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { vocabulary, samples })
    }

    pub fn vocabulary(&self) -> &LabelVocabulary {
        &self.vocabulary
    }

    pub fn samples(&self) -> &[ObjectSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
