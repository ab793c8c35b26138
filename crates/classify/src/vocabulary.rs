use std::path::Path;

use crate::error::{ClassifyError, Result};

/// Ordered class names; a label's position is its network output index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelVocabulary {
    labels: Vec<String>,
}

impl Default for LabelVocabulary {
    fn default() -> Self {
        Self::new(["bowl", "cap", "cereal", "coffee", "soda"])
    }
}

impl LabelVocabulary {
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            labels: labels.into_iter().map(Into::into).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }

    pub fn label(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    /// Class of an object file, taken from the start of its file stem
    /// (`soda_2.off` is a `soda`). Case-insensitive; the first matching label
    /// in vocabulary order wins.
    pub fn infer_from_path(&self, path: &Path) -> Result<usize> {
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .map(str::to_lowercase)
            .ok_or_else(|| ClassifyError::UnknownLabel(path.to_path_buf()))?;

        self.labels
            .iter()
            .position(|label| stem.starts_with(&label.to_lowercase()))
            .ok_or_else(|| ClassifyError::UnknownLabel(path.to_path_buf()))
    }
}
