use std::path::PathBuf;

use tabletop_io::IoError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClassifyError>;

#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error(transparent)]
    Io(#[from] IoError),

    #[error("invalid weight file: {0}")]
    Weights(#[from] serde_json::Error),

    #[error("invalid object directory pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("cannot list object directory: {0}")]
    Glob(#[from] glob::GlobError),

    #[error("no vocabulary label matches the file name of {}", .0.display())]
    UnknownLabel(PathBuf),

    #[error("object {} has no finite points", .0.display())]
    EmptyObject(PathBuf),

    #[error("no objects to classify")]
    EmptyDataset,

    #[error("network shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("class index {index} outside 0..{num_classes}")]
    InvalidClass { index: usize, num_classes: usize },
}
