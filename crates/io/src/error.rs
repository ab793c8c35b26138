use thiserror::Error;

pub type Result<T> = std::result::Result<T, IoError>;

/// Failures while reading or writing point cloud files.
#[derive(Debug, Error)]
pub enum IoError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unsupported point cloud format: {0}")]
    UnsupportedFormat(String),

    #[error("malformed {format} data: {reason}")]
    Malformed {
        format: &'static str,
        reason: String,
    },
}

impl IoError {
    pub(crate) fn malformed(format: &'static str, reason: impl Into<String>) -> Self {
        IoError::Malformed {
            format,
            reason: reason.into(),
        }
    }
}
