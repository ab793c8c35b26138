#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod export;
pub mod objects;
pub mod processing;
pub mod segmenter;
pub mod table;

pub use config::{SceneConfig, ViewConfig};
pub use error::SceneError;
pub use objects::{ObjectRecord, PALETTE};
pub use processing::ScanProcessor;
pub use segmenter::{SceneSegmenter, Segmentation};
pub use table::{detect_table, TableDetection};
