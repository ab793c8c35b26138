#![forbid(unsafe_code)]

//! Object classification for segmented tabletop scenes: label inference
//! from file names, point-set sampling, PointNet inference from JSON weights
//! and precision/recall/F1 scoring.

pub mod classifier;
pub mod config;
pub mod dataset;
pub mod error;
pub mod metrics;
pub mod pointnet;
pub mod sampler;
pub mod vocabulary;

pub use classifier::{classify_batch, ClassificationReport, ObjectPrediction};
pub use config::ClassifierConfig;
pub use dataset::{ObjectDataset, ObjectSample};
pub use error::{ClassifyError, Result};
pub use metrics::{ClassificationMetrics, ConfusionMatrix};
pub use pointnet::{LayerWeights, PointNet, PointNetWeights, PointSetClassifier};
pub use sampler::PointSampler;
pub use vocabulary::LabelVocabulary;
