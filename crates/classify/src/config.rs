use serde::{Deserialize, Serialize};

use crate::sampler::PointSampler;
use crate::vocabulary::LabelVocabulary;

/// `[classifier]` settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Class names in network output order.
    pub labels: Vec<String>,
    pub num_points: usize,
    pub seed: u64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        let sampler = PointSampler::default();
        Self {
            labels: LabelVocabulary::default().labels().to_vec(),
            num_points: sampler.num_points,
            seed: sampler.seed,
        }
    }
}

impl ClassifierConfig {
    pub fn vocabulary(&self) -> LabelVocabulary {
        LabelVocabulary::new(self.labels.iter().cloned())
    }

    pub fn sampler(&self) -> PointSampler {
        PointSampler::new(self.num_points, self.seed)
    }
}
