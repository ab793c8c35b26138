use std::path::PathBuf;

use crate::dataset::ObjectDataset;
use crate::error::{ClassifyError, Result};
use crate::metrics::{ClassificationMetrics, ConfusionMatrix};
use crate::pointnet::PointSetClassifier;
use crate::sampler::PointSampler;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectPrediction {
    pub path: PathBuf,
    pub predicted: usize,
    pub ground_truth: usize,
    pub predicted_label: String,
    pub ground_truth_label: String,
}

impl ObjectPrediction {
    pub fn is_correct(&self) -> bool {
        self.predicted == self.ground_truth
    }
}

#[derive(Debug, Clone)]
pub struct ClassificationReport {
    pub predictions: Vec<ObjectPrediction>,
    pub confusion: ConfusionMatrix,
    pub metrics: ClassificationMetrics,
}

impl ClassificationReport {
    pub fn predicted_labels(&self) -> Vec<&str> {
        self.predictions.iter().map(|p| p.predicted_label.as_str()).collect()
    }

    pub fn ground_truth_labels(&self) -> Vec<&str> {
        self.predictions
            .iter()
            .map(|p| p.ground_truth_label.as_str())
            .collect()
    }
}

/// Classifies every object of `dataset` in one forward pass and scores the
/// predictions against the labels taken from the file names.
pub fn classify_batch<C>(
    classifier: &C,
    dataset: &ObjectDataset,
    sampler: &PointSampler,
) -> Result<ClassificationReport>
where
    C: PointSetClassifier + ?Sized,
{
    if dataset.is_empty() {
        return Err(ClassifyError::EmptyDataset);
    }
    let vocabulary = dataset.vocabulary();
    if classifier.num_classes() != vocabulary.len() {
        return Err(ClassifyError::ShapeMismatch(format!(
            "network has {} outputs, vocabulary has {} labels",
            classifier.num_classes(),
            vocabulary.len()
        )));
    }

    let batch = dataset
        .samples()
        .iter()
        .enumerate()
        .map(|(i, s)| sampler.sample(&s.cloud, i as u64, &s.path))
        .collect::<Result<Vec<_>>>()?;
    log::info!(
        "classifying {} objects with {} points each",
        batch.len(),
        sampler.num_points
    );

    let logits = classifier.logits(&batch)?;
    if logits.len() != batch.len() {
        return Err(ClassifyError::ShapeMismatch(format!(
            "{} logit rows for {} objects",
            logits.len(),
            batch.len()
        )));
    }

    let mut confusion = ConfusionMatrix::new(vocabulary.len());
    let mut predictions = Vec::with_capacity(batch.len());
    for (sample, row) in dataset.samples().iter().zip(&logits) {
        let predicted = argmax(row).ok_or_else(|| {
            ClassifyError::ShapeMismatch(format!("no finite logits for {}", sample.path.display()))
        })?;
        confusion.add(predicted, sample.label)?;

        let label_of = |index: usize| {
            vocabulary
                .label(index)
                .map(str::to_owned)
                .ok_or(ClassifyError::InvalidClass {
                    index,
                    num_classes: vocabulary.len(),
                })
        };
        log::debug!("{}: predicted {predicted}, expected {}", sample.path.display(), sample.label);
        predictions.push(ObjectPrediction {
            path: sample.path.clone(),
            predicted,
            ground_truth: sample.label,
            predicted_label: label_of(predicted)?,
            ground_truth_label: label_of(sample.label)?,
        });
    }

    let metrics = ClassificationMetrics::from(&confusion);
    Ok(ClassificationReport {
        predictions,
        confusion,
        metrics,
    })
}

/// Index of the largest value; the first one on ties. NaN never wins.
fn argmax(values: &[f32]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .filter(|(_, v)| !v.is_nan())
        .fold(None, |best: Option<(usize, f32)>, (i, &v)| match best {
            Some((_, b)) if v <= b => best,
            _ => Some((i, v)),
        })
        .map(|(i, _)| i)
}
