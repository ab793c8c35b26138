use crate::error::{ClassifyError, Result};

/// Counts of (ground truth, prediction) pairs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfusionMatrix {
    num_classes: usize,
    /// `counts[truth][predicted]`
    counts: Vec<Vec<usize>>,
}

impl ConfusionMatrix {
    pub fn new(num_classes: usize) -> Self {
        Self {
            num_classes,
            counts: vec![vec![0; num_classes]; num_classes],
        }
    }

    pub fn from_predictions(
        predicted: &[usize],
        truth: &[usize],
        num_classes: usize,
    ) -> Result<Self> {
        let mut matrix = Self::new(num_classes);
        for (&p, &t) in predicted.iter().zip(truth) {
            matrix.add(p, t)?;
        }
        Ok(matrix)
    }

    pub fn add(&mut self, predicted: usize, truth: usize) -> Result<()> {
        for index in [predicted, truth] {
            if index >= self.num_classes {
                return Err(ClassifyError::InvalidClass {
                    index,
                    num_classes: self.num_classes,
                });
            }
        }
        self.counts[truth][predicted] += 1;
        Ok(())
    }

    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    pub fn count(&self, truth: usize, predicted: usize) -> usize {
        self.counts[truth][predicted]
    }

    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    pub fn true_positives(&self, class: usize) -> usize {
        self.counts[class][class]
    }

    pub fn false_positives(&self, class: usize) -> usize {
        (0..self.num_classes)
            .filter(|&t| t != class)
            .map(|t| self.counts[t][class])
            .sum()
    }

    pub fn false_negatives(&self, class: usize) -> usize {
        (0..self.num_classes)
            .filter(|&p| p != class)
            .map(|p| self.counts[class][p])
            .sum()
    }

    /// Mean of `score(tp, fp, fn)` over the classes that occur in either the
    /// predictions or the ground truth.
    fn macro_average(&self, score: impl Fn(usize, usize, usize) -> f64) -> f64 {
        let present: Vec<f64> = (0..self.num_classes)
            .map(|c| (self.true_positives(c), self.false_positives(c), self.false_negatives(c)))
            .filter(|&(tp, fp, fn_)| tp + fp + fn_ > 0)
            .map(|(tp, fp, fn_)| score(tp, fp, fn_))
            .collect();
        if present.is_empty() {
            0.0
        } else {
            present.iter().sum::<f64>() / present.len() as f64
        }
    }

    pub fn macro_precision(&self) -> f64 {
        self.macro_average(|tp, fp, _| safe_div(tp, tp + fp))
    }

    pub fn macro_recall(&self) -> f64 {
        self.macro_average(|tp, _, fn_| safe_div(tp, tp + fn_))
    }

    pub fn macro_f1(&self) -> f64 {
        self.macro_average(|tp, fp, fn_| safe_div(2 * tp, 2 * tp + fp + fn_))
    }

    /// F1 over the pooled counts of all classes.
    pub fn micro_f1(&self) -> f64 {
        let (mut tp, mut fp, mut fn_) = (0, 0, 0);
        for c in 0..self.num_classes {
            tp += self.true_positives(c);
            fp += self.false_positives(c);
            fn_ += self.false_negatives(c);
        }
        safe_div(2 * tp, 2 * tp + fp + fn_)
    }

    pub fn accuracy(&self) -> f64 {
        let correct: usize = (0..self.num_classes).map(|c| self.true_positives(c)).sum();
        safe_div(correct, self.total())
    }
}

fn safe_div(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// Summary scores in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassificationMetrics {
    /// Macro-averaged precision.
    pub precision: f64,
    /// Macro-averaged recall.
    pub recall: f64,
    /// Micro-averaged F1.
    pub f1: f64,
    pub macro_f1: f64,
}

impl From<&ConfusionMatrix> for ClassificationMetrics {
    fn from(matrix: &ConfusionMatrix) -> Self {
        Self {
            precision: matrix.macro_precision(),
            recall: matrix.macro_recall(),
            f1: matrix.micro_f1(),
            macro_f1: matrix.macro_f1(),
        }
    }
}
