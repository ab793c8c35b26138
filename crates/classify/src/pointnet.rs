//! PointNet inference.
//!
//! The network is a stack of per-point dense layers shared by every point,
//! a max-pool over the points, and a fully-connected head producing one
//! logit per class. Weights are the inference-mode export of a trained
//! model: batch normalisation is folded into the preceding layer and
//! dropout is gone.

use std::fs;
use std::path::Path;

use nalgebra::{DMatrix, DVector, RowDVector};
use serde::{Deserialize, Serialize};
use tabletop_io::IoError;

use crate::error::{ClassifyError, Result};

/// Anything that maps point sets to class scores.
pub trait PointSetClassifier {
    fn num_classes(&self) -> usize;

    /// One logit vector of length [`num_classes`](Self::num_classes) per
    /// point set in `batch`.
    fn logits(&self, batch: &[Vec<[f32; 3]>]) -> Result<Vec<Vec<f32>>>;
}

/// A dense layer `y = W x + b` as stored in the weight file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerWeights {
    /// Row-major, `outputs x inputs`.
    pub weight: Vec<Vec<f32>>,
    pub bias: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointNetWeights {
    pub point_mlp: Vec<LayerWeights>,
    pub head: Vec<LayerWeights>,
}

#[derive(Debug, Clone)]
struct Dense {
    /// `inputs x outputs`, so rows of activations multiply on the left.
    weight_t: DMatrix<f32>,
    bias: RowDVector<f32>,
}

impl Dense {
    fn from_weights(layer: &LayerWeights, inputs: usize, name: &str) -> Result<Self> {
        let outputs = layer.weight.len();
        if outputs == 0 {
            return Err(ClassifyError::ShapeMismatch(format!("{} has no outputs", name)));
        }
        if let Some(row) = layer.weight.iter().position(|r| r.len() != inputs) {
            return Err(ClassifyError::ShapeMismatch(format!(
                "{} row {} has {} inputs, expected {}",
                name,
                row,
                layer.weight[row].len(),
                inputs
            )));
        }
        if layer.bias.len() != outputs {
            return Err(ClassifyError::ShapeMismatch(format!(
                "{} has {} biases for {} outputs",
                name,
                layer.bias.len(),
                outputs
            )));
        }

        Ok(Self {
            weight_t: DMatrix::from_fn(inputs, outputs, |i, o| layer.weight[o][i]),
            bias: RowDVector::from_row_slice(&layer.bias),
        })
    }

    fn outputs(&self) -> usize {
        self.bias.len()
    }

    /// Applies the layer to every row of `input`.
    fn forward_rows(&self, input: &DMatrix<f32>, relu: bool) -> DMatrix<f32> {
        let mut out = input * &self.weight_t;
        for mut row in out.row_iter_mut() {
            row += &self.bias;
            if relu {
                row.apply(|v| *v = v.max(0.0));
            }
        }
        out
    }
}

/// PointNet classifier with weights loaded from JSON.
#[derive(Debug, Clone)]
pub struct PointNet {
    point_mlp: Vec<Dense>,
    head: Vec<Dense>,
}

impl PointNet {
    /// Loads and validates a JSON weight file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(IoError::from)?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let weights: PointNetWeights = serde_json::from_str(json)?;
        Self::from_weights(&weights)
    }

    /// Builds the network, checking that the shared layers start at 3
    /// inputs and that every layer consumes what the previous one produces.
    pub fn from_weights(weights: &PointNetWeights) -> Result<Self> {
        if weights.point_mlp.is_empty() || weights.head.is_empty() {
            return Err(ClassifyError::ShapeMismatch(
                "both the shared MLP and the head need at least one layer".to_string(),
            ));
        }

        let mut inputs = 3;
        let mut point_mlp = Vec::with_capacity(weights.point_mlp.len());
        for (i, layer) in weights.point_mlp.iter().enumerate() {
            let dense = Dense::from_weights(layer, inputs, &format!("point_mlp[{}]", i))?;
            inputs = dense.outputs();
            point_mlp.push(dense);
        }

        let mut head = Vec::with_capacity(weights.head.len());
        for (i, layer) in weights.head.iter().enumerate() {
            let dense = Dense::from_weights(layer, inputs, &format!("head[{}]", i))?;
            inputs = dense.outputs();
            head.push(dense);
        }

        log::debug!(
            "PointNet with {} shared and {} head layers, {} classes",
            point_mlp.len(),
            head.len(),
            inputs
        );
        Ok(Self { point_mlp, head })
    }

    fn global_features(&self, batch: &[Vec<[f32; 3]>]) -> Result<Vec<DVector<f32>>> {
        if let Some(i) = batch.iter().position(|set| set.is_empty()) {
            return Err(ClassifyError::ShapeMismatch(format!("point set {} is empty", i)));
        }

        // every point of every set goes through the shared layers at once
        let total: usize = batch.iter().map(Vec::len).sum();
        let mut activations = DMatrix::from_iterator(
            3,
            total,
            batch.iter().flatten().flat_map(|p| p.iter().copied()),
        )
        .transpose();

        for layer in &self.point_mlp {
            activations = layer.forward_rows(&activations, true);
        }

        let mut features = Vec::with_capacity(batch.len());
        let mut start = 0;
        for set in batch {
            let rows = activations.rows(start, set.len());
            let pooled = DVector::from_iterator(
                rows.ncols(),
                rows.column_iter().map(|c| c.max()),
            );
            features.push(pooled);
            start += set.len();
        }
        Ok(features)
    }
}

impl PointSetClassifier for PointNet {
    fn num_classes(&self) -> usize {
        self.head.last().map_or(0, Dense::outputs)
    }

    fn logits(&self, batch: &[Vec<[f32; 3]>]) -> Result<Vec<Vec<f32>>> {
        let features = self.global_features(batch)?;
        if features.is_empty() {
            return Ok(Vec::new());
        }

        let mut activations = DMatrix::from_columns(&features).transpose();
        let last = self.head.len() - 1;
        for (i, layer) in self.head.iter().enumerate() {
            activations = layer.forward_rows(&activations, i != last);
        }

        Ok(activations
            .row_iter()
            .map(|row| row.iter().copied().collect())
            .collect())
    }
}
