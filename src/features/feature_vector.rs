use serde::{Deserialize, Serialize};
use std::fmt;

/// A struct representing the per-frame feature vector.
///
/// A feature vector is the numeric summary of one frame's detected landmarks. Its length is fixed
/// by the loaded model (the feature width, `F`). Vectors coming from outside the crate may be any
/// length; they are fitted to the model's width when they enter a frame window or a tensor, never
/// before.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FeatureVector {
    values: Vec<f32>,
}

impl FeatureVector {
    pub fn new(values: Vec<f32>) -> Self {
        FeatureVector { values }
    }

    /// A vector of `width` zeros. Used when there is no frame to replicate.
    pub fn zeros(width: usize) -> Self {
        FeatureVector {
            values: vec![0.0; width],
        }
    }

    /// Returns a copy of this vector zero-padded on the right or truncated to exactly `width`.
    pub fn fitted(&self, width: usize) -> Self {
        let mut values: Vec<f32> = self.values.iter().copied().take(width).collect();
        values.resize(width, 0.0);
        FeatureVector { values }
    }

    /// In-place version of `fitted`.
    pub fn fit_to_width(&mut self, width: usize) {
        self.values.truncate(width);
        self.values.resize(width, 0.0);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }
}

impl From<Vec<f32>> for FeatureVector {
    fn from(values: Vec<f32>) -> Self {
        FeatureVector::new(values)
    }
}

impl fmt::Display for FeatureVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FeatureVector {{ len: {} }}", self.values.len())
    }
}
