use crate::classification::classification_error::ClassificationError;
use crate::model::label_table::LabelTable;
use ndarray::{ArrayD, ArrayViewD, Axis};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

/// The labeled decision for one inference call.
///
/// `confidence` is the model's raw score at the chosen index. No softmax is applied here; the
/// model is expected to end in one.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Prediction {
    pub label: String,
    pub confidence: f32,
    pub index: usize,
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:.2}%)", self.label, self.confidence * 100.0)
    }
}

/// Flattens a raw output tensor to one score per class.
///
/// Leading batch dimensions of size 1 are stripped. If a real batch remains, its first entry is
/// used.
pub fn class_scores(output: &ArrayD<f32>) -> Vec<f32> {
    let mut view: ArrayViewD<'_, f32> = output.view();
    while view.ndim() > 1 {
        if view.shape()[0] == 0 {
            return Vec::new();
        }
        if view.shape()[0] != 1 {
            warn!(shape = ?output.shape(), "output has a batch above 1, using the first entry");
        }
        view = view.index_axis_move(Axis(0), 0);
    }
    view.iter().copied().collect()
}

/// Index of the highest score, the first one on ties. NaN scores never win.
pub fn stable_argmax(scores: &[f32]) -> Option<usize> {
    scores
        .iter()
        .enumerate()
        .filter(|(_, score)| !score.is_nan())
        .fold(None, |best: Option<(usize, f32)>, (index, &score)| match best {
            Some((_, best_score)) if score <= best_score => best,
            _ => Some((index, score)),
        })
        .map(|(index, _)| index)
}

/// Reduces a raw output tensor to a prediction.
pub fn reduce(
    output: &ArrayD<f32>,
    labels: &LabelTable,
) -> Result<Prediction, ClassificationError> {
    let scores = class_scores(output);
    let index = stable_argmax(&scores).ok_or(ClassificationError::EmptyOutput {
        output_size: scores.len(),
    })?;
    let label = labels
        .get(index)
        .ok_or(ClassificationError::OutputSizeMismatch {
            index,
            output_size: scores.len(),
            label_count: labels.len(),
        })?;
    Ok(Prediction {
        label: label.to_string(),
        confidence: scores[index],
        index,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::IxDyn;

    fn output(shape: &[usize], scores: Vec<f32>) -> ArrayD<f32> {
        ArrayD::from_shape_vec(IxDyn(shape), scores).unwrap()
    }

    fn labels() -> LabelTable {
        LabelTable::from_iter(["idle", "hello", "good"])
    }

    #[test]
    fn picks_highest_score() {
        let prediction = reduce(&output(&[3], vec![0.1, 0.7, 0.2]), &labels()).unwrap();
        assert_eq!(
            prediction,
            Prediction {
                label: "hello".to_string(),
                confidence: 0.7,
                index: 1,
            }
        );
    }

    #[test]
    fn strips_leading_batch_dimensions() {
        let prediction = reduce(&output(&[1, 1, 3], vec![0.1, 0.2, 0.7]), &labels()).unwrap();
        assert_eq!(prediction.label, "good");
    }

    #[test]
    fn multi_row_batch_uses_first_row() {
        assert_eq!(
            class_scores(&output(&[2, 3], vec![0.1, 0.2, 0.7, 0.9, 0.0, 0.1])),
            vec![0.1, 0.2, 0.7]
        );
    }

    #[test]
    fn ties_resolve_to_lowest_index() {
        assert_eq!(stable_argmax(&[0.2, 0.4, 0.4, 0.1]), Some(1));
        assert_eq!(stable_argmax(&[0.5, 0.5, 0.5]), Some(0));
    }

    #[test]
    fn nan_scores_are_ignored() {
        assert_eq!(stable_argmax(&[f32::NAN, 0.3, 0.2]), Some(1));
        assert_eq!(stable_argmax(&[f32::NAN]), None);
        assert_eq!(stable_argmax(&[]), None);
    }

    #[test]
    fn index_past_labels_is_a_mismatch() {
        let scores = vec![0.0, 0.0, 0.0, 0.0, 0.0, 0.9];
        match reduce(&output(&[1, 6], scores), &labels()) {
            Err(ClassificationError::OutputSizeMismatch { index, output_size, label_count }) => {
                assert_eq!((index, output_size, label_count), (5, 6, 3));
            }
            other => panic!("expected mismatch, got {other:?}"),
        }
    }

    #[test]
    fn empty_output_is_reported() {
        assert!(matches!(
            reduce(&output(&[1, 0], vec![]), &labels()),
            Err(ClassificationError::EmptyOutput { output_size: 0 })
        ));
    }

    #[test]
    fn displays_as_percentage() {
        let prediction = Prediction {
            label: "hello".to_string(),
            confidence: 0.7,
            index: 1,
        };
        assert_eq!(prediction.to_string(), "hello (70.00%)");
    }
}
