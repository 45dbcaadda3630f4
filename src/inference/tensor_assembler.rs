use crate::features::feature_vector::FeatureVector;
use crate::model::model_contract::{ModelContract, TensorLayout};
use ndarray::{Array2, ArrayD, Axis};

/// Packs an ordered sequence of feature vectors into the input tensor a model expects.
///
/// The sequence is first shaped into an `[N, F]` frame matrix:
/// - only the most recent `N` vectors are used,
/// - a short sequence repeats its last vector until there are `N` rows,
/// - an empty sequence gives `N` rows of zeros,
/// - each row is zero-padded or truncated to `F`.
///
/// The matrix is then given the contract's layout: `[N, F]`, `[1, N, F]` or `[1, N, F, 1]`.
/// An unsupported layout gets `[N, F]`; flagging that is up to the caller.
pub fn assemble(sequence: &[FeatureVector], contract: &ModelContract) -> ArrayD<f32> {
    let frames = frame_matrix(sequence, contract.sequence_length, contract.feature_width);
    match contract.layout {
        TensorLayout::Rank2 | TensorLayout::Unsupported { .. } => frames.into_dyn(),
        TensorLayout::Rank3 => frames.insert_axis(Axis(0)).into_dyn(),
        TensorLayout::Rank4 => frames
            .insert_axis(Axis(0))
            .insert_axis(Axis(3))
            .into_dyn(),
    }
}

/// The `[N, F]` matrix of the tail window of `sequence`, padded as described on `assemble`.
pub fn frame_matrix(
    sequence: &[FeatureVector],
    sequence_length: usize,
    feature_width: usize,
) -> Array2<f32> {
    let tail = &sequence[sequence.len().saturating_sub(sequence_length)..];
    let mut frames = Array2::<f32>::zeros((sequence_length, feature_width));
    let Some(last) = tail.last() else {
        return frames;
    };
    for (row_ix, mut row) in frames.axis_iter_mut(Axis(0)).enumerate() {
        let source = tail.get(row_ix).unwrap_or(last).as_slice();
        // Zipping stops at the shorter side: long rows are cut, short ones keep their zeros.
        for (dst, src) in row.iter_mut().zip(source) {
            *dst = *src;
        }
    }
    frames
}
