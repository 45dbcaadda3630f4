use crate::model::inference_runtime::RuntimeError;

/// A set of custom errors for the classification pipeline.
///
/// None of these are fatal to the session: the frame window is left as it was, so the next
/// call can retry with fresh data.
#[derive(Debug, thiserror::Error)]
pub enum ClassificationError {
    #[error("model not loaded")]
    ModelUnavailable,

    #[error("not enough frames: have {have}, need {need}")]
    InsufficientFrames { have: usize, need: usize },

    #[error(
        "unknown prediction: output index {index} is outside the label table \
        (output size {output_size}, {label_count} labels)"
    )]
    OutputSizeMismatch {
        index: usize,
        output_size: usize,
        label_count: usize,
    },

    #[error("model output holds no usable scores (output size {output_size})")]
    EmptyOutput { output_size: usize },

    #[error("inference failed: {cause}")]
    Runtime {
        #[from]
        cause: RuntimeError,
    },
}
