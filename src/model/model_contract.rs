use crate::buffering::frame_window::DEFAULT_SEQUENCE_LENGTH;
use itertools::Itertools;
use std::fmt;
use tracing::warn;

/// Feature width assumed when the model does not declare one.
pub const DEFAULT_FEATURE_WIDTH: usize = 1662;

/// The tensor layouts a sequence model can ask for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TensorLayout {
    /// `[N, F]`
    Rank2,
    /// `[1, N, F]`
    Rank3,
    /// `[1, N, F, 1]`
    Rank4,
    /// Anything else. Assembled as `[N, F]`, and flagged as a configuration problem.
    Unsupported { rank: usize },
}

impl TensorLayout {
    pub fn from_rank(rank: usize) -> Self {
        match rank {
            2 => TensorLayout::Rank2,
            3 => TensorLayout::Rank3,
            4 => TensorLayout::Rank4,
            rank => TensorLayout::Unsupported { rank },
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, TensorLayout::Unsupported { .. })
    }

    /// The concrete shape for a window of `sequence_length` frames of `feature_width` values.
    pub fn shape(&self, sequence_length: usize, feature_width: usize) -> Vec<usize> {
        match self {
            TensorLayout::Rank2 | TensorLayout::Unsupported { .. } => {
                vec![sequence_length, feature_width]
            }
            TensorLayout::Rank3 => vec![1, sequence_length, feature_width],
            TensorLayout::Rank4 => vec![1, sequence_length, feature_width, 1],
        }
    }
}

/// The input/output contract of a loaded sequence model.
///
/// Derived once when the model is loaded and never changed afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModelContract {
    pub sequence_length: usize,
    pub feature_width: usize,
    pub layout: TensorLayout,
    /// Number of class scores, when the model declares it.
    pub output_width: Option<usize>,
}

impl Default for ModelContract {
    fn default() -> Self {
        ModelContract {
            sequence_length: DEFAULT_SEQUENCE_LENGTH,
            feature_width: DEFAULT_FEATURE_WIDTH,
            layout: TensorLayout::Rank2,
            output_width: None,
        }
    }
}

fn positive(dim: i64) -> Option<usize> {
    if dim > 0 { Some(dim as usize) } else { None }
}

impl ModelContract {
    pub fn new(sequence_length: usize, feature_width: usize, layout: TensorLayout) -> Self {
        ModelContract {
            sequence_length,
            feature_width,
            layout,
            output_width: None,
        }
    }

    /// Derives a contract from the declared input and output dimensions of a model.
    ///
    /// Input dims are read as `[N, F]`, `[B, N, F]` or `[B, N, F, C]`. Dynamic (`-1`) or zero
    /// dims take the defaults given, as does a missing input shape. For other ranks the last
    /// two dims are used as `N` and `F`.
    pub fn from_dims(
        input_dims: Option<&[i64]>,
        output_dims: Option<&[i64]>,
        default_sequence_length: usize,
        default_feature_width: usize,
    ) -> Self {
        let output_width = output_dims.and_then(|dims| dims.last().copied().and_then(positive));

        let Some(dims) = input_dims else {
            warn!(
                sequence_length = default_sequence_length,
                feature_width = default_feature_width,
                "model input shape unavailable, using defaults"
            );
            return ModelContract {
                output_width,
                ..ModelContract::new(
                    default_sequence_length,
                    default_feature_width,
                    TensorLayout::Rank2,
                )
            };
        };

        let layout = TensorLayout::from_rank(dims.len());
        let (seq_dim, feat_dim) = match layout {
            TensorLayout::Rank2 => (Some(dims[0]), Some(dims[1])),
            TensorLayout::Rank3 | TensorLayout::Rank4 => (Some(dims[1]), Some(dims[2])),
            TensorLayout::Unsupported { rank } if rank >= 2 => {
                (Some(dims[rank - 2]), Some(dims[rank - 1]))
            }
            TensorLayout::Unsupported { .. } => (None, None),
        };

        if matches!(layout, TensorLayout::Rank3 | TensorLayout::Rank4) && dims[0] > 1 {
            warn!(batch = dims[0], "model declares a batch size above 1, sending batches of 1");
        }
        if layout == TensorLayout::Rank4 && dims[3] > 1 {
            warn!(channels = dims[3], "model declares more than one channel, sending 1");
        }
        if !layout.is_supported() {
            warn!(
                shape = %format_dims(dims),
                "unsupported model input rank, falling back to [N, F] layout"
            );
        }

        let sequence_length = seq_dim.and_then(positive).unwrap_or_else(|| {
            warn!(default = default_sequence_length, "sequence length not declared");
            default_sequence_length
        });
        let feature_width = feat_dim.and_then(positive).unwrap_or_else(|| {
            warn!(default = default_feature_width, "feature width not declared");
            default_feature_width
        });

        ModelContract {
            output_width,
            ..ModelContract::new(sequence_length, feature_width, layout)
        }
    }

    /// The exact input shape this contract assembles.
    pub fn input_shape(&self) -> Vec<usize> {
        self.layout.shape(self.sequence_length, self.feature_width)
    }
}

/// Formats dims the way the model declares them, e.g. `[-1, 30, 1662]`.
pub fn format_dims<T: fmt::Display>(dims: &[T]) -> String {
    format!("[{}]", dims.iter().join(", "))
}

impl fmt::Display for ModelContract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ModelContract {{ input: {}, layout: {:?}, output_width: {} }}",
            format_dims(&self.input_shape()),
            self.layout,
            self.output_width
                .map(|w| w.to_string())
                .unwrap_or_else(|| "unknown".to_string())
        )
    }
}
