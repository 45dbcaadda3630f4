use crate::buffering::frame_window::{FrameWindow, WindowState};
use crate::classification::classification_error::ClassificationError;
use crate::config::classifier_config::{ClassifierConfig, ConfigError};
use crate::features::feature_extractor::FeatureExtractor;
use crate::features::feature_vector::FeatureVector;
use crate::inference::decision_reducer::{Prediction, reduce};
use crate::inference::inference_invoker::InferenceInvoker;
use crate::inference::tensor_assembler::assemble;
use crate::model::label_table::{LabelTable, read_labels_txt_file};
use crate::model::model_contract::ModelContract;
use crate::model::ort_inference_session::OrtInferenceSession;
use crate::video::video_batch_adapter::resample;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// Result of feeding the live path one frame.
#[derive(Clone, Debug, PartialEq)]
pub enum ClassificationOutcome {
    /// The window is still filling. This is the normal state for the first `N - 1` frames.
    InsufficientFrames { have: usize, need: usize },
    Predicted(Prediction),
}

impl fmt::Display for ClassificationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassificationOutcome::InsufficientFrames { have, need } => {
                write!(f, "Collecting frames... ({have}/{need})")
            }
            ClassificationOutcome::Predicted(prediction) => write!(f, "{prediction}"),
        }
    }
}

/// One classifier: a frame window plus the model contract, labels and runtime it feeds.
///
/// The session is `Send + Sync`. A producer thread can push frames while other threads classify
/// the live window or a video clip. Inference runs on a copy of the window, so a slow model
/// never blocks a push. Sessions are independent of each other; create as many as needed.
pub struct ClassificationSession {
    window: FrameWindow,
    contract: ModelContract,
    labels: LabelTable,
    invoker: InferenceInvoker,
}

impl ClassificationSession {
    pub fn new(invoker: InferenceInvoker, contract: ModelContract, labels: LabelTable) -> Self {
        if !contract.layout.is_supported() {
            warn!(
                layout = ?contract.layout,
                "unsupported model input layout, tensors will be assembled as [N, F]"
            );
        }
        if let Some(output_width) = contract.output_width {
            if output_width != labels.len() {
                warn!(
                    output_width,
                    label_count = labels.len(),
                    "label table does not match model output width"
                );
            }
        }
        if !invoker.is_available() {
            warn!("no model loaded, classification calls will report the model as unavailable");
        }
        ClassificationSession {
            window: FrameWindow::new(contract.sequence_length, contract.feature_width),
            contract,
            labels,
            invoker,
        }
    }

    /// Builds a session from a config.
    ///
    /// A model that is not configured or fails to load leaves the session without a runtime;
    /// that is logged, not returned. A configured label file that cannot be read is an error,
    /// as is a zero default sequence length or feature width.
    pub fn from_config(config: &ClassifierConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let labels = match &config.labels_path {
            Some(path) => read_labels_txt_file(path).map_err(|source| ConfigError::Io {
                path: path.clone(),
                source,
            })?,
            None => LabelTable::default(),
        };

        let defaults = ModelContract::from_dims(
            None,
            None,
            config.default_sequence_length,
            config.default_feature_width,
        );
        let (invoker, contract) = match &config.model_path {
            Some(path) => match OrtInferenceSession::new(path) {
                Ok(session) => {
                    let contract = session
                        .contract(config.default_sequence_length, config.default_feature_width);
                    info!(%contract, "model contract derived");
                    (InferenceInvoker::new(Arc::new(session)), contract)
                }
                Err(err) => {
                    error!(model = %path.display(), error = %err, "failed to load model");
                    (InferenceInvoker::unavailable(), defaults)
                }
            },
            None => (InferenceInvoker::unavailable(), defaults),
        };

        Ok(ClassificationSession::new(invoker, contract, labels))
    }

    pub fn contract(&self) -> &ModelContract {
        &self.contract
    }

    pub fn labels(&self) -> &LabelTable {
        &self.labels
    }

    pub fn state(&self) -> WindowState {
        self.window.state()
    }

    pub fn frame_count(&self) -> usize {
        self.window.size()
    }

    /// Empties the frame window. The next frames start a new fill cycle.
    pub fn clear(&self) {
        self.window.clear();
        debug!("frame window cleared");
    }

    pub fn push_frame(&self, vector: FeatureVector) -> WindowState {
        self.window.push(vector)
    }

    /// Live path: pushes one frame and classifies the window once it is full.
    ///
    /// The frame is buffered even when no model is loaded, so a model loaded later would
    /// not start from an empty window.
    pub fn classify_frame(
        &self,
        vector: FeatureVector,
    ) -> Result<ClassificationOutcome, ClassificationError> {
        self.push_frame(vector);
        if !self.invoker.is_available() {
            return Err(ClassificationError::ModelUnavailable);
        }
        self.classify_window()
    }

    /// Classifies the current window, or reports progress if it is not full yet.
    pub fn classify_window(&self) -> Result<ClassificationOutcome, ClassificationError> {
        let snapshot = self.window.snapshot();
        let need = self.window.capacity();
        if snapshot.len() < need {
            return Ok(ClassificationOutcome::InsufficientFrames {
                have: snapshot.len(),
                need,
            });
        }
        self.classify_sequence(&snapshot)
            .map(ClassificationOutcome::Predicted)
    }

    /// Assembles, runs and reduces one sequence. Short sequences are padded by the assembler;
    /// callers decide whether a short sequence is acceptable.
    pub fn classify_sequence(
        &self,
        sequence: &[FeatureVector],
    ) -> Result<Prediction, ClassificationError> {
        let tensor = assemble(sequence, &self.contract);
        let output = self.invoker.infer(&tensor)?;
        let prediction = reduce(&output, &self.labels).inspect_err(|err| {
            warn!(error = %err, "could not reduce model output");
        })?;
        debug!(label = %prediction.label, confidence = prediction.confidence, "prediction");
        Ok(prediction)
    }

    /// Video path: resamples a pre-collected clip to the window length, extracts features and
    /// classifies it. The live window is not touched.
    #[instrument(skip_all, fields(frames = frames.len()))]
    pub fn classify_video<F, E>(
        &self,
        frames: &[F],
        extractor: &E,
    ) -> Result<Prediction, ClassificationError>
    where
        F: Clone,
        E: FeatureExtractor<F> + ?Sized,
    {
        let need = self.contract.sequence_length;
        if !self.invoker.is_available() {
            return Err(ClassificationError::ModelUnavailable);
        }
        if frames.len() < need {
            return Err(ClassificationError::InsufficientFrames {
                have: frames.len(),
                need,
            });
        }
        let selected = resample(frames, need);
        debug!(selected = selected.len(), "resampled clip");
        let sequence: Vec<FeatureVector> = selected
            .iter()
            .map(|frame| extractor.extract(frame))
            .collect();
        self.classify_sequence(&sequence)
    }
}
