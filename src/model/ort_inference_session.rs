use crate::model::inference_runtime::{InferenceRuntime, RuntimeError};
use crate::model::model_contract::ModelContract;
use crate::model::model_inspection::{ModelReport, TensorInfo};
use ndarray::ArrayD;
use ort::session::Session;
use ort::value::{TensorRef, ValueType};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info};

/// An onnxruntime inference session.
///
/// The classifier is a wrapper around an ONNX inference session that handles running the
/// model on hardware. Running a session needs exclusive access, so it sits behind a mutex;
/// the declared input/output metadata is copied out at load time and read without locking.
pub struct OrtInferenceSession {
    session: Mutex<Session>,
    inputs: Vec<TensorInfo>,
    outputs: Vec<TensorInfo>,
}

fn tensor_info(name: &str, value_type: &ValueType) -> TensorInfo {
    TensorInfo {
        name: name.to_string(),
        dims: value_type.tensor_shape().map(|shape| shape.to_vec()),
        element_type: value_type
            .tensor_type()
            .map(|ty| format!("{ty:?}"))
            .unwrap_or_else(|| "non-tensor".to_string()),
    }
}

impl OrtInferenceSession {
    pub fn new(model_path: &Path) -> ort::Result<Self> {
        let session = Session::builder()?.commit_from_file(model_path)?;
        let inputs: Vec<TensorInfo> = session
            .inputs
            .iter()
            .map(|input| tensor_info(&input.name, &input.input_type))
            .collect();
        let outputs: Vec<TensorInfo> = session
            .outputs
            .iter()
            .map(|output| tensor_info(&output.name, &output.output_type))
            .collect();
        info!(model = %model_path.display(), "loaded onnx model");
        debug!(?inputs, ?outputs, "model tensors");
        Ok(OrtInferenceSession {
            session: Mutex::new(session),
            inputs,
            outputs,
        })
    }

    /// Derives the model contract from the first input and first output.
    pub fn contract(
        &self,
        default_sequence_length: usize,
        default_feature_width: usize,
    ) -> ModelContract {
        ModelContract::from_dims(
            self.inputs.first().and_then(|t| t.dims.as_deref()),
            self.outputs.first().and_then(|t| t.dims.as_deref()),
            default_sequence_length,
            default_feature_width,
        )
    }

    pub fn report(
        &self,
        default_sequence_length: usize,
        default_feature_width: usize,
    ) -> ModelReport {
        ModelReport::new(
            self.inputs.clone(),
            self.outputs.clone(),
            default_sequence_length,
            default_feature_width,
        )
    }
}

impl InferenceRuntime for OrtInferenceSession {
    fn run(&self, input: &ArrayD<f32>) -> Result<ArrayD<f32>, RuntimeError> {
        let input_name = self
            .inputs
            .first()
            .map(|t| t.name.clone())
            .ok_or_else(|| RuntimeError::Other("model declares no inputs".to_string()))?;
        let output_name = self
            .outputs
            .first()
            .map(|t| t.name.clone())
            .ok_or_else(|| RuntimeError::Other("model declares no outputs".to_string()))?;

        let tensor = TensorRef::from_array_view(input)?;
        let mut session = self.session.lock().unwrap_or_else(|e| e.into_inner());
        let outputs = session.run(ort::inputs![input_name.as_str() => tensor])?;
        let output = outputs
            .get(output_name.as_str())
            .ok_or_else(|| RuntimeError::MissingOutput(output_name.clone()))?;
        Ok(output.try_extract_array::<f32>()?.to_owned())
    }
}
