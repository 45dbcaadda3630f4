use crate::classification::classification_error::ClassificationError;
use crate::model::inference_runtime::InferenceRuntime;
use crate::model::model_contract::format_dims;
use ndarray::ArrayD;
use std::sync::Arc;
use tracing::{debug, error};

/// Hands assembled tensors to the model runtime, if one is loaded.
///
/// A missing runtime is not an error at construction: every call reports
/// `ModelUnavailable` instead, so a session can exist (and buffer frames) without a model.
/// Nothing here retries; a failed call is reported and the next call starts fresh.
#[derive(Clone, Default)]
pub struct InferenceInvoker {
    runtime: Option<Arc<dyn InferenceRuntime>>,
}

impl InferenceInvoker {
    pub fn new(runtime: Arc<dyn InferenceRuntime>) -> Self {
        InferenceInvoker {
            runtime: Some(runtime),
        }
    }

    pub fn unavailable() -> Self {
        InferenceInvoker { runtime: None }
    }

    pub fn is_available(&self) -> bool {
        self.runtime.is_some()
    }

    pub fn infer(&self, tensor: &ArrayD<f32>) -> Result<ArrayD<f32>, ClassificationError> {
        let runtime = self
            .runtime
            .as_ref()
            .ok_or(ClassificationError::ModelUnavailable)?;
        let output = runtime.run(tensor).map_err(|cause| {
            error!(error = %cause, input = %format_dims(tensor.shape()), "inference failed");
            ClassificationError::from(cause)
        })?;
        debug!(
            input = %format_dims(tensor.shape()),
            output = %format_dims(output.shape()),
            "inference complete"
        );
        Ok(output)
    }
}
