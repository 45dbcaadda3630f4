use ndarray::ArrayD;

/// Errors raised by an inference runtime while executing a model.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("onnx runtime error: {0}")]
    Ort(#[from] ort::Error),

    #[error("model produced no output named '{0}'")]
    MissingOutput(String),

    #[error("{0}")]
    Other(String),
}

/// Defines a trait that every model runtime must follow.
///
/// The runtime is opaque to the rest of the crate: it takes the assembled input tensor and
/// returns the raw output tensor. Implementations must be shareable across threads, since the
/// live and video classification paths may call the same runtime concurrently.
pub trait InferenceRuntime: Send + Sync {
    fn run(&self, input: &ArrayD<f32>) -> Result<ArrayD<f32>, RuntimeError>;
}
