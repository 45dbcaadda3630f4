pub mod inference_runtime;
pub mod label_table;
pub mod model_contract;
pub mod model_inspection;
pub mod ort_inference_session;
