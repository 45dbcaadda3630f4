pub mod decision_reducer;
pub mod inference_invoker;
pub mod tensor_assembler;
