use crate::model::model_contract::{ModelContract, format_dims};
use std::fmt;

/// Name, declared dims and element type of one model input or output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TensorInfo {
    pub name: String,
    /// `None` when the value is not a tensor. Dynamic dims are negative.
    pub dims: Option<Vec<i64>>,
    pub element_type: String,
}

/// How a model's declared input compares to the reference `[30, 1662]` sequence input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Compatibility {
    Exact,
    Batched,
    Different { sequence_length: i64, feature_width: i64 },
    Unexpected,
}

pub const REFERENCE_INPUT: [i64; 2] = [30, 1662];

impl Compatibility {
    pub fn assess(dims: Option<&[i64]>) -> Self {
        match dims {
            Some(dims) if dims == REFERENCE_INPUT.as_slice() => Compatibility::Exact,
            Some([1, seq, feat]) if [*seq, *feat] == REFERENCE_INPUT => Compatibility::Batched,
            Some(dims) if dims.len() >= 2 => Compatibility::Different {
                sequence_length: dims[dims.len() - 2],
                feature_width: dims[dims.len() - 1],
            },
            _ => Compatibility::Unexpected,
        }
    }
}

/// A printable description of a loaded model and the contract derived from it.
#[derive(Clone, Debug)]
pub struct ModelReport {
    pub inputs: Vec<TensorInfo>,
    pub outputs: Vec<TensorInfo>,
    pub contract: ModelContract,
    pub compatibility: Compatibility,
}

impl ModelReport {
    pub fn new(
        inputs: Vec<TensorInfo>,
        outputs: Vec<TensorInfo>,
        default_sequence_length: usize,
        default_feature_width: usize,
    ) -> Self {
        let input_dims = inputs.first().and_then(|t| t.dims.as_deref());
        let contract = ModelContract::from_dims(
            input_dims,
            outputs.first().and_then(|t| t.dims.as_deref()),
            default_sequence_length,
            default_feature_width,
        );
        let compatibility = Compatibility::assess(input_dims);
        ModelReport {
            inputs,
            outputs,
            contract,
            compatibility,
        }
    }
}

fn write_tensors(f: &mut fmt::Formatter<'_>, title: &str, tensors: &[TensorInfo]) -> fmt::Result {
    writeln!(f, "{title}:")?;
    if tensors.is_empty() {
        writeln!(f, "  (none)")?;
    }
    for tensor in tensors {
        let shape = tensor
            .dims
            .as_deref()
            .map(format_dims)
            .unwrap_or_else(|| "n/a".to_string());
        writeln!(f, "  {}: shape {} type {}", tensor.name, shape, tensor.element_type)?;
    }
    Ok(())
}

impl fmt::Display for ModelReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Model inspection report")?;
        write_tensors(f, "Inputs", &self.inputs)?;
        write_tensors(f, "Outputs", &self.outputs)?;
        writeln!(f, "Derived: {}", self.contract)?;
        match &self.compatibility {
            Compatibility::Exact => write!(f, "Input matches {}", format_dims(&REFERENCE_INPUT)),
            Compatibility::Batched => write!(
                f,
                "Input is the batched form of {}, layout will adapt",
                format_dims(&REFERENCE_INPUT)
            ),
            Compatibility::Different { sequence_length, feature_width } => write!(
                f,
                "Input differs from {}: last two dims are [{}, {}]",
                format_dims(&REFERENCE_INPUT),
                sequence_length,
                feature_width
            ),
            Compatibility::Unexpected => write!(f, "Unexpected input shape"),
        }
    }
}
