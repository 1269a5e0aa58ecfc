//! Narrow interface over an inference runtime.
//!
//! A classifier only ever needs to look at the declared tensors, place one
//! input, run a forward pass and read one output back. Keeping the surface
//! this small lets the ONNX Runtime backend be swapped for any runtime (or a
//! fixed-output stand-in in tests).

use comicnet_core::TensorDescriptor;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model file not found: {0}")]
    NotFound(std::path::PathBuf),

    #[error("no input tensor at index {0}")]
    NoInput(usize),

    #[error("no output tensor at index {0}")]
    NoOutput(usize),

    #[error("input {index} was not set before invoke")]
    InputNotSet { index: usize },

    #[error("output {index} is not available; invoke the model first")]
    OutputNotReady { index: usize },

    #[error("unsupported element type {ty} for tensor {name}")]
    UnsupportedType { name: String, ty: String },

    #[cfg(feature = "onnx")]
    #[error("onnx runtime error: {0}")]
    Ort(#[from] ort::Error),

    #[error("{0}")]
    Other(String),
}

/// Dense row-major data for one model input.
#[derive(Debug, Clone, PartialEq)]
pub enum InputTensor {
    F32 { shape: Vec<i64>, data: Vec<f32> },
    U8 { shape: Vec<i64>, data: Vec<u8> },
}

impl InputTensor {
    pub fn shape(&self) -> &[i64] {
        match self {
            Self::F32 { shape, .. } | Self::U8 { shape, .. } => shape,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::F32 { data, .. } => data.len(),
            Self::U8 { data, .. } => data.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Dense row-major data read back from one model output.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputTensor {
    F32 { shape: Vec<i64>, data: Vec<f32> },
    U8 { shape: Vec<i64>, data: Vec<u8> },
    I8 { shape: Vec<i64>, data: Vec<i8> },
}

impl OutputTensor {
    pub fn shape(&self) -> &[i64] {
        match self {
            Self::F32 { shape, .. } | Self::U8 { shape, .. } | Self::I8 { shape, .. } => shape,
        }
    }

    /// Squeeze singleton dimensions: the flat per-class scores as `f32`.
    ///
    /// Data is row-major, so dropping size-1 dimensions leaves the element
    /// order unchanged.
    pub fn scores(&self) -> Vec<f32> {
        match self {
            Self::F32 { data, .. } => data.clone(),
            Self::U8 { data, .. } => data.iter().map(|&v| v as f32).collect(),
            Self::I8 { data, .. } => data.iter().map(|&v| v as f32).collect(),
        }
    }
}

/// An inference runtime holding one loaded model.
///
/// Implementations are not required to be safe for concurrent use; callers
/// serialize `set_input` / `invoke` / `output` sequences.
pub trait Model: Send {
    /// Declared input tensors, ordered by index.
    fn inputs(&self) -> &[TensorDescriptor];

    /// Declared output tensors, ordered by index.
    fn outputs(&self) -> &[TensorDescriptor];

    /// Place data into the input slot at `index` for the next `invoke`.
    fn set_input(&mut self, index: usize, tensor: InputTensor) -> Result<(), ModelError>;

    /// Run one forward pass over the inputs set so far.
    fn invoke(&mut self) -> Result<(), ModelError>;

    /// Read the output at `index` produced by the last `invoke`.
    fn output(&self, index: usize) -> Result<OutputTensor, ModelError>;
}
