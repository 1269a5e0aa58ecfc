//! Tensor metadata: how a model wants to be fed and how to read it back.
//!
//! Image classifiers take a single NHWC input `(batch, height, width, channels)`
//! and produce one score per class. Everything the service needs to know about
//! the model (input size, numeric mode, class count) is derived from these
//! descriptors once at startup.

use std::fmt;

/// Element type of a tensor as declared by the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementType {
    Float32,
    Uint8,
    Int8,
    /// Any other runtime type, kept by name for diagnostics.
    Other(String),
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Float32 => f.write_str("float32"),
            Self::Uint8 => f.write_str("uint8"),
            Self::Int8 => f.write_str("int8"),
            Self::Other(name) => f.write_str(name),
        }
    }
}

/// Metadata for one model input or output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TensorDescriptor {
    /// Position among the model's inputs (or outputs).
    pub index: usize,
    pub name: String,
    /// Declared dimensions; negative values are symbolic (dynamic) dimensions.
    pub shape: Vec<i64>,
    pub element_type: ElementType,
}

impl TensorDescriptor {
    /// Spatial size of an NHWC image input: height at position 1, width at 2.
    ///
    /// Returns `None` unless the shape has rank 4 with positive height and width.
    pub fn nhwc_size(&self) -> Option<InputSize> {
        if self.shape.len() != 4 {
            return None;
        }
        let height = positive(self.shape[1])?;
        let width = positive(self.shape[2])?;
        Some(InputSize { width, height })
    }

    /// Number of elements once singleton dimensions are squeezed away.
    ///
    /// `None` when any dimension is dynamic.
    pub fn static_len(&self) -> Option<usize> {
        self.shape
            .iter()
            .try_fold(1usize, |acc, &d| positive(d).map(|d| acc * d as usize))
    }

    /// Numeric mode implied by this tensor's element type.
    pub fn numeric_mode(&self) -> NumericMode {
        NumericMode::from_element_type(&self.element_type)
    }
}

fn positive(d: i64) -> Option<u32> {
    if d > 0 { u32::try_from(d).ok() } else { None }
}

/// Target spatial size for preprocessing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputSize {
    pub width: u32,
    pub height: u32,
}

/// How pixel values are fed and how scores are read back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericMode {
    /// `f32` input in `[-1, 1]`; output scores are already probabilities.
    Floating,
    /// Raw `u8` pixels in; 8-bit scores out, divided by 255 to get a probability.
    Quantized,
}

impl NumericMode {
    /// Only a `Float32` input makes a floating model; everything else is
    /// treated as 8-bit quantized.
    pub fn from_element_type(ty: &ElementType) -> Self {
        match ty {
            ElementType::Float32 => Self::Floating,
            _ => Self::Quantized,
        }
    }

    /// Map a raw output score to a probability.
    pub fn probability(self, raw: f32) -> f64 {
        match self {
            Self::Floating => raw as f64,
            Self::Quantized => raw as f64 / 255.0,
        }
    }
}
