//! Image classification inference: model abstraction, ONNX Runtime backend,
//! preprocessing and the shared classification context.

pub mod classifier;
pub mod model;
pub mod preprocess;

#[cfg(feature = "onnx")]
mod onnx;
#[cfg(feature = "onnx")]
pub use onnx::OnnxModel;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use classifier::{Classifier, ClassifyError};
pub use model::{InputTensor, Model, ModelError, OutputTensor};
