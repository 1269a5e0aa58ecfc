pub mod classification;
pub mod labels;
pub mod tensor;

pub use classification::Classification;
pub use labels::{LabelError, LabelTable};
pub use tensor::{ElementType, InputSize, NumericMode, TensorDescriptor};
