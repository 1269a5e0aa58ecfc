//! ONNX Runtime backend for [`Model`].
//!
//! Loads a `.onnx` classification model, reads its declared tensor metadata
//! and runs single forward passes. Session memory is allocated by the
//! runtime once, when the session is committed.

use std::borrow::Cow;
use std::path::Path;

use comicnet_core::{ElementType, TensorDescriptor};
use ort::session::{Session, SessionInputValue};
use ort::tensor::TensorElementType;
use ort::value::{Tensor, ValueType};
use tracing::info;

use crate::model::{InputTensor, Model, ModelError, OutputTensor};

/// A committed ONNX Runtime session plus its tensor descriptors.
pub struct OnnxModel {
    session: Session,
    inputs: Vec<TensorDescriptor>,
    outputs: Vec<TensorDescriptor>,
    pending: Vec<Option<InputTensor>>,
    results: Vec<Option<OutputTensor>>,
    ready: bool,
}

impl OnnxModel {
    /// Load a model file. `threads` sets intra-op parallelism; `None` keeps
    /// the runtime default.
    pub fn load(path: &Path, threads: Option<usize>) -> Result<Self, ModelError> {
        if !path.exists() {
            return Err(ModelError::NotFound(path.to_path_buf()));
        }

        let mut builder = Session::builder()?;
        if let Some(n) = threads {
            builder = builder
                .with_intra_threads(n)
                .map_err(|e| ModelError::Other(format!("set intra-op threads: {e}")))?;
        }
        let session = builder.commit_from_file(path)?;

        let inputs: Vec<TensorDescriptor> = session
            .inputs()
            .iter()
            .enumerate()
            .map(|(index, input)| describe(index, input.name(), input.dtype()))
            .collect();
        let outputs: Vec<TensorDescriptor> = session
            .outputs()
            .iter()
            .enumerate()
            .map(|(index, output)| describe(index, output.name(), output.dtype()))
            .collect();

        for d in inputs.iter().chain(&outputs) {
            info!(
                index = d.index,
                name = %d.name,
                shape = ?d.shape,
                ty = %d.element_type,
                "tensor"
            );
        }
        info!(
            model = %path.display(),
            inputs = inputs.len(),
            outputs = outputs.len(),
            "loaded onnx model"
        );

        Ok(Self {
            session,
            pending: vec![None; inputs.len()],
            results: Vec::new(),
            ready: false,
            inputs,
            outputs,
        })
    }
}

impl Model for OnnxModel {
    fn inputs(&self) -> &[TensorDescriptor] {
        &self.inputs
    }

    fn outputs(&self) -> &[TensorDescriptor] {
        &self.outputs
    }

    fn set_input(&mut self, index: usize, tensor: InputTensor) -> Result<(), ModelError> {
        let slot = self
            .pending
            .get_mut(index)
            .ok_or(ModelError::NoInput(index))?;
        *slot = Some(tensor);
        Ok(())
    }

    fn invoke(&mut self) -> Result<(), ModelError> {
        self.ready = false;

        let mut feeds: Vec<(Cow<'_, str>, SessionInputValue<'_>)> =
            Vec::with_capacity(self.inputs.len());
        for (desc, slot) in self.inputs.iter().zip(self.pending.iter_mut()) {
            let tensor = slot
                .take()
                .ok_or(ModelError::InputNotSet { index: desc.index })?;
            let value: SessionInputValue<'_> = match tensor {
                InputTensor::F32 { shape, data } => {
                    Tensor::from_array((shape, data.into_boxed_slice()))?.into()
                }
                InputTensor::U8 { shape, data } => {
                    Tensor::from_array((shape, data.into_boxed_slice()))?.into()
                }
            };
            feeds.push((Cow::Borrowed(desc.name.as_str()), value));
        }

        let outputs = self.session.run(feeds)?;

        let mut results = Vec::with_capacity(self.outputs.len());
        for desc in &self.outputs {
            let value = &outputs[desc.index];
            let tensor = match desc.element_type {
                ElementType::Float32 => {
                    let (shape, data) = value.try_extract_tensor::<f32>()?;
                    Some(OutputTensor::F32 {
                        shape: shape.iter().copied().collect(),
                        data: data.to_vec(),
                    })
                }
                ElementType::Uint8 => {
                    let (shape, data) = value.try_extract_tensor::<u8>()?;
                    Some(OutputTensor::U8 {
                        shape: shape.iter().copied().collect(),
                        data: data.to_vec(),
                    })
                }
                ElementType::Int8 => {
                    let (shape, data) = value.try_extract_tensor::<i8>()?;
                    Some(OutputTensor::I8 {
                        shape: shape.iter().copied().collect(),
                        data: data.to_vec(),
                    })
                }
                ElementType::Other(_) => None,
            };
            results.push(tensor);
        }
        drop(outputs);

        self.results = results;
        self.ready = true;
        Ok(())
    }

    fn output(&self, index: usize) -> Result<OutputTensor, ModelError> {
        let desc = self.outputs.get(index).ok_or(ModelError::NoOutput(index))?;
        if !self.ready {
            return Err(ModelError::OutputNotReady { index });
        }
        self.results
            .get(index)
            .cloned()
            .flatten()
            .ok_or_else(|| ModelError::UnsupportedType {
                name: desc.name.clone(),
                ty: desc.element_type.to_string(),
            })
    }
}

fn describe(index: usize, name: &str, value_type: &ValueType) -> TensorDescriptor {
    let (shape, element_type) = match value_type {
        ValueType::Tensor { ty, shape, .. } => {
            (shape.iter().copied().collect(), element_type(*ty))
        }
        other => (Vec::new(), ElementType::Other(format!("{other:?}"))),
    };
    TensorDescriptor {
        index,
        name: name.to_string(),
        shape,
        element_type,
    }
}

fn element_type(ty: TensorElementType) -> ElementType {
    match ty {
        TensorElementType::Float32 => ElementType::Float32,
        TensorElementType::Uint8 => ElementType::Uint8,
        TensorElementType::Int8 => ElementType::Int8,
        other => ElementType::Other(format!("{other:?}").to_lowercase()),
    }
}
