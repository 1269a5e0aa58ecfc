//! A [`Model`] that returns preset scores, for exercising the pipeline
//! without a real model file.

use std::sync::{Arc, Mutex};

use comicnet_core::{ElementType, TensorDescriptor};

use crate::model::{InputTensor, Model, ModelError, OutputTensor};

/// Fixed-output model with a single NHWC input and a single `[1, classes]`
/// output.
///
/// Every tensor passed to `set_input` is recorded; grab the handle from
/// [`FixedModel::recorded`] before boxing the model.
pub struct FixedModel {
    inputs: Vec<TensorDescriptor>,
    outputs: Vec<TensorDescriptor>,
    scores: OutputTensor,
    pending: Option<InputTensor>,
    ready: bool,
    recorded: Arc<Mutex<Vec<InputTensor>>>,
}

impl FixedModel {
    /// Float32 input of `height × width × 3`, float scores out.
    pub fn floating(height: i64, width: i64, scores: Vec<f32>) -> Self {
        let classes = scores.len() as i64;
        Self::new(
            ElementType::Float32,
            height,
            width,
            OutputTensor::F32 {
                shape: vec![1, classes],
                data: scores,
            },
        )
    }

    /// Uint8 input of `height × width × 3`, uint8 scores out.
    pub fn quantized(height: i64, width: i64, scores: Vec<u8>) -> Self {
        let classes = scores.len() as i64;
        Self::new(
            ElementType::Uint8,
            height,
            width,
            OutputTensor::U8 {
                shape: vec![1, classes],
                data: scores,
            },
        )
    }

    /// Override the declared input shape, e.g. to model an unusable layout.
    pub fn with_input_shape(mut self, shape: Vec<i64>) -> Self {
        self.inputs[0].shape = shape;
        self
    }

    /// Declare the output with a dynamic class dimension.
    pub fn with_dynamic_output(mut self) -> Self {
        self.outputs[0].shape = vec![1, -1];
        self
    }

    /// Override the declared output element type.
    pub fn with_output_type(mut self, ty: ElementType) -> Self {
        self.outputs[0].element_type = ty;
        self
    }

    /// Shared log of every input tensor this model has received.
    pub fn recorded(&self) -> Arc<Mutex<Vec<InputTensor>>> {
        Arc::clone(&self.recorded)
    }

    fn new(ty: ElementType, height: i64, width: i64, scores: OutputTensor) -> Self {
        let out_ty = match &scores {
            OutputTensor::F32 { .. } => ElementType::Float32,
            OutputTensor::U8 { .. } => ElementType::Uint8,
            OutputTensor::I8 { .. } => ElementType::Int8,
        };
        Self {
            inputs: vec![TensorDescriptor {
                index: 0,
                name: "input".into(),
                shape: vec![1, height, width, 3],
                element_type: ty,
            }],
            outputs: vec![TensorDescriptor {
                index: 0,
                name: "scores".into(),
                shape: scores.shape().to_vec(),
                element_type: out_ty,
            }],
            scores,
            pending: None,
            ready: false,
            recorded: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl Model for FixedModel {
    fn inputs(&self) -> &[TensorDescriptor] {
        &self.inputs
    }

    fn outputs(&self) -> &[TensorDescriptor] {
        &self.outputs
    }

    fn set_input(&mut self, index: usize, tensor: InputTensor) -> Result<(), ModelError> {
        let desc = self.inputs.get(index).ok_or(ModelError::NoInput(index))?;
        let type_ok = matches!(
            (&desc.element_type, &tensor),
            (ElementType::Float32, InputTensor::F32 { .. }) | (ElementType::Uint8, InputTensor::U8 { .. })
        );
        if !type_ok {
            return Err(ModelError::UnsupportedType {
                name: desc.name.clone(),
                ty: desc.element_type.to_string(),
            });
        }
        let shape_ok = desc.shape.len() == tensor.shape().len()
            && desc
                .shape
                .iter()
                .zip(tensor.shape())
                .all(|(&want, &got)| want < 0 || want == got);
        if !shape_ok {
            return Err(ModelError::Other(format!(
                "input shape {:?} does not match declared {:?}",
                tensor.shape(),
                desc.shape
            )));
        }
        if let Ok(mut seen) = self.recorded.lock() {
            seen.push(tensor.clone());
        }
        self.pending = Some(tensor);
        Ok(())
    }

    fn invoke(&mut self) -> Result<(), ModelError> {
        if self.pending.take().is_none() {
            return Err(ModelError::InputNotSet { index: 0 });
        }
        self.ready = true;
        Ok(())
    }

    fn output(&self, index: usize) -> Result<OutputTensor, ModelError> {
        if index >= self.outputs.len() {
            return Err(ModelError::NoOutput(index));
        }
        if !self.ready {
            return Err(ModelError::OutputNotReady { index });
        }
        Ok(self.scores.clone())
    }
}
