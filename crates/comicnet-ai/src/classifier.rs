//! The classification context: one loaded model plus its labels.
//!
//! Built once at startup and shared (behind an `Arc`) by every request. The
//! model handle is not safe for concurrent use, so each set-input / invoke /
//! read-output sequence runs under a single mutex acquisition. Decoding and
//! resizing happen before the lock is taken.

use std::sync::Mutex;

use comicnet_core::{
    Classification, ElementType, InputSize, LabelTable, NumericMode, TensorDescriptor,
};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::model::{InputTensor, Model, ModelError};
use crate::preprocess::preprocess;

#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("model declares no input tensor")]
    NoInput,

    #[error("model declares no output tensor")]
    NoOutput,

    #[error(
        "input tensor '{name}' has shape {shape:?}; expected (batch, height, width, channels) with fixed height and width"
    )]
    InputShape { name: String, shape: Vec<i64> },

    #[error("output tensor '{name}' has unsupported element type {ty}")]
    OutputType { name: String, ty: String },

    #[error("image decode error: {0}")]
    Decode(#[from] image::ImageError),

    #[error("model error: {0}")]
    Model(#[from] ModelError),

    #[error("model produced no scores")]
    EmptyOutput,

    #[error("class index {index} is out of range for {len} labels")]
    LabelOutOfRange { index: usize, len: usize },

    #[error("model lock poisoned by a panic in an earlier request")]
    Poisoned,
}

/// Immutable classification context.
pub struct Classifier {
    model: Mutex<Box<dyn Model>>,
    input: TensorDescriptor,
    output: TensorDescriptor,
    size: InputSize,
    mode: NumericMode,
    labels: LabelTable,
}

impl Classifier {
    /// Wrap a loaded model and its label table.
    ///
    /// Uses the first declared input and output. Fails if the input is not an
    /// NHWC tensor with fixed height and width, or if the output element type
    /// cannot be read back as scores.
    pub fn new(model: Box<dyn Model>, labels: LabelTable) -> Result<Self, ClassifyError> {
        let input = model
            .inputs()
            .first()
            .cloned()
            .ok_or(ClassifyError::NoInput)?;
        let output = model
            .outputs()
            .first()
            .cloned()
            .ok_or(ClassifyError::NoOutput)?;

        let size = input.nhwc_size().ok_or_else(|| ClassifyError::InputShape {
            name: input.name.clone(),
            shape: input.shape.clone(),
        })?;
        let mode = input.numeric_mode();
        if let ElementType::Other(ty) = &output.element_type {
            return Err(ClassifyError::OutputType {
                name: output.name.clone(),
                ty: ty.clone(),
            });
        }

        match output.static_len() {
            Some(classes) if classes > labels.len() => warn!(
                classes,
                labels = labels.len(),
                "model has more output classes than labels; top classes past the table will fail"
            ),
            Some(_) => {}
            None => debug!(shape = ?output.shape, "output class count is dynamic"),
        }

        info!(
            width = size.width,
            height = size.height,
            mode = ?mode,
            input = %input.name,
            output = %output.name,
            labels = labels.len(),
            "classifier ready"
        );

        Ok(Self {
            model: Mutex::new(model),
            input,
            output,
            size,
            mode,
            labels,
        })
    }

    /// Classify encoded image bytes, returning the single top class.
    pub fn classify(&self, image: &[u8]) -> Result<Classification, ClassifyError> {
        self.classify_top_k(image, 1)?
            .into_iter()
            .next()
            .ok_or(ClassifyError::EmptyOutput)
    }

    /// Classify encoded image bytes, returning up to `k` highest-scoring
    /// classes in descending order.
    ///
    /// The top class must have a label. Lower-ranked classes past the end of
    /// the label table end the list early.
    pub fn classify_top_k(
        &self,
        image: &[u8],
        k: usize,
    ) -> Result<Vec<Classification>, ClassifyError> {
        let tensor = preprocess(image, self.size, self.mode)?;
        let scores = self.infer(tensor)?;
        let ranked = rank(&scores);
        let &top = ranked.first().ok_or(ClassifyError::EmptyOutput)?;
        if self.labels.get(top).is_none() {
            return Err(ClassifyError::LabelOutOfRange {
                index: top,
                len: self.labels.len(),
            });
        }

        Ok(ranked
            .into_iter()
            .take(k)
            .map_while(|index| {
                let label = self.labels.get(index)?;
                Some(Classification::new(self.mode.probability(scores[index]), label))
            })
            .collect())
    }

    /// Run one forward pass and return the squeezed output scores.
    pub fn infer(&self, tensor: InputTensor) -> Result<Vec<f32>, ClassifyError> {
        let mut model = self.model.lock().map_err(|_| ClassifyError::Poisoned)?;
        model.set_input(self.input.index, tensor)?;
        model.invoke()?;
        let output = model.output(self.output.index)?;
        Ok(output.scores())
    }

    pub fn input_size(&self) -> InputSize {
        self.size
    }

    pub fn mode(&self) -> NumericMode {
        self.mode
    }

    pub fn labels(&self) -> &LabelTable {
        &self.labels
    }

    pub fn input(&self) -> &TensorDescriptor {
        &self.input
    }

    pub fn output(&self) -> &TensorDescriptor {
        &self.output
    }
}

/// Class indices ordered by score, highest first.
///
/// Equal scores keep ascending index order. Scores compare with
/// `f32::total_cmp`, so NaN never panics.
pub fn rank(scores: &[f32]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));
    order
}
