//! The classification result returned by the service and consumed by clients.

use serde::{Deserialize, Serialize};

/// Top predicted class for one image.
///
/// Serialized as `{"probability": <number>, "label": <string>}`, the exact
/// response body of `POST /classify`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    /// Model score for the class, scaled to `[0, 1]` for quantized models.
    pub probability: f64,
    pub label: String,
}

impl Classification {
    pub fn new(probability: f64, label: impl Into<String>) -> Self {
        Self {
            probability,
            label: label.into(),
        }
    }
}
