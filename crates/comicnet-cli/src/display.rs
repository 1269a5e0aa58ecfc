//! Plain-text rendering of classification results and model metadata.

use comicnet_ai::Classifier;
use comicnet_core::{Classification, TensorDescriptor};

/// One `label  probability` row per class, labels padded to a common width.
pub fn format_ranking(results: &[Classification]) -> String {
    let width = results
        .iter()
        .map(|c| c.label.chars().count())
        .max()
        .unwrap_or(0);
    results
        .iter()
        .map(|c| format!("{:<width$}  {:.4}\n", c.label, c.probability))
        .collect()
}

/// Short model summary: input size, numeric mode, tensors and label count.
pub fn format_model(classifier: &Classifier) -> String {
    let size = classifier.input_size();
    let mut out = String::new();

    // ── Model ──
    out.push_str(&format!(
        "input    {}x{} ({:?})\n",
        size.width,
        size.height,
        classifier.mode()
    ));
    out.push_str(&format!("labels   {}\n", classifier.labels().len()));

    // ── Tensors ──
    out.push_str(&tensor_line("in ", classifier.input()));
    out.push_str(&tensor_line("out", classifier.output()));
    out
}

fn tensor_line(dir: &str, d: &TensorDescriptor) -> String {
    let dims: Vec<String> = d
        .shape
        .iter()
        .map(|&n| if n < 0 { "?".to_string() } else { n.to_string() })
        .collect();
    format!(
        "{dir}      #{} {} [{}] {}\n",
        d.index,
        d.name,
        dims.join(", "),
        d.element_type
    )
}
