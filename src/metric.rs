use crate::ModelError;
use ndarray::{ArrayView2, Zip};

/// Decision threshold used to turn sigmoid outputs into class labels.
pub const BINARY_THRESHOLD: f32 = 0.5;

/// Metrics that can be tracked during training.
///
/// # Variants
///
/// - `Accuracy` - Fraction of samples whose thresholded prediction equals the label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Accuracy,
}

impl Metric {
    /// Resolves a metric identifier such as `"accuracy"` or `"acc"`.
    pub fn from_identifier(name: &str) -> Result<Self, ModelError> {
        match name.to_ascii_lowercase().as_str() {
            "accuracy" | "acc" | "binary_accuracy" => Ok(Metric::Accuracy),
            other => Err(ModelError::InputValidationError(format!(
                "unknown metric `{}`",
                other
            ))),
        }
    }
}

/// Counts correctly classified samples in a batch of binary predictions.
///
/// A prediction counts as class `1` when it is strictly greater than
/// [`BINARY_THRESHOLD`], matching the convention of Keras' `binary_accuracy`.
///
/// # Parameters
///
/// - `y_true` - Labels with shape (batch_size, 1) holding `0.0` or `1.0`
/// - `y_pred` - Predicted probabilities with the same shape
///
/// # Returns
///
/// * `usize` - Number of matching elements
pub fn binary_correct_count(y_true: ArrayView2<f32>, y_pred: ArrayView2<f32>) -> usize {
    let mut correct = 0usize;
    Zip::from(y_true).and(y_pred).for_each(|&t, &p| {
        let predicted = if p > BINARY_THRESHOLD { 1.0 } else { 0.0 };
        if (predicted - t).abs() < f32::EPSILON {
            correct += 1;
        }
    });
    correct
}

/// Binary accuracy in the range \[0.0, 1.0\].
///
/// # Returns
///
/// - `f32` - Accuracy (returns 0.0 when the inputs are empty)
///
/// # Panics
///
/// - Panics if the two arrays have different shapes
pub fn binary_accuracy(y_true: ArrayView2<f32>, y_pred: ArrayView2<f32>) -> f32 {
    if y_true.shape() != y_pred.shape() {
        panic!(
            "Input arrays must have the same shape. Predicted: {:?}, Actual: {:?}",
            y_pred.shape(),
            y_true.shape()
        );
    }
    if y_true.is_empty() {
        return 0.0;
    }
    binary_correct_count(y_true, y_pred) as f32 / y_true.len() as f32
}
