use crate::neural_network::{LossFunction, Tensor};

/// Mean Squared Error loss function
///
/// `L = mean((p - y)^2)`
#[derive(Debug, Clone, Copy, Default)]
pub struct MeanSquaredError;

impl MeanSquaredError {
    /// Creates a new instance of MeanSquaredError
    pub fn new() -> Self {
        Self
    }
}

impl LossFunction for MeanSquaredError {
    fn compute_loss(&self, y_true: &Tensor, y_pred: &Tensor) -> f32 {
        let n = y_pred.len() as f32;
        (y_pred - y_true).mapv(|d| d * d).sum() / n
    }

    fn compute_grad(&self, y_true: &Tensor, y_pred: &Tensor) -> Tensor {
        let n = y_pred.len() as f32;
        let mut grad = y_pred - y_true;
        grad.par_mapv_inplace(|d| 2.0 * d / n);
        grad
    }

    fn identifier(&self) -> &'static str {
        "mean_squared_error"
    }
}
