use crate::neural_network::{LossFunction, Tensor};

/// Predictions are clipped to `[EPSILON, 1 - EPSILON]` before taking logarithms.
const EPSILON: f32 = 1e-7;

/// Binary Cross Entropy loss function for binary classification
///
/// `L = -mean(y * ln(p) + (1 - y) * ln(1 - p))`
///
/// # Example
///
/// ```rust
/// use densex::neural_network::{BinaryCrossEntropy, LossFunction};
/// use ndarray::array;
///
/// let bce = BinaryCrossEntropy::new();
/// let y_true = array![[1.0f32], [0.0]].into_dyn();
/// let y_pred = array![[0.9f32], [0.1]].into_dyn();
/// let loss = bce.compute_loss(&y_true, &y_pred);
/// assert!((loss - 0.105_360_5).abs() < 1e-5);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct BinaryCrossEntropy;

impl BinaryCrossEntropy {
    /// Creates a new instance of BinaryCrossEntropy
    pub fn new() -> Self {
        Self
    }

    fn clipped(y_pred: &Tensor) -> Tensor {
        let mut clipped = y_pred.clone();
        clipped.par_mapv_inplace(|p| p.clamp(EPSILON, 1.0 - EPSILON));
        clipped
    }
}

impl LossFunction for BinaryCrossEntropy {
    fn compute_loss(&self, y_true: &Tensor, y_pred: &Tensor) -> f32 {
        let p = Self::clipped(y_pred);
        let n = p.len() as f32;
        let total: f32 = y_true
            .iter()
            .zip(p.iter())
            .map(|(&y, &p)| y * p.ln() + (1.0 - y) * (1.0 - p).ln())
            .sum();
        -total / n
    }

    fn compute_grad(&self, y_true: &Tensor, y_pred: &Tensor) -> Tensor {
        let p = Self::clipped(y_pred);
        let n = p.len() as f32;

        // dL/dp = (p - y) / (p * (1 - p)), averaged over elements
        let mut grad = &p - y_true;
        grad.zip_mut_with(&p, |g, &p| *g /= p * (1.0 - p) * n);
        grad
    }

    fn identifier(&self) -> &'static str {
        "binary_crossentropy"
    }
}
