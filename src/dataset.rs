use crate::ModelError;
use crate::context::ExecutionContext;
use crate::neural_network::Tensor;
use ndarray::Array2;
use rand::Rng;
use rand_distr::{Bernoulli, Uniform};

/// In-memory synthetic binary classification data.
///
/// Features are drawn independently from `U[0, 1)` and labels independently and
/// uniformly from `{0, 1}`, so there is no real signal to learn; the data only exists to
/// exercise the training loop end to end.
///
/// # Fields
///
/// - `features` - Matrix with shape (n_samples, n_features)
/// - `labels` - Column vector with shape (n_samples, 1) holding `0.0` or `1.0`
#[derive(Debug, Clone)]
pub struct SyntheticDataset {
    pub features: Array2<f32>,
    pub labels: Array2<f32>,
}

impl SyntheticDataset {
    /// Generates a fresh dataset from the context's random generator.
    ///
    /// # Parameters
    ///
    /// - `n_samples` - Number of rows
    /// - `n_features` - Number of feature columns
    /// - `ctx` - Execution context supplying the random source
    ///
    /// # Returns
    ///
    /// - `Ok(SyntheticDataset)` - The generated data
    /// - `Err(ModelError::InputValidationError)` - If either dimension is zero
    pub fn generate(
        n_samples: usize,
        n_features: usize,
        ctx: &mut ExecutionContext,
    ) -> Result<Self, ModelError> {
        if n_samples == 0 || n_features == 0 {
            return Err(ModelError::InputValidationError(format!(
                "dataset dimensions must be non-zero, got {} x {}",
                n_samples, n_features
            )));
        }

        let feature_dist = Uniform::new(0.0f32, 1.0)
            .map_err(|e| ModelError::ProcessingError(format!("feature distribution: {}", e)))?;
        let label_dist = Bernoulli::new(0.5)
            .map_err(|e| ModelError::ProcessingError(format!("label distribution: {}", e)))?;

        let rng = ctx.rng();
        let features = Array2::from_shape_simple_fn((n_samples, n_features), || {
            rng.sample(&feature_dist)
        });
        let labels = Array2::from_shape_simple_fn((n_samples, 1), || {
            if rng.sample(&label_dist) { 1.0 } else { 0.0 }
        });

        log::debug!(
            "generated synthetic dataset: {} samples, {} features",
            n_samples,
            n_features
        );

        Ok(Self { features, labels })
    }

    pub fn n_samples(&self) -> usize {
        self.features.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.features.ncols()
    }

    /// Returns `(features, labels)` as dynamic-rank tensors for `Sequential::fit_with_batches`.
    pub fn to_tensors(&self) -> (Tensor, Tensor) {
        (
            self.features.clone().into_dyn(),
            self.labels.clone().into_dyn(),
        )
    }
}
