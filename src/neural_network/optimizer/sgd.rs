use crate::error::ModelError;
use crate::neural_network::optimizer::input_validation_function::validate_learning_rate;
use crate::neural_network::optimizer::OptimizerConfig;
use crate::neural_network::{Layer, Optimizer};

/// Stochastic Gradient Descent (SGD) optimizer.
///
/// Updates parameters in the direction of the negative gradient, scaled by the learning rate.
/// SGD keeps no slot state.
///
/// # Fields
///
/// * `learning_rate` - Learning rate controlling the size of parameter updates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SGD {
    learning_rate: f32,
}

impl SGD {
    /// Creates a new SGD optimizer with the specified learning rate.
    ///
    /// # Errors
    ///
    /// - `ModelError::InputValidationError` - If `learning_rate` is not positive and finite
    pub fn new(learning_rate: f32) -> Result<Self, ModelError> {
        validate_learning_rate(learning_rate)?;
        Ok(Self { learning_rate })
    }

    pub fn learning_rate(&self) -> f32 {
        self.learning_rate
    }
}

impl Default for SGD {
    fn default() -> Self {
        Self {
            learning_rate: 0.01,
        }
    }
}

impl Optimizer for SGD {
    fn update(&mut self, layer: &mut dyn Layer) {
        layer.update_parameters_sgd(self.learning_rate);
    }

    fn identifier(&self) -> &'static str {
        "sgd"
    }

    fn config(&self) -> OptimizerConfig {
        OptimizerConfig::SGD {
            learning_rate: self.learning_rate,
        }
    }
}
