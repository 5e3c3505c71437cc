/// Shared hyperparameter validation for optimizers
mod input_validation_function;
/// RMSprop optimizer and its per-layer slot cache
pub mod rms_prop;
/// Stochastic Gradient Descent optimizer
pub mod sgd;

pub use rms_prop::*;
pub use sgd::*;

use crate::ModelError;
use crate::neural_network::Optimizer;
use serde::{Deserialize, Serialize};

/// Hyperparameters of an optimizer, stored with a saved model so that a loaded model
/// resumes training with the same update rule.
///
/// # Variants
///
/// - `RMSprop` - Learning rate, decay rate and epsilon of [`RMSprop`]
/// - `SGD` - Learning rate of [`SGD`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum OptimizerConfig {
    RMSprop {
        learning_rate: f32,
        rho: f32,
        epsilon: f32,
    },
    SGD {
        learning_rate: f32,
    },
}

impl OptimizerConfig {
    /// Creates the optimizer, validating every hyperparameter.
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn Optimizer>)` - The optimizer
    /// - `Err(ModelError::InputValidationError)` - If a hyperparameter is out of range
    pub fn build(&self) -> Result<Box<dyn Optimizer>, ModelError> {
        let optimizer: Box<dyn Optimizer> = match *self {
            OptimizerConfig::RMSprop {
                learning_rate,
                rho,
                epsilon,
            } => Box::new(RMSprop::new(learning_rate, rho, epsilon)?),
            OptimizerConfig::SGD { learning_rate } => Box::new(SGD::new(learning_rate)?),
        };
        Ok(optimizer)
    }
}

/// Builds an optimizer from its Keras identifier with Keras default hyperparameters.
///
/// | identifier | optimizer | defaults |
/// |------------|-----------|----------|
/// | `rmsprop`  | [`RMSprop`] | lr = 0.001, rho = 0.9, epsilon = 1e-7 |
/// | `sgd`      | [`SGD`]     | lr = 0.01 |
///
/// # Parameters
///
/// * `name` - Case-insensitive identifier
///
/// # Returns
///
/// - `Ok(Box<dyn Optimizer>)` - The optimizer
/// - `Err(ModelError::InputValidationError)` - If the identifier is unknown
pub fn optimizer_from_identifier(name: &str) -> Result<Box<dyn Optimizer>, ModelError> {
    match name.to_ascii_lowercase().as_str() {
        "rmsprop" => Ok(Box::new(RMSprop::default())),
        "sgd" => Ok(Box::new(SGD::default())),
        other => Err(ModelError::InputValidationError(format!(
            "unknown optimizer `{}`",
            other
        ))),
    }
}
