/// Binary Cross Entropy loss function for binary classification
pub mod binary_cross_entropy;
/// Mean Squared Error loss function
pub mod mean_squared_error;

pub use binary_cross_entropy::*;
pub use mean_squared_error::*;

use crate::ModelError;
use crate::neural_network::LossFunction;

/// Builds a loss function from its Keras identifier.
///
/// Accepts `binary_crossentropy` (also spelled `binary_cross_entropy` or `bce`) and
/// `mean_squared_error` (`mse`).
///
/// # Returns
///
/// - `Ok(Box<dyn LossFunction>)` - The loss function
/// - `Err(ModelError::InputValidationError)` - If the identifier is unknown
pub fn loss_from_identifier(name: &str) -> Result<Box<dyn LossFunction>, ModelError> {
    match name.to_ascii_lowercase().replace([' ', '-'], "_").as_str() {
        "binary_crossentropy" | "binary_cross_entropy" | "bce" => {
            Ok(Box::new(BinaryCrossEntropy::new()))
        }
        "mean_squared_error" | "mse" => Ok(Box::new(MeanSquaredError::new())),
        other => Err(ModelError::InputValidationError(format!(
            "unknown loss `{}`",
            other
        ))),
    }
}
