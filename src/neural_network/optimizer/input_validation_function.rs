use crate::error::ModelError;

fn require(valid: bool, param_name: &str, requirement: &str, value: f32) -> Result<(), ModelError> {
    if valid {
        Ok(())
    } else {
        Err(ModelError::InputValidationError(format!(
            "{} must be {}, got {}",
            param_name, requirement, value
        )))
    }
}

/// Validates that the learning rate is positive and finite.
pub(super) fn validate_learning_rate(learning_rate: f32) -> Result<(), ModelError> {
    require(
        learning_rate > 0.0 && learning_rate.is_finite(),
        "learning_rate",
        "positive and finite",
        learning_rate,
    )
}

/// Validates that a decay rate such as `rho` lies in \[0, 1).
pub(super) fn validate_decay_rate(value: f32, param_name: &str) -> Result<(), ModelError> {
    require((0.0..1.0).contains(&value), param_name, "in range [0, 1)", value)
}

/// Validates that epsilon is positive and finite.
pub(super) fn validate_epsilon(epsilon: f32) -> Result<(), ModelError> {
    require(
        epsilon > 0.0 && epsilon.is_finite(),
        "epsilon",
        "positive and finite",
        epsilon,
    )
}
