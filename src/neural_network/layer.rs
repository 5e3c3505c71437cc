/// Dense (fully connected) layer
pub mod dense;
/// Borrowed views of layer weights used by the serializers
pub mod layer_weight;

pub use dense::*;
pub use layer_weight::*;

/// Parameter count of a layer, split by whether the optimizer updates it.
///
/// # Variants
///
/// - `Trainable` - Parameters updated by the optimizer
/// - `NonTrainable` - Parameters that are stored but never updated
/// - `NoTrainable` - The layer holds no parameters at all
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainingParameters {
    Trainable(usize),
    NonTrainable(usize),
    NoTrainable,
}

impl TrainingParameters {
    /// Total number of parameters regardless of trainability.
    pub fn total(&self) -> usize {
        match self {
            TrainingParameters::Trainable(n) | TrainingParameters::NonTrainable(n) => *n,
            TrainingParameters::NoTrainable => 0,
        }
    }
}
