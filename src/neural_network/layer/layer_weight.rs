use crate::neural_network::optimizer::RMSpropCache;
use ndarray::Array2;

/// Container for the weights of the supported layer types
///
/// Each variant borrows the parameters of one layer together with any optimizer slot
/// state attached to them, so that a saved model can resume training.
///
/// # Variants
///
/// - `Dense` - Contains weights for dense (fully connected) layers
pub enum LayerWeight<'a> {
    Dense(DenseLayerWeight<'a>),
}

/// Weights for a dense (fully connected) neural network layer
///
/// # Fields
///
/// - `weight` - Weight matrix with shape (input_features, output_features)
/// - `bias` - Bias vector with shape (1, output_features)
/// - `rmsprop_cache` - RMSprop moving averages, present once the layer has been trained with RMSprop
pub struct DenseLayerWeight<'a> {
    pub weight: &'a Array2<f32>,
    pub bias: &'a Array2<f32>,
    pub rmsprop_cache: Option<&'a RMSpropCache>,
}
