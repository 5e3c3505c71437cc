/// Module that contains activation function implementations
pub mod activation;
/// Traced primitive computation graph of a model
pub mod graph;
/// Module that contains neural network layer implementations
pub mod layer;
/// Module that contains loss function implementations
pub mod loss_function;
/// Architecture descriptions used to build models
pub mod model_spec;
/// Traits shared by layers, loss functions and optimizers
pub mod neural_network_trait;
/// Module that contains optimization algorithms for neural network training
pub mod optimizer;
/// Saved-model directory serialization
pub mod saved_model;
/// Module that contains implementations for sequential model architecture
pub mod sequential;
/// Training configuration and history
pub mod training_config;

pub use activation::*;
pub use graph::*;
pub use layer::*;
pub use loss_function::*;
pub use model_spec::*;
pub use optimizer::*;
pub use sequential::*;
pub use training_config::*;

use crate::ModelError;
use ndarray::ArrayD;

/// Type alias for n-dimensional arrays used as tensors in the neural network
pub type Tensor = ArrayD<f32>;

pub use neural_network_trait::{Layer, LossFunction, Optimizer};
