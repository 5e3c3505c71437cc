use crate::error::ModelError;
use crate::neural_network::Tensor;
use crate::neural_network::graph::NativeGraph;
use crate::neural_network::layer::TrainingParameters;
use crate::neural_network::layer::layer_weight::LayerWeight;
use crate::neural_network::model_spec::LayerSpec;
use crate::neural_network::optimizer::OptimizerConfig;

/// A trainable stage of a [`Sequential`](crate::neural_network::Sequential) model.
///
/// Besides forward and backward propagation, a layer exposes its weights, its architecture
/// entry and its primitive operations so that it can be saved natively and exported.
pub trait Layer: std::any::Any + Send + Sync {
    /// Performs forward propagation through the layer.
    ///
    /// # Parameters
    ///
    /// - `input` - The input tensor to the layer
    ///
    /// # Returns
    ///
    /// - `Ok(Tensor)` - The output tensor after forward computation
    /// - `Err(ModelError)` - If the input shape does not match the layer
    fn forward(&mut self, input: &Tensor) -> Result<Tensor, ModelError>;

    /// Performs backward propagation through the layer.
    ///
    /// # Parameters
    ///
    /// - `grad_output` - The gradient tensor from the next layer
    ///
    /// # Returns
    ///
    /// - `Ok(Tensor)` - The gradient tensor to be passed to the previous layer
    /// - `Err(ModelError)` - If the layer encountered an error during processing
    fn backward(&mut self, grad_output: &Tensor) -> Result<Tensor, ModelError>;

    /// Returns the type name of the layer (e.g. "Dense").
    fn layer_type(&self) -> &str;

    /// Returns the unique name of the layer inside its model.
    fn name(&self) -> &str;

    /// Renames the layer. Called by `Sequential::add` for unnamed layers.
    fn set_name(&mut self, name: String);

    /// Width of the input this layer expects.
    fn input_dim(&self) -> usize;

    /// Width of the output this layer produces.
    fn output_dim(&self) -> usize;

    /// Returns a description of the output shape of the layer, e.g. `(None, 32)`.
    fn output_shape(&self) -> String {
        format!("(None, {})", self.output_dim())
    }

    /// Returns the total number of parameters in the layer.
    ///
    /// # Returns
    ///
    /// - `TrainingParameters` - The count of parameters as an enum variant
    fn param_count(&self) -> TrainingParameters;

    /// Updates the layer parameters using Stochastic Gradient Descent.
    ///
    /// # Parameters
    ///
    /// - `lr` - Learning rate for parameter updates
    fn update_parameters_sgd(&mut self, lr: f32);

    /// Updates the layer parameters using RMSprop optimizer.
    ///
    /// # Parameters
    ///
    /// - `lr` - Learning rate for parameter updates
    /// - `rho` - Decay rate for moving average of squared gradients
    /// - `epsilon` - Small constant for numerical stability
    fn update_parameters_rmsprop(&mut self, lr: f32, rho: f32, epsilon: f32);

    /// Returns references to the weights (and optimizer slots) held by the layer.
    fn get_weights(&self) -> LayerWeight<'_>;

    /// Returns the architecture entry that rebuilds this layer.
    fn spec(&self) -> LayerSpec;

    /// Appends the layer's primitive operations to a native graph.
    ///
    /// # Parameters
    ///
    /// - `input` - Name of the tensor feeding this layer
    /// - `graph` - Graph under construction
    ///
    /// # Returns
    ///
    /// - `String` - Name of the tensor this layer produces
    fn trace(&self, input: &str, graph: &mut NativeGraph) -> String;
}

/// A scalar training objective and its gradient with respect to the predictions.
pub trait LossFunction: Send + Sync {
    /// Mean loss of a batch.
    ///
    /// # Parameters
    ///
    /// - `y_true` - Tensor containing the ground truth values
    /// - `y_pred` - Tensor containing the predicted values
    ///
    /// # Returns
    ///
    /// - `f32` - The scalar loss value, averaged over all elements
    fn compute_loss(&self, y_true: &Tensor, y_pred: &Tensor) -> f32;

    /// Gradient of [`compute_loss`](LossFunction::compute_loss) with respect to `y_pred`.
    ///
    /// # Parameters
    ///
    /// - `y_true` - Tensor containing the ground truth values
    /// - `y_pred` - Tensor containing the predicted values
    ///
    /// # Returns
    ///
    /// - `Tensor` - Tensor containing the gradient of the loss with respect to predictions
    fn compute_grad(&self, y_true: &Tensor, y_pred: &Tensor) -> Tensor;

    /// Keras-style identifier of the loss (e.g. `"binary_crossentropy"`).
    fn identifier(&self) -> &'static str;
}

/// An update rule applied to every layer after its backward pass.
pub trait Optimizer: Send + Sync {
    /// Applies one step of the rule to the gradients stored in `layer`.
    ///
    /// # Parameters
    ///
    /// - `layer` - The layer whose parameters should be updated
    fn update(&mut self, layer: &mut dyn Layer);

    /// Keras-style identifier of the optimizer (e.g. `"rmsprop"`).
    fn identifier(&self) -> &'static str;

    /// Hyperparameters that recreate this optimizer.
    fn config(&self) -> OptimizerConfig;
}
