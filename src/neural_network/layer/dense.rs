use crate::ModelError;
use crate::neural_network::graph::{NativeGraph, NativeOpKind};
use crate::neural_network::layer::{DenseLayerWeight, LayerWeight, TrainingParameters};
use crate::neural_network::model_spec::LayerSpec;
use crate::neural_network::optimizer::*;
use crate::neural_network::{Activation, Layer, Tensor};
use ndarray::{Array2, Axis, Ix2};
use rand::Rng;
use rand_distr::Uniform;

/// Dense (Fully Connected) layer implementation for neural networks.
///
/// This layer performs a linear transformation of the input data using a weight matrix and bias vector,
/// followed by an activation function: `output = activation(input * weights + bias)`.
///
/// Weights are initialized with Glorot/Xavier uniform initialization, i.e. drawn from
/// `U[-limit, limit]` with `limit = sqrt(6 / (input_dim + output_dim))`. Bias values start at zero.
///
/// # Dimensions
///
/// - Input shape: (batch_size, input_dim)
/// - Output shape: (batch_size, output_dim)
///
/// # Example
/// ```rust
/// use densex::prelude::*;
/// use ndarray::Array;
///
/// let mut ctx = ExecutionContext::with_seed(7);
/// let mut dense = Dense::new(4, 3, Activation::ReLU, ctx.rng()).unwrap();
/// let out = dense.forward(&Array::ones((2, 4)).into_dyn()).unwrap();
/// assert_eq!(out.shape(), &[2, 3]);
/// ```
pub struct Dense {
    /// Layer name, unique inside a model
    name: String,
    /// Input dimension size
    input_dim: usize,
    /// Output dimension size
    output_dim: usize,
    /// Weight matrix with shape (input_dim, output_dim)
    weights: Array2<f32>,
    /// Bias vector with shape (1, output_dim)
    bias: Array2<f32>,
    /// Activation function for the layer
    activation: Activation,
    /// Cache of the input from forward pass for use in backward pass
    input_cache: Option<Array2<f32>>,
    /// Cached output after activation for use in backward pass
    activation_output: Option<Array2<f32>>,
    grad_weights: Option<Array2<f32>>,
    grad_bias: Option<Array2<f32>>,
    /// RMSprop moving averages, created on the first RMSprop step
    rmsprop_cache: Option<RMSpropCache>,
}

impl Dense {
    /// Creates a new unnamed dense layer.
    ///
    /// # Parameters
    ///
    /// - `input_dim` - Number of input features
    /// - `output_dim` - Number of units
    /// - `activation` - Activation applied after the affine transform
    /// - `rng` - Random source for the weight initialization
    ///
    /// # Returns
    ///
    /// - `Ok(Dense)` - The initialized layer
    /// - `Err(ModelError::InputValidationError)` - If either dimension is zero
    pub fn new<R: Rng>(
        input_dim: usize,
        output_dim: usize,
        activation: Activation,
        rng: &mut R,
    ) -> Result<Self, ModelError> {
        if input_dim == 0 || output_dim == 0 {
            return Err(ModelError::InputValidationError(format!(
                "Dense layer dimensions must be non-zero, got input_dim={}, units={}",
                input_dim, output_dim
            )));
        }

        let limit = (6.0 / (input_dim + output_dim) as f32).sqrt();
        let init = Uniform::new_inclusive(-limit, limit)
            .map_err(|e| ModelError::ProcessingError(format!("weight initializer: {}", e)))?;
        let weights = Array2::from_shape_simple_fn((input_dim, output_dim), || rng.sample(&init));

        Ok(Self {
            name: String::new(),
            input_dim,
            output_dim,
            weights,
            bias: Array2::zeros((1, output_dim)),
            activation,
            input_cache: None,
            activation_output: None,
            grad_weights: None,
            grad_bias: None,
            rmsprop_cache: None,
        })
    }

    /// Sets the layer name (builder style).
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn activation(&self) -> Activation {
        self.activation
    }

    /// Replaces the weights and bias of the layer.
    ///
    /// # Parameters
    ///
    /// - `weights` - Matrix with shape (input_dim, output_dim)
    /// - `bias` - Matrix with shape (1, output_dim)
    ///
    /// # Returns
    ///
    /// - `Ok(())` - Weights replaced
    /// - `Err(ModelError::InputValidationError)` - If a shape does not match the layer
    pub fn set_weights(&mut self, weights: Array2<f32>, bias: Array2<f32>) -> Result<(), ModelError> {
        if weights.dim() != (self.input_dim, self.output_dim) {
            return Err(ModelError::InputValidationError(format!(
                "layer `{}` expects kernel shape ({}, {}), got {:?}",
                self.name,
                self.input_dim,
                self.output_dim,
                weights.dim()
            )));
        }
        if bias.dim() != (1, self.output_dim) {
            return Err(ModelError::InputValidationError(format!(
                "layer `{}` expects bias shape (1, {}), got {:?}",
                self.name,
                self.output_dim,
                bias.dim()
            )));
        }
        self.weights = weights;
        self.bias = bias;
        Ok(())
    }

    /// Restores RMSprop slot state, e.g. after loading a saved model.
    pub fn set_rmsprop_cache(&mut self, cache: RMSpropCache) -> Result<(), ModelError> {
        if cache.cache.dim() != self.weights.dim() || cache.bias.dim() != self.bias.dim() {
            return Err(ModelError::InputValidationError(format!(
                "RMSprop slot shapes do not match layer `{}`",
                self.name
            )));
        }
        self.rmsprop_cache = Some(cache);
        Ok(())
    }

    fn take_cache(slot: &mut Option<Array2<f32>>) -> Result<Array2<f32>, ModelError> {
        slot.take().ok_or_else(|| {
            ModelError::ProcessingError(String::from("Forward pass has not been run"))
        })
    }
}

impl Layer for Dense {
    fn forward(&mut self, input: &Tensor) -> Result<Tensor, ModelError> {
        let input_2d = input
            .view()
            .into_dimensionality::<Ix2>()
            .map_err(|_| {
                ModelError::InputValidationError(format!(
                    "layer `{}` expects a 2D input, got shape {:?}",
                    self.name,
                    input.shape()
                ))
            })?
            .to_owned();

        if input_2d.ncols() != self.input_dim {
            return Err(ModelError::InputValidationError(format!(
                "layer `{}` expects {} input features, got {}",
                self.name,
                self.input_dim,
                input_2d.ncols()
            )));
        }

        let z = input_2d.dot(&self.weights) + &self.bias;
        let a = Activation::apply_activation(&z, &self.activation);

        self.input_cache = Some(input_2d);
        self.activation_output = Some(a.clone());
        Ok(a.into_dyn())
    }

    fn backward(&mut self, grad_output: &Tensor) -> Result<Tensor, ModelError> {
        let grad_upstream = grad_output
            .view()
            .into_dimensionality::<Ix2>()
            .map_err(|e| ModelError::ProcessingError(format!("gradient is not 2D: {}", e)))?
            .to_owned();

        let a = Self::take_cache(&mut self.activation_output)?;
        let input = Self::take_cache(&mut self.input_cache)?;

        // dL/dz from dL/da
        let delta = if self.activation == Activation::Softmax {
            Activation::softmax_backward(&a, &grad_upstream)
        } else {
            Activation::activation_derivative(&a, &self.activation) * &grad_upstream
        };

        self.grad_weights = Some(input.t().dot(&delta));
        self.grad_bias = Some(delta.sum_axis(Axis(0)).insert_axis(Axis(0)));

        Ok(delta.dot(&self.weights.t()).into_dyn())
    }

    fn layer_type(&self) -> &str {
        "Dense"
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: String) {
        self.name = name;
    }

    fn input_dim(&self) -> usize {
        self.input_dim
    }

    fn output_dim(&self) -> usize {
        self.output_dim
    }

    fn param_count(&self) -> TrainingParameters {
        TrainingParameters::Trainable(self.input_dim * self.output_dim + self.output_dim)
    }

    fn update_parameters_sgd(&mut self, lr: f32) {
        if let (Some(grad_w), Some(grad_b)) = (&self.grad_weights, &self.grad_bias) {
            self.weights.scaled_add(-lr, grad_w);
            self.bias.scaled_add(-lr, grad_b);
        }
    }

    fn update_parameters_rmsprop(&mut self, lr: f32, rho: f32, epsilon: f32) {
        if let (Some(grad_w), Some(grad_b)) = (&self.grad_weights, &self.grad_bias) {
            let (weight_dims, bias_dims) = (self.weights.dim(), self.bias.dim());
            self.rmsprop_cache
                .get_or_insert_with(|| RMSpropCache::new(weight_dims, bias_dims))
                .update_parameters(
                    &mut self.weights,
                    &mut self.bias,
                    grad_w,
                    grad_b,
                    rho,
                    lr,
                    epsilon,
                );
        }
    }

    fn get_weights(&self) -> LayerWeight<'_> {
        LayerWeight::Dense(DenseLayerWeight {
            weight: &self.weights,
            bias: &self.bias,
            rmsprop_cache: self.rmsprop_cache.as_ref(),
        })
    }

    fn spec(&self) -> LayerSpec {
        LayerSpec {
            units: self.output_dim,
            activation: self.activation,
            name: Some(self.name.clone()),
        }
    }

    fn trace(&self, input: &str, graph: &mut NativeGraph) -> String {
        let kernel = graph.add_variable(
            format!("{}/kernel", self.name),
            vec![self.input_dim, self.output_dim],
            self.weights.iter().copied().collect(),
        );
        let bias = graph.add_variable(
            format!("{}/bias", self.name),
            vec![self.output_dim],
            self.bias.iter().copied().collect(),
        );

        let kernel_read = graph.add_op(
            format!("{}/MatMul/ReadVariableOp", self.name),
            NativeOpKind::ReadVariable(kernel),
            vec![],
        );
        let matmul = graph.add_op(
            format!("{}/MatMul", self.name),
            NativeOpKind::MatMul,
            vec![input.to_string(), kernel_read],
        );
        let bias_read = graph.add_op(
            format!("{}/BiasAdd/ReadVariableOp", self.name),
            NativeOpKind::ReadVariable(bias),
            vec![],
        );
        let bias_add = graph.add_op(
            format!("{}/BiasAdd", self.name),
            NativeOpKind::BiasAdd,
            vec![matmul, bias_read],
        );
        graph.add_op(
            format!("{}/{}", self.name, NativeOpKind::Activation(self.activation).op_type()),
            NativeOpKind::Activation(self.activation),
            vec![bias_add],
        )
    }
}
