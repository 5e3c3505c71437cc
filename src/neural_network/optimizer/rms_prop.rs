use crate::error::ModelError;
use crate::neural_network::optimizer::input_validation_function::{
    validate_decay_rate, validate_epsilon, validate_learning_rate,
};
use crate::neural_network::optimizer::OptimizerConfig;
use crate::neural_network::{Layer, Optimizer};
use ndarray::{Array2, Zip};

/// Threshold for switching between sequential and parallel computation.
/// For arrays smaller than this threshold, sequential computation is used
/// to avoid parallelization overhead.
const RMS_PROP_PARALLEL_THRESHOLD: usize = 1024;

/// RMSprop (Root Mean Square Propagation) optimizer.
///
/// Adapts per-parameter learning rates using a moving average of squared gradients:
///
/// ```text
/// v = rho * v + (1 - rho) * g^2
/// w = w - lr * g / (sqrt(v) + epsilon)
/// ```
///
/// # Fields
///
/// - `learning_rate` - Learning rate controlling the size of parameter updates
/// - `rho` - Decay rate for the moving average of squared gradients
/// - `epsilon` - Small constant added for numerical stability
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RMSprop {
    learning_rate: f32,
    rho: f32,
    epsilon: f32,
}

impl RMSprop {
    /// Creates a new RMSprop optimizer with the specified parameters.
    ///
    /// # Parameters
    ///
    /// - `learning_rate` - Step size for parameter updates
    /// - `rho` - Decay rate for moving average of squared gradients (typically 0.9)
    /// - `epsilon` - Small constant for numerical stability (typically 1e-7)
    ///
    /// # Errors
    ///
    /// - `ModelError::InputValidationError` - If any hyperparameter is out of range
    pub fn new(learning_rate: f32, rho: f32, epsilon: f32) -> Result<Self, ModelError> {
        validate_learning_rate(learning_rate)?;
        validate_decay_rate(rho, "rho")?;
        validate_epsilon(epsilon)?;

        Ok(Self {
            learning_rate,
            rho,
            epsilon,
        })
    }

    pub fn learning_rate(&self) -> f32 {
        self.learning_rate
    }

    pub fn rho(&self) -> f32 {
        self.rho
    }

    pub fn epsilon(&self) -> f32 {
        self.epsilon
    }
}

impl Default for RMSprop {
    /// Keras defaults: lr = 0.001, rho = 0.9, epsilon = 1e-7.
    fn default() -> Self {
        Self {
            learning_rate: 0.001,
            rho: 0.9,
            epsilon: 1e-7,
        }
    }
}

impl Optimizer for RMSprop {
    fn update(&mut self, layer: &mut dyn Layer) {
        layer.update_parameters_rmsprop(self.learning_rate, self.rho, self.epsilon);
    }

    fn identifier(&self) -> &'static str {
        "rmsprop"
    }

    fn config(&self) -> OptimizerConfig {
        OptimizerConfig::RMSprop {
            learning_rate: self.learning_rate,
            rho: self.rho,
            epsilon: self.epsilon,
        }
    }
}

/// RMSprop slot state of a dense layer.
///
/// Stores the moving averages of squared gradients for the kernel and the bias. The cache
/// is created lazily on the first update and saved alongside the weights so that a loaded
/// model resumes training with the same adaptive step sizes.
///
/// # Fields
///
/// - `cache` - Moving average of squared gradients for the kernel
/// - `bias` - Moving average of squared gradients for the bias
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RMSpropCache {
    pub cache: Array2<f32>,
    pub bias: Array2<f32>,
}

impl RMSpropCache {
    /// Creates a zeroed cache for a kernel of shape `dims` and a bias of shape `bias_dims`.
    pub fn new(dims: (usize, usize), bias_dims: (usize, usize)) -> Self {
        Self {
            cache: Array2::<f32>::zeros(dims),
            bias: Array2::<f32>::zeros(bias_dims),
        }
    }

    /// Updates a parameter and its RMSprop cache in place.
    ///
    /// # Parameters
    ///
    /// - `param` - Parameter to be updated
    /// - `grad` - Gradient corresponding to the parameter
    /// - `cache` - Cache corresponding to the parameter
    /// - `rho` - Decay rate
    /// - `lr` - Learning rate
    /// - `epsilon` - Small constant for numerical stability
    ///
    /// # Performance
    ///
    /// Uses parallel computation when the parameter length is at least `RMS_PROP_PARALLEL_THRESHOLD`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use ndarray::array;
    /// use densex::neural_network::optimizer::rms_prop::RMSpropCache;
    ///
    /// let mut cache = RMSpropCache::new((1, 2), (1, 2));
    /// let mut param = array![[1.0, 2.0]];
    /// let grad = array![[0.1, 0.1]];
    /// RMSpropCache::update_param(&mut param, &grad, &mut cache.cache, 0.9, 0.001, 1e-7);
    /// assert!(param[[0, 0]] < 1.0);
    /// ```
    pub fn update_param(
        param: &mut Array2<f32>,
        grad: &Array2<f32>,
        cache: &mut Array2<f32>,
        rho: f32,
        lr: f32,
        epsilon: f32,
    ) {
        let step = |p: &mut f32, v: &mut f32, &g: &f32| {
            *v = rho * *v + (1.0 - rho) * g * g;
            *p -= lr * g / (v.sqrt() + epsilon);
        };

        let use_parallel = param.len() >= RMS_PROP_PARALLEL_THRESHOLD;
        let zip = Zip::from(param).and(cache).and(grad);
        if use_parallel {
            zip.par_for_each(step);
        } else {
            zip.for_each(step);
        }
    }

    /// Updates kernel and bias with their gradients.
    ///
    /// # Parameters
    ///
    /// - `param` - Kernel to be updated
    /// - `bias_param` - Bias to be updated
    /// - `grad` - Kernel gradient
    /// - `bias_grad` - Bias gradient
    /// - `rho` - Decay rate for the moving average of squared gradients
    /// - `lr` - Learning rate controlling the size of parameter updates
    /// - `epsilon` - Small constant added for numerical stability
    pub fn update_parameters(
        &mut self,
        param: &mut Array2<f32>,
        bias_param: &mut Array2<f32>,
        grad: &Array2<f32>,
        bias_grad: &Array2<f32>,
        rho: f32,
        lr: f32,
        epsilon: f32,
    ) {
        Self::update_param(param, grad, &mut self.cache, rho, lr, epsilon);
        Self::update_param(bias_param, bias_grad, &mut self.bias, rho, lr, epsilon);
    }
}
