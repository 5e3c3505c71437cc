use crate::ModelError;
use ndarray::{Array2, Axis, Zip};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Activation function enum, supporting Linear, ReLU, Tanh, Sigmoid, and Softmax
///
/// Serialized with the lowercase Keras identifiers (`"relu"`, `"sigmoid"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    Linear,
    ReLU,
    Tanh,
    Sigmoid,
    Softmax,
}

impl Activation {
    /// Resolves an activation identifier such as `"relu"` or `"sigmoid"`.
    ///
    /// # Parameters
    ///
    /// * `name` - Case-insensitive identifier
    ///
    /// # Returns
    ///
    /// - `Ok(Activation)` - The matching activation
    /// - `Err(ModelError::InputValidationError)` - If the identifier is unknown
    pub fn from_identifier(name: &str) -> Result<Self, ModelError> {
        match name.to_ascii_lowercase().as_str() {
            "linear" | "none" => Ok(Activation::Linear),
            "relu" => Ok(Activation::ReLU),
            "tanh" => Ok(Activation::Tanh),
            "sigmoid" => Ok(Activation::Sigmoid),
            "softmax" => Ok(Activation::Softmax),
            other => Err(ModelError::InputValidationError(format!(
                "unknown activation `{}`",
                other
            ))),
        }
    }

    /// Lowercase identifier of the activation.
    pub fn identifier(&self) -> &'static str {
        match self {
            Activation::Linear => "linear",
            Activation::ReLU => "relu",
            Activation::Tanh => "tanh",
            Activation::Sigmoid => "sigmoid",
            Activation::Softmax => "softmax",
        }
    }

    /// Forward application of activation functions
    ///
    /// Applies the specified activation function to the input tensor.
    ///
    /// # Parameters
    ///
    /// - `z` - Input tensor to apply activation function to
    /// - `activation` - The activation function to apply
    ///
    /// # Returns
    /// * `Array2<f32>` - A new tensor with the activation function applied
    pub fn apply_activation(z: &Array2<f32>, activation: &Activation) -> Array2<f32> {
        match activation {
            Activation::Linear => z.clone(),
            Activation::ReLU => {
                let mut result = z.clone();
                result.par_mapv_inplace(|x| if x > 0.0 { x } else { 0.0 });
                result
            }
            Activation::Sigmoid => {
                let mut result = z.clone();
                result.par_mapv_inplace(|x| 1.0 / (1.0 + (-x).exp()));
                result
            }
            Activation::Tanh => {
                let mut result = z.clone();
                result.par_mapv_inplace(|x| x.tanh());
                result
            }
            Activation::Softmax => {
                let mut out = z.clone();
                // rows are independent, so each one is normalized on its own worker
                out.axis_iter_mut(Axis(0))
                    .into_par_iter()
                    .for_each(|mut row| {
                        let max_val = row.fold(f32::NEG_INFINITY, |m, &x| m.max(x));
                        row.mapv_inplace(|x| (x - max_val).exp());
                        let sum = row.sum();
                        row /= sum;
                    });
                out
            }
        }
    }

    /// Computes derivatives for Linear, ReLU, Sigmoid, and Tanh activation functions
    ///
    /// Returns the derivative of the activation function given the activated output.
    /// For Softmax, the gradient is handled separately in backward propagation.
    ///
    /// # Parameters
    ///
    /// - `activation_output` - The output after activation function has been applied
    /// - `activation` - The activation function whose derivative to compute
    ///
    /// # Returns
    /// * `Array2<f32>` - A tensor containing the derivative values
    pub fn activation_derivative(
        activation_output: &Array2<f32>,
        activation: &Activation,
    ) -> Array2<f32> {
        match activation {
            Activation::ReLU => activation_output.mapv(|x| if x > 0.0 { 1.0 } else { 0.0 }),
            Activation::Sigmoid => activation_output.mapv(|a| a * (1.0 - a)),
            Activation::Tanh => activation_output.mapv(|a| 1.0 - a * a),
            Activation::Linear | Activation::Softmax => Array2::ones(activation_output.dim()),
        }
    }

    /// Backward propagation for Softmax activation
    ///
    /// For each row, computes:
    /// new_grad\[i\] = a\[i\] * (upstream\[i\] - sum_j(a\[j\]*upstream\[j\]))
    ///
    /// # Parameters
    ///
    /// - `a` - The output from the softmax activation
    /// - `upstream` - The gradient flowing from the next layer
    ///
    /// # Returns
    ///
    /// * `Array2<f32>` - The gradient with respect to the input of the softmax function
    pub fn softmax_backward(a: &Array2<f32>, upstream: &Array2<f32>) -> Array2<f32> {
        let mut result = Array2::<f32>::zeros(a.raw_dim());

        Zip::from(result.rows_mut())
            .and(a.rows())
            .and(upstream.rows())
            .par_for_each(|mut out_row, a_row, up_row| {
                let weighted = a_row.dot(&up_row);
                Zip::from(&mut out_row)
                    .and(&a_row)
                    .and(&up_row)
                    .for_each(|r, &ai, &gi| *r = ai * (gi - weighted));
            });

        result
    }
}
