use crate::neural_network::Activation;
use serde::{Deserialize, Serialize};

/// One entry of an architecture description: a dense layer of `units` outputs.
///
/// # Fields
///
/// - `units` - Output width of the layer
/// - `activation` - Activation applied to the layer output
/// - `name` - Optional layer name; generated (`dense`, `dense_1`, ...) when absent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSpec {
    pub units: usize,
    pub activation: Activation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl LayerSpec {
    pub fn new(units: usize, activation: Activation) -> Self {
        Self {
            units,
            activation,
            name: None,
        }
    }

    pub fn named(units: usize, activation: Activation, name: impl Into<String>) -> Self {
        Self {
            units,
            activation,
            name: Some(name.into()),
        }
    }
}

/// Architecture of a sequential stack of dense layers.
///
/// The input width of layer `i + 1` is the unit count of layer `i`; the first layer reads
/// `input_dim` features.
///
/// # Example
/// ```rust
/// use densex::neural_network::{Activation, ModelSpec};
///
/// let spec = ModelSpec::reference();
/// assert_eq!(spec.input_dim, 100);
/// assert_eq!(spec.layers[0].units, 32);
/// assert_eq!(spec.layers[1].activation, Activation::Sigmoid);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSpec {
    pub input_dim: usize,
    pub layers: Vec<LayerSpec>,
}

impl ModelSpec {
    pub fn new(input_dim: usize, layers: Vec<LayerSpec>) -> Self {
        Self { input_dim, layers }
    }

    /// The two-layer binary classifier: 100 -> 32 (relu, `main_input`) -> 1 (sigmoid, `dense_1`).
    pub fn reference() -> Self {
        Self::new(
            100,
            vec![
                LayerSpec::named(32, Activation::ReLU, "main_input"),
                LayerSpec::named(1, Activation::Sigmoid, "dense_1"),
            ],
        )
    }

    /// Width of the model output, i.e. the unit count of the last layer.
    pub fn output_dim(&self) -> Option<usize> {
        self.layers.last().map(|layer| layer.units)
    }
}

impl Default for ModelSpec {
    fn default() -> Self {
        Self::reference()
    }
}
