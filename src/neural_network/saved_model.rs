use crate::context::ExecutionContext;
use crate::error::IoError;
use crate::neural_network::layer::{Dense, LayerWeight};
use crate::neural_network::model_spec::ModelSpec;
use crate::neural_network::loss_function::loss_from_identifier;
use crate::neural_network::optimizer::{OptimizerConfig, RMSpropCache};
use crate::neural_network::training_config::TrainingConfig;
use crate::neural_network::{Layer, Sequential};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use serde_json::{from_reader, to_writer_pretty};
use std::any::Any;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Metadata file at the root of a saved-model directory
pub const SAVED_MODEL_FILE: &str = "saved_model.json";
/// Directory holding the trained variables
pub const VARIABLES_DIR: &str = "variables";
/// Variables file inside [`VARIABLES_DIR`]
pub const VARIABLES_FILE: &str = "variables.json";
/// Directory for auxiliary files; always created, currently left empty
pub const ASSETS_DIR: &str = "assets";

const FORMAT_VERSION: u32 = 1;

/// Contents of `saved_model.json`.
///
/// # Fields
///
/// - `format_version` - Layout version of the directory
/// - `architecture` - Layer stack the variables belong to
/// - `training_config` - Configuration the model was compiled with, if any
/// - `optimizer` - Hyperparameters of the compiled optimizer, if any
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedModelMetadata {
    pub format_version: u32,
    pub architecture: ModelSpec,
    #[serde(default)]
    pub training_config: Option<TrainingConfig>,
    #[serde(default)]
    pub optimizer: Option<OptimizerConfig>,
}

/// RMSprop moving averages of one dense layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerializableRMSpropSlots {
    pub kernel: Vec<Vec<f32>>,
    pub bias: Vec<Vec<f32>>,
}

/// Serializable representation of Dense layer weights.
///
/// # Fields
///
/// - `name` - Name of the layer the weights belong to
/// - `kernel` - 2D weight matrix stored as nested vectors
/// - `bias` - 2D bias matrix stored as nested vectors
/// - `rmsprop` - Optimizer slots, present once the layer was trained with RMSprop
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerializableDenseWeight {
    pub name: String,
    pub kernel: Vec<Vec<f32>>,
    pub bias: Vec<Vec<f32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rmsprop: Option<SerializableRMSpropSlots>,
}

/// Serializable weight container for all supported layer types.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SerializableLayerWeight {
    Dense(SerializableDenseWeight),
}

/// Contents of `variables/variables.json`.
///
/// # Fields
///
/// - `iterations` - Optimizer step counter
/// - `layers` - Per-layer weights in layer order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerializableVariables {
    pub iterations: u64,
    pub layers: Vec<SerializableLayerWeight>,
}

fn array2_to_vec2(array: &Array2<f32>) -> Vec<Vec<f32>> {
    array.outer_iter().map(|row| row.to_vec()).collect()
}

fn vec2_to_array2(vec: &[Vec<f32>]) -> Result<Array2<f32>, IoError> {
    let rows = vec.len();
    let cols = vec.first().map_or(0, |row| row.len());
    let flat: Vec<f32> = vec.iter().flat_map(|row| row.iter().copied()).collect();
    Array2::from_shape_vec((rows, cols), flat).map_err(|e| {
        IoError::StdIoError(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            e.to_string(),
        ))
    })
}

impl SerializableLayerWeight {
    /// Converts a `LayerWeight` reference into an owned serializable weight.
    pub fn from_layer_weight(name: &str, weight: &LayerWeight) -> Self {
        match weight {
            LayerWeight::Dense(w) => SerializableLayerWeight::Dense(SerializableDenseWeight {
                name: name.to_string(),
                kernel: array2_to_vec2(w.weight),
                bias: array2_to_vec2(w.bias),
                rmsprop: w.rmsprop_cache.map(|slots| SerializableRMSpropSlots {
                    kernel: array2_to_vec2(&slots.cache),
                    bias: array2_to_vec2(&slots.bias),
                }),
            }),
        }
    }

    /// Writes the stored weights into `layer`.
    ///
    /// # Returns
    ///
    /// - `Ok(())` - Weights applied
    /// - `Err(IoError::ModelStructureMismatch)` - If the layer type, name or a shape differs
    pub fn apply_to_layer(&self, layer: &mut dyn Layer) -> Result<(), IoError> {
        let layer_name = layer.name().to_string();
        let layer_any: &mut dyn Any = layer;
        match self {
            SerializableLayerWeight::Dense(stored) => {
                let dense = layer_any.downcast_mut::<Dense>().ok_or_else(|| {
                    IoError::ModelStructureMismatch(format!(
                        "stored Dense weights cannot be applied to layer `{}`",
                        layer_name
                    ))
                })?;
                if stored.name != layer_name {
                    return Err(IoError::ModelStructureMismatch(format!(
                        "stored weights belong to `{}`, architecture has `{}`",
                        stored.name, layer_name
                    )));
                }

                let mismatch = |e: crate::ModelError| IoError::ModelStructureMismatch(e.to_string());
                dense
                    .set_weights(vec2_to_array2(&stored.kernel)?, vec2_to_array2(&stored.bias)?)
                    .map_err(mismatch)?;
                if let Some(slots) = &stored.rmsprop {
                    dense
                        .set_rmsprop_cache(RMSpropCache {
                            cache: vec2_to_array2(&slots.kernel)?,
                            bias: vec2_to_array2(&slots.bias)?,
                        })
                        .map_err(mismatch)?;
                }
                Ok(())
            }
        }
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), IoError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    to_writer_pretty(&mut writer, value)?;
    writer.flush()?;
    Ok(())
}

/// Saves a model in the saved-model directory layout.
///
/// ```text
/// <path>/
///   saved_model.json          architecture, training config, optimizer
///   variables/variables.json  weights, optimizer slots, step counter
///   assets/
/// ```
///
/// The directory is created if missing; existing files are overwritten.
///
/// # Parameters
///
/// - `model` - Model to save; it does not need to be compiled
/// - `path` - Target directory
///
/// # Returns
///
/// - `Ok(())` - The model was written
/// - `Err(IoError)` - If the architecture is invalid or a file cannot be written
pub fn save(model: &Sequential, path: impl AsRef<Path>) -> Result<(), IoError> {
    let path = path.as_ref();
    model.validate_architecture()?;

    let variables_dir = path.join(VARIABLES_DIR);
    fs::create_dir_all(&variables_dir)?;
    fs::create_dir_all(path.join(ASSETS_DIR))?;

    let metadata = SavedModelMetadata {
        format_version: FORMAT_VERSION,
        architecture: model.spec(),
        training_config: model.training_config().cloned(),
        optimizer: model.optimizer_config(),
    };
    write_json(&path.join(SAVED_MODEL_FILE), &metadata)?;

    let variables = SerializableVariables {
        iterations: model.iterations(),
        layers: model
            .layers()
            .iter()
            .map(|layer| {
                SerializableLayerWeight::from_layer_weight(layer.name(), &layer.get_weights())
            })
            .collect(),
    };
    write_json(&variables_dir.join(VARIABLES_FILE), &variables)?;

    log::info!(
        "saved model ({} layers, {} steps) to {}",
        variables.layers.len(),
        variables.iterations,
        path.display()
    );
    Ok(())
}

/// Loads a model saved with [`save`].
///
/// The architecture is rebuilt, the weights and optimizer slots are restored and, if the
/// model was compiled when saved, it is compiled again with the stored configuration so
/// that training can continue.
///
/// # Returns
///
/// - `Ok(Sequential)` - The restored model
/// - `Err(IoError)` - If a file is missing or malformed, or weights do not fit the architecture
pub fn load(path: impl AsRef<Path>) -> Result<Sequential, IoError> {
    let path = path.as_ref();

    let metadata: SavedModelMetadata =
        from_reader(IoError::load_in_buf_reader(path.join(SAVED_MODEL_FILE))?)?;
    if metadata.format_version != FORMAT_VERSION {
        return Err(IoError::ModelStructureMismatch(format!(
            "unsupported saved model format version {}",
            metadata.format_version
        )));
    }

    let variables: SerializableVariables = from_reader(IoError::load_in_buf_reader(
        path.join(VARIABLES_DIR).join(VARIABLES_FILE),
    )?)?;
    if variables.layers.len() != metadata.architecture.layers.len() {
        return Err(IoError::ModelStructureMismatch(format!(
            "Layer count mismatch: architecture has {} layers, variables have {}",
            metadata.architecture.layers.len(),
            variables.layers.len()
        )));
    }

    // initial weights are overwritten below, so the seed is irrelevant
    let mut model = Sequential::build(&metadata.architecture, &mut ExecutionContext::with_seed(0))?;
    for (layer, stored) in model.layers_mut().iter_mut().zip(&variables.layers) {
        stored.apply_to_layer(layer.as_mut())?;
    }

    if let Some(config) = &metadata.training_config {
        match &metadata.optimizer {
            Some(optimizer) => {
                model.compile_boxed(optimizer.build()?, loss_from_identifier(&config.loss)?, config)?;
            }
            None => {
                model.compile(config)?;
            }
        }
    }
    model.set_iterations(variables.iterations);

    log::info!(
        "loaded model ({} layers, {} steps) from {}",
        model.layers().len(),
        model.iterations(),
        path.display()
    );
    Ok(model)
}
