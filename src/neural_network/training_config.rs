use serde::{Deserialize, Serialize};

/// Optimizer, loss and metric identifiers plus the epoch/batch schedule of a training run.
///
/// Identifiers follow Keras naming and are resolved by `Sequential::compile`. The
/// configuration is copied into the model on compile and is not changed by training.
///
/// # Fields
///
/// - `optimizer` - Optimizer identifier (`"rmsprop"`, `"sgd"`)
/// - `loss` - Loss identifier (`"binary_crossentropy"`, `"mean_squared_error"`)
/// - `metrics` - Tracked metric identifiers (`"accuracy"`)
/// - `epochs` - Number of full passes over the data
/// - `batch_size` - Samples per optimizer step; the last batch of an epoch may be smaller
/// - `shuffle` - Whether sample order is reshuffled at the start of every epoch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub optimizer: String,
    pub loss: String,
    pub metrics: Vec<String>,
    pub epochs: u32,
    pub batch_size: usize,
    pub shuffle: bool,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            optimizer: "rmsprop".to_string(),
            loss: "binary_crossentropy".to_string(),
            metrics: vec!["accuracy".to_string()],
            epochs: 10,
            batch_size: 32,
            shuffle: true,
        }
    }
}

/// Metrics recorded at the end of one epoch.
///
/// # Fields
///
/// - `epoch` - One-based epoch number
/// - `loss` - Sample-weighted mean of the batch losses
/// - `accuracy` - Fraction of correctly classified samples, when accuracy is tracked
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpochRecord {
    pub epoch: u32,
    pub loss: f32,
    pub accuracy: Option<f32>,
}

/// Per-epoch training history returned by `Sequential::fit_with_batches`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct History {
    pub epochs: Vec<EpochRecord>,
}

impl History {
    pub fn len(&self) -> usize {
        self.epochs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.epochs.is_empty()
    }

    pub fn last(&self) -> Option<&EpochRecord> {
        self.epochs.last()
    }

    /// Loss values in epoch order.
    pub fn losses(&self) -> Vec<f32> {
        self.epochs.iter().map(|record| record.loss).collect()
    }
}
