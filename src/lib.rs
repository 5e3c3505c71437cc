//! # densex
//!
//! Build, train and export small dense feed-forward networks.
//!
//! The crate covers one pipeline end to end:
//!
//! - **Build**: [`Sequential::build`](neural_network::Sequential::build) turns a
//!   [`ModelSpec`](neural_network::ModelSpec) into Glorot-initialized dense layers
//! - **Train**: `compile` resolves optimizer, loss and metrics from Keras-style identifiers,
//!   `fit_with_batches` runs mini-batch training and returns a per-epoch
//!   [`History`](neural_network::History)
//! - **Save**: [`saved_model`](neural_network::saved_model) writes a directory with the
//!   architecture, weights and optimizer state, and loads it back
//! - **Export**: [`onnx`] traces the model, converts it to ONNX operators and writes a
//!   `ModelProto` file
//!
//! All randomness and verbosity live in an explicit [`ExecutionContext`], so a fixed seed
//! reproduces a run.
//!
//! # Example
//! ```rust
//! use densex::prelude::*;
//!
//! let mut ctx = ExecutionContext::with_seed(42);
//! let data = SyntheticDataset::generate(100, 100, &mut ctx).unwrap();
//! let (x, y) = data.to_tensors();
//!
//! let mut model = Sequential::build(&ModelSpec::reference(), &mut ctx).unwrap();
//! model.compile(&TrainingConfig { epochs: 1, ..TrainingConfig::default() }).unwrap();
//! let history = model.fit_with_batches(&x, &y, &mut ctx).unwrap();
//! assert_eq!(history.len(), 1);
//! ```

/// Explicit execution state: random source and verbosity
pub mod context;
/// Synthetic binary classification data
pub mod dataset;
/// Error types of every stage
pub mod error;
/// Classification metrics
pub mod metric;
/// Layers, models, training and native serialization
pub mod neural_network;
/// ONNX conversion, encoding and reference evaluation
pub mod onnx;
/// End-to-end build, train, save and export
pub mod pipeline;
/// Commonly used types
pub mod prelude;

pub use context::ExecutionContext;
pub use error::{ExportError, IoError, ModelError, PipelineError};
