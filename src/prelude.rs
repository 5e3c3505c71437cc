pub use crate::context::ExecutionContext;
pub use crate::dataset::SyntheticDataset;
pub use crate::error::{ExportError, IoError, ModelError, PipelineError};
pub use crate::metric::{Metric, binary_accuracy};
pub use crate::neural_network::saved_model;
pub use crate::neural_network::{
    Activation, BinaryCrossEntropy, Dense, EpochRecord, Evaluation, History, Layer, LayerSpec,
    LossFunction, MeanSquaredError, ModelSpec, Optimizer, OptimizerConfig, RMSprop, SGD,
    Sequential, Tensor, TrainingConfig,
};
pub use crate::onnx::{ExportConfig, ExportReport, OnnxModel};
pub use crate::pipeline::{PipelineConfig, PipelineReport, run_pipeline};
