use crate::context::ExecutionContext;
use crate::dataset::SyntheticDataset;
use crate::error::{IoError, PipelineError};
use crate::neural_network::{History, ModelSpec, Sequential, TrainingConfig, saved_model};
use crate::onnx::{self, ExportConfig, ExportReport};
use serde::{Deserialize, Serialize};
use serde_json::from_reader;
use std::path::{Path, PathBuf};

/// Everything a pipeline run needs, with the reference scenario as the default.
///
/// # Fields
///
/// - `seed` - Seed of the execution context; `None` seeds from the operating system
/// - `n_samples` - Rows of the synthetic dataset
/// - `n_features` - Columns of the synthetic dataset; must equal `model.input_dim`
/// - `model` - Architecture to build
/// - `training` - Optimizer, loss, metrics and schedule
/// - `saved_model_dir` - Target directory of the native save
/// - `onnx_path` - Target file of the ONNX export
/// - `export` - ONNX conversion options
/// - `verbose` - Show a training progress bar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub seed: Option<u64>,
    pub n_samples: usize,
    pub n_features: usize,
    pub model: ModelSpec,
    pub training: TrainingConfig,
    pub saved_model_dir: PathBuf,
    pub onnx_path: PathBuf,
    pub export: ExportConfig,
    pub verbose: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            seed: None,
            n_samples: 1000,
            n_features: 100,
            model: ModelSpec::reference(),
            training: TrainingConfig::default(),
            saved_model_dir: PathBuf::from("saved_model"),
            onnx_path: PathBuf::from("example.onnx"),
            export: ExportConfig::default(),
            verbose: false,
        }
    }
}

impl PipelineConfig {
    /// Reads a JSON configuration; missing fields take their default values.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, IoError> {
        let reader = IoError::load_in_buf_reader(path)?;
        Ok(from_reader(reader)?)
    }

    /// Creates the execution context described by `seed` and `verbose`.
    pub fn context(&self) -> ExecutionContext {
        let ctx = match self.seed {
            Some(seed) => ExecutionContext::with_seed(seed),
            None => ExecutionContext::new(),
        };
        ctx.verbose(self.verbose)
    }
}

/// Outcome of a successful pipeline run.
///
/// # Fields
///
/// - `history` - Per-epoch training metrics
/// - `saved_model_dir` - Where the native model was written
/// - `onnx_path` - Where the ONNX model was written
/// - `export` - Operator counts and opset of the export
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineReport {
    pub history: History,
    pub saved_model_dir: PathBuf,
    pub onnx_path: PathBuf,
    pub export: ExportReport,
}

/// Runs build, train, native save and ONNX export in order, stopping at the first failure.
///
/// # Parameters
///
/// * `config` - Pipeline configuration
///
/// # Returns
///
/// - `Ok(PipelineReport)` - All four stages succeeded
/// - `Err(PipelineError)` - The error of the first failing stage
pub fn run_pipeline(config: &PipelineConfig) -> Result<PipelineReport, PipelineError> {
    let mut ctx = config.context();
    run_pipeline_with_context(config, &mut ctx)
}

/// [`run_pipeline`] with a caller-supplied execution context.
///
/// `config.seed` and `config.verbose` are ignored in favor of `ctx`.
pub fn run_pipeline_with_context(
    config: &PipelineConfig,
    ctx: &mut ExecutionContext,
) -> Result<PipelineReport, PipelineError> {
    let dataset = SyntheticDataset::generate(config.n_samples, config.n_features, ctx)
        .map_err(PipelineError::Build)?;
    let (x, y) = dataset.to_tensors();

    log::info!("stage 1: building model");
    let mut model = Sequential::build(&config.model, ctx).map_err(PipelineError::Build)?;
    log::info!("\n{}", model.summary());

    log::info!("stage 2: training");
    let history = model
        .compile(&config.training)
        .and_then(|model| model.fit_with_batches(&x, &y, ctx))
        .map_err(PipelineError::Train)?;

    log::info!("stage 3: saving native model");
    saved_model::save(&model, &config.saved_model_dir).map_err(PipelineError::Save)?;

    log::info!("stage 4: exporting ONNX");
    let export = onnx::export_model(&model, &config.export).map_err(PipelineError::Export)?;
    onnx::save_model(&export.model, &config.onnx_path).map_err(PipelineError::Export)?;

    Ok(PipelineReport {
        history,
        saved_model_dir: config.saved_model_dir.clone(),
        onnx_path: config.onnx_path.clone(),
        export: export.report,
    })
}
