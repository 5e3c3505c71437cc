use super::*;
use crate::context::ExecutionContext;
use crate::metric::{Metric, binary_accuracy, binary_correct_count};
use indicatif::{ProgressBar, ProgressStyle};
use ndarray::{ArrayView2, Axis, Ix2};
use rand::seq::SliceRandom;

/// Loss and metrics of a model on a dataset, computed without updating weights.
///
/// # Fields
///
/// - `loss` - Mean loss over all samples
/// - `accuracy` - Binary accuracy, when the model tracks accuracy
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub loss: f32,
    pub accuracy: Option<f32>,
}

/// A Sequential neural network model for building and training feedforward networks.
///
/// The Sequential model allows you to build neural networks by stacking layers in a linear fashion.
/// Each layer feeds its output to the next layer in sequence.
///
/// # Fields
///
/// - `layers` - All layers of the model, in execution order
/// - `optimizer` - Optimizer resolved by `compile`
/// - `loss` - Loss function resolved by `compile`
/// - `metrics` - Metrics tracked during training and evaluation
/// - `training_config` - The configuration the model was compiled with
/// - `iterations` - Number of optimizer steps taken so far
///
/// # Example
/// ```rust
/// use densex::prelude::*;
///
/// let mut ctx = ExecutionContext::with_seed(42);
/// let data = SyntheticDataset::generate(64, 100, &mut ctx).unwrap();
/// let (x, y) = data.to_tensors();
///
/// let mut model = Sequential::build(&ModelSpec::reference(), &mut ctx).unwrap();
/// model.compile(&TrainingConfig { epochs: 2, ..TrainingConfig::default() }).unwrap();
///
/// let history = model.fit_with_batches(&x, &y, &mut ctx).unwrap();
/// assert_eq!(history.len(), 2);
///
/// let predictions = model.predict(&x).unwrap();
/// assert_eq!(predictions.shape(), &[64, 1]);
/// ```
pub struct Sequential {
    layers: Vec<Box<dyn Layer>>,
    optimizer: Option<Box<dyn Optimizer>>,
    loss: Option<Box<dyn LossFunction>>,
    metrics: Vec<Metric>,
    training_config: Option<TrainingConfig>,
    iterations: u64,
}

impl Sequential {
    /// Creates a new empty Sequential model
    pub fn new() -> Self {
        Self {
            layers: Vec::new(),
            optimizer: None,
            loss: None,
            metrics: Vec::new(),
            training_config: None,
            iterations: 0,
        }
    }

    /// Builds an untrained model from an architecture description.
    ///
    /// Each layer's input width is the previous layer's unit count; weights are drawn from
    /// the context's random generator.
    ///
    /// # Parameters
    ///
    /// - `spec` - Architecture description
    /// - `ctx` - Execution context supplying the random source
    ///
    /// # Returns
    ///
    /// - `Ok(Sequential)` - The untrained model
    /// - `Err(ModelError::InputValidationError)` - If the description is empty, has a zero
    ///   width, or repeats a layer name
    pub fn build(spec: &ModelSpec, ctx: &mut ExecutionContext) -> Result<Self, ModelError> {
        if spec.layers.is_empty() {
            return Err(ModelError::InputValidationError(
                "Layers not specified".to_string(),
            ));
        }

        let mut model = Self::new();
        let mut input_dim = spec.input_dim;
        for layer_spec in &spec.layers {
            let mut dense = Dense::new(
                input_dim,
                layer_spec.units,
                layer_spec.activation,
                ctx.rng(),
            )?;
            if let Some(name) = &layer_spec.name {
                dense = dense.with_name(name.clone());
            }
            model.add(dense);
            input_dim = layer_spec.units;
        }
        model.validate_architecture()?;

        log::info!(
            "built model: {} layers, {} parameters",
            model.layers.len(),
            model.count_params()
        );
        Ok(model)
    }

    /// Adds a layer to the model
    ///
    /// Supports method chaining pattern. An unnamed layer receives a generated name
    /// (`dense`, `dense_1`, ...) that is unique among the layers already present.
    ///
    /// # Parameters
    ///
    /// * `layer` - The layer to add to the model
    ///
    /// # Returns
    ///
    /// * `&mut Sequential` - Mutable reference to self for method chaining
    pub fn add<L: 'static + Layer>(&mut self, mut layer: L) -> &mut Self {
        if layer.name().is_empty() {
            let prefix = layer.layer_type().to_ascii_lowercase();
            let taken = |candidate: &str| self.layers.iter().any(|l| l.name() == candidate);
            let mut name = prefix.clone();
            let mut index = 0;
            while taken(&name) {
                index += 1;
                name = format!("{}_{}", prefix, index);
            }
            layer.set_name(name);
        }
        self.layers.push(Box::new(layer));
        self
    }

    /// Checks that the layer stack is connected and uniquely named.
    ///
    /// # Returns
    ///
    /// - `Ok(())` - Every layer's input width equals the previous layer's output width
    /// - `Err(ModelError::InputValidationError)` - Otherwise
    pub fn validate_architecture(&self) -> Result<(), ModelError> {
        if self.layers.is_empty() {
            return Err(ModelError::InputValidationError(
                "Layers not specified".to_string(),
            ));
        }

        for pair in self.layers.windows(2) {
            let (previous, next) = (&pair[0], &pair[1]);
            if previous.output_dim() != next.input_dim() {
                return Err(ModelError::InputValidationError(format!(
                    "layer `{}` outputs {} features but layer `{}` expects {}",
                    previous.name(),
                    previous.output_dim(),
                    next.name(),
                    next.input_dim()
                )));
            }
        }

        for (i, layer) in self.layers.iter().enumerate() {
            if self.layers[..i].iter().any(|l| l.name() == layer.name()) {
                return Err(ModelError::InputValidationError(format!(
                    "duplicate layer name `{}`",
                    layer.name()
                )));
            }
        }

        Ok(())
    }

    /// Configures the optimizer, loss function and metrics for the model
    ///
    /// # Parameters
    ///
    /// * `config` - Training configuration; its identifiers are resolved here and the
    ///   configuration is kept for `fit_with_batches` and the saved model
    ///
    /// # Returns
    ///
    /// - `Ok(&mut Sequential)` - Mutable reference to self for method chaining
    /// - `Err(ModelError::InputValidationError)` - If an identifier is unknown, the batch size
    ///   is zero or the layer stack is not connected
    pub fn compile(&mut self, config: &TrainingConfig) -> Result<&mut Self, ModelError> {
        let optimizer = optimizer_from_identifier(&config.optimizer)?;
        let loss = loss_from_identifier(&config.loss)?;
        self.compile_boxed(optimizer, loss, config)
    }

    /// Configures the model with ready-made optimizer and loss instances
    ///
    /// The `optimizer` and `loss` identifiers of `config` are replaced by those of the
    /// given instances; metrics and the epoch/batch schedule are taken from `config`.
    ///
    /// # Parameters
    ///
    /// - `optimizer` - The optimizer to use for training
    /// - `loss` - The loss function to use for training
    /// - `config` - Metrics and schedule
    ///
    /// # Returns
    ///
    /// - `Ok(&mut Sequential)` - Mutable reference to self for method chaining
    /// - `Err(ModelError::InputValidationError)` - If a metric is unknown, the batch size is
    ///   zero or the layer stack is not connected
    pub fn compile_with<O, LFunc>(
        &mut self,
        optimizer: O,
        loss: LFunc,
        config: &TrainingConfig,
    ) -> Result<&mut Self, ModelError>
    where
        O: 'static + Optimizer,
        LFunc: 'static + LossFunction,
    {
        self.compile_boxed(Box::new(optimizer), Box::new(loss), config)
    }

    pub(crate) fn compile_boxed(
        &mut self,
        optimizer: Box<dyn Optimizer>,
        loss: Box<dyn LossFunction>,
        config: &TrainingConfig,
    ) -> Result<&mut Self, ModelError> {
        if config.batch_size == 0 {
            return Err(ModelError::InputValidationError(
                "Batch size must be greater than 0".to_string(),
            ));
        }
        self.validate_architecture()?;

        let metrics = config
            .metrics
            .iter()
            .map(|name| Metric::from_identifier(name))
            .collect::<Result<Vec<_>, _>>()?;

        self.training_config = Some(TrainingConfig {
            optimizer: optimizer.identifier().to_string(),
            loss: loss.identifier().to_string(),
            ..config.clone()
        });
        self.optimizer = Some(optimizer);
        self.loss = Some(loss);
        self.metrics = metrics;
        Ok(self)
    }

    /// Validates the model state and input data
    fn validate_training_inputs(&self, x: &Tensor, y: &Tensor) -> Result<(), ModelError> {
        if self.optimizer.is_none() || self.loss.is_none() {
            return Err(ModelError::NotFitted);
        }
        self.validate_architecture()?;

        if x.is_empty() || y.is_empty() {
            return Err(ModelError::InputValidationError(
                "Input tensors cannot be empty".to_string(),
            ));
        }
        if x.ndim() != 2 || y.ndim() != 2 {
            return Err(ModelError::InputValidationError(format!(
                "expected 2D inputs, got x {:?} and y {:?}",
                x.shape(),
                y.shape()
            )));
        }
        if x.shape()[0] != y.shape()[0] {
            return Err(ModelError::InputValidationError(format!(
                "Batch size mismatch: input has {} samples, target has {} samples",
                x.shape()[0],
                y.shape()[0]
            )));
        }
        if x.shape()[1] != self.input_dim() {
            return Err(ModelError::InputValidationError(format!(
                "input has {} features but the model expects {}",
                x.shape()[1],
                self.input_dim()
            )));
        }
        if y.shape()[1] != self.output_dim() {
            return Err(ModelError::InputValidationError(format!(
                "target has {} columns but the model outputs {}",
                y.shape()[1],
                self.output_dim()
            )));
        }

        Ok(())
    }

    /// Performs training on a single batch of data
    ///
    /// # Returns
    ///
    /// - `Ok((f32, Tensor))` - The batch loss and the forward output computed before the update
    /// - `Err(ModelError)` - If training fails
    fn train_batch(&mut self, x: &Tensor, y: &Tensor) -> Result<(f32, Tensor), ModelError> {
        let loss_fn = self.loss.as_deref().ok_or(ModelError::NotFitted)?;
        let optimizer = self.optimizer.as_deref_mut().ok_or(ModelError::NotFitted)?;

        let mut output = x.clone();
        for layer in self.layers.iter_mut() {
            output = layer.forward(&output)?;
        }

        let loss_value = loss_fn.compute_loss(y, &output);
        let mut grad = loss_fn.compute_grad(y, &output);

        // each layer computes its input gradient before its own weights change
        for layer in self.layers.iter_mut().rev() {
            grad = layer.backward(&grad)?;
            optimizer.update(layer.as_mut());
        }
        self.iterations += 1;

        Ok((loss_value, output))
    }

    fn tracks_accuracy(&self) -> bool {
        self.metrics.contains(&Metric::Accuracy)
    }

    fn as_matrices<'a>(
        y: &'a Tensor,
        output: &'a Tensor,
    ) -> Result<(ArrayView2<'a, f32>, ArrayView2<'a, f32>), ModelError> {
        let y_2d = y
            .view()
            .into_dimensionality::<Ix2>()
            .map_err(|e| ModelError::ProcessingError(format!("labels are not 2D: {}", e)))?;
        let out_2d = output
            .view()
            .into_dimensionality::<Ix2>()
            .map_err(|e| ModelError::ProcessingError(format!("output is not 2D: {}", e)))?;
        Ok((y_2d, out_2d))
    }

    fn correct_predictions(y: &Tensor, output: &Tensor) -> Result<usize, ModelError> {
        let (y_2d, out_2d) = Self::as_matrices(y, output)?;
        Ok(binary_correct_count(y_2d, out_2d))
    }

    /// Trains the model using batch processing
    ///
    /// Runs `epochs` passes over the data as configured by `compile`. Every pass
    /// (optionally shuffled) splits the samples into batches of `batch_size`; the last
    /// batch holds the remainder when the sample count is not a multiple of the batch size.
    /// Each batch performs one forward pass, one loss evaluation, one backward pass and
    /// one optimizer step.
    ///
    /// # Parameters
    ///
    /// - `x` - Input training data tensor with shape (n_samples, input_dim)
    /// - `y` - Target output data tensor with shape (n_samples, output_dim)
    /// - `ctx` - Execution context supplying the shuffle order and verbosity
    ///
    /// # Returns
    ///
    /// - `Ok(History)` - One record per epoch
    /// - `Err(ModelError)` - If the model is not compiled or the data does not fit the model
    pub fn fit_with_batches(
        &mut self,
        x: &Tensor,
        y: &Tensor,
        ctx: &mut ExecutionContext,
    ) -> Result<History, ModelError> {
        self.validate_training_inputs(x, y)?;
        let config = self.training_config.clone().ok_or(ModelError::NotFitted)?;

        let n_samples = x.shape()[0];
        let mut batch_size = config.batch_size;
        if batch_size > n_samples {
            log::warn!(
                "batch size {} exceeds dataset size {}, using {}",
                batch_size,
                n_samples,
                n_samples
            );
            batch_size = n_samples;
        }

        let total_batches = n_samples.div_ceil(batch_size);
        let progress_bar = if ctx.is_verbose() {
            ProgressBar::new(config.epochs as u64 * total_batches as u64)
        } else {
            ProgressBar::hidden()
        };
        progress_bar.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} | Epoch {msg}")
                .map_err(|e| ModelError::ProcessingError(format!("progress bar: {}", e)))?
                .progress_chars("█▓░"),
        );

        log::info!(
            "training on {} samples: {} epochs, batch size {}, optimizer {}, loss {}",
            n_samples,
            config.epochs,
            batch_size,
            config.optimizer,
            config.loss
        );

        let mut indices: Vec<usize> = (0..n_samples).collect();
        let mut history = History::default();
        let track_accuracy = self.tracks_accuracy();
        let outputs_per_sample = y.shape()[1];

        for epoch in 1..=config.epochs {
            if config.shuffle {
                indices.shuffle(ctx.rng());
            }

            let mut weighted_loss = 0.0f64;
            let mut correct = 0usize;

            for batch_indices in indices.chunks(batch_size) {
                let batch_x = x.select(Axis(0), batch_indices);
                let batch_y = y.select(Axis(0), batch_indices);

                let (batch_loss, output) = self.train_batch(&batch_x, &batch_y)?;
                weighted_loss += batch_loss as f64 * batch_indices.len() as f64;
                if track_accuracy {
                    correct += Self::correct_predictions(&batch_y, &output)?;
                }

                log::debug!(
                    "epoch {} step {}: batch of {} samples, loss {:.6}",
                    epoch,
                    self.iterations,
                    batch_indices.len(),
                    batch_loss
                );
                progress_bar.set_message(format!(
                    "{}/{} | Loss: {:.6}",
                    epoch, config.epochs, batch_loss
                ));
                progress_bar.inc(1);
            }

            let record = EpochRecord {
                epoch,
                loss: (weighted_loss / n_samples as f64) as f32,
                accuracy: track_accuracy
                    .then(|| correct as f32 / (n_samples * outputs_per_sample) as f32),
            };
            match record.accuracy {
                Some(accuracy) => log::info!(
                    "epoch {}/{} - loss: {:.4} - accuracy: {:.4}",
                    epoch,
                    config.epochs,
                    record.loss,
                    accuracy
                ),
                None => log::info!(
                    "epoch {}/{} - loss: {:.4}",
                    epoch,
                    config.epochs,
                    record.loss
                ),
            }
            history.epochs.push(record);
        }

        progress_bar.finish_with_message("Training completed");
        Ok(history)
    }

    /// Generates predictions for the input data
    ///
    /// Only performs forward pass without any training
    ///
    /// # Parameters
    ///
    /// * `x` - Input tensor with shape (n_samples, input_dim)
    ///
    /// # Returns
    ///
    /// - `Ok(Tensor)` - Tensor containing the model's predictions
    /// - `Err(ModelError)` - If the input is empty or has the wrong width
    pub fn predict(&mut self, x: &Tensor) -> Result<Tensor, ModelError> {
        if x.is_empty() {
            return Err(ModelError::InputValidationError(
                "Input tensor cannot be empty".to_string(),
            ));
        }
        self.validate_architecture()?;

        let mut output = x.clone();
        for layer in &mut self.layers {
            output = layer.forward(&output)?;
        }
        Ok(output)
    }

    /// Computes loss and metrics on a dataset without updating weights.
    ///
    /// # Returns
    ///
    /// - `Ok(Evaluation)` - Mean loss and, if tracked, accuracy
    /// - `Err(ModelError)` - If the model is not compiled or the data does not fit the model
    pub fn evaluate(&mut self, x: &Tensor, y: &Tensor) -> Result<Evaluation, ModelError> {
        self.validate_training_inputs(x, y)?;
        let output = self.predict(x)?;
        let loss = self
            .loss
            .as_deref()
            .ok_or(ModelError::NotFitted)?
            .compute_loss(y, &output);
        let accuracy = if self.tracks_accuracy() {
            let (y_2d, out_2d) = Self::as_matrices(y, &output)?;
            Some(binary_accuracy(y_2d, out_2d))
        } else {
            None
        };
        Ok(Evaluation { loss, accuracy })
    }

    /// Traces the model into its primitive native graph.
    ///
    /// The graph input is named `"{first_layer}_input"`; every dense layer contributes a
    /// kernel read, a `MatMul`, a bias read, a `BiasAdd` and its activation op.
    ///
    /// # Returns
    ///
    /// - `Ok(NativeGraph)` - The traced graph
    /// - `Err(ModelError::InputValidationError)` - If the architecture is invalid
    pub fn trace(&self) -> Result<NativeGraph, ModelError> {
        self.validate_architecture()?;

        let first = &self.layers[0];
        let mut graph = NativeGraph::new(format!("{}_input", first.name()), first.input_dim());
        let mut current = graph.input_name.clone();
        for layer in &self.layers {
            current = layer.trace(&current, &mut graph);
        }
        graph.set_output(current, self.output_dim());
        Ok(graph)
    }

    /// Renders a summary of the model's structure
    ///
    /// Lists each layer's name, type, output shape and parameter count in a tabular format.
    pub fn summary(&self) -> String {
        let col1_width = 33;
        let col2_width = 24;
        let col3_width = 15;
        let mut lines = vec![
            "Model: \"sequential\"".to_string(),
            format!(
                "┏{}┳{}┳{}┓",
                "━".repeat(col1_width),
                "━".repeat(col2_width),
                "━".repeat(col3_width)
            ),
            format!(
                "┃ {:<31} ┃ {:<22} ┃ {:>13} ┃",
                "Layer (type)", "Output Shape", "Param #"
            ),
            format!(
                "┡{}╇{}╇{}┩",
                "━".repeat(col1_width),
                "━".repeat(col2_width),
                "━".repeat(col3_width)
            ),
        ];

        let mut trainable = 0usize;
        let mut non_trainable = 0usize;
        for layer in &self.layers {
            let params = layer.param_count();
            match params {
                TrainingParameters::Trainable(count) => trainable += count,
                TrainingParameters::NonTrainable(count) => non_trainable += count,
                TrainingParameters::NoTrainable => {}
            }
            lines.push(format!(
                "│ {:<31} │ {:<22} │ {:>13} │",
                format!("{} ({})", layer.name(), layer.layer_type()),
                layer.output_shape(),
                params.total()
            ));
        }

        lines.push(format!(
            "└{}┴{}┴{}┘",
            "─".repeat(col1_width),
            "─".repeat(col2_width),
            "─".repeat(col3_width)
        ));
        // f32 parameters, 4 bytes each
        let total = trainable + non_trainable;
        lines.push(format!(" Total params: {} ({} B)", total, total * 4));
        lines.push(format!(
            " Trainable params: {} ({} B)",
            trainable,
            trainable * 4
        ));
        lines.push(format!(
            " Non-trainable params: {} ({} B)",
            non_trainable,
            non_trainable * 4
        ));
        lines.join("\n")
    }

    /// Total number of parameters across all layers.
    pub fn count_params(&self) -> usize {
        self.layers.iter().map(|layer| layer.param_count().total()).sum()
    }

    /// Returns all the weights from each layer in the model, in layer order.
    pub fn get_weights(&self) -> Vec<LayerWeight<'_>> {
        self.layers.iter().map(|layer| layer.get_weights()).collect()
    }

    /// Architecture description of the current layer stack.
    pub fn spec(&self) -> ModelSpec {
        ModelSpec::new(
            self.input_dim(),
            self.layers.iter().map(|layer| layer.spec()).collect(),
        )
    }

    pub fn layers(&self) -> &[Box<dyn Layer>] {
        &self.layers
    }

    pub(crate) fn layers_mut(&mut self) -> &mut [Box<dyn Layer>] {
        &mut self.layers
    }

    /// Input width of the first layer, or 0 for an empty model.
    pub fn input_dim(&self) -> usize {
        self.layers.first().map_or(0, |layer| layer.input_dim())
    }

    /// Output width of the last layer, or 0 for an empty model.
    pub fn output_dim(&self) -> usize {
        self.layers.last().map_or(0, |layer| layer.output_dim())
    }

    pub fn training_config(&self) -> Option<&TrainingConfig> {
        self.training_config.as_ref()
    }

    /// Identifier of the compiled optimizer, if any.
    pub fn optimizer_identifier(&self) -> Option<&'static str> {
        self.optimizer.as_ref().map(|optimizer| optimizer.identifier())
    }

    /// Hyperparameters of the compiled optimizer, if any.
    pub fn optimizer_config(&self) -> Option<OptimizerConfig> {
        self.optimizer.as_ref().map(|optimizer| optimizer.config())
    }

    /// Number of optimizer steps taken since the model was built or loaded.
    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    pub(crate) fn set_iterations(&mut self, iterations: u64) {
        self.iterations = iterations;
    }
}

impl Default for Sequential {
    fn default() -> Self {
        Self::new()
    }
}
