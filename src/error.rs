use thiserror::Error;

/// Error types that can occur during model operations
///
/// # Variants
///
/// - `NotFitted` - Indicates that the model has not been compiled or trained yet
/// - `InputValidationError` - indicates the input data provided does not meet the expected format, type, or validation rules
/// - `ProcessingError` - indicates that there is something wrong while processing
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error(
        "Model has not been compiled. Training and evaluation require an optimizer and a loss function."
    )]
    NotFitted,
    #[error("Input validation error: {0}")]
    InputValidationError(String),
    #[error("Processing error: {0}")]
    ProcessingError(String),
}

/// Input/Output error types that can occur during model serialization and file operations
///
/// # Variants
///
/// - `StdIoError` - Wraps standard I/O errors from file system operations (reading, writing, file access)
/// - `JsonError` - Wraps JSON serialization/deserialization errors when working with JSON data formats
/// - `ModelStructureMismatch` - The stored architecture and the stored weights disagree
/// - `Model` - Rebuilding the stored model failed validation
#[derive(Debug, Error)]
pub enum IoError {
    #[error("IO error: {0}")]
    StdIoError(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Model structure mismatch: {0}")]
    ModelStructureMismatch(String),
    #[error("Stored model is invalid: {0}")]
    Model(#[from] ModelError),
}

impl IoError {
    /// Opens `path` for buffered reading.
    pub fn load_in_buf_reader(
        path: impl AsRef<std::path::Path>,
    ) -> Result<std::io::BufReader<std::fs::File>, IoError> {
        let file = std::fs::File::open(path)?;
        Ok(std::io::BufReader::new(file))
    }
}

/// Errors raised while converting a model to ONNX or reading an ONNX file back.
///
/// # Variants
///
/// - `UnsupportedOperator` - An operator has no definition at the requested opset
/// - `InvalidGraph` - The graph is structurally broken (dangling tensor names, bad shapes)
/// - `Decode` - The protobuf payload could not be parsed
/// - `Io` - Reading or writing the file failed
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("operator `{op}` requires opset {since}, but the target opset is {target}")]
    UnsupportedOperator {
        op: String,
        since: i64,
        target: i64,
    },
    #[error("invalid graph: {0}")]
    InvalidGraph(String),
    #[error("failed to decode ONNX payload: {0}")]
    Decode(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error returned by the end-to-end pipeline, tagged with the stage that failed.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("stage 1 (build) failed: {0}")]
    Build(#[source] ModelError),
    #[error("stage 2 (train) failed: {0}")]
    Train(#[source] ModelError),
    #[error("stage 3 (native save) failed: {0}")]
    Save(#[source] IoError),
    #[error("stage 4 (onnx export) failed: {0}")]
    Export(#[source] ExportError),
    #[error("configuration error: {0}")]
    Config(#[source] IoError),
}
