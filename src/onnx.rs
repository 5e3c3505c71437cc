//! ONNX export of trained `Sequential` models.
//!
//! A model is first traced into its native graph (`Sequential::trace`), then converted:
//! variable reads are folded into initializers, `BiasAdd` becomes `Add`, linear
//! activations disappear and `MatMul + Add` pairs can optionally be fused into `Gemm`.
//! The result is encoded as an ONNX `ModelProto` without a protobuf code generator.
//!
//! # Example
//!
//! ```rust,no_run
//! use densex::prelude::*;
//! use densex::onnx::{self, ExportConfig};
//!
//! let mut ctx = ExecutionContext::with_seed(42);
//! let model = Sequential::build(&ModelSpec::reference(), &mut ctx).unwrap();
//!
//! let export = onnx::export_model(&model, &ExportConfig::default()).unwrap();
//! onnx::save_model(&export.model, "example.onnx").unwrap();
//!
//! let restored = onnx::load_model("example.onnx").unwrap();
//! assert_eq!(restored.op_count(), export.report.onnx_op_count);
//! ```

/// Native graph to ONNX conversion and file IO
pub mod converter;
/// In-memory ONNX model and its protobuf encoding
pub mod graph;
/// Supported operators and opset bookkeeping
pub mod ops;
pub(crate) mod proto;
mod runtime;

pub use converter::*;
pub use graph::*;
pub use ops::*;
