/// Opset used when an export does not request one
pub const DEFAULT_OPSET: i64 = 13;

/// ONNX operators the exporter can emit and the reference evaluator can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OnnxOp {
    MatMul,
    Add,
    Gemm,
    Relu,
    Sigmoid,
    Tanh,
    Softmax,
    Identity,
}

impl OnnxOp {
    pub fn op_type(&self) -> &'static str {
        match self {
            OnnxOp::MatMul => "MatMul",
            OnnxOp::Add => "Add",
            OnnxOp::Gemm => "Gemm",
            OnnxOp::Relu => "Relu",
            OnnxOp::Sigmoid => "Sigmoid",
            OnnxOp::Tanh => "Tanh",
            OnnxOp::Softmax => "Softmax",
            OnnxOp::Identity => "Identity",
        }
    }

    pub fn from_op_type(op_type: &str) -> Option<Self> {
        let op = match op_type {
            "MatMul" => OnnxOp::MatMul,
            "Add" => OnnxOp::Add,
            "Gemm" => OnnxOp::Gemm,
            "Relu" => OnnxOp::Relu,
            "Sigmoid" => OnnxOp::Sigmoid,
            "Tanh" => OnnxOp::Tanh,
            "Softmax" => OnnxOp::Softmax,
            "Identity" => OnnxOp::Identity,
            _ => return None,
        };
        Some(op)
    }

    /// Earliest opset whose definition of the operator has the semantics the exporter relies on.
    ///
    /// `Add` and `Gemm` need multidirectional broadcasting (opset 7); the activations
    /// dropped their legacy `consumed_inputs` attribute in opset 6.
    pub fn since_version(&self) -> i64 {
        match self {
            OnnxOp::MatMul | OnnxOp::Softmax | OnnxOp::Identity => 1,
            OnnxOp::Relu | OnnxOp::Sigmoid | OnnxOp::Tanh => 6,
            OnnxOp::Add | OnnxOp::Gemm => 7,
        }
    }
}

/// IR version matching a default-domain opset, following the ONNX release table.
///
/// # Example
/// ```rust
/// use densex::onnx::ir_version_for_opset;
///
/// assert_eq!(ir_version_for_opset(13), 7);
/// assert_eq!(ir_version_for_opset(8), 3);
/// ```
pub fn ir_version_for_opset(opset: i64) -> i64 {
    match opset {
        ..=8 => 3,
        9 => 4,
        10 => 5,
        11 => 6,
        12..=14 => 7,
        15..=18 => 8,
        19..=20 => 9,
        21..=22 => 10,
        _ => 11,
    }
}
