use crate::neural_network::Activation;

/// A trained variable captured while tracing a model.
///
/// # Fields
///
/// - `name` - Variable name, e.g. `dense_1/kernel`
/// - `dims` - Shape of the variable
/// - `values` - Values in row-major order
#[derive(Debug, Clone, PartialEq)]
pub struct NativeVariable {
    pub name: String,
    pub dims: Vec<usize>,
    pub values: Vec<f32>,
}

/// Primitive operations a traced model is made of.
///
/// # Variants
///
/// - `ReadVariable` - Reads the variable at the given index of `NativeGraph::variables`
/// - `MatMul` - Matrix product of the two inputs
/// - `BiasAdd` - Adds a 1-D bias to every row of the first input
/// - `Activation` - Element-wise (or row-wise, for softmax) activation
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NativeOpKind {
    ReadVariable(usize),
    MatMul,
    BiasAdd,
    Activation(Activation),
}

impl NativeOpKind {
    /// Operation type name as it appears in the traced graph.
    pub fn op_type(&self) -> &'static str {
        match self {
            NativeOpKind::ReadVariable(_) => "ReadVariableOp",
            NativeOpKind::MatMul => "MatMul",
            NativeOpKind::BiasAdd => "BiasAdd",
            NativeOpKind::Activation(activation) => match activation {
                Activation::Linear => "Identity",
                Activation::ReLU => "Relu",
                Activation::Sigmoid => "Sigmoid",
                Activation::Tanh => "Tanh",
                Activation::Softmax => "Softmax",
            },
        }
    }
}

/// One node of the traced graph. Every op produces exactly one tensor named `"{name}:0"`.
#[derive(Debug, Clone, PartialEq)]
pub struct NativeOp {
    pub name: String,
    pub kind: NativeOpKind,
    pub inputs: Vec<String>,
    pub output: String,
}

/// Computation graph of a `Sequential` model, produced by `Sequential::trace`.
///
/// Ops are stored in execution order. The graph is the source the ONNX converter works
/// from, so its operator count is the "before" number of the export.
#[derive(Debug, Clone, PartialEq)]
pub struct NativeGraph {
    pub input_name: String,
    pub input_dim: usize,
    pub variables: Vec<NativeVariable>,
    pub ops: Vec<NativeOp>,
    pub output_name: String,
    pub output_dim: usize,
}

impl NativeGraph {
    /// Creates an empty graph with a single `[None, input_dim]` input.
    pub fn new(input_name: impl Into<String>, input_dim: usize) -> Self {
        let input_name = input_name.into();
        Self {
            output_name: input_name.clone(),
            output_dim: input_dim,
            input_name,
            input_dim,
            variables: Vec::new(),
            ops: Vec::new(),
        }
    }

    /// Registers a variable and returns its index.
    pub fn add_variable(&mut self, name: String, dims: Vec<usize>, values: Vec<f32>) -> usize {
        self.variables.push(NativeVariable { name, dims, values });
        self.variables.len() - 1
    }

    /// Appends an op and returns the name of the tensor it produces.
    pub fn add_op(&mut self, name: String, kind: NativeOpKind, inputs: Vec<String>) -> String {
        let output = format!("{}:0", name);
        self.ops.push(NativeOp {
            name,
            kind,
            inputs,
            output: output.clone(),
        });
        output
    }

    /// Marks the tensor `name` of width `dim` as the graph output.
    pub fn set_output(&mut self, name: String, dim: usize) {
        self.output_name = name;
        self.output_dim = dim;
    }

    pub fn op_count(&self) -> usize {
        self.ops.len()
    }

    pub fn variable(&self, index: usize) -> Option<&NativeVariable> {
        self.variables.get(index)
    }
}
