use super::graph::{
    AttributeValue, Dim, ELEM_TYPE_FLOAT, OnnxGraph, OnnxModel, OnnxNode, OnnxTensor, OnnxValueInfo,
};
use super::ops::{DEFAULT_OPSET, OnnxOp, ir_version_for_opset};
use crate::error::ExportError;
use crate::neural_network::{Activation, NativeGraph, NativeOpKind, Sequential};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Options of an ONNX export.
///
/// # Fields
///
/// - `target_opset` - Version of the default operator set written to the file
/// - `fuse_gemm` - Collapse each `MatMul` + bias `Add` pair into one `Gemm`
/// - `producer_name` - Value of `ModelProto.producer_name`
/// - `graph_name` - Value of `GraphProto.name`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub target_opset: i64,
    pub fuse_gemm: bool,
    pub producer_name: String,
    pub graph_name: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            target_opset: DEFAULT_OPSET,
            fuse_gemm: false,
            producer_name: env!("CARGO_PKG_NAME").to_string(),
            graph_name: "sequential".to_string(),
        }
    }
}

/// Operator counts before and after conversion.
///
/// # Fields
///
/// - `native_op_count` - Ops of the traced native graph, including variable reads
/// - `onnx_op_count` - Nodes of the exported graph
/// - `min_opset` - Smallest opset that defines every exported node
/// - `target_opset` - Opset written to the file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportReport {
    pub native_op_count: usize,
    pub onnx_op_count: usize,
    pub min_opset: i64,
    pub target_opset: i64,
}

/// Result of [`export_model`]: the ONNX model plus conversion statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct OnnxExport {
    pub model: OnnxModel,
    pub report: ExportReport,
}

/// Tracks which ONNX tensor a native tensor name resolves to.
struct Converter<'a> {
    native: &'a NativeGraph,
    aliases: HashMap<String, String>,
    initialized: Vec<bool>,
    graph: OnnxGraph,
}

impl<'a> Converter<'a> {
    fn new(native: &'a NativeGraph, graph_name: &str) -> Self {
        let mut aliases = HashMap::new();
        aliases.insert(native.input_name.clone(), native.input_name.clone());
        Self {
            native,
            aliases,
            initialized: vec![false; native.variables.len()],
            graph: OnnxGraph {
                name: graph_name.to_string(),
                inputs: vec![OnnxValueInfo::batched(
                    native.input_name.clone(),
                    native.input_dim,
                )],
                ..OnnxGraph::default()
            },
        }
    }

    fn resolve(&self, native_name: &str) -> Result<String, ExportError> {
        self.aliases.get(native_name).cloned().ok_or_else(|| {
            ExportError::InvalidGraph(format!("tensor `{}` is used before it is produced", native_name))
        })
    }

    fn resolve_inputs(&self, inputs: &[String], arity: usize, op: &str) -> Result<Vec<String>, ExportError> {
        if inputs.len() != arity {
            return Err(ExportError::InvalidGraph(format!(
                "op `{}` expects {} inputs, got {}",
                op,
                arity,
                inputs.len()
            )));
        }
        inputs.iter().map(|name| self.resolve(name)).collect()
    }

    /// Turns a variable read into a graph initializer.
    fn fold_variable(&mut self, index: usize, output: &str) -> Result<(), ExportError> {
        let variable = self.native.variable(index).ok_or_else(|| {
            ExportError::InvalidGraph(format!("variable index {} out of range", index))
        })?;
        if !self.initialized[index] {
            self.graph.initializers.push(OnnxTensor {
                name: variable.name.clone(),
                dims: variable.dims.iter().map(|&d| d as i64).collect(),
                data: variable.values.clone(),
            });
            self.initialized[index] = true;
        }
        self.aliases.insert(output.to_string(), variable.name.clone());
        Ok(())
    }

    fn emit(&mut self, node: OnnxNode) {
        for output in &node.outputs {
            self.aliases.insert(output.clone(), output.clone());
        }
        self.graph.nodes.push(node);
    }

    fn convert(mut self) -> Result<OnnxGraph, ExportError> {
        let native = self.native;
        for op in &native.ops {
            let onnx_op = match op.kind {
                NativeOpKind::ReadVariable(index) => {
                    self.fold_variable(index, &op.output)?;
                    continue;
                }
                NativeOpKind::MatMul => OnnxOp::MatMul,
                NativeOpKind::BiasAdd => OnnxOp::Add,
                NativeOpKind::Activation(activation) => match activation_op(activation) {
                    Some(onnx_op) => onnx_op,
                    None => {
                        let inputs = self.resolve_inputs(&op.inputs, 1, &op.name)?;
                        self.aliases.insert(op.output.clone(), inputs[0].clone());
                        continue;
                    }
                },
            };

            let arity = if onnx_op == OnnxOp::MatMul || onnx_op == OnnxOp::Add { 2 } else { 1 };
            let inputs = self.resolve_inputs(&op.inputs, arity, &op.name)?;
            let mut node = OnnxNode::new(&op.name, onnx_op, inputs, op.output.clone());
            if onnx_op == OnnxOp::Softmax {
                // feature axis of a [N, units] tensor under every opset
                node = node.with_attribute("axis", AttributeValue::Int(1));
            }
            self.emit(node);
        }

        let output = self.resolve(&self.native.output_name)?;
        if output == self.native.input_name {
            return Err(ExportError::InvalidGraph(
                "graph output is the graph input; the model has no operators".to_string(),
            ));
        }
        self.graph
            .outputs
            .push(OnnxValueInfo::batched(output, self.native.output_dim));
        Ok(self.graph)
    }
}

/// ONNX operator of an activation; `None` for the identity.
fn activation_op(activation: Activation) -> Option<OnnxOp> {
    match activation {
        Activation::Linear => None,
        Activation::ReLU => Some(OnnxOp::Relu),
        Activation::Sigmoid => Some(OnnxOp::Sigmoid),
        Activation::Tanh => Some(OnnxOp::Tanh),
        Activation::Softmax => Some(OnnxOp::Softmax),
    }
}

/// Collapses `MatMul(x, W)` followed by `Add(_, b)` into `Gemm(x, W, b)`.
///
/// A pair is fused only when `W` is a 2-D initializer, `b` a 1-D initializer and the
/// `MatMul` output feeds nothing but the `Add`.
fn fuse_gemm(graph: &mut OnnxGraph) -> usize {
    let mut fused = 0;
    let mut i = 0;
    while i + 1 < graph.nodes.len() {
        let (matmul, add) = (&graph.nodes[i], &graph.nodes[i + 1]);
        let matmul_out = &matmul.outputs[0];
        let fusable = matmul.op == OnnxOp::MatMul
            && add.op == OnnxOp::Add
            && add.inputs.first() == Some(matmul_out)
            && graph
                .initializer(&matmul.inputs[1])
                .is_some_and(|w| w.dims.len() == 2)
            && add
                .inputs
                .get(1)
                .and_then(|b| graph.initializer(b))
                .is_some_and(|b| b.dims.len() == 1)
            && graph
                .nodes
                .iter()
                .filter(|node| node.inputs.contains(matmul_out))
                .count()
                == 1
            && !graph.outputs.iter().any(|o| &o.name == matmul_out);

        if fusable {
            let name = match add.name.rsplit_once('/') {
                Some((scope, _)) => format!("{}/Gemm", scope),
                None => format!("{}_Gemm", add.name),
            };
            let gemm = OnnxNode::new(
                name,
                OnnxOp::Gemm,
                vec![
                    matmul.inputs[0].clone(),
                    matmul.inputs[1].clone(),
                    add.inputs[1].clone(),
                ],
                add.outputs[0].clone(),
            )
            .with_attribute("alpha", AttributeValue::Float(1.0))
            .with_attribute("beta", AttributeValue::Float(1.0));
            graph.nodes.splice(i..i + 2, [gemm]);
            fused += 1;
        }
        i += 1;
    }
    fused
}

/// IR versions below 4 require every initializer to also be declared as a graph input.
const IR_INITIALIZERS_OPTIONAL_AS_INPUTS: i64 = 4;

/// Appends one fixed-shape graph input per initializer, after the data input.
fn declare_initializers_as_inputs(graph: &mut OnnxGraph) {
    let declared: Vec<OnnxValueInfo> = graph
        .initializers
        .iter()
        .filter(|tensor| !graph.inputs.iter().any(|input| input.name == tensor.name))
        .map(|tensor| OnnxValueInfo {
            name: tensor.name.clone(),
            elem_type: ELEM_TYPE_FLOAT,
            dims: tensor.dims.iter().map(|&d| Dim::Value(d)).collect(),
        })
        .collect();
    graph.inputs.extend(declared);
}

fn check_opset(graph: &OnnxGraph, target: i64) -> Result<i64, ExportError> {
    let mut min_opset = 1;
    for node in &graph.nodes {
        let since = node.op.since_version();
        if since > target {
            return Err(ExportError::UnsupportedOperator {
                op: node.op.op_type().to_string(),
                since,
                target,
            });
        }
        min_opset = min_opset.max(since);
    }
    Ok(min_opset)
}

/// Converts a traced native graph into an ONNX model.
///
/// Variable reads become initializers, `BiasAdd` becomes `Add`, linear activations are
/// dropped and the remaining activations map one to one.
///
/// Targets whose IR version is below 4 (opset 8 and older) also list every initializer
/// in `graph.input`, after the data input.
///
/// # Returns
///
/// - `Ok(OnnxExport)` - The model and its operator counts
/// - `Err(ExportError::UnsupportedOperator)` - If a node needs a newer opset than the target
/// - `Err(ExportError::InvalidGraph)` - If the native graph is malformed
pub fn convert_graph(native: &NativeGraph, config: &ExportConfig) -> Result<OnnxExport, ExportError> {
    if config.target_opset < 1 {
        return Err(ExportError::InvalidGraph(format!(
            "target opset must be at least 1, got {}",
            config.target_opset
        )));
    }

    let mut graph = Converter::new(native, &config.graph_name).convert()?;
    log::debug!(
        "converted {} native ops into {} ONNX nodes",
        native.op_count(),
        graph.nodes.len()
    );
    if config.fuse_gemm {
        let fused = fuse_gemm(&mut graph);
        log::debug!("fused {} MatMul/Add pairs into Gemm", fused);
    }
    let min_opset = check_opset(&graph, config.target_opset)?;
    let ir_version = ir_version_for_opset(config.target_opset);
    if ir_version < IR_INITIALIZERS_OPTIONAL_AS_INPUTS {
        declare_initializers_as_inputs(&mut graph);
    }

    let report = ExportReport {
        native_op_count: native.op_count(),
        onnx_op_count: graph.nodes.len(),
        min_opset,
        target_opset: config.target_opset,
    };
    let model = OnnxModel {
        ir_version,
        opset_version: config.target_opset,
        producer_name: config.producer_name.clone(),
        producer_version: env!("CARGO_PKG_VERSION").to_string(),
        graph,
    };
    Ok(OnnxExport { model, report })
}

/// Traces `model` and converts it to ONNX.
///
/// # Example
/// ```rust
/// use densex::prelude::*;
/// use densex::onnx::{ExportConfig, export_model};
///
/// let mut ctx = ExecutionContext::with_seed(1);
/// let model = Sequential::build(&ModelSpec::reference(), &mut ctx).unwrap();
///
/// let export = export_model(&model, &ExportConfig::default()).unwrap();
/// assert_eq!(export.report.native_op_count, 10);
/// assert_eq!(export.report.onnx_op_count, 6);
/// ```
pub fn export_model(model: &Sequential, config: &ExportConfig) -> Result<OnnxExport, ExportError> {
    let native = model
        .trace()
        .map_err(|e| ExportError::InvalidGraph(e.to_string()))?;
    let export = convert_graph(&native, config)?;
    log::info!(
        "exported ONNX graph: {} native ops -> {} ONNX ops, min opset {}, target opset {}",
        export.report.native_op_count,
        export.report.onnx_op_count,
        export.report.min_opset,
        export.report.target_opset
    );
    Ok(export)
}

/// Writes the encoded model to `path`, replacing any existing file.
pub fn save_model(model: &OnnxModel, path: impl AsRef<Path>) -> Result<(), ExportError> {
    let path = path.as_ref();
    let bytes = model.to_bytes();
    fs::write(path, &bytes)?;
    log::info!("wrote {} bytes of ONNX to {}", bytes.len(), path.display());
    Ok(())
}

/// Reads and decodes an ONNX file written by [`save_model`].
pub fn load_model(path: impl AsRef<Path>) -> Result<OnnxModel, ExportError> {
    let bytes = fs::read(path)?;
    OnnxModel::from_bytes(&bytes)
}
