use super::graph::{OnnxModel, OnnxNode, OnnxTensor};
use super::ops::OnnxOp;
use crate::error::ExportError;
use crate::neural_network::Activation;
use ndarray::{Array2, ArrayView2};
use std::collections::HashMap;

/// Loads an initializer as a matrix; 1-D tensors become a single broadcastable row.
fn tensor_to_array2(tensor: &OnnxTensor) -> Result<Array2<f32>, ExportError> {
    let shape = match tensor.dims.as_slice() {
        [n] => (1, *n as usize),
        [rows, cols] => (*rows as usize, *cols as usize),
        dims => {
            return Err(ExportError::InvalidGraph(format!(
                "initializer `{}` has rank {}, only rank 1 and 2 are supported",
                tensor.name,
                dims.len()
            )));
        }
    };
    Array2::from_shape_vec(shape, tensor.data.clone()).map_err(|e| {
        ExportError::InvalidGraph(format!("initializer `{}`: {}", tensor.name, e))
    })
}

fn node_input<'v>(
    values: &'v HashMap<String, Array2<f32>>,
    node: &OnnxNode,
    index: usize,
) -> Result<&'v Array2<f32>, ExportError> {
    let name = node.inputs.get(index).ok_or_else(|| {
        ExportError::InvalidGraph(format!("node `{}` is missing input {}", node.name, index))
    })?;
    values.get(name).ok_or_else(|| {
        ExportError::InvalidGraph(format!(
            "node `{}` reads `{}` before it is produced",
            node.name, name
        ))
    })
}

fn broadcast_add(a: &Array2<f32>, b: &Array2<f32>, node: &OnnxNode) -> Result<Array2<f32>, ExportError> {
    if (b.nrows() != 1 && b.nrows() != a.nrows()) || b.ncols() != a.ncols() {
        return Err(ExportError::InvalidGraph(format!(
            "node `{}` cannot broadcast {:?} to {:?}",
            node.name,
            b.dim(),
            a.dim()
        )));
    }
    Ok(a + b)
}

fn matmul(a: &Array2<f32>, b: &Array2<f32>, node: &OnnxNode) -> Result<Array2<f32>, ExportError> {
    if a.ncols() != b.nrows() {
        return Err(ExportError::InvalidGraph(format!(
            "node `{}` multiplies {:?} by {:?}",
            node.name,
            a.dim(),
            b.dim()
        )));
    }
    Ok(a.dot(b))
}

fn eval_node(node: &OnnxNode, values: &HashMap<String, Array2<f32>>) -> Result<Array2<f32>, ExportError> {
    let x = node_input(values, node, 0)?;
    let out = match node.op {
        OnnxOp::MatMul => matmul(x, node_input(values, node, 1)?, node)?,
        OnnxOp::Add => broadcast_add(x, node_input(values, node, 1)?, node)?,
        OnnxOp::Gemm => {
            let a = if node.int_attribute("transA", 0) != 0 { x.t().to_owned() } else { x.clone() };
            let b = node_input(values, node, 1)?;
            let b = if node.int_attribute("transB", 0) != 0 { b.t().to_owned() } else { b.clone() };
            let alpha = node.float_attribute("alpha", 1.0);
            let beta = node.float_attribute("beta", 1.0);

            let mut product = matmul(&a, &b, node)?;
            if alpha != 1.0 {
                product.mapv_inplace(|v| v * alpha);
            }
            match node.inputs.get(2).filter(|name| !name.is_empty()) {
                Some(_) => {
                    let c = node_input(values, node, 2)?;
                    let c = if beta != 1.0 { c.mapv(|v| v * beta) } else { c.clone() };
                    broadcast_add(&product, &c, node)?
                }
                None => product,
            }
        }
        OnnxOp::Relu => Activation::apply_activation(x, &Activation::ReLU),
        OnnxOp::Sigmoid => Activation::apply_activation(x, &Activation::Sigmoid),
        OnnxOp::Tanh => Activation::apply_activation(x, &Activation::Tanh),
        OnnxOp::Softmax => {
            let axis = node.int_attribute("axis", 1);
            if axis != 1 && axis != -1 {
                return Err(ExportError::InvalidGraph(format!(
                    "node `{}` uses softmax axis {}, only the feature axis is supported",
                    node.name, axis
                )));
            }
            Activation::apply_activation(x, &Activation::Softmax)
        }
        OnnxOp::Identity => x.clone(),
    };
    Ok(out)
}

impl OnnxModel {
    /// Evaluates the graph on a batch of inputs.
    ///
    /// A reference evaluator for the operators in [`OnnxOp`], sharing the activation
    /// kernels of the native layers so that exported and native outputs can be compared.
    ///
    /// # Parameters
    ///
    /// * `input` - Matrix with shape (n_samples, input_dim)
    ///
    /// # Returns
    ///
    /// - `Ok(Array2<f32>)` - Values of the first graph output
    /// - `Err(ExportError::InvalidGraph)` - If the input does not fit or the graph is malformed
    pub fn run(&self, input: ArrayView2<f32>) -> Result<Array2<f32>, ExportError> {
        let graph = &self.graph;
        let graph_input = graph
            .inputs
            .first()
            .ok_or_else(|| ExportError::InvalidGraph("graph has no input".to_string()))?;
        let graph_output = graph
            .outputs
            .first()
            .ok_or_else(|| ExportError::InvalidGraph("graph has no output".to_string()))?;
        if let Some(width) = graph_input.width() {
            if input.ncols() != width {
                return Err(ExportError::InvalidGraph(format!(
                    "input `{}` expects {} features, got {}",
                    graph_input.name,
                    width,
                    input.ncols()
                )));
            }
        }

        let mut values: HashMap<String, Array2<f32>> = HashMap::new();
        for tensor in &graph.initializers {
            values.insert(tensor.name.clone(), tensor_to_array2(tensor)?);
        }
        values.insert(graph_input.name.clone(), input.to_owned());

        for node in &graph.nodes {
            let out = eval_node(node, &values)?;
            let name = node.outputs.first().ok_or_else(|| {
                ExportError::InvalidGraph(format!("node `{}` has no output", node.name))
            })?;
            values.insert(name.clone(), out);
        }

        values.remove(&graph_output.name).ok_or_else(|| {
            ExportError::InvalidGraph(format!(
                "graph output `{}` is never produced",
                graph_output.name
            ))
        })
    }
}
