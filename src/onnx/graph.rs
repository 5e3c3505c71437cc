use super::ops::OnnxOp;
use super::proto::{FieldValue, ProtoReader, ProtoWriter};
use crate::error::ExportError;

/// `TensorProto.DataType.FLOAT`
pub const ELEM_TYPE_FLOAT: i32 = 1;

const ATTRIBUTE_TYPE_FLOAT: i64 = 1;
const ATTRIBUTE_TYPE_INT: i64 = 2;

/// One dimension of a value's shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dim {
    Value(i64),
    /// Symbolic dimension such as the batch size `N`
    Param(String),
}

/// Name, element type and shape of a graph input or output.
#[derive(Debug, Clone, PartialEq)]
pub struct OnnxValueInfo {
    pub name: String,
    pub elem_type: i32,
    pub dims: Vec<Dim>,
}

impl OnnxValueInfo {
    /// A float tensor of shape `[N, width]`.
    pub fn batched(name: impl Into<String>, width: usize) -> Self {
        Self {
            name: name.into(),
            elem_type: ELEM_TYPE_FLOAT,
            dims: vec![Dim::Param("N".to_string()), Dim::Value(width as i64)],
        }
    }

    /// Fixed width of the last dimension, if known.
    pub fn width(&self) -> Option<usize> {
        match self.dims.last() {
            Some(Dim::Value(v)) if *v >= 0 => Some(*v as usize),
            _ => None,
        }
    }
}

/// A float32 initializer; values are stored row-major and written as little-endian `raw_data`.
#[derive(Debug, Clone, PartialEq)]
pub struct OnnxTensor {
    pub name: String,
    pub dims: Vec<i64>,
    pub data: Vec<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AttributeValue {
    Float(f32),
    Int(i64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct OnnxAttribute {
    pub name: String,
    pub value: AttributeValue,
}

/// One operator application.
#[derive(Debug, Clone, PartialEq)]
pub struct OnnxNode {
    pub name: String,
    pub op: OnnxOp,
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
    pub attributes: Vec<OnnxAttribute>,
}

impl OnnxNode {
    pub fn new(name: impl Into<String>, op: OnnxOp, inputs: Vec<String>, output: String) -> Self {
        Self {
            name: name.into(),
            op,
            inputs,
            outputs: vec![output],
            attributes: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, name: &str, value: AttributeValue) -> Self {
        self.attributes.push(OnnxAttribute {
            name: name.to_string(),
            value,
        });
        self
    }

    pub fn attribute(&self, name: &str) -> Option<AttributeValue> {
        self.attributes
            .iter()
            .find(|attribute| attribute.name == name)
            .map(|attribute| attribute.value)
    }

    pub fn int_attribute(&self, name: &str, default: i64) -> i64 {
        match self.attribute(name) {
            Some(AttributeValue::Int(v)) => v,
            _ => default,
        }
    }

    pub fn float_attribute(&self, name: &str, default: f32) -> f32 {
        match self.attribute(name) {
            Some(AttributeValue::Float(v)) => v,
            _ => default,
        }
    }
}

/// Nodes in topological order together with their initializers and interface.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OnnxGraph {
    pub name: String,
    pub nodes: Vec<OnnxNode>,
    pub initializers: Vec<OnnxTensor>,
    pub inputs: Vec<OnnxValueInfo>,
    pub outputs: Vec<OnnxValueInfo>,
}

impl OnnxGraph {
    pub fn initializer(&self, name: &str) -> Option<&OnnxTensor> {
        self.initializers.iter().find(|tensor| tensor.name == name)
    }
}

/// An in-memory ONNX `ModelProto`.
///
/// # Fields
///
/// - `ir_version` - IR version of the file format
/// - `opset_version` - Version of the default operator set import
/// - `producer_name` - Tool that produced the model
/// - `producer_version` - Version of that tool
/// - `graph` - The computation graph
#[derive(Debug, Clone, PartialEq)]
pub struct OnnxModel {
    pub ir_version: i64,
    pub opset_version: i64,
    pub producer_name: String,
    pub producer_version: String,
    pub graph: OnnxGraph,
}

impl OnnxModel {
    pub fn op_count(&self) -> usize {
        self.graph.nodes.len()
    }

    /// Encodes the model in the ONNX protobuf binary format.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut w = ProtoWriter::new();
        w.int64(1, self.ir_version)
            .string(2, &self.producer_name)
            .string(3, &self.producer_version)
            .message(7, |g| encode_graph(g, &self.graph))
            .message(8, |opset| {
                opset.string(1, "").int64(2, self.opset_version);
            });
        w.into_bytes()
    }

    /// Decodes a `ModelProto` produced by [`OnnxModel::to_bytes`].
    ///
    /// Unknown fields are skipped. Operators outside [`OnnxOp`] and non-float tensors are
    /// rejected with `ExportError::Decode`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ExportError> {
        let mut model = OnnxModel {
            ir_version: 0,
            opset_version: 0,
            producer_name: String::new(),
            producer_version: String::new(),
            graph: OnnxGraph::default(),
        };
        let mut has_graph = false;

        let mut reader = ProtoReader::new(bytes);
        while let Some((field, value)) = reader.next_field()? {
            match field {
                1 => model.ir_version = value.as_i64("ModelProto.ir_version")?,
                2 => model.producer_name = value.as_string("ModelProto.producer_name")?,
                3 => model.producer_version = value.as_string("ModelProto.producer_version")?,
                7 => {
                    model.graph = decode_graph(value.as_bytes("ModelProto.graph")?)?;
                    has_graph = true;
                }
                8 => {
                    let (domain, version) =
                        decode_opset_import(value.as_bytes("ModelProto.opset_import")?)?;
                    if domain.is_empty() || domain == "ai.onnx" {
                        model.opset_version = version;
                    }
                }
                _ => {}
            }
        }

        if !has_graph {
            return Err(ExportError::Decode("model has no graph".to_string()));
        }
        Ok(model)
    }
}

fn encode_graph(w: &mut ProtoWriter, graph: &OnnxGraph) {
    for node in &graph.nodes {
        w.message(1, |n| encode_node(n, node));
    }
    w.string(2, &graph.name);
    for tensor in &graph.initializers {
        w.message(5, |t| encode_tensor(t, tensor));
    }
    for input in &graph.inputs {
        w.message(11, |v| encode_value_info(v, input));
    }
    for output in &graph.outputs {
        w.message(12, |v| encode_value_info(v, output));
    }
}

fn encode_node(w: &mut ProtoWriter, node: &OnnxNode) {
    for input in &node.inputs {
        w.string(1, input);
    }
    for output in &node.outputs {
        w.string(2, output);
    }
    w.string(3, &node.name).string(4, node.op.op_type());
    for attribute in &node.attributes {
        w.message(5, |a| {
            a.string(1, &attribute.name);
            match attribute.value {
                AttributeValue::Float(f) => {
                    a.float(2, f).int64(20, ATTRIBUTE_TYPE_FLOAT);
                }
                AttributeValue::Int(i) => {
                    a.int64(3, i).int64(20, ATTRIBUTE_TYPE_INT);
                }
            }
        });
    }
}

fn encode_tensor(w: &mut ProtoWriter, tensor: &OnnxTensor) {
    for &dim in &tensor.dims {
        w.int64(1, dim);
    }
    w.int64(2, ELEM_TYPE_FLOAT as i64).string(8, &tensor.name);
    let raw: Vec<u8> = tensor.data.iter().flat_map(|v| v.to_le_bytes()).collect();
    w.bytes(9, &raw);
}

fn encode_value_info(w: &mut ProtoWriter, info: &OnnxValueInfo) {
    w.string(1, &info.name).message(2, |type_proto| {
        type_proto.message(1, |tensor_type| {
            tensor_type.int64(1, info.elem_type as i64).message(2, |shape| {
                for dim in &info.dims {
                    shape.message(1, |d| match dim {
                        Dim::Value(v) => {
                            d.int64(1, *v);
                        }
                        Dim::Param(p) => {
                            d.string(2, p);
                        }
                    });
                }
            });
        });
    });
}

fn decode_opset_import(bytes: &[u8]) -> Result<(String, i64), ExportError> {
    let mut domain = String::new();
    let mut version = 0;
    let mut reader = ProtoReader::new(bytes);
    while let Some((field, value)) = reader.next_field()? {
        match field {
            1 => domain = value.as_string("OperatorSetIdProto.domain")?,
            2 => version = value.as_i64("OperatorSetIdProto.version")?,
            _ => {}
        }
    }
    Ok((domain, version))
}

fn decode_graph(bytes: &[u8]) -> Result<OnnxGraph, ExportError> {
    let mut graph = OnnxGraph::default();
    let mut reader = ProtoReader::new(bytes);
    while let Some((field, value)) = reader.next_field()? {
        match field {
            1 => graph.nodes.push(decode_node(value.as_bytes("GraphProto.node")?)?),
            2 => graph.name = value.as_string("GraphProto.name")?,
            5 => graph
                .initializers
                .push(decode_tensor(value.as_bytes("GraphProto.initializer")?)?),
            11 => graph
                .inputs
                .push(decode_value_info(value.as_bytes("GraphProto.input")?)?),
            12 => graph
                .outputs
                .push(decode_value_info(value.as_bytes("GraphProto.output")?)?),
            _ => {}
        }
    }
    Ok(graph)
}

fn decode_node(bytes: &[u8]) -> Result<OnnxNode, ExportError> {
    let mut name = String::new();
    let mut op_type = String::new();
    let mut inputs = Vec::new();
    let mut outputs = Vec::new();
    let mut attributes = Vec::new();

    let mut reader = ProtoReader::new(bytes);
    while let Some((field, value)) = reader.next_field()? {
        match field {
            1 => inputs.push(value.as_string("NodeProto.input")?),
            2 => outputs.push(value.as_string("NodeProto.output")?),
            3 => name = value.as_string("NodeProto.name")?,
            4 => op_type = value.as_string("NodeProto.op_type")?,
            5 => attributes.push(decode_attribute(value.as_bytes("NodeProto.attribute")?)?),
            _ => {}
        }
    }

    let op = OnnxOp::from_op_type(&op_type).ok_or_else(|| {
        ExportError::Decode(format!("node `{}` has unsupported op `{}`", name, op_type))
    })?;
    Ok(OnnxNode {
        name,
        op,
        inputs,
        outputs,
        attributes,
    })
}

fn decode_attribute(bytes: &[u8]) -> Result<OnnxAttribute, ExportError> {
    let mut name = String::new();
    let mut float = None;
    let mut int = None;
    let mut kind = 0;

    let mut reader = ProtoReader::new(bytes);
    while let Some((field, value)) = reader.next_field()? {
        match field {
            1 => name = value.as_string("AttributeProto.name")?,
            2 => float = Some(value.as_f32("AttributeProto.f")?),
            3 => int = Some(value.as_i64("AttributeProto.i")?),
            20 => kind = value.as_i64("AttributeProto.type")?,
            _ => {}
        }
    }

    let value = match (kind, float, int) {
        (ATTRIBUTE_TYPE_FLOAT, Some(f), _) => AttributeValue::Float(f),
        (ATTRIBUTE_TYPE_INT, _, Some(i)) => AttributeValue::Int(i),
        // older writers omit the type tag
        (0, Some(f), None) => AttributeValue::Float(f),
        (0, None, Some(i)) => AttributeValue::Int(i),
        _ => {
            return Err(ExportError::Decode(format!(
                "attribute `{}` has unsupported type {}",
                name, kind
            )));
        }
    };
    Ok(OnnxAttribute { name, value })
}

fn decode_tensor(bytes: &[u8]) -> Result<OnnxTensor, ExportError> {
    let mut name = String::new();
    let mut dims = Vec::new();
    let mut data_type = 0;
    let mut raw: Option<&[u8]> = None;
    let mut float_data = Vec::new();

    let mut reader = ProtoReader::new(bytes);
    while let Some((field, value)) = reader.next_field()? {
        match field {
            1 => value.push_i64s("TensorProto.dims", &mut dims)?,
            2 => data_type = value.as_i64("TensorProto.data_type")?,
            4 => match value {
                FieldValue::Fixed32(bits) => float_data.push(f32::from_bits(bits)),
                FieldValue::Bytes(packed) => float_data.extend(
                    packed
                        .chunks_exact(4)
                        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]])),
                ),
                _ => {
                    return Err(ExportError::Decode(
                        "TensorProto.float_data has an invalid encoding".to_string(),
                    ));
                }
            },
            8 => name = value.as_string("TensorProto.name")?,
            9 => raw = Some(value.as_bytes("TensorProto.raw_data")?),
            _ => {}
        }
    }

    if data_type != ELEM_TYPE_FLOAT as i64 {
        return Err(ExportError::Decode(format!(
            "tensor `{}` has data type {}, only float32 is supported",
            name, data_type
        )));
    }

    let data: Vec<f32> = match raw {
        Some(raw) => {
            if raw.len() % 4 != 0 {
                return Err(ExportError::Decode(format!(
                    "tensor `{}` raw_data length {} is not a multiple of 4",
                    name,
                    raw.len()
                )));
            }
            raw.chunks_exact(4)
                .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                .collect()
        }
        None => float_data,
    };

    let expected = dims
        .iter()
        .try_fold(1i64, |acc, &d| acc.checked_mul(d))
        .filter(|&n| n >= 0)
        .ok_or_else(|| {
            ExportError::Decode(format!("tensor `{}` has invalid dims {:?}", name, dims))
        })?;
    if data.len() as u64 != expected as u64 {
        return Err(ExportError::Decode(format!(
            "tensor `{}` has {} values for dims {:?}",
            name,
            data.len(),
            dims
        )));
    }

    Ok(OnnxTensor { name, dims, data })
}

fn decode_value_info(bytes: &[u8]) -> Result<OnnxValueInfo, ExportError> {
    let mut info = OnnxValueInfo {
        name: String::new(),
        elem_type: 0,
        dims: Vec::new(),
    };

    let mut reader = ProtoReader::new(bytes);
    while let Some((field, value)) = reader.next_field()? {
        match field {
            1 => info.name = value.as_string("ValueInfoProto.name")?,
            2 => decode_type(value.as_bytes("ValueInfoProto.type")?, &mut info)?,
            _ => {}
        }
    }
    Ok(info)
}

fn decode_type(bytes: &[u8], info: &mut OnnxValueInfo) -> Result<(), ExportError> {
    let mut reader = ProtoReader::new(bytes);
    while let Some((field, value)) = reader.next_field()? {
        if field != 1 {
            continue;
        }
        let mut tensor_type = ProtoReader::new(value.as_bytes("TypeProto.tensor_type")?);
        while let Some((field, value)) = tensor_type.next_field()? {
            match field {
                1 => info.elem_type = value.as_i64("TypeProto.Tensor.elem_type")? as i32,
                2 => {
                    let mut shape = ProtoReader::new(value.as_bytes("TypeProto.Tensor.shape")?);
                    while let Some((field, value)) = shape.next_field()? {
                        if field == 1 {
                            info.dims
                                .push(decode_dim(value.as_bytes("TensorShapeProto.dim")?)?);
                        }
                    }
                }
                _ => {}
            }
        }
    }
    Ok(())
}

fn decode_dim(bytes: &[u8]) -> Result<Dim, ExportError> {
    let mut dim = Dim::Param(String::new());
    let mut reader = ProtoReader::new(bytes);
    while let Some((field, value)) = reader.next_field()? {
        match field {
            1 => dim = Dim::Value(value.as_i64("Dimension.dim_value")?),
            2 => dim = Dim::Param(value.as_string("Dimension.dim_param")?),
            _ => {}
        }
    }
    Ok(dim)
}
