use crate::error::ExportError;

/// Protobuf wire types used by the ONNX schema
pub(crate) const WIRE_VARINT: u32 = 0;
pub(crate) const WIRE_FIXED64: u32 = 1;
pub(crate) const WIRE_LEN: u32 = 2;
pub(crate) const WIRE_FIXED32: u32 = 5;

/// Appends `value` as a base-128 varint.
pub(crate) fn encode_varint(mut value: u64, buf: &mut Vec<u8>) {
    while value >= 0x80 {
        buf.push((value as u8 & 0x7f) | 0x80);
        value >>= 7;
    }
    buf.push(value as u8);
}

/// Minimal protobuf message writer.
///
/// Fields are appended in call order; nested messages are built with a separate writer
/// and embedded as length-delimited fields.
#[derive(Debug, Default)]
pub(crate) struct ProtoWriter {
    buf: Vec<u8>,
}

impl ProtoWriter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn key(&mut self, field: u32, wire_type: u32) {
        encode_varint(((field << 3) | wire_type) as u64, &mut self.buf);
    }

    pub(crate) fn varint(&mut self, field: u32, value: u64) -> &mut Self {
        self.key(field, WIRE_VARINT);
        encode_varint(value, &mut self.buf);
        self
    }

    /// int32/int64 fields; negative values use the ten-byte two's complement form.
    pub(crate) fn int64(&mut self, field: u32, value: i64) -> &mut Self {
        self.varint(field, value as u64)
    }

    pub(crate) fn float(&mut self, field: u32, value: f32) -> &mut Self {
        self.key(field, WIRE_FIXED32);
        self.buf.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub(crate) fn bytes(&mut self, field: u32, value: &[u8]) -> &mut Self {
        self.key(field, WIRE_LEN);
        encode_varint(value.len() as u64, &mut self.buf);
        self.buf.extend_from_slice(value);
        self
    }

    pub(crate) fn string(&mut self, field: u32, value: &str) -> &mut Self {
        self.bytes(field, value.as_bytes())
    }

    /// Embeds a nested message built by `build`.
    pub(crate) fn message<F>(&mut self, field: u32, build: F) -> &mut Self
    where
        F: FnOnce(&mut ProtoWriter),
    {
        let mut nested = ProtoWriter::new();
        build(&mut nested);
        self.bytes(field, &nested.buf)
    }

    pub(crate) fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// A decoded field payload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum FieldValue<'a> {
    Varint(u64),
    Fixed64(u64),
    Bytes(&'a [u8]),
    Fixed32(u32),
}

impl<'a> FieldValue<'a> {
    pub(crate) fn as_i64(&self, field: &str) -> Result<i64, ExportError> {
        match self {
            FieldValue::Varint(v) => Ok(*v as i64),
            other => Err(wrong_type(field, "varint", other)),
        }
    }

    pub(crate) fn as_f32(&self, field: &str) -> Result<f32, ExportError> {
        match self {
            FieldValue::Fixed32(bits) => Ok(f32::from_bits(*bits)),
            other => Err(wrong_type(field, "fixed32", other)),
        }
    }

    pub(crate) fn as_bytes(&self, field: &str) -> Result<&'a [u8], ExportError> {
        match self {
            FieldValue::Bytes(bytes) => Ok(bytes),
            other => Err(wrong_type(field, "length-delimited", other)),
        }
    }

    pub(crate) fn as_string(&self, field: &str) -> Result<String, ExportError> {
        let bytes = self.as_bytes(field)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| ExportError::Decode(format!("{} is not valid UTF-8: {}", field, e)))
    }

    /// Repeated int64 values, accepting both the unpacked and the packed encoding.
    pub(crate) fn push_i64s(&self, field: &str, out: &mut Vec<i64>) -> Result<(), ExportError> {
        match self {
            FieldValue::Varint(v) => out.push(*v as i64),
            FieldValue::Bytes(bytes) => {
                let mut reader = ProtoReader::new(bytes);
                while !reader.is_empty() {
                    out.push(reader.read_varint()? as i64);
                }
            }
            other => return Err(wrong_type(field, "varint", other)),
        }
        Ok(())
    }
}

fn wrong_type(field: &str, expected: &str, got: &FieldValue) -> ExportError {
    ExportError::Decode(format!(
        "field {} expected {} encoding, got {:?}",
        field, expected, got
    ))
}

/// Sequential reader over the fields of one protobuf message.
pub(crate) struct ProtoReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ProtoReader<'a> {
    pub(crate) fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.pos >= self.buf.len()
    }

    pub(crate) fn read_varint(&mut self) -> Result<u64, ExportError> {
        let mut value = 0u64;
        for shift in (0..64).step_by(7) {
            let byte = *self
                .buf
                .get(self.pos)
                .ok_or_else(|| ExportError::Decode("truncated varint".to_string()))?;
            self.pos += 1;
            value |= ((byte & 0x7f) as u64) << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(ExportError::Decode("varint longer than 10 bytes".to_string()))
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], ExportError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.buf.len())
            .ok_or_else(|| {
                ExportError::Decode(format!(
                    "field of {} bytes at offset {} exceeds message length {}",
                    len,
                    self.pos,
                    self.buf.len()
                ))
            })?;
        let slice = &self.buf[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    /// Reads the next `(field number, value)` pair, or `None` at the end of the message.
    pub(crate) fn next_field(&mut self) -> Result<Option<(u32, FieldValue<'a>)>, ExportError> {
        if self.is_empty() {
            return Ok(None);
        }
        let key = self.read_varint()?;
        let field = (key >> 3) as u32;
        let value = match (key & 0x7) as u32 {
            WIRE_VARINT => FieldValue::Varint(self.read_varint()?),
            WIRE_FIXED64 => {
                let bytes = self.take(8)?;
                let mut raw = [0u8; 8];
                raw.copy_from_slice(bytes);
                FieldValue::Fixed64(u64::from_le_bytes(raw))
            }
            WIRE_LEN => {
                let len = self.read_varint()? as usize;
                FieldValue::Bytes(self.take(len)?)
            }
            WIRE_FIXED32 => {
                let bytes = self.take(4)?;
                let mut raw = [0u8; 4];
                raw.copy_from_slice(bytes);
                FieldValue::Fixed32(u32::from_le_bytes(raw))
            }
            other => {
                return Err(ExportError::Decode(format!(
                    "unsupported wire type {} for field {}",
                    other, field
                )));
            }
        };
        Ok(Some((field, value)))
    }
}
