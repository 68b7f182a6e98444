//! Primitive numeric codecs and explicit padding.

use crate::{
    bytes::{self, fits, sign_extend},
    errors::Error,
    field::Codec,
    settings::{ByteOrder, Settings},
    value::Value,
};

/// Width, signedness and representation of a primitive number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum ScalarKind {
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    /// IEEE 754 single precision.
    F32,
    /// IEEE 754 double precision.
    F64,
}

impl ScalarKind {
    pub fn size(self) -> usize {
        match self {
            ScalarKind::U8 | ScalarKind::I8 => 1,
            ScalarKind::U16 | ScalarKind::I16 => 2,
            ScalarKind::U32 | ScalarKind::I32 | ScalarKind::F32 => 4,
            ScalarKind::U64 | ScalarKind::I64 | ScalarKind::F64 => 8,
        }
    }

    pub fn is_signed(self) -> bool {
        matches!(
            self,
            ScalarKind::I8 | ScalarKind::I16 | ScalarKind::I32 | ScalarKind::I64
        )
    }

    pub fn is_float(self) -> bool {
        matches!(self, ScalarKind::F32 | ScalarKind::F64)
    }

    /// Inclusive range of an integer kind; `None` for floats.
    pub fn bounds(self) -> Option<(i128, i128)> {
        if self.is_float() {
            None
        } else {
            Some(bytes::int_bounds(self.size(), self.is_signed()))
        }
    }
}

/// Fixed-width integer or float, two's complement for signed integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scalar {
    kind: ScalarKind,
}

impl Scalar {
    pub fn new(kind: ScalarKind) -> Self {
        Self { kind }
    }

    pub fn kind(&self) -> ScalarKind {
        self.kind
    }

    /// Integer payload of `value`, checked against this width.
    fn int_of(&self, value: &Value) -> Result<i128, Error> {
        let v = value.as_int().ok_or(Error::TypeMismatch {
            expected: "integer",
            actual: value.kind_name(),
        })?;

        if !fits(v, self.kind.size(), self.kind.is_signed()) {
            return Err(Error::Overflow {
                value: v.to_string(),
                size: self.kind.size(),
            });
        }

        Ok(v)
    }

    /// Float payload of `value`, checked against this width.
    ///
    /// Integers must convert exactly; finite values must stay finite.
    fn float_of(&self, value: &Value) -> Result<f64, Error> {
        let overflow = |value: String| Error::Overflow {
            value,
            size: self.kind.size(),
        };

        let v = match value {
            Value::Float(v) => *v,
            Value::Int(i) => {
                let back = match self.kind {
                    ScalarKind::F32 => (*i as f32) as i128,
                    _ => (*i as f64) as i128,
                };
                // Float to int casts saturate at i128::MAX, which no float holds exactly.
                if back != *i || back == i128::MAX {
                    return Err(overflow(i.to_string()));
                }
                *i as f64
            }
            other => {
                return Err(Error::TypeMismatch {
                    expected: "float",
                    actual: other.kind_name(),
                });
            }
        };

        if self.kind == ScalarKind::F32 && v.is_finite() && (v as f32).is_infinite() {
            return Err(overflow(v.to_string()));
        }

        Ok(v)
    }

    pub(crate) fn write(&self, value: &Value, order: ByteOrder, out: &mut Vec<u8>) -> Result<(), Error> {
        match self.kind {
            ScalarKind::F32 => {
                let bits = (self.float_of(value)? as f32).to_bits();
                bytes::write_int(bits as i128, 4, order, out);
            }
            ScalarKind::F64 => {
                let bits = self.float_of(value)?.to_bits();
                bytes::write_int(bits as i128, 8, order, out);
            }
            _ => {
                let v = self.int_of(value)?;
                bytes::write_int(v, self.kind.size(), order, out);
            }
        }

        Ok(())
    }

    pub(crate) fn read(&self, data: &[u8], order: ByteOrder) -> Value {
        let raw = bytes::read_uint(data, order);

        match self.kind {
            ScalarKind::F32 => Value::Float(f32::from_bits(raw as u32) as f64),
            ScalarKind::F64 => Value::Float(f64::from_bits(raw)),
            kind if kind.is_signed() => Value::Int(sign_extend(raw, kind.size() * 8) as i128),
            _ => Value::Int(raw as i128),
        }
    }
}

impl Codec for Scalar {
    fn size(&self) -> usize {
        self.kind.size()
    }

    fn default_value(&self) -> Value {
        if self.kind.is_float() {
            Value::Float(0.0)
        } else {
            Value::Int(0)
        }
    }

    fn encode(&self, value: &Value, settings: &Settings, out: &mut Vec<u8>) -> Result<(), Error> {
        self.write(value, settings.byte_order(), out)
    }

    fn decode(&self, data: &[u8], settings: &Settings) -> Result<Value, Error> {
        Ok(self.read(data, settings.byte_order()))
    }

    fn check(&self, value: &Value) -> Result<(), Error> {
        if self.kind.is_float() {
            self.float_of(value).map(|_| ())
        } else {
            self.int_of(value).map(|_| ())
        }
    }
}

/// Explicit padding. Defaults to zero bytes; decoded bytes are kept as read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pad {
    size: usize,
}

impl Pad {
    pub fn new(size: usize) -> Self {
        Self { size }
    }
}

impl Codec for Pad {
    fn size(&self) -> usize {
        self.size
    }

    fn default_value(&self) -> Value {
        Value::Bytes(vec![0; self.size])
    }

    fn encode(&self, value: &Value, _settings: &Settings, out: &mut Vec<u8>) -> Result<(), Error> {
        self.check(value)?;
        out.extend_from_slice(value.as_bytes().unwrap_or_default());
        Ok(())
    }

    fn decode(&self, data: &[u8], _settings: &Settings) -> Result<Value, Error> {
        Ok(Value::Bytes(data.to_vec()))
    }

    fn check(&self, value: &Value) -> Result<(), Error> {
        match value {
            Value::Bytes(bytes) if bytes.len() == self.size => Ok(()),
            Value::Bytes(bytes) => Err(Error::ArrayLength {
                expected: self.size,
                actual: bytes.len(),
            }),
            other => Err(Error::TypeMismatch {
                expected: "bytes",
                actual: other.kind_name(),
            }),
        }
    }
}
