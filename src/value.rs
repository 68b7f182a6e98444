//! Dynamic values held by record fields.

use crate::{errors::Error, record::Record};

/// A value stored in, encoded from, or decoded into a record field.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Any integer up to 64 bits wide, signed or unsigned.
    Int(i128),
    Float(f64),
    /// Raw bytes (padding, or the items of an 8-bit array).
    Bytes(Vec<u8>),
    Array(Vec<Value>),
    Record(Record),
    /// An enum member, resolved to its integer when encoded.
    Member(Member),
    /// An enum member referenced by name, resolved when encoded.
    Name(String),
}

/// A named constant of an [crate::enumeration::EnumDomain].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Member {
    pub name: String,
    pub value: i128,
}

impl Value {
    /// Short name of the variant, used in type mismatch errors.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Bytes(_) => "bytes",
            Value::Array(_) => "array",
            Value::Record(_) => "record",
            Value::Member(_) => "enum member",
            Value::Name(_) => "enum name",
        }
    }

    /// Integer view of the value. Enum members yield their numeric value.
    pub fn as_int(&self) -> Option<i128> {
        match self {
            Value::Int(v) => Some(*v),
            Value::Member(m) => Some(m.value),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_record_mut(&mut self) -> Option<&mut Record> {
        match self {
            Value::Record(r) => Some(r),
            _ => None,
        }
    }

    /// Number of elements of an array or byte value.
    pub fn element_count(&self) -> Option<usize> {
        match self {
            Value::Array(items) => Some(items.len()),
            Value::Bytes(b) => Some(b.len()),
            _ => None,
        }
    }

    /// Returns a copy of the element at `index`. Byte values yield [Value::Int].
    pub fn get_index(&self, index: usize) -> Result<Value, Error> {
        match self {
            Value::Array(items) => items.get(index).cloned().ok_or(Error::IndexOutOfBounds {
                index,
                len: items.len(),
            }),
            Value::Bytes(b) => b
                .get(index)
                .map(|byte| Value::Int(*byte as i128))
                .ok_or(Error::IndexOutOfBounds {
                    index,
                    len: b.len(),
                }),
            _ => Err(Error::TypeMismatch {
                expected: "array",
                actual: self.kind_name(),
            }),
        }
    }

    /// Replaces the element at `index`. Fails at once if `index` is past the end.
    pub fn set_index(&mut self, index: usize, value: Value) -> Result<(), Error> {
        let actual = self.kind_name();
        match self {
            Value::Array(items) => {
                let len = items.len();
                let slot = items
                    .get_mut(index)
                    .ok_or(Error::IndexOutOfBounds { index, len })?;
                *slot = value;
                Ok(())
            }
            Value::Bytes(bytes) => {
                let len = bytes.len();
                let slot = bytes
                    .get_mut(index)
                    .ok_or(Error::IndexOutOfBounds { index, len })?;
                let byte = value.as_int().ok_or(Error::TypeMismatch {
                    expected: "integer",
                    actual: value.kind_name(),
                })?;
                *slot = u8::try_from(byte).map_err(|_| Error::Overflow {
                    value: byte.to_string(),
                    size: 1,
                })?;
                Ok(())
            }
            _ => Err(Error::TypeMismatch {
                expected: "array",
                actual,
            }),
        }
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(value: $t) -> Self {
                    Value::Int(value as i128)
                }
            }
        )*
    };
}

impl_from_int!(u8, u16, u32, u64, i8, i16, i32, i64, i128, usize);

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Float(value as f64)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Bytes(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::Array(value)
    }
}

impl From<Record> for Value {
    fn from(value: Record) -> Self {
        Value::Record(value)
    }
}

impl From<Member> for Value {
    fn from(value: Member) -> Self {
        Value::Member(value)
    }
}

impl From<&Member> for Value {
    fn from(value: &Member) -> Self {
        Value::Member(value.clone())
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Name(value.to_string())
    }
}
