//! Fixed-count repetition of an element field.

use crate::{
    errors::{DefinitionError, Error},
    field::{Codec, Field},
    settings::Settings,
    value::Value,
};

/// `count` consecutive elements, each laid out by `element`.
///
/// Element fields keep their own validator and endianness override; the
/// array's settings are what elements without an override see.
#[derive(Debug, Clone)]
pub struct Array {
    count: usize,
    element: Field,
}

impl Array {
    pub fn new(count: usize, element: Field) -> Self {
        Self { count, element }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn element(&self) -> &Field {
        &self.element
    }

    fn check_count(&self, actual: usize) -> Result<(), Error> {
        if actual != self.count {
            return Err(Error::ArrayLength {
                expected: self.count,
                actual,
            });
        }

        Ok(())
    }
}

impl Codec for Array {
    fn size(&self) -> usize {
        self.count * self.element.size()
    }

    fn default_value(&self) -> Value {
        Value::Array(
            (0..self.count)
                .map(|_| self.element.default_value())
                .collect(),
        )
    }

    fn encode(&self, value: &Value, settings: &Settings, out: &mut Vec<u8>) -> Result<(), Error> {
        match value {
            Value::Array(items) => {
                self.check_count(items.len())?;
                for item in items {
                    self.element.encode_into(item, settings, out)?;
                }
            }
            Value::Bytes(bytes) => {
                self.check_count(bytes.len())?;
                for byte in bytes {
                    self.element
                        .encode_into(&Value::Int(*byte as i128), settings, out)?;
                }
            }
            other => {
                return Err(Error::TypeMismatch {
                    expected: "array",
                    actual: other.kind_name(),
                });
            }
        }

        Ok(())
    }

    fn decode(&self, data: &[u8], settings: &Settings) -> Result<Value, Error> {
        if data.len() != self.size() {
            return Err(Error::LengthMismatch {
                expected: self.size(),
                actual: data.len(),
            });
        }

        let stride = self.element.size();
        let mut items = Vec::with_capacity(self.count);

        for i in 0..self.count {
            let offset = i * stride;
            items.push(self.element.decode(&data[offset..offset + stride], settings)?);
        }

        Ok(Value::Array(items))
    }

    fn check(&self, value: &Value) -> Result<(), Error> {
        match value {
            Value::Array(items) => {
                self.check_count(items.len())?;
                items.iter().try_for_each(|item| self.element.check(item))
            }
            Value::Bytes(bytes) => {
                self.check_count(bytes.len())?;
                bytes
                    .iter()
                    .try_for_each(|byte| self.element.check(&Value::Int(*byte as i128)))
            }
            other => Err(Error::TypeMismatch {
                expected: "array",
                actual: other.kind_name(),
            }),
        }
    }

    fn validate_inner(&self, value: &Value) -> Result<(), Error> {
        match value {
            Value::Array(items) => items
                .iter()
                .try_for_each(|item| self.element.validate_all(item)),
            Value::Bytes(bytes) => bytes
                .iter()
                .try_for_each(|byte| self.element.validate_all(&Value::Int(*byte as i128))),
            other => Err(Error::TypeMismatch {
                expected: "array",
                actual: other.kind_name(),
            }),
        }
    }

    fn verify(&self) -> Result<(), DefinitionError> {
        self.element.verify("[element]")
    }
}
