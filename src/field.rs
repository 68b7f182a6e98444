//! Field descriptors: the unit of memory layout in a record.
//!
//! A [Field] wraps a [Codec] (the byte layout of one kind of value) with the
//! parts every field shares: an optional default override, an optional
//! [Validator] and an optional endianness override. Fields are immutable once
//! built and cheap to clone; a record type shares them across all of its
//! instances.
//!
//! New primitive or composite field types are added by implementing [Codec]
//! and wrapping the implementation with [Field::new].

use std::{borrow::Cow, fmt, sync::Arc};

use crate::{
    array::Array,
    enumeration::{EnumDomain, Enumerated},
    errors::{DefinitionError, Error},
    record::{Nested, RecordType},
    scalar::{Pad, Scalar, ScalarKind},
    settings::{Endian, Settings},
    validator::Validator,
    value::Value,
};

/// Byte layout of one kind of field value.
///
/// Implementations only deal with representation. Validation, endianness
/// overrides and input length checks are done by [Field] around these calls.
pub trait Codec: fmt::Debug + Send + Sync {
    /// Encoded size in bytes. Must never change.
    fn size(&self) -> usize;

    /// Value of a freshly constructed field. Must be encodable.
    fn default_value(&self) -> Value;

    /// Appends exactly [Codec::size] bytes for `value` to `out`.
    fn encode(&self, value: &Value, settings: &Settings, out: &mut Vec<u8>) -> Result<(), Error>;

    /// Decodes a slice of exactly [Codec::size] bytes.
    fn decode(&self, data: &[u8], settings: &Settings) -> Result<Value, Error>;

    /// Maps alternative spellings of a value (e.g. enum names) to the value validators see.
    fn resolve<'a>(&self, value: &'a Value) -> Result<Cow<'a, Value>, Error> {
        Ok(Cow::Borrowed(value))
    }

    /// Checks that `value` can be stored in this field, without encoding it.
    fn check(&self, value: &Value) -> Result<(), Error>;

    /// Runs the validators of inner fields (array elements, nested record fields) on `value`.
    fn validate_inner(&self, _value: &Value) -> Result<(), Error> {
        Ok(())
    }

    /// Checks the codec's own parameters when a record type is built.
    fn verify(&self) -> Result<(), DefinitionError> {
        Ok(())
    }
}

/// A field descriptor: size, default, encoding, optional validator and endianness.
#[derive(Clone)]
pub struct Field {
    codec: Arc<dyn Codec>,
    default: Option<Value>,
    validator: Option<Arc<dyn Validator>>,
    endian: Option<Endian>,
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("codec", &self.codec)
            .field("default", &self.default)
            .field("validated", &self.validator.is_some())
            .field("endian", &self.endian)
            .finish()
    }
}

impl Field {
    pub fn new(codec: impl Codec + 'static) -> Self {
        Self {
            codec: Arc::new(codec),
            default: None,
            validator: None,
            endian: None,
        }
    }

    pub fn scalar(kind: ScalarKind) -> Self {
        Self::new(Scalar::new(kind))
    }

    pub fn u8() -> Self {
        Self::scalar(ScalarKind::U8)
    }

    pub fn u16() -> Self {
        Self::scalar(ScalarKind::U16)
    }

    pub fn u32() -> Self {
        Self::scalar(ScalarKind::U32)
    }

    pub fn u64() -> Self {
        Self::scalar(ScalarKind::U64)
    }

    pub fn i8() -> Self {
        Self::scalar(ScalarKind::I8)
    }

    pub fn i16() -> Self {
        Self::scalar(ScalarKind::I16)
    }

    pub fn i32() -> Self {
        Self::scalar(ScalarKind::I32)
    }

    pub fn i64() -> Self {
        Self::scalar(ScalarKind::I64)
    }

    pub fn f32() -> Self {
        Self::scalar(ScalarKind::F32)
    }

    pub fn f64() -> Self {
        Self::scalar(ScalarKind::F64)
    }

    /// Explicit padding of `size` zero bytes.
    pub fn pad(size: usize) -> Self {
        Self::new(Pad::new(size))
    }

    /// `count` consecutive elements laid out by `element`.
    pub fn array(count: usize, element: Field) -> Self {
        Self::new(Array::new(count, element))
    }

    /// Enumerated field backed by a 4-byte unsigned integer.
    pub fn enumeration(domain: &EnumDomain) -> Self {
        Self::enumeration_with(domain, ScalarKind::U32)
    }

    pub fn enumeration_with(domain: &EnumDomain, backing: ScalarKind) -> Self {
        Self::new(Enumerated::new(domain.clone(), backing))
    }

    /// Nested record field whose default is a default-constructed instance.
    pub fn record(record_type: &RecordType) -> Self {
        Self::new(Nested::new(record_type.instantiate()))
    }

    /// Replaces the codec's default value.
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn with_validator(mut self, validator: impl Validator + 'static) -> Self {
        self.validator = Some(Arc::new(validator));
        self
    }

    /// Fixes the byte order of this field regardless of the active settings.
    pub fn with_endian(mut self, endian: Endian) -> Self {
        self.endian = Some(endian);
        self
    }

    pub fn codec(&self) -> &dyn Codec {
        self.codec.as_ref()
    }

    pub fn endian(&self) -> Option<Endian> {
        self.endian
    }

    pub fn size(&self) -> usize {
        self.codec.size()
    }

    pub fn default_value(&self) -> Value {
        match &self.default {
            Some(value) => value.clone(),
            None => self.codec.default_value(),
        }
    }

    /// Runs the validator (if any) on `value`, regardless of the active settings.
    pub fn validate(&self, value: &Value) -> bool {
        self.codec
            .resolve(value)
            .is_ok_and(|value| self.passes(&value))
    }

    /// Runs this field's validator and those of every inner field, regardless of the active settings.
    pub fn validate_all(&self, value: &Value) -> Result<(), Error> {
        let resolved = self.codec.resolve(value)?;
        if !self.passes(&resolved) {
            return Err(Error::Validation(format!("{resolved:?}")));
        }

        self.codec.validate_inner(&resolved)
    }

    /// Settings as seen by this field: `base` with the endianness override applied.
    pub fn settings(&self, base: &Settings) -> Settings {
        match self.endian {
            Some(endian) => base.with_endian(endian),
            None => *base,
        }
    }

    /// Checks that `value` can be assigned to this field.
    pub fn check(&self, value: &Value) -> Result<(), Error> {
        self.codec.check(value)
    }

    pub fn encode(&self, value: &Value, settings: &Settings) -> Result<Vec<u8>, Error> {
        let mut out = Vec::with_capacity(self.size());
        self.encode_into(value, settings, &mut out)?;
        Ok(out)
    }

    /// Appends the encoding of `value` to `out`.
    ///
    /// On error `out` may hold a partial field; callers discard it.
    pub fn encode_into(
        &self,
        value: &Value,
        settings: &Settings,
        out: &mut Vec<u8>,
    ) -> Result<(), Error> {
        let settings = self.settings(settings);
        let value = self.codec.resolve(value)?;

        if settings.validate && !self.passes(&value) {
            return Err(Error::Validation(format!("{value:?}")));
        }

        let start = out.len();
        self.codec.encode(&value, &settings, out)?;
        debug_assert_eq!(out.len() - start, self.size());

        Ok(())
    }

    pub fn decode(&self, data: &[u8], settings: &Settings) -> Result<Value, Error> {
        if data.len() != self.size() {
            return Err(Error::LengthMismatch {
                expected: self.size(),
                actual: data.len(),
            });
        }

        let settings = self.settings(settings);
        let value = self.codec.decode(data, &settings)?;

        if settings.validate && !self.passes(&value) {
            return Err(Error::Validation(format!("{value:?}")));
        }

        Ok(value)
    }

    fn passes(&self, resolved: &Value) -> bool {
        self.validator
            .as_ref()
            .is_none_or(|validator| validator.validate(resolved))
    }

    /// Checks the codec and the declared default when a record type is built.
    pub(crate) fn verify(&self, name: &str) -> Result<(), DefinitionError> {
        self.codec.verify()?;

        if let Some(value) = &self.default {
            self.codec
                .check(value)
                .map_err(|reason| DefinitionError::InvalidDefault {
                    field: name.to_string(),
                    reason: Box::new(reason),
                })?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::{Constant, Range};

    #[test]
    fn test_encode_resolves_endian_override() {
        let field = Field::u32().with_endian(Endian::Big);
        let settings = Settings::default().with_endian(Endian::Little);
        assert_eq!(
            field.encode(&Value::Int(0xDEADBEEF), &settings).unwrap(),
            vec![0xDE, 0xAD, 0xBE, 0xEF]
        );
    }

    #[test]
    fn test_encode_validation_gate() {
        let field = Field::u8().with_validator(Constant(false));
        let on = Settings::default();
        let off = Settings::default().with_validate(false);

        assert_eq!(
            field.encode(&Value::Int(1), &on).unwrap_err(),
            Error::Validation("Int(1)".to_string())
        );
        assert_eq!(field.encode(&Value::Int(1), &off).unwrap(), vec![1]);
    }

    #[test]
    fn test_overflow_ignores_validate_flag() {
        let field = Field::u8();
        let off = Settings::default().with_validate(false);
        assert!(matches!(
            field.encode(&Value::Int(0x100), &off).unwrap_err(),
            Error::Overflow { size: 1, .. }
        ));
    }

    #[test]
    fn test_decode_length_mismatch() {
        let field = Field::u16();
        assert_eq!(
            field.decode(&[0x01], &Settings::default()).unwrap_err(),
            Error::LengthMismatch {
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn test_decode_validation_gate() {
        let field = Field::i16().with_validator(Range::inclusive(-15, 15));
        let settings = Settings::default().with_endian(Endian::Little);

        assert_eq!(field.decode(&[0xF1, 0xFF], &settings).unwrap(), Value::Int(-15));
        assert!(field.decode(&[0xF0, 0xFF], &settings).is_err());
        assert_eq!(
            field
                .decode(&[0xF0, 0xFF], &settings.with_validate(false))
                .unwrap(),
            Value::Int(-16)
        );
    }

    #[test]
    fn test_validate_all_reaches_elements() {
        let field = Field::array(2, Field::u8().with_validator(Range::inclusive(0, 9)));
        let ok = Value::Array(vec![Value::Int(1), Value::Int(9)]);
        let bad = Value::Array(vec![Value::Int(1), Value::Int(10)]);

        assert!(field.validate_all(&ok).is_ok());
        assert_eq!(
            field.validate_all(&bad).unwrap_err(),
            Error::Validation("Int(10)".to_string())
        );
        assert!(field.validate_all(&Value::Bytes(vec![3, 12])).is_err());
    }

    #[test]
    fn test_default_override() {
        let field = Field::u16().with_default(0xCAFEu16);
        assert_eq!(field.default_value(), Value::Int(0xCAFE));
        assert!(field.verify("a").is_ok());

        let too_big = Field::u8().with_default(0x1FFu16);
        assert!(matches!(
            too_big.verify("a").unwrap_err(),
            DefinitionError::InvalidDefault { .. }
        ));
    }
}
