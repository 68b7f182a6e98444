//! Error types for type definition and for encoding/decoding records.

use thiserror::Error;

/// Errors produced while building a [crate::record::RecordType] or an [crate::enumeration::EnumDomain].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefinitionError {
    /// Two fields of the same record type share a name.
    #[error("field `{0}` is declared more than once")]
    DuplicateField(String),
    /// Two members of the same enum domain share a name.
    #[error("enum member `{0}` is declared more than once")]
    DuplicateLiteral(String),
    /// An enumerated field is backed by a non-integer scalar.
    #[error("enum `{0}` must be backed by an integer scalar")]
    InvalidBacking(String),
    /// An auto-valued enum member follows a member valued `i128::MAX`.
    #[error("enum member `{0}` has no value after i128::MAX")]
    AutoValueOverflow(String),
    /// An enum member value does not fit in the backing scalar.
    #[error("enum member `{name}` = {value} does not fit the backing scalar")]
    LiteralOutOfRange { name: String, value: i128 },
    /// A declared default value cannot be stored in its field.
    #[error("invalid default for field `{field}`: {reason}")]
    InvalidDefault { field: String, reason: Box<Error> },
}

/// Errors produced when assigning, serializing or deserializing record values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A value failed its validator while validation is enabled.
    #[error("value {0} was rejected by its validator")]
    Validation(String),
    /// An integer does not fit the fixed width of its field.
    #[error("value {value} does not fit in {size} byte(s)")]
    Overflow { value: String, size: usize },
    /// A sequence does not have the declared element count.
    #[error("expected {expected} elements, got {actual}")]
    ArrayLength { expected: usize, actual: usize },
    /// A value of the wrong shape was given to a field.
    #[error("expected {expected}, got {actual}")]
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },
    /// A nested record field holds an instance of another record type.
    #[error("expected a `{expected}` record, got `{actual}`")]
    RecordMismatch { expected: String, actual: String },
    /// Input length differs from the fixed size of the record or field.
    #[error("expected {expected} bytes, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
    /// A name does not refer to a field of the record type.
    #[error("`{0}` is not a field of this record")]
    UnknownField(String),
    /// A name does not refer to a member of the enum domain.
    #[error("`{0}` is not a member of this enum")]
    UnknownLiteral(String),
    /// An array element index is past the declared count.
    #[error("index {index} is out of bounds for an array of {len}")]
    IndexOutOfBounds { index: usize, len: usize },
}

/// Coarse classification of an [Error].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The value is representable but rejected by a validator.
    Validation,
    /// The value cannot be represented in the field's layout.
    Encoding,
    /// The input bytes do not match the expected layout size.
    Decoding,
    /// Unknown field name.
    UnknownField,
    /// Unknown enum member name.
    Key,
    /// Out-of-bounds array index.
    Index,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation(_) => ErrorKind::Validation,
            Error::Overflow { .. }
            | Error::ArrayLength { .. }
            | Error::TypeMismatch { .. }
            | Error::RecordMismatch { .. } => ErrorKind::Encoding,
            Error::LengthMismatch { .. } => ErrorKind::Decoding,
            Error::UnknownField(_) => ErrorKind::UnknownField,
            Error::UnknownLiteral(_) => ErrorKind::Key,
            Error::IndexOutOfBounds { .. } => ErrorKind::Index,
        }
    }
}
