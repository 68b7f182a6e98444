//! # bytecraft
//!
//! Declarative fixed-layout binary records.
//!
//! Describe a record as an ordered list of named fields (integers, floats,
//! padding, fixed-count arrays, enums and nested records), then serialize
//! instances to exact byte layouts and parse bytes back. Endianness and
//! validation are resolved per operation from layered settings, with
//! per-field overrides.
//!
//! ## Example
//!
//! ```
//! use bytecraft::field::Field;
//! use bytecraft::record::RecordType;
//! use bytecraft::settings::{Endian, Settings};
//! use bytecraft::validator::Range;
//!
//! let simple = RecordType::builder("SimpleStruct")
//!     .field("first", Field::u8().with_default(0xDEu8))
//!     .field("second", Field::u16().with_default(0xCAFEu16))
//!     .field("third", Field::i8().with_validator(Range::inclusive(-15, 15)))
//!     .build()
//!     .unwrap();
//!
//! let settings = Settings::default().with_endian(Endian::Little);
//! let bytes = simple.instantiate().serialize_with(&settings).unwrap();
//! assert_eq!(bytes, [0xDE, 0xFE, 0xCA, 0x00]);
//!
//! assert!(simple.deserialize_with(&[0, 0, 0, 0x10], &settings).is_err());
//! ```

pub mod array;
pub mod bytes;
pub mod enumeration;
pub mod errors;
pub mod field;
pub mod record;
pub mod scalar;
pub mod settings;
pub mod validator;
pub mod value;

pub use errors::{DefinitionError, Error, ErrorKind};
pub use field::{Codec, Field};
pub use record::{Record, RecordType};
pub use settings::{Endian, Settings};
pub use value::Value;
