//! Record types: ordered compositions of named fields with a fixed total size.
//!
//! A [RecordType] is built once from `(name, Field)` pairs in declaration
//! order. It produces [Record] instances, serializes them by concatenating
//! each field's encoding in order, and deserializes by slicing the input at
//! the cached field offsets. A record type can itself be used as a field
//! (see [RecordType::as_field]), to any depth.
//!
//! ```
//! use bytecraft::{field::Field, record::RecordType, settings::{Endian, Settings}, value::Value};
//!
//! let header = RecordType::builder("Header")
//!     .field("opcode", Field::u32())
//!     .field("length", Field::u16())
//!     .build()
//!     .unwrap();
//!
//! let packet = RecordType::builder("Packet")
//!     .field("header", header.as_field_with([("opcode", Value::from(3u32)), ("length", Value::from(1024u16))]).unwrap())
//!     .field("payload", Field::array(4, Field::u8()))
//!     .build()
//!     .unwrap();
//!
//! let settings = Settings::default().with_endian(Endian::Big);
//! let bytes = packet.instantiate().serialize_with(&settings).unwrap();
//! assert_eq!(bytes, [0, 0, 0, 3, 0x04, 0x00, 0, 0, 0, 0]);
//! assert_eq!(packet.deserialize_with(&bytes, &settings).unwrap(), packet.instantiate());
//! ```

use std::{borrow::Cow, collections::HashMap, fmt, sync::Arc};

use log::{debug, trace};

use crate::{
    errors::{DefinitionError, Error},
    field::{Codec, Field},
    settings::{self, Endian, Settings},
    value::Value,
};

/// Whole-record predicate checked after deserialization.
pub type RecordCheck = Arc<dyn Fn(&Record) -> bool + Send + Sync>;

/// Hook run on a record around [Record::serialize_mut_with].
pub type RecordHook = Arc<dyn Fn(&mut Record) + Send + Sync>;

/// An ordered, named set of fields. Cheap to clone; clones share the same type.
#[derive(Clone)]
pub struct RecordType(Arc<RecordTypeInner>);

struct RecordTypeInner {
    name: String,
    fields: Vec<(String, Field)>,
    offsets: Vec<usize>,
    positions: HashMap<String, usize>,
    size: usize,
    endian: Option<Endian>,
    check: Option<RecordCheck>,
    before_serialize: Option<RecordHook>,
    after_serialize: Option<RecordHook>,
}

impl fmt::Debug for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordType")
            .field("name", &self.0.name)
            .field("size", &self.0.size)
            .field("endian", &self.0.endian)
            .field("fields", &self.0.fields)
            .finish()
    }
}

/// Two record types are equal only if they are the same built type.
impl PartialEq for RecordType {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for RecordType {}

impl RecordType {
    pub fn builder(name: impl Into<String>) -> RecordTypeBuilder {
        RecordTypeBuilder {
            name: name.into(),
            fields: Vec::new(),
            endian: None,
            check: None,
            before_serialize: None,
            after_serialize: None,
        }
    }

    /// Builds a record type from fields in declaration order.
    pub fn new(
        name: impl Into<String>,
        fields: impl IntoIterator<Item = (String, Field)>,
    ) -> Result<Self, DefinitionError> {
        let mut builder = Self::builder(name);
        builder.fields.extend(fields);
        builder.build()
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Total encoded size in bytes: the sum of all field sizes.
    pub fn size(&self) -> usize {
        self.0.size
    }

    /// Byte order fixed for every field of this type without its own override.
    pub fn endian(&self) -> Option<Endian> {
        self.0.endian
    }

    /// Settings as seen by this type's fields: `base` with the type's endianness applied.
    pub fn settings(&self, base: &Settings) -> Settings {
        match self.0.endian {
            Some(endian) => base.with_endian(endian),
            None => *base,
        }
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Field)> + '_ {
        self.0.fields.iter().map(|(name, field)| (name.as_str(), field))
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.position(name).map(|i| &self.0.fields[i].1)
    }

    /// Declaration index of a field.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.0.positions.get(name).copied()
    }

    /// Byte offset of a field from the start of the record.
    pub fn offset_of(&self, name: &str) -> Result<usize, Error> {
        self.position(name)
            .map(|i| self.0.offsets[i])
            .ok_or_else(|| Error::UnknownField(name.to_string()))
    }

    fn index_of(&self, name: &str) -> Result<usize, Error> {
        self.position(name)
            .ok_or_else(|| Error::UnknownField(name.to_string()))
    }

    /// A new instance with every field at its default.
    pub fn instantiate(&self) -> Record {
        Record {
            record_type: self.clone(),
            values: self.0.fields.iter().map(|(_, f)| f.default_value()).collect(),
        }
    }

    /// A new instance with the given fields overridden and the rest at their defaults.
    pub fn instantiate_with<K: AsRef<str>>(
        &self,
        overrides: impl IntoIterator<Item = (K, Value)>,
    ) -> Result<Record, Error> {
        let mut record = self.instantiate();
        for (name, value) in overrides {
            record.set(name.as_ref(), value)?;
        }

        Ok(record)
    }

    /// This record type as a nested field, defaulting to a default-constructed instance.
    pub fn as_field(&self) -> Field {
        Field::record(self)
    }

    /// This record type as a nested field whose default has the given fields overridden.
    pub fn as_field_with<K: AsRef<str>>(
        &self,
        overrides: impl IntoIterator<Item = (K, Value)>,
    ) -> Result<Field, Error> {
        Ok(Field::new(Nested::new(self.instantiate_with(overrides)?)))
    }

    /// Deserializes using the calling thread's current settings.
    pub fn deserialize(&self, data: &[u8]) -> Result<Record, Error> {
        self.deserialize_with(data, &settings::current())
    }

    pub fn deserialize_with(&self, data: &[u8], settings: &Settings) -> Result<Record, Error> {
        if data.len() != self.size() {
            return Err(Error::LengthMismatch {
                expected: self.size(),
                actual: data.len(),
            });
        }

        let settings = self.settings(settings);
        let mut values = Vec::with_capacity(self.0.fields.len());
        for ((_, field), offset) in self.0.fields.iter().zip(&self.0.offsets) {
            values.push(field.decode(&data[*offset..*offset + field.size()], &settings)?);
        }

        let record = Record {
            record_type: self.clone(),
            values,
        };

        if settings.validate {
            record.check_record()?;
        }

        trace!("deserialized `{}` from {} bytes", self.name(), data.len());
        Ok(record)
    }
}

/// Collects fields in declaration order for a [RecordType].
pub struct RecordTypeBuilder {
    name: String,
    fields: Vec<(String, Field)>,
    endian: Option<Endian>,
    check: Option<RecordCheck>,
    before_serialize: Option<RecordHook>,
    after_serialize: Option<RecordHook>,
}

impl RecordTypeBuilder {
    pub fn field(mut self, name: impl Into<String>, field: Field) -> Self {
        self.fields.push((name.into(), field));
        self
    }

    /// Appends all fields of `base`, in its order, at this point of the declaration.
    ///
    /// The endianness, check and hooks of `base` are inherited unless already set.
    pub fn extend(mut self, base: &RecordType) -> Self {
        self.fields.extend(
            base.0
                .fields
                .iter()
                .map(|(name, field)| (name.clone(), field.clone())),
        );
        self.endian = self.endian.or(base.0.endian);
        self.check = self.check.or_else(|| base.0.check.clone());
        self.before_serialize = self
            .before_serialize
            .or_else(|| base.0.before_serialize.clone());
        self.after_serialize = self
            .after_serialize
            .or_else(|| base.0.after_serialize.clone());
        self
    }

    /// Fixes the byte order of every field without its own override.
    ///
    /// Takes precedence over both the thread's settings and per-call settings.
    pub fn endian(mut self, endian: Endian) -> Self {
        self.endian = Some(endian);
        self
    }

    /// Sets a whole-record predicate, checked after deserializing and by [Record::validate].
    pub fn check(mut self, check: impl Fn(&Record) -> bool + Send + Sync + 'static) -> Self {
        self.check = Some(Arc::new(check));
        self
    }

    /// Sets a hook run by [Record::serialize_mut_with] before encoding.
    pub fn before_serialize(mut self, hook: impl Fn(&mut Record) + Send + Sync + 'static) -> Self {
        self.before_serialize = Some(Arc::new(hook));
        self
    }

    /// Sets a hook run by [Record::serialize_mut_with] after a successful encoding.
    pub fn after_serialize(mut self, hook: impl Fn(&mut Record) + Send + Sync + 'static) -> Self {
        self.after_serialize = Some(Arc::new(hook));
        self
    }

    pub fn build(self) -> Result<RecordType, DefinitionError> {
        let mut positions = HashMap::with_capacity(self.fields.len());
        let mut offsets = Vec::with_capacity(self.fields.len());
        let mut size = 0;

        for (i, (name, field)) in self.fields.iter().enumerate() {
            if positions.insert(name.clone(), i).is_some() {
                return Err(DefinitionError::DuplicateField(name.clone()));
            }
            field.verify(name)?;

            offsets.push(size);
            size += field.size();
        }

        debug!(
            "built record type `{}`: {} fields, {} bytes",
            self.name,
            self.fields.len(),
            size
        );

        Ok(RecordType(Arc::new(RecordTypeInner {
            name: self.name,
            fields: self.fields,
            offsets,
            positions,
            size,
            endian: self.endian,
            check: self.check,
            before_serialize: self.before_serialize,
            after_serialize: self.after_serialize,
        })))
    }
}

/// One mutable instance of a [RecordType]. Cloning copies all field values.
#[derive(Clone)]
pub struct Record {
    record_type: RecordType,
    values: Vec<Value>,
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct(self.record_type.name());
        for (name, value) in self.iter() {
            s.field(name, value);
        }
        s.finish()
    }
}

/// Records are equal when they are of the same type and serialize to the same bytes.
///
/// Bytes are compared with validation off, so invalid but representable values still compare.
/// Records that cannot be encoded at all compare by their field values.
impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        if self.record_type != other.record_type {
            return false;
        }

        let settings = settings::current().with_validate(false);
        match (self.serialize_with(&settings), other.serialize_with(&settings)) {
            (Ok(a), Ok(b)) => a == b,
            (Err(_), Err(_)) => self.values == other.values,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HookStage {
    Before,
    After,
}

impl Record {
    pub fn record_type(&self) -> &RecordType {
        &self.record_type
    }

    /// Encoded size in bytes.
    pub fn len(&self) -> usize {
        self.record_type.size()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Field names and values in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> + '_ {
        self.record_type
            .0
            .fields
            .iter()
            .map(|(name, _)| name.as_str())
            .zip(&self.values)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.record_type.position(name).map(|i| &self.values[i])
    }

    /// Like [Record::get], failing with [Error::UnknownField] for undeclared names.
    pub fn try_get(&self, name: &str) -> Result<&Value, Error> {
        self.record_type
            .index_of(name)
            .map(|i| &self.values[i])
    }

    /// Unchecked mutable access; invalid values surface when serializing.
    ///
    /// A record holding a value that cannot be encoded equals only records with the same values.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.record_type.position(name).map(|i| &mut self.values[i])
    }

    /// Assigns a field, rejecting values the field cannot represent.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<(), Error> {
        let i = self.record_type.index_of(name)?;
        let value = value.into();
        self.record_type.0.fields[i].1.check(&value)?;
        self.values[i] = value;
        Ok(())
    }

    /// Assigns one element of an array field.
    pub fn set_element(
        &mut self,
        name: &str,
        index: usize,
        value: impl Into<Value>,
    ) -> Result<(), Error> {
        let i = self.record_type.index_of(name)?;

        let mut updated = self.values[i].clone();
        updated.set_index(index, value.into())?;
        self.record_type.0.fields[i].1.check(&updated)?;
        self.values[i] = updated;
        Ok(())
    }

    /// A copy of one element of an array field.
    pub fn element(&self, name: &str, index: usize) -> Result<Value, Error> {
        let i = self.record_type.index_of(name)?;
        self.values[i].get_index(index)
    }

    /// Mutable access to a nested record field.
    pub fn record_mut(&mut self, name: &str) -> Result<&mut Record, Error> {
        let i = self.record_type.index_of(name)?;
        let slot = &mut self.values[i];
        let actual = slot.kind_name();
        slot.as_record_mut().ok_or(Error::TypeMismatch {
            expected: "record",
            actual,
        })
    }

    /// Serializes using the calling thread's current settings.
    pub fn serialize(&self) -> Result<Vec<u8>, Error> {
        self.serialize_with(&settings::current())
    }

    pub fn serialize_with(&self, settings: &Settings) -> Result<Vec<u8>, Error> {
        let mut out = Vec::with_capacity(self.len());
        self.encode_fields(0..self.values.len(), settings, &mut out)?;
        debug_assert_eq!(out.len(), self.len());

        trace!("serialized `{}` into {} bytes", self.record_type.name(), out.len());
        Ok(out)
    }

    /// Serializes using the calling thread's current settings, running serialize hooks.
    pub fn serialize_mut(&mut self) -> Result<Vec<u8>, Error> {
        self.serialize_mut_with(&settings::current())
    }

    /// Like [Record::serialize_with], but runs the `before_serialize` and
    /// `after_serialize` hooks of this record and of every nested record.
    ///
    /// Hooks are skipped when `dry_run` is set. After hooks only run if encoding succeeds.
    pub fn serialize_mut_with(&mut self, settings: &Settings) -> Result<Vec<u8>, Error> {
        if settings.dry_run {
            return self.serialize_with(settings);
        }

        self.run_hooks(HookStage::Before);
        let out = self.serialize_with(settings)?;
        self.run_hooks(HookStage::After);

        Ok(out)
    }

    /// Parent hooks run before nested ones on the way in and after them on the way out.
    fn run_hooks(&mut self, stage: HookStage) {
        let record_type = self.record_type.clone();
        let hook = match stage {
            HookStage::Before => &record_type.0.before_serialize,
            HookStage::After => &record_type.0.after_serialize,
        };

        if stage == HookStage::Before {
            if let Some(hook) = hook {
                hook(self);
            }
        }

        for value in &mut self.values {
            run_nested_hooks(value, stage);
        }

        if stage == HookStage::After {
            if let Some(hook) = hook {
                hook(self);
            }
        }
    }

    /// Serializes the fields from `start` through `end` inclusive; `None` leaves that side open.
    pub fn serialize_span(
        &self,
        start: Option<&str>,
        end: Option<&str>,
        settings: &Settings,
    ) -> Result<Vec<u8>, Error> {
        let first = start.map_or(Ok(0), |name| self.record_type.index_of(name))?;
        let last = end.map_or(Ok(self.values.len()), |name| {
            self.record_type.index_of(name).map(|i| i + 1)
        })?;

        let mut out = Vec::new();
        if first < last {
            self.encode_fields(first..last, settings, &mut out)?;
        }

        Ok(out)
    }

    fn encode_fields(
        &self,
        range: std::ops::Range<usize>,
        settings: &Settings,
        out: &mut Vec<u8>,
    ) -> Result<(), Error> {
        let settings = self.record_type.settings(settings);
        let fields = &self.record_type.0.fields[range.clone()];
        for ((_, field), value) in fields.iter().zip(&self.values[range]) {
            field.encode_into(value, &settings, out)?;
        }

        Ok(())
    }

    /// Runs every field validator and the record check, descending into array
    /// elements and nested records.
    pub fn validate(&self) -> Result<(), Error> {
        for ((_, field), value) in self.record_type.0.fields.iter().zip(&self.values) {
            field.validate_all(value)?;
        }

        self.check_record()
    }

    fn check_record(&self) -> Result<(), Error> {
        match &self.record_type.0.check {
            Some(check) if !check(self) => Err(Error::Validation(format!(
                "record `{}`",
                self.record_type.name()
            ))),
            _ => Ok(()),
        }
    }
}

fn run_nested_hooks(value: &mut Value, stage: HookStage) {
    match value {
        Value::Record(record) => record.run_hooks(stage),
        Value::Array(items) => items
            .iter_mut()
            .for_each(|item| run_nested_hooks(item, stage)),
        _ => {}
    }
}

/// A record type used as a field.
#[derive(Debug, Clone)]
pub struct Nested {
    template: Record,
}

impl Nested {
    /// `template` is both the record type and the field's default value.
    pub fn new(template: Record) -> Self {
        Self { template }
    }

    pub fn record_type(&self) -> &RecordType {
        self.template.record_type()
    }

    fn record_of<'a>(&self, value: &'a Value) -> Result<&'a Record, Error> {
        match value {
            Value::Record(record) if record.record_type == self.template.record_type => Ok(record),
            Value::Record(record) => Err(Error::RecordMismatch {
                expected: self.record_type().name().to_string(),
                actual: record.record_type.name().to_string(),
            }),
            other => Err(Error::TypeMismatch {
                expected: "record",
                actual: other.kind_name(),
            }),
        }
    }
}

impl Codec for Nested {
    fn size(&self) -> usize {
        self.template.len()
    }

    fn default_value(&self) -> Value {
        Value::Record(self.template.clone())
    }

    fn encode(&self, value: &Value, settings: &Settings, out: &mut Vec<u8>) -> Result<(), Error> {
        let record = self.record_of(value)?;
        record.encode_fields(0..record.values.len(), settings, out)
    }

    fn decode(&self, data: &[u8], settings: &Settings) -> Result<Value, Error> {
        self.record_type()
            .deserialize_with(data, settings)
            .map(Value::Record)
    }

    fn resolve<'a>(&self, value: &'a Value) -> Result<Cow<'a, Value>, Error> {
        self.record_of(value).map(|_| Cow::Borrowed(value))
    }

    fn check(&self, value: &Value) -> Result<(), Error> {
        self.record_of(value).map(|_| ())
    }

    fn validate_inner(&self, value: &Value) -> Result<(), Error> {
        self.record_of(value)?.validate()
    }
}
