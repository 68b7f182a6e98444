//! Enum domains and the enumerated field codec.
//!
//! ```
//! use bytecraft::enumeration::EnumDomain;
//!
//! let opcode = EnumDomain::builder("Opcode")
//!     .member("a")
//!     .member("b")
//!     .member_value("c", 10)
//!     .member("d")
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(opcode.value_of("b"), Ok(1));
//! assert_eq!(opcode.value_of("d"), Ok(11));
//! assert_eq!(opcode.name_of(10), Some("c"));
//! ```

use std::{borrow::Cow, collections::HashSet, sync::Arc};

use log::debug;

use crate::{
    errors::{DefinitionError, Error},
    field::Codec,
    scalar::{Scalar, ScalarKind},
    settings::Settings,
    value::{Member, Value},
};

/// An ordered table of named integer constants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumDomain(Arc<DomainInner>);

#[derive(Debug, PartialEq, Eq)]
struct DomainInner {
    name: String,
    members: Vec<Member>,
}

impl EnumDomain {
    pub fn builder(name: impl Into<String>) -> EnumDomainBuilder {
        EnumDomainBuilder {
            name: name.into(),
            members: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Members in declaration order.
    pub fn members(&self) -> &[Member] {
        &self.0.members
    }

    pub fn len(&self) -> usize {
        self.0.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.members.is_empty()
    }

    pub fn member(&self, name: &str) -> Result<&Member, Error> {
        self.0
            .members
            .iter()
            .find(|m| m.name == name)
            .ok_or_else(|| Error::UnknownLiteral(name.to_string()))
    }

    pub fn value_of(&self, name: &str) -> Result<i128, Error> {
        self.member(name).map(|m| m.value)
    }

    /// Name of the first member declared with `value`.
    pub fn name_of(&self, value: i128) -> Option<&str> {
        self.0
            .members
            .iter()
            .find(|m| m.value == value)
            .map(|m| m.name.as_str())
    }

    pub fn contains(&self, value: i128) -> bool {
        self.0.members.iter().any(|m| m.value == value)
    }

    /// Resolves a raw integer, member or member name to its integer value.
    ///
    /// Raw integers are passed through even if no member has that value.
    pub fn resolve(&self, value: &Value) -> Result<i128, Error> {
        match value {
            Value::Int(v) => Ok(*v),
            Value::Member(member) => match self.member(&member.name) {
                Ok(own) if own.value == member.value => Ok(own.value),
                _ => Err(Error::UnknownLiteral(member.name.clone())),
            },
            Value::Name(name) => self.value_of(name),
            other => Err(Error::TypeMismatch {
                expected: "enum value",
                actual: other.kind_name(),
            }),
        }
    }
}

/// Collects members in order; unspecified values continue from the previous member.
#[derive(Debug, Clone)]
pub struct EnumDomainBuilder {
    name: String,
    members: Vec<(String, Option<i128>)>,
}

impl EnumDomainBuilder {
    /// Adds a member valued one more than the previous member (0 for the first).
    pub fn member(mut self, name: impl Into<String>) -> Self {
        self.members.push((name.into(), None));
        self
    }

    pub fn member_value(mut self, name: impl Into<String>, value: i128) -> Self {
        self.members.push((name.into(), Some(value)));
        self
    }

    pub fn build(self) -> Result<EnumDomain, DefinitionError> {
        let mut seen = HashSet::new();
        let mut members = Vec::with_capacity(self.members.len());
        // `None` once a member holds i128::MAX.
        let mut next = Some(0i128);

        for (name, value) in self.members {
            if !seen.insert(name.clone()) {
                return Err(DefinitionError::DuplicateLiteral(name));
            }

            let value = match value.or(next) {
                Some(value) => value,
                None => return Err(DefinitionError::AutoValueOverflow(name)),
            };
            next = value.checked_add(1);
            members.push(Member { name, value });
        }

        debug!("built enum `{}` with {} members", self.name, members.len());

        Ok(EnumDomain(Arc::new(DomainInner {
            name: self.name,
            members,
        })))
    }
}

/// An enum domain stored through an integer scalar.
#[derive(Debug, Clone)]
pub struct Enumerated {
    domain: EnumDomain,
    backing: Scalar,
}

impl Enumerated {
    pub fn new(domain: EnumDomain, backing: ScalarKind) -> Self {
        Self {
            domain,
            backing: Scalar::new(backing),
        }
    }

    pub fn domain(&self) -> &EnumDomain {
        &self.domain
    }
}

impl Codec for Enumerated {
    fn size(&self) -> usize {
        self.backing.kind().size()
    }

    fn default_value(&self) -> Value {
        Value::Int(self.domain.members().first().map_or(0, |m| m.value))
    }

    fn encode(&self, value: &Value, settings: &Settings, out: &mut Vec<u8>) -> Result<(), Error> {
        let raw = Value::Int(self.domain.resolve(value)?);
        self.backing.encode(&raw, settings, out)
    }

    fn decode(&self, data: &[u8], settings: &Settings) -> Result<Value, Error> {
        let value = self.backing.decode(data, settings)?;

        if settings.validate && settings.strict_enums {
            if let Some(v) = value.as_int().filter(|v| !self.domain.contains(*v)) {
                return Err(Error::Validation(format!(
                    "{v} (not a member of `{}`)",
                    self.domain.name()
                )));
            }
        }

        Ok(value)
    }

    fn resolve<'a>(&self, value: &'a Value) -> Result<Cow<'a, Value>, Error> {
        match value {
            Value::Int(_) => Ok(Cow::Borrowed(value)),
            other => self.domain.resolve(other).map(|v| Cow::Owned(Value::Int(v))),
        }
    }

    fn check(&self, value: &Value) -> Result<(), Error> {
        let raw = Value::Int(self.domain.resolve(value)?);
        self.backing.check(&raw)
    }

    fn verify(&self) -> Result<(), DefinitionError> {
        let Some((min, max)) = self.backing.kind().bounds() else {
            return Err(DefinitionError::InvalidBacking(
                self.domain.name().to_string(),
            ));
        };

        for member in self.domain.members() {
            if !(min..=max).contains(&member.value) {
                return Err(DefinitionError::LiteralOutOfRange {
                    name: member.name.clone(),
                    value: member.value,
                });
            }
        }

        Ok(())
    }
}
