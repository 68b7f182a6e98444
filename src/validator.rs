//! Predicates that gate which values a field accepts.
//!
//! Validators run on encode and decode while [crate::settings::Settings::validate]
//! is on. Any `Fn(&Value) -> bool` is a validator; the types below cover the
//! common cases and can be combined with [AllOf], [AnyOf] and [Not].

use std::sync::Arc;

use crate::value::Value;

pub trait Validator: Send + Sync {
    /// Returns true if `value` is acceptable. Must not have side effects.
    fn validate(&self, value: &Value) -> bool;
}

impl<F> Validator for F
where
    F: Fn(&Value) -> bool + Send + Sync,
{
    fn validate(&self, value: &Value) -> bool {
        self(value)
    }
}

/// Accepts exactly one value.
#[derive(Debug, Clone, PartialEq)]
pub struct ExactValue(pub Value);

impl Validator for ExactValue {
    fn validate(&self, value: &Value) -> bool {
        match (value.as_int(), self.0.as_int()) {
            (Some(a), Some(b)) => a == b,
            _ => *value == self.0,
        }
    }
}

/// Accepts numbers between `low` and `high`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    pub low: i128,
    pub high: i128,
    pub inclusive: bool,
}

impl Range {
    pub fn new(low: i128, high: i128, inclusive: bool) -> Self {
        Self {
            low,
            high,
            inclusive,
        }
    }

    /// `low <= value <= high`
    pub fn inclusive(low: i128, high: i128) -> Self {
        Self::new(low, high, true)
    }

    /// `low < value < high`
    pub fn exclusive(low: i128, high: i128) -> Self {
        Self::new(low, high, false)
    }
}

impl Validator for Range {
    fn validate(&self, value: &Value) -> bool {
        if let Some(v) = value.as_int() {
            return if self.inclusive {
                self.low <= v && v <= self.high
            } else {
                self.low < v && v < self.high
            };
        }

        match value {
            Value::Float(v) => {
                let (low, high) = (self.low as f64, self.high as f64);
                if self.inclusive {
                    low <= *v && *v <= high
                } else {
                    low < *v && *v < high
                }
            }
            _ => false,
        }
    }
}

/// Accepts integers in `0..2^bits`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitSize(pub u32);

impl Validator for BitSize {
    fn validate(&self, value: &Value) -> bool {
        let Some(v) = value.as_int() else {
            return false;
        };
        if v < 0 {
            return false;
        }

        match 1i128.checked_shl(self.0) {
            Some(limit) if self.0 < 127 => v < limit,
            _ => true,
        }
    }
}

/// Accepts everything (`Constant(true)`) or nothing (`Constant(false)`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Constant(pub bool);

impl Validator for Constant {
    fn validate(&self, _value: &Value) -> bool {
        self.0
    }
}

/// Accepts a value only if every inner validator does.
#[derive(Clone, Default)]
pub struct AllOf(pub Vec<Arc<dyn Validator>>);

impl AllOf {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, validator: impl Validator + 'static) -> Self {
        self.0.push(Arc::new(validator));
        self
    }
}

impl Validator for AllOf {
    fn validate(&self, value: &Value) -> bool {
        self.0.iter().all(|v| v.validate(value))
    }
}

/// Accepts a value if at least one inner validator does.
#[derive(Clone, Default)]
pub struct AnyOf(pub Vec<Arc<dyn Validator>>);

impl AnyOf {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, validator: impl Validator + 'static) -> Self {
        self.0.push(Arc::new(validator));
        self
    }
}

impl Validator for AnyOf {
    fn validate(&self, value: &Value) -> bool {
        self.0.iter().any(|v| v.validate(value))
    }
}

/// Inverts a validator.
#[derive(Clone)]
pub struct Not(pub Arc<dyn Validator>);

impl Not {
    pub fn new(validator: impl Validator + 'static) -> Self {
        Self(Arc::new(validator))
    }
}

impl Validator for Not {
    fn validate(&self, value: &Value) -> bool {
        !self.0.validate(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_value() {
        let validator = ExactValue(Value::Int(13));
        assert!(validator.validate(&Value::Int(13)));
        assert!(!validator.validate(&Value::Int(0)));
    }

    #[test]
    fn test_range_inclusive() {
        let validator = Range::inclusive(-15, 15);
        for v in [-15, -3, 0, 7, 15] {
            assert!(validator.validate(&Value::Int(v)), "{v}");
        }
        for v in [-100, 1_000_000, 1 << 16] {
            assert!(!validator.validate(&Value::Int(v)), "{v}");
        }
    }

    #[test]
    fn test_range_exclusive() {
        let validator = Range::exclusive(-15, 15);
        assert!(!validator.validate(&Value::Int(-15)));
        assert!(!validator.validate(&Value::Int(15)));
        assert!(validator.validate(&Value::Int(-14)));
        assert!(validator.validate(&Value::Int(14)));
        assert!(validator.validate(&Value::Float(14.5)));
    }

    #[test]
    fn test_bit_size() {
        let validator = BitSize(10);
        assert!(validator.validate(&Value::Int(0)));
        assert!(validator.validate(&Value::Int(1 << 9)));
        assert!(validator.validate(&Value::Int(1023)));
        assert!(!validator.validate(&Value::Int(-1)));
        assert!(!validator.validate(&Value::Int(1024)));
        assert!(!validator.validate(&Value::Int(1 << 11)));
    }

    #[test]
    fn test_closure() {
        let validator = |value: &Value| value.as_int().is_some_and(|v| v > 4);
        assert!(validator.validate(&Value::Int(6)));
        assert!(!validator.validate(&Value::Int(0)));
    }

    #[test]
    fn test_combinators() {
        let even_in_range = AllOf::new()
            .with(Range::inclusive(0, 10))
            .with(|value: &Value| value.as_int().is_some_and(|v| v % 2 == 0));
        assert!(even_in_range.validate(&Value::Int(4)));
        assert!(!even_in_range.validate(&Value::Int(5)));
        assert!(!even_in_range.validate(&Value::Int(12)));

        let outside = Not::new(Range::inclusive(0, 10));
        assert!(outside.validate(&Value::Int(11)));

        let either = AnyOf::new()
            .with(ExactValue(Value::Int(1)))
            .with(ExactValue(Value::Int(3)));
        assert!(either.validate(&Value::Int(3)));
        assert!(!either.validate(&Value::Int(2)));
        assert!(!AnyOf::new().validate(&Value::Int(0)));
    }
}
