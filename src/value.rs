//! Runtime values for AutoMaTA
//!
//! A value is either a string or a number; exactly one payload exists at
//! any time. Booleans are numbers: 0 is false, anything else is true.

use std::fmt;

use crate::error::{AmtaError, ErrorKind, Result};

/// A tagged runtime value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// String value
    Str(String),

    /// Numeric value (64-bit float)
    Num(f64),
}

impl Value {
    pub fn from_bool(b: bool) -> Self {
        Value::Num(if b { 1.0 } else { 0.0 })
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Str(_) => "String",
            Value::Num(_) => "Number",
        }
    }

    pub fn is_truthy(&self) -> bool {
        matches!(self, Value::Num(n) if *n != 0.0)
    }

    /// Extract the numeric payload; `name` is reported on mismatch.
    pub fn as_num(&self, name: &str) -> Result<f64> {
        match self {
            Value::Num(n) => Ok(*n),
            Value::Str(_) => Err(AmtaError::new(ErrorKind::TypeMismatch {
                name: name.to_string(),
                expected: "Number",
                got: self.type_name(),
            })),
        }
    }

    /// Extract the string payload; `name` is reported on mismatch.
    pub fn as_str(&self, name: &str) -> Result<&str> {
        match self {
            Value::Str(s) => Ok(s),
            Value::Num(_) => Err(AmtaError::new(ErrorKind::TypeMismatch {
                name: name.to_string(),
                expected: "String",
                got: self.type_name(),
            })),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "{}", s),
            Value::Num(n) => write!(f, "{}", n),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Num(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthiness() {
        assert!(!Value::Num(0.0).is_truthy());
        assert!(Value::Num(1.0).is_truthy());
        assert!(Value::Num(-0.5).is_truthy());
        assert!(!Value::Str("nonempty".to_string()).is_truthy());
    }

    #[test]
    fn typed_access() {
        assert_eq!(Value::Num(2.5).as_num("x").unwrap(), 2.5);
        assert!(Value::Str("a".to_string()).as_num("x").is_err());
        assert_eq!(Value::Str("a".to_string()).as_str("x").unwrap(), "a");
        assert!(Value::Num(1.0).as_str("x").is_err());
    }
}
