//! Value types for InfluxDB query results.

use ordered_float::OrderedFloat;

/// Represents a cell value in an InfluxDB query result.
///
/// The JSON query API carries only strings, numbers, booleans and nulls.
/// Timestamps arrive as RFC3339 strings (or epoch integers when an epoch
/// precision was requested).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Value {
    /// String value.
    String(String),

    /// 64-bit floating point value.
    Double(OrderedFloat<f64>),

    /// Signed 64-bit integer.
    Long(i64),

    /// Boolean value.
    Bool(bool),

    /// Null value.
    Null,
}

impl Value {
    /// Returns the value as a string reference if it is a `String` variant.
    pub fn as_string(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the value as an owned string if it is a `String` variant.
    pub fn string(&self) -> Option<String> {
        match self {
            Value::String(s) => Some(s.clone()),
            _ => None,
        }
    }

    /// Returns the value as a f64 if it is numeric.
    ///
    /// InfluxDB serializes whole floats like `10.0` as `10`, so integer cells
    /// are widened here.
    pub fn as_double(&self) -> Option<f64> {
        match self {
            Value::Double(f) => Some(f.into_inner()),
            Value::Long(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Returns the value as a bool if it is a `Bool` variant.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the value as an i64 if it is a `Long` variant.
    pub fn as_long(&self) -> Option<i64> {
        match self {
            Value::Long(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns true if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl From<&serde_json::Value> for Value {
    fn from(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Long(i),
                None => Value::Double(OrderedFloat::from(n.as_f64().unwrap_or(f64::NAN))),
            },
            serde_json::Value::String(s) => Value::String(s.clone()),
            // Nested values never appear in result cells; keep their JSON text.
            other => Value::String(other.to_string()),
        }
    }
}

/// Canonical text form used by the flattened result view: plain decimal
/// numbers, `true`/`false`, and an empty string for null.
impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::String(s) => write!(f, "{}", s),
            Value::Double(d) => write!(f, "{}", d),
            Value::Long(i) => write!(f, "{}", i),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Null => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // =========================================================================
    // Value accessor tests
    // =========================================================================

    #[test]
    fn test_as_string() {
        let v = Value::String("hello".to_string());
        assert_eq!(v.as_string(), Some("hello"));
        assert_eq!(v.string(), Some("hello".to_string()));

        // Wrong type returns None
        assert_eq!(Value::Long(42).as_string(), None);
        assert_eq!(Value::Null.string(), None);
    }

    #[test]
    fn test_as_double() {
        let v = Value::Double(OrderedFloat::from(2.72));
        assert_eq!(v.as_double(), Some(2.72));
        assert_eq!(Value::Long(10).as_double(), Some(10.0));

        // Wrong type returns None
        assert_eq!(Value::String("2.72".to_string()).as_double(), None);
        assert_eq!(Value::Null.as_double(), None);
    }

    #[test]
    fn test_as_bool_and_long() {
        assert_eq!(Value::Bool(true).as_bool(), Some(true));
        assert_eq!(Value::Long(1).as_bool(), None);

        assert_eq!(Value::Long(-100).as_long(), Some(-100));
        assert_eq!(Value::Double(OrderedFloat::from(42.0)).as_long(), None);
    }

    #[test]
    fn test_is_null() {
        assert!(Value::Null.is_null());
        assert!(!Value::String("".to_string()).is_null());
        assert!(!Value::Long(0).is_null());
    }

    // =========================================================================
    // JSON conversion
    // =========================================================================

    #[test]
    fn test_from_json() {
        assert_eq!(Value::from(&json!(null)), Value::Null);
        assert_eq!(Value::from(&json!(true)), Value::Bool(true));
        assert_eq!(Value::from(&json!(10)), Value::Long(10));
        assert_eq!(
            Value::from(&json!(0.64)),
            Value::Double(OrderedFloat::from(0.64))
        );
        assert_eq!(
            Value::from(&json!("2016-01-07T01:12:05Z")),
            Value::String("2016-01-07T01:12:05Z".to_string())
        );
    }

    // =========================================================================
    // Value Display tests
    // =========================================================================

    #[test]
    fn test_display() {
        assert_eq!(Value::String("hello world".to_string()).to_string(), "hello world");
        assert_eq!(Value::Double(OrderedFloat::from(0.64)).to_string(), "0.64");
        assert_eq!(Value::Double(OrderedFloat::from(3.0)).to_string(), "3");
        assert_eq!(Value::Long(-100).to_string(), "-100");
        assert_eq!(Value::Bool(false).to_string(), "false");
        assert_eq!(Value::Null.to_string(), "");
    }
}
