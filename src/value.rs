/// LiveView Values and Records
///
/// A Record is a mapping from field name to `Value`. The view engine only ever
/// interprets one field itself (the id field); everything else is read by
/// caller-supplied predicates, comparators, grouping keys and aggregators.
///
/// `Key` is the hashable projection of a `Value`. It is what the identity
/// index, the grouping buckets and the collapsed-group set are keyed by.

use crate::error::{Result, ViewError};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

/// A single record of the source collection.
pub type Record = HashMap<String, Value>;

/// Field value enum to support multiple types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&str> {
        match self {
            Value::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Numeric view used by aggregators. Null, NaN and non-numeric values
    /// yield `None` and are excluded from accumulation.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) if !v.is_nan() => Some(*v),
            _ => None,
        }
    }

    /// Total order used by field comparators.
    ///
    /// Nulls sort last. Ints and floats compare numerically with each other;
    /// other mixed types order by type rank (bool < number < string).
    pub fn total_cmp(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Null, _) => Ordering::Greater,
            (_, Value::Null) => Ordering::Less,
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::String(a), Value::String(b)) => a.cmp(b),
            (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
                let a = self.as_number().unwrap_or(f64::NAN);
                let b = other.as_number().unwrap_or(f64::NAN);
                a.total_cmp(&b)
            }
            (a, b) => a.type_rank().cmp(&b.type_rank()),
        }
    }

    fn type_rank(&self) -> u8 {
        match self {
            Value::Bool(_) => 0,
            Value::Int(_) | Value::Float(_) => 1,
            Value::String(_) => 2,
            Value::Null => 3,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::String(v) => write!(f, "{}", v),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&JsonValue> for Value {
    /// Nested arrays and objects have no field-value counterpart and are
    /// kept as their JSON text.
    fn from(json: &JsonValue) -> Self {
        match json {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Bool(*b),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => n.as_f64().map(Value::Float).unwrap_or(Value::Null),
            },
            JsonValue::String(s) => Value::String(s.clone()),
            other => Value::String(other.to_string()),
        }
    }
}

/// Hashable identity of a `Value`.
///
/// Floats are keyed by their bit pattern with `-0.0` folded into `0.0`, so a
/// float key is equal only to the same float. `Int(1)` and `Float(1.0)` are
/// different keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    Null,
    Bool(bool),
    Int(i64),
    Float(u64),
    String(String),
}

impl Key {
    pub fn is_null(&self) -> bool {
        matches!(self, Key::Null)
    }

    /// Reads `field` from a record. A missing field maps to `Key::Null`.
    pub fn of(record: &Record, field: &str) -> Key {
        record.get(field).map(Key::from).unwrap_or(Key::Null)
    }
}

impl From<&Value> for Key {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => Key::Null,
            Value::Bool(b) => Key::Bool(*b),
            Value::Int(i) => Key::Int(*i),
            Value::Float(f) => {
                let f = if *f == 0.0 { 0.0 } else { *f };
                Key::Float(f.to_bits())
            }
            Value::String(s) => Key::String(s.clone()),
        }
    }
}

impl From<Value> for Key {
    fn from(value: Value) -> Self {
        Key::from(&value)
    }
}

impl From<i64> for Key {
    fn from(v: i64) -> Self {
        Key::Int(v)
    }
}

impl From<i32> for Key {
    fn from(v: i32) -> Self {
        Key::Int(v as i64)
    }
}

impl From<&str> for Key {
    fn from(v: &str) -> Self {
        Key::String(v.to_string())
    }
}

impl From<String> for Key {
    fn from(v: String) -> Self {
        Key::String(v)
    }
}

impl From<bool> for Key {
    fn from(v: bool) -> Self {
        Key::Bool(v)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Null => write!(f, "null"),
            Key::Bool(v) => write!(f, "{}", v),
            Key::Int(v) => write!(f, "{}", v),
            Key::Float(bits) => write!(f, "{}", f64::from_bits(*bits)),
            Key::String(v) => write!(f, "{:?}", v),
        }
    }
}

/// Build a record from `(field, value)` pairs.
///
/// ```
/// use liveview::{record, Value};
///
/// let r = record([("id", Value::Int(1)), ("name", Value::from("Alice"))]);
/// assert_eq!(r.get("name").and_then(|v| v.as_string()), Some("Alice"));
/// ```
pub fn record<I, K>(fields: I) -> Record
where
    I: IntoIterator<Item = (K, Value)>,
    K: Into<String>,
{
    fields.into_iter().map(|(k, v)| (k.into(), v)).collect()
}

/// Parse a JSON array of objects into records.
pub fn records_from_json(json: &str) -> Result<Vec<Record>> {
    let parsed: JsonValue = serde_json::from_str(json)?;
    let items = parsed
        .as_array()
        .ok_or_else(|| ViewError::InvalidData("expected a JSON array of objects".to_string()))?;

    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let object = item
                .as_object()
                .ok_or_else(|| ViewError::InvalidData(format!("element {} is not an object", i)))?;
            Ok(object
                .iter()
                .map(|(field, value)| (field.clone(), Value::from(value)))
                .collect())
        })
        .collect()
}
