use std::collections::HashMap;

/// A single column value, decoded from Postgres or built from a typed row.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Array(Vec<Value>),
    Object(HashMap<String, Value>),
}

impl Value {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric value; integers widen to floats.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

/// Decoded `json`/`jsonb` columns.
impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(Value::Int)
                .or_else(|| n.as_f64().map(Value::Float))
                .unwrap_or(Value::Null),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(fields) => Value::Object(
                fields
                    .into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

/// Column name to value.
pub type RowMap = HashMap<String, Value>;

/// Conversion of a typed payload into destination columns.
///
/// The in-memory sinks store payloads through this; the Postgres sinks bind
/// typed fields directly.
pub trait ToRow {
    fn to_row(&self) -> RowMap;
}

impl ToRow for RowMap {
    fn to_row(&self) -> RowMap {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_accessors() {
        assert_eq!(Value::Int(42).as_i64(), Some(42));
        assert_eq!(Value::Int(42).as_f64(), Some(42.0));
        assert_eq!(Value::Float(2.5).as_f64(), Some(2.5));
        assert_eq!(Value::String("42".into()).as_i64(), None);
        assert_eq!(Value::Null.as_str(), None);
    }

    #[test]
    fn test_json_object_column() {
        let json = serde_json::json!({"_id": "abc", "rate": 4.5, "sum": 1200, "extra": null});

        let Value::Object(obj) = Value::from(json) else {
            panic!("Expected object");
        };
        assert_eq!(obj.get("_id"), Some(&Value::String("abc".into())));
        assert_eq!(obj.get("rate"), Some(&Value::Float(4.5)));
        assert_eq!(obj.get("sum"), Some(&Value::Int(1200)));
        assert_eq!(obj.get("extra"), Some(&Value::Null));
    }

    #[test]
    fn test_ledger_columns_convert() {
        assert_eq!(Value::from(7i32), Value::Int(7));
        assert_eq!(Value::from("x"), Value::String("x".into()));
    }
}
