use std::fmt;

use crate::error::{MessageError, Result};

/// A single ITMP field value.
///
/// Mirrors the subset of CBOR the head firmware speaks: integers, floats,
/// text, byte strings, booleans, null, arrays and maps.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    List(Vec<Value>),
    /// Map entries in wire order.
    Map(Vec<(Value, Value)>),
}

impl Value {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Look up a text key in a map value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Map(entries) => entries
                .iter()
                .find(|(k, _)| k.as_str() == Some(key))
                .map(|(_, v)| v),
            _ => None,
        }
    }

    /// Short kind name used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Integer(_) => "int",
            Value::Float(_) => "float",
            Value::Text(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::List(_) => "list",
            Value::Map(_) => "map",
        }
    }

    /// Convert into a JSON value for display and scripting.
    ///
    /// Map keys that are not strings are rendered with their display form;
    /// byte strings become arrays of numbers.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Integer(n) => serde_json::Value::from(*n),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Text(s) => serde_json::Value::String(s.clone()),
            Value::Bytes(b) => serde_json::Value::from(b.clone()),
            Value::List(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Map(entries) => serde_json::Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| {
                        let key = match k {
                            Value::Text(s) => s.clone(),
                            other => other.to_string(),
                        };
                        (key, v.to_json())
                    })
                    .collect(),
            ),
        }
    }

    pub(crate) fn into_cbor(self) -> ciborium::Value {
        match self {
            Value::Null => ciborium::Value::Null,
            Value::Bool(b) => ciborium::Value::Bool(b),
            Value::Integer(n) => ciborium::Value::Integer(n.into()),
            Value::Float(f) => ciborium::Value::Float(f),
            Value::Text(s) => ciborium::Value::Text(s),
            Value::Bytes(b) => ciborium::Value::Bytes(b),
            Value::List(items) => {
                ciborium::Value::Array(items.into_iter().map(Value::into_cbor).collect())
            }
            Value::Map(entries) => ciborium::Value::Map(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.into_cbor(), v.into_cbor()))
                    .collect(),
            ),
        }
    }

    pub(crate) fn from_cbor(value: ciborium::Value) -> Result<Self> {
        let value = match value {
            ciborium::Value::Null => Value::Null,
            ciborium::Value::Bool(b) => Value::Bool(b),
            ciborium::Value::Integer(n) => {
                let wide = i128::from(n);
                let narrow = i64::try_from(wide)
                    .map_err(|_| MessageError::Cbor(format!("integer {wide} out of range")))?;
                Value::Integer(narrow)
            }
            ciborium::Value::Float(f) => Value::Float(f),
            ciborium::Value::Text(s) => Value::Text(s),
            ciborium::Value::Bytes(b) => Value::Bytes(b),
            ciborium::Value::Array(items) => Value::List(
                items
                    .into_iter()
                    .map(Value::from_cbor)
                    .collect::<Result<_>>()?,
            ),
            ciborium::Value::Map(entries) => Value::Map(
                entries
                    .into_iter()
                    .map(|(k, v)| Ok((Value::from_cbor(k)?, Value::from_cbor(v)?)))
                    .collect::<Result<_>>()?,
            ),
            // Semantic tags carry no meaning for ITMP; keep the tagged item.
            ciborium::Value::Tag(_, inner) => Value::from_cbor(*inner)?,
            other => {
                return Err(MessageError::Cbor(format!(
                    "unsupported cbor item: {other:?}"
                )))
            }
        };
        Ok(value)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Integer(n.into())
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Integer(n.into())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::Text(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => Value::Map(
                map.into_iter()
                    .map(|(k, v)| (Value::Text(k), Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => write!(f, "{s:?}"),
            other => write!(f, "{}", other.to_json()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_conversion_keeps_integers() {
        let json: serde_json::Value = serde_json::json!([1000, -3500, "abc", 1.5, null]);
        let value = Value::from(json);
        assert_eq!(
            value,
            Value::List(vec![
                Value::Integer(1000),
                Value::Integer(-3500),
                Value::Text("abc".into()),
                Value::Float(1.5),
                Value::Null,
            ])
        );
    }

    #[test]
    fn json_roundtrip_object() {
        let json = serde_json::json!({"path": "mot1/go", "args": [{"name": "pos"}]});
        let value = Value::from(json.clone());
        assert_eq!(value.get("path").and_then(Value::as_str), Some("mot1/go"));
        assert_eq!(value.to_json(), json);
    }

    #[test]
    fn cbor_conversion_rejects_oversized_integer() {
        let big = ciborium::Value::Integer(u64::MAX.into());
        assert!(matches!(
            Value::from_cbor(big),
            Err(MessageError::Cbor(_))
        ));
    }

    #[test]
    fn cbor_tag_is_unwrapped() {
        let tagged = ciborium::Value::Tag(1, Box::new(ciborium::Value::Integer(7.into())));
        assert_eq!(Value::from_cbor(tagged).unwrap(), Value::Integer(7));
    }
}
