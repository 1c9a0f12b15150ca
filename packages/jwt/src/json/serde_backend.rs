//! `serde_json` backend.

use super::{JsonTraits, ValueKind};
use crate::error::{JwtError, JwtResult};
use serde_json::{Map, Number, Value};

/// Backend over [`serde_json::Value`].
///
/// Object entries come out sorted by key, which keeps serialized headers and
/// payloads deterministic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SerdeJson;

impl JsonTraits for SerdeJson {
    type Value = Value;

    fn kind(value: &Value) -> ValueKind {
        match value {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Boolean,
            Value::Number(n) if n.is_i64() || n.is_u64() => ValueKind::Integer,
            Value::Number(_) => ValueKind::Real,
            Value::String(_) => ValueKind::String,
            Value::Array(_) => ValueKind::Array,
            Value::Object(_) => ValueKind::Object,
        }
    }

    fn null() -> Value {
        Value::Null
    }

    fn from_bool(value: bool) -> Value {
        Value::Bool(value)
    }

    fn from_integer(value: i64) -> Value {
        Value::Number(value.into())
    }

    fn from_real(value: f64) -> Value {
        Number::from_f64(value).map_or(Value::Null, Value::Number)
    }

    fn from_string(value: String) -> Value {
        Value::String(value)
    }

    fn from_array(items: Vec<Value>) -> Value {
        Value::Array(items)
    }

    fn from_object<I>(entries: I) -> Value
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        Value::Object(entries.into_iter().collect::<Map<String, Value>>())
    }

    fn as_bool(value: &Value) -> Option<bool> {
        value.as_bool()
    }

    fn as_integer(value: &Value) -> Option<i64> {
        value.as_i64()
    }

    fn as_real(value: &Value) -> Option<f64> {
        match Self::kind(value) {
            ValueKind::Real => value.as_f64(),
            _ => None,
        }
    }

    fn as_str(value: &Value) -> Option<&str> {
        value.as_str()
    }

    fn as_array(value: &Value) -> Option<&[Value]> {
        value.as_array().map(Vec::as_slice)
    }

    fn object_entries(value: &Value) -> Option<Vec<(&str, &Value)>> {
        value
            .as_object()
            .map(|map| map.iter().map(|(k, v)| (k.as_str(), v)).collect())
    }

    fn object_get<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
        value.as_object()?.get(key)
    }

    fn parse(text: &str) -> JwtResult<Value> {
        serde_json::from_str(text).map_err(|e| JwtError::Parse(e.to_string()))
    }

    fn serialize(value: &Value) -> JwtResult<String> {
        serde_json::to_string(value).map_err(|e| JwtError::Serialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kinds() {
        assert_eq!(SerdeJson::kind(&json!(null)), ValueKind::Null);
        assert_eq!(SerdeJson::kind(&json!(true)), ValueKind::Boolean);
        assert_eq!(SerdeJson::kind(&json!(-3)), ValueKind::Integer);
        assert_eq!(SerdeJson::kind(&json!(u64::MAX)), ValueKind::Integer);
        assert_eq!(SerdeJson::kind(&json!(1.5)), ValueKind::Real);
        assert_eq!(SerdeJson::kind(&json!("x")), ValueKind::String);
        assert_eq!(SerdeJson::kind(&json!([])), ValueKind::Array);
        assert_eq!(SerdeJson::kind(&json!({})), ValueKind::Object);
    }

    #[test]
    fn test_numeric_precision_is_not_lost_silently() {
        assert_eq!(SerdeJson::as_integer(&json!(u64::MAX)), None);
        assert_eq!(SerdeJson::as_real(&json!(7)), None);
        assert_eq!(SerdeJson::as_integer(&json!(7.0)), None);
        assert_eq!(SerdeJson::from_real(f64::NAN), Value::Null);
        assert_eq!(SerdeJson::from_real(f64::INFINITY), Value::Null);
    }

    #[test]
    fn test_cross_kind_values_are_unequal() {
        assert_ne!(SerdeJson::from_integer(1), SerdeJson::from_real(1.0));
        assert_ne!(SerdeJson::from_string("1".into()), SerdeJson::from_integer(1));
        assert_ne!(SerdeJson::from_bool(false), SerdeJson::null());
    }

    #[test]
    fn test_object_entries_are_sorted() {
        let value = SerdeJson::from_object([
            ("typ".to_string(), json!("JWT")),
            ("alg".to_string(), json!("HS256")),
        ]);
        let keys: Vec<&str> = SerdeJson::object_entries(&value)
            .unwrap()
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(keys, ["alg", "typ"]);
        assert_eq!(SerdeJson::serialize(&value).unwrap(), r#"{"alg":"HS256","typ":"JWT"}"#);
        assert_eq!(SerdeJson::object_get(&value, "typ"), Some(&json!("JWT")));
        assert_eq!(SerdeJson::object_entries(&json!([1])), None);
    }

    #[test]
    fn test_parse_rejects_malformed_text() {
        let err = SerdeJson::parse("{\"a\":").unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Parse);
    }
}
