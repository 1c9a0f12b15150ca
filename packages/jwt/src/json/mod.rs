//! Structured value abstraction.
//!
//! Claims, headers and payloads never touch a concrete JSON library. They go
//! through [`JsonTraits`], which a backend implements once for its value type.
//! [`SerdeJson`] is the bundled backend.

mod serde_backend;

pub use serde_backend::SerdeJson;

use crate::error::JwtResult;
use std::fmt;

/// Tag of a structured value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// JSON `null`.
    Null,
    /// `true` or `false`.
    Boolean,
    /// Number with no fractional part.
    Integer,
    /// Number with a fractional part or exponent.
    Real,
    /// UTF-8 string.
    String,
    /// Ordered sequence of values.
    Array,
    /// String-keyed mapping with unique keys.
    Object,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Null => "null",
            ValueKind::Boolean => "boolean",
            ValueKind::Integer => "integer",
            ValueKind::Real => "real",
            ValueKind::String => "string",
            ValueKind::Array => "array",
            ValueKind::Object => "object",
        };
        f.write_str(name)
    }
}

/// Capability contract a JSON library must satisfy to back claims.
///
/// The implementing type is a marker; all operations are associated
/// functions over [`JsonTraits::Value`]. Implementations must keep these
/// rules:
///
/// - values of different kinds never compare equal
/// - an integer that does not fit `i64` still reports [`ValueKind::Integer`]
///   but [`JsonTraits::as_integer`] returns `None` for it
/// - [`JsonTraits::as_real`] only answers for [`ValueKind::Real`]
/// - [`JsonTraits::object_entries`] yields entries in a stable order
pub trait JsonTraits: Sized + Send + Sync + 'static {
    /// Backend value type.
    type Value: Clone + fmt::Debug + PartialEq + Send + Sync;

    /// Tag of `value`.
    fn kind(value: &Self::Value) -> ValueKind;

    /// The `null` value.
    fn null() -> Self::Value;
    /// Boolean value.
    fn from_bool(value: bool) -> Self::Value;
    /// Integer value.
    fn from_integer(value: i64) -> Self::Value;
    /// Real value. Non-finite input becomes `null`.
    fn from_real(value: f64) -> Self::Value;
    /// String value.
    fn from_string(value: String) -> Self::Value;
    /// Array value.
    fn from_array(items: Vec<Self::Value>) -> Self::Value;
    /// Object value. Later duplicate keys replace earlier ones.
    fn from_object<I>(entries: I) -> Self::Value
    where
        I: IntoIterator<Item = (String, Self::Value)>;

    /// Boolean payload, if `value` is a boolean.
    fn as_bool(value: &Self::Value) -> Option<bool>;
    /// Integer payload, if `value` is an integer representable as `i64`.
    fn as_integer(value: &Self::Value) -> Option<i64>;
    /// Real payload, if `value` is a real.
    fn as_real(value: &Self::Value) -> Option<f64>;
    /// String payload, if `value` is a string.
    fn as_str(value: &Self::Value) -> Option<&str>;
    /// Elements, if `value` is an array.
    fn as_array(value: &Self::Value) -> Option<&[Self::Value]>;
    /// Entries in a stable order, if `value` is an object.
    fn object_entries(value: &Self::Value) -> Option<Vec<(&str, &Self::Value)>>;

    /// Member `key` of an object value.
    fn object_get<'a>(value: &'a Self::Value, key: &str) -> Option<&'a Self::Value> {
        Self::object_entries(value)?
            .into_iter()
            .find(|(name, _)| *name == key)
            .map(|(_, member)| member)
    }

    /// Parse JSON text.
    fn parse(text: &str) -> JwtResult<Self::Value>;
    /// Render compact JSON text.
    fn serialize(value: &Self::Value) -> JwtResult<String>;
}
