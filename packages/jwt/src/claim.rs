//! A single typed claim.

use crate::error::{JwtError, JwtResult};
use crate::json::{JsonTraits, SerdeJson, ValueKind};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// One claim value, owned, backed by the JSON backend `J`.
///
/// Typed accessors never coerce: asking for a string from an integer claim
/// fails with [`JwtError::ClaimTypeMismatch`] carrying both kinds.
pub struct Claim<J: JsonTraits = SerdeJson> {
    value: J::Value,
}

impl<J: JsonTraits> Claim<J> {
    /// Wrap a backend value.
    pub fn from_value(value: J::Value) -> Self {
        Self { value }
    }

    /// Claim holding `null`.
    pub fn null() -> Self {
        Self::from_value(J::null())
    }

    /// Parse a claim from JSON text, e.g. a nested object.
    pub fn parse(text: &str) -> JwtResult<Self> {
        J::parse(text).map(Self::from_value)
    }

    /// Array claim from any sequence of items convertible to claims.
    pub fn from_array<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Claim<J>>,
    {
        let values = items.into_iter().map(|item| item.into().value).collect();
        Self::from_value(J::from_array(values))
    }

    /// Set claim: an array of unique strings, first occurrence order kept.
    pub fn from_set<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = BTreeSet::new();
        let values = items
            .into_iter()
            .map(Into::into)
            .filter(|s: &String| seen.insert(s.clone()))
            .map(J::from_string)
            .collect();
        Self::from_value(J::from_array(values))
    }

    /// Kind of the stored value.
    pub fn kind(&self) -> ValueKind {
        J::kind(&self.value)
    }

    fn mismatch(&self, expected: ValueKind) -> JwtError {
        JwtError::type_mismatch(expected, self.kind())
    }

    /// String value.
    pub fn as_string(&self) -> JwtResult<&str> {
        J::as_str(&self.value).ok_or_else(|| self.mismatch(ValueKind::String))
    }

    /// Integer value.
    ///
    /// An integer that does not fit `i64` fails with
    /// [`JwtError::ClaimOutOfRange`].
    pub fn as_integer(&self) -> JwtResult<i64> {
        match J::as_integer(&self.value) {
            Some(value) => Ok(value),
            None if self.kind() == ValueKind::Integer => Err(JwtError::ClaimOutOfRange(
                "integer does not fit in i64".to_string(),
            )),
            None => Err(self.mismatch(ValueKind::Integer)),
        }
    }

    /// Real value. Integers are not widened.
    pub fn as_real(&self) -> JwtResult<f64> {
        J::as_real(&self.value).ok_or_else(|| self.mismatch(ValueKind::Real))
    }

    /// Boolean value.
    pub fn as_bool(&self) -> JwtResult<bool> {
        J::as_bool(&self.value).ok_or_else(|| self.mismatch(ValueKind::Boolean))
    }

    /// Integer interpreted as seconds since the Unix epoch.
    pub fn as_date(&self) -> JwtResult<DateTime<Utc>> {
        let secs = self.as_integer()?;
        DateTime::from_timestamp(secs, 0)
            .ok_or_else(|| JwtError::ClaimOutOfRange(format!("timestamp {secs} out of range")))
    }

    /// Array of unique strings.
    pub fn as_set(&self) -> JwtResult<BTreeSet<String>> {
        let items = J::as_array(&self.value).ok_or_else(|| self.mismatch(ValueKind::Array))?;
        let mut set = BTreeSet::new();
        for item in items {
            let s = J::as_str(item)
                .ok_or_else(|| JwtError::type_mismatch(ValueKind::String, J::kind(item)))?;
            if !set.insert(s.to_string()) {
                return Err(JwtError::DuplicateSetEntry(s.to_string()));
            }
        }
        Ok(set)
    }

    /// Array elements as claims.
    pub fn as_array(&self) -> JwtResult<Vec<Claim<J>>> {
        J::as_array(&self.value)
            .map(|items| items.iter().cloned().map(Self::from_value).collect())
            .ok_or_else(|| self.mismatch(ValueKind::Array))
    }

    /// Borrow the backend value.
    pub fn as_value(&self) -> &J::Value {
        &self.value
    }

    /// Take the backend value.
    pub fn into_value(self) -> J::Value {
        self.value
    }

    /// Render as compact JSON text.
    pub fn to_json(&self) -> JwtResult<String> {
        J::serialize(&self.value)
    }
}

impl Claim<SerdeJson> {
    /// Claim from any serializable host value.
    pub fn from_serializable<T: Serialize + ?Sized>(value: &T) -> JwtResult<Self> {
        serde_json::to_value(value)
            .map(Self::from_value)
            .map_err(|e| JwtError::Serialization(e.to_string()))
    }

    /// Deserialize the claim into a host type.
    pub fn deserialize<T: DeserializeOwned>(&self) -> JwtResult<T> {
        serde_json::from_value(self.value.clone()).map_err(|e| JwtError::Parse(e.to_string()))
    }
}

impl<J: JsonTraits> Clone for Claim<J> {
    fn clone(&self) -> Self {
        Self::from_value(self.value.clone())
    }
}

impl<J: JsonTraits> fmt::Debug for Claim<J> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Claim").field(&self.value).finish()
    }
}

impl<J: JsonTraits> PartialEq for Claim<J> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<J: JsonTraits> fmt::Display for Claim<J> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = self.to_json().map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}

impl<J: JsonTraits> FromStr for Claim<J> {
    type Err = JwtError;

    fn from_str(s: &str) -> JwtResult<Self> {
        Self::parse(s)
    }
}

impl<J: JsonTraits> From<&str> for Claim<J> {
    fn from(value: &str) -> Self {
        Self::from_value(J::from_string(value.to_string()))
    }
}

impl<J: JsonTraits> From<String> for Claim<J> {
    fn from(value: String) -> Self {
        Self::from_value(J::from_string(value))
    }
}

impl<J: JsonTraits> From<&String> for Claim<J> {
    fn from(value: &String) -> Self {
        Self::from(value.as_str())
    }
}

impl<J: JsonTraits> From<i64> for Claim<J> {
    fn from(value: i64) -> Self {
        Self::from_value(J::from_integer(value))
    }
}

impl<J: JsonTraits> From<i32> for Claim<J> {
    fn from(value: i32) -> Self {
        Self::from(i64::from(value))
    }
}

impl<J: JsonTraits> From<bool> for Claim<J> {
    fn from(value: bool) -> Self {
        Self::from_value(J::from_bool(value))
    }
}

impl<J: JsonTraits> From<f64> for Claim<J> {
    fn from(value: f64) -> Self {
        Self::from_value(J::from_real(value))
    }
}

impl<J: JsonTraits> From<DateTime<Utc>> for Claim<J> {
    fn from(value: DateTime<Utc>) -> Self {
        Self::from(value.timestamp())
    }
}

impl<J: JsonTraits> From<BTreeSet<String>> for Claim<J> {
    fn from(value: BTreeSet<String>) -> Self {
        Self::from_set(value)
    }
}

impl<J: JsonTraits> From<Vec<Claim<J>>> for Claim<J> {
    fn from(value: Vec<Claim<J>>) -> Self {
        Self::from_array(value)
    }
}
