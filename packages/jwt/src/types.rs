//! Header and payload claim maps.

use crate::claim::Claim;
use crate::error::{JwtError, JwtResult};
use crate::json::{JsonTraits, SerdeJson, ValueKind};
use chrono::{DateTime, Utc};
use std::collections::btree_map::{self, BTreeMap};
use std::collections::BTreeSet;
use std::fmt;
use std::ops::{Deref, DerefMut};

/// Registered header and payload claim names.
pub mod registered {
    /// Signing algorithm (header).
    pub const ALGORITHM: &str = "alg";
    /// Token media type (header).
    pub const TYPE: &str = "typ";
    /// Content type (header).
    pub const CONTENT_TYPE: &str = "cty";
    /// Key identifier (header).
    pub const KEY_ID: &str = "kid";
    /// Issuer.
    pub const ISSUER: &str = "iss";
    /// Subject.
    pub const SUBJECT: &str = "sub";
    /// Audience, a string or an array of strings.
    pub const AUDIENCE: &str = "aud";
    /// Expiration time, seconds since the epoch.
    pub const EXPIRES_AT: &str = "exp";
    /// Not-before time, seconds since the epoch.
    pub const NOT_BEFORE: &str = "nbf";
    /// Issued-at time, seconds since the epoch.
    pub const ISSUED_AT: &str = "iat";
    /// Token identifier.
    pub const ID: &str = "jti";
}

/// Mapping from claim name to claim.
///
/// Names are unique. Iteration is ordered by name, which is also the order
/// claims are handed to the backend when the map is serialized.
pub struct ClaimMap<J: JsonTraits = SerdeJson> {
    claims: BTreeMap<String, Claim<J>>,
}

impl<J: JsonTraits> ClaimMap<J> {
    /// Empty map.
    pub fn new() -> Self {
        Self {
            claims: BTreeMap::new(),
        }
    }

    /// Build a map from a backend object value.
    ///
    /// Fails with [`JwtError::TokenFormat`] when `value` is not an object.
    pub fn from_value(value: &J::Value) -> JwtResult<Self> {
        let entries = J::object_entries(value).ok_or_else(|| {
            JwtError::TokenFormat(format!("expected a JSON object, found {}", J::kind(value)))
        })?;
        let claims = entries
            .into_iter()
            .map(|(name, member)| (name.to_string(), Claim::from_value(member.clone())))
            .collect();
        Ok(Self { claims })
    }

    /// Parse JSON text that must hold an object.
    pub fn parse(text: &str) -> JwtResult<Self> {
        Self::from_value(&J::parse(text)?)
    }

    /// Backend object value holding every claim.
    pub fn to_value(&self) -> J::Value {
        J::from_object(
            self.claims
                .iter()
                .map(|(name, claim)| (name.clone(), claim.as_value().clone())),
        )
    }

    /// Compact JSON text of the whole map.
    pub fn to_json(&self) -> JwtResult<String> {
        J::serialize(&self.to_value())
    }

    /// Claim by name.
    pub fn get(&self, name: &str) -> Option<&Claim<J>> {
        self.claims.get(name)
    }

    /// Whether a claim is present.
    pub fn contains(&self, name: &str) -> bool {
        self.claims.contains_key(name)
    }

    /// Insert or replace a claim, returning the previous one.
    pub fn insert(&mut self, name: impl Into<String>, claim: impl Into<Claim<J>>) -> Option<Claim<J>> {
        self.claims.insert(name.into(), claim.into())
    }

    /// Remove a claim.
    pub fn remove(&mut self, name: &str) -> Option<Claim<J>> {
        self.claims.remove(name)
    }

    /// Claims in name order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, Claim<J>> {
        self.claims.iter()
    }

    /// Number of claims.
    pub fn len(&self) -> usize {
        self.claims.len()
    }

    /// Whether the map is empty.
    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }

    /// String claim, if present.
    pub fn get_str(&self, name: &str) -> JwtResult<Option<&str>> {
        self.get(name).map(Claim::as_string).transpose()
    }

    /// Date claim, if present.
    pub fn get_date(&self, name: &str) -> JwtResult<Option<DateTime<Utc>>> {
        self.get(name).map(Claim::as_date).transpose()
    }
}

impl<J: JsonTraits> Default for ClaimMap<J> {
    fn default() -> Self {
        Self::new()
    }
}

impl<J: JsonTraits> Clone for ClaimMap<J> {
    fn clone(&self) -> Self {
        Self {
            claims: self.claims.clone(),
        }
    }
}

impl<J: JsonTraits> fmt::Debug for ClaimMap<J> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.claims.iter()).finish()
    }
}

impl<J: JsonTraits> PartialEq for ClaimMap<J> {
    fn eq(&self, other: &Self) -> bool {
        self.claims == other.claims
    }
}

impl<'a, J: JsonTraits> IntoIterator for &'a ClaimMap<J> {
    type Item = (&'a String, &'a Claim<J>);
    type IntoIter = btree_map::Iter<'a, String, Claim<J>>;

    fn into_iter(self) -> Self::IntoIter {
        self.claims.iter()
    }
}

macro_rules! claim_map_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        pub struct $name<J: JsonTraits = SerdeJson>(ClaimMap<J>);

        impl<J: JsonTraits> $name<J> {
            /// Empty map.
            pub fn new() -> Self {
                Self(ClaimMap::new())
            }

            /// Unwrap into the plain claim map.
            pub fn into_inner(self) -> ClaimMap<J> {
                self.0
            }
        }

        impl<J: JsonTraits> From<ClaimMap<J>> for $name<J> {
            fn from(map: ClaimMap<J>) -> Self {
                Self(map)
            }
        }

        impl<J: JsonTraits> Deref for $name<J> {
            type Target = ClaimMap<J>;

            fn deref(&self) -> &ClaimMap<J> {
                &self.0
            }
        }

        impl<J: JsonTraits> DerefMut for $name<J> {
            fn deref_mut(&mut self) -> &mut ClaimMap<J> {
                &mut self.0
            }
        }

        impl<J: JsonTraits> Default for $name<J> {
            fn default() -> Self {
                Self::new()
            }
        }

        impl<J: JsonTraits> Clone for $name<J> {
            fn clone(&self) -> Self {
                Self(self.0.clone())
            }
        }

        impl<J: JsonTraits> fmt::Debug for $name<J> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_tuple(stringify!($name)).field(&self.0).finish()
            }
        }

        impl<J: JsonTraits> PartialEq for $name<J> {
            fn eq(&self, other: &Self) -> bool {
                self.0 == other.0
            }
        }
    };
}

claim_map_newtype!(
    /// Token header claims (`alg`, `typ`, `cty`, `kid`, ...).
    Header
);

claim_map_newtype!(
    /// Token payload claims, registered and custom.
    Payload
);

impl<J: JsonTraits> Header<J> {
    /// `alg`, if present.
    pub fn algorithm(&self) -> JwtResult<Option<&str>> {
        self.get_str(registered::ALGORITHM)
    }

    /// `typ`, if present.
    pub fn token_type(&self) -> JwtResult<Option<&str>> {
        self.get_str(registered::TYPE)
    }

    /// `cty`, if present.
    pub fn content_type(&self) -> JwtResult<Option<&str>> {
        self.get_str(registered::CONTENT_TYPE)
    }

    /// `kid`, if present.
    pub fn key_id(&self) -> JwtResult<Option<&str>> {
        self.get_str(registered::KEY_ID)
    }
}

impl<J: JsonTraits> Payload<J> {
    /// `iss`, if present.
    pub fn issuer(&self) -> JwtResult<Option<&str>> {
        self.get_str(registered::ISSUER)
    }

    /// `sub`, if present.
    pub fn subject(&self) -> JwtResult<Option<&str>> {
        self.get_str(registered::SUBJECT)
    }

    /// `jti`, if present.
    pub fn id(&self) -> JwtResult<Option<&str>> {
        self.get_str(registered::ID)
    }

    /// `aud` as a set, whether encoded as one string or an array.
    pub fn audience(&self) -> JwtResult<Option<BTreeSet<String>>> {
        let Some(claim) = self.get(registered::AUDIENCE) else {
            return Ok(None);
        };
        match claim.kind() {
            ValueKind::String => Ok(Some(BTreeSet::from([claim.as_string()?.to_string()]))),
            _ => claim.as_set().map(Some),
        }
    }

    /// `exp`, if present.
    pub fn expires_at(&self) -> JwtResult<Option<DateTime<Utc>>> {
        self.get_date(registered::EXPIRES_AT)
    }

    /// `nbf`, if present.
    pub fn not_before(&self) -> JwtResult<Option<DateTime<Utc>>> {
        self.get_date(registered::NOT_BEFORE)
    }

    /// `iat`, if present.
    pub fn issued_at(&self) -> JwtResult<Option<DateTime<Utc>>> {
        self.get_date(registered::ISSUED_AT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;

    #[test]
    fn test_non_object_is_token_format() {
        for text in ["[1,2]", "\"x\"", "null", "3"] {
            let err = ClaimMap::<SerdeJson>::parse(text).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::TokenFormat, "{text}");
        }
    }

    #[test]
    fn test_map_serializes_in_name_order() {
        let mut header = Header::<SerdeJson>::new();
        header.insert("typ", "JWT");
        header.insert("alg", "HS256");
        assert_eq!(header.to_json().unwrap(), r#"{"alg":"HS256","typ":"JWT"}"#);
        assert_eq!(header.algorithm().unwrap(), Some("HS256"));
        assert_eq!(header.key_id().unwrap(), None);
    }

    #[test]
    fn test_audience_string_or_array() {
        let single = Payload::<SerdeJson>::from(ClaimMap::parse(r#"{"aud":"a"}"#).unwrap());
        assert_eq!(single.audience().unwrap(), Some(BTreeSet::from(["a".to_string()])));

        let many = Payload::<SerdeJson>::from(ClaimMap::parse(r#"{"aud":["a","b"]}"#).unwrap());
        assert_eq!(many.audience().unwrap().unwrap().len(), 2);

        let wrong = Payload::<SerdeJson>::from(ClaimMap::parse(r#"{"aud":5}"#).unwrap());
        assert_eq!(wrong.audience().unwrap_err().kind(), ErrorKind::ClaimTypeMismatch);

        assert_eq!(Payload::<SerdeJson>::new().audience().unwrap(), None);
    }

    #[test]
    fn test_registered_time_claims() {
        let payload =
            Payload::<SerdeJson>::from(ClaimMap::parse(r#"{"exp":100,"iat":"soon"}"#).unwrap());
        assert_eq!(payload.expires_at().unwrap().unwrap().timestamp(), 100);
        assert_eq!(payload.not_before().unwrap(), None);
        assert!(payload.issued_at().is_err());
    }

    #[test]
    fn test_value_round_trip_keeps_nested_claims() {
        let value = json!({"ctx": {"tenant": "t1"}, "n": 1});
        let map = ClaimMap::<SerdeJson>::from_value(&value).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map.to_value(), value);
    }
}
