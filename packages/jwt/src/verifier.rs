//! Token verifier.
//!
//! Verification runs in a fixed order. The header `alg` is looked up in the
//! allow-list first; an unknown or unlisted name ends verification there.
//! Time claims, the header type and every registered claim check are then
//! evaluated and the first failure is kept. The signature is always checked
//! afterwards, and a bad signature is reported ahead of any claim failure.
//!
//! Error kinds differ by the kind of check. `exp`, `nbf` and `iat` have to be
//! read as integers before they can be compared, so a value of another JSON
//! type fails with [`JwtError::ClaimTypeMismatch`] (or
//! [`JwtError::ClaimOutOfRange`] past `i64`). Value checks such as
//! [`Verifier::with_issuer`], [`Verifier::with_audience`] and
//! [`Verifier::with_claim`] only ask whether the token carries an acceptable
//! value, and report any disagreement, a wrong type included, as
//! [`JwtError::ClaimMismatch`].

use crate::algorithms::AlgorithmDescriptor;
use crate::claim::Claim;
use crate::decoder::{DecodedToken, Decoder};
use crate::error::{JwtError, JwtResult};
use crate::json::{JsonTraits, SerdeJson, ValueKind};
use crate::traits::Algorithm;
use crate::types::{registered, Header, Payload};
use crate::validation::{TimeClaim, VerificationOptions};
use chrono::{DateTime, Duration, Utc};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

type ClaimPredicate<J> = Arc<dyn Fn(&Claim<J>) -> bool + Send + Sync>;

enum ClaimCheck<J: JsonTraits> {
    Equals(Claim<J>),
    OneOf(BTreeSet<String>),
    ContainsAll(BTreeSet<String>),
    Predicate(ClaimPredicate<J>),
}

impl<J: JsonTraits> ClaimCheck<J> {
    fn evaluate(&self, name: &str, claim: Option<&Claim<J>>) -> JwtResult<()> {
        let claim = claim.ok_or_else(|| JwtError::claim_mismatch(name, "claim is missing"))?;
        match self {
            ClaimCheck::Equals(expected) => {
                if claim == expected {
                    Ok(())
                } else {
                    Err(JwtError::claim_mismatch(name, "value does not match"))
                }
            }
            ClaimCheck::OneOf(accepted) => {
                let value = claim
                    .as_string()
                    .map_err(|_| JwtError::claim_mismatch(name, "expected a string"))?;
                if accepted.contains(value) {
                    Ok(())
                } else {
                    Err(JwtError::claim_mismatch(name, "value is not accepted"))
                }
            }
            ClaimCheck::ContainsAll(required) => {
                let present = string_or_set(claim).ok_or_else(|| {
                    JwtError::claim_mismatch(name, "expected a string or an array of strings")
                })?;
                match required.difference(&present).next() {
                    None => Ok(()),
                    Some(missing) => Err(JwtError::claim_mismatch(
                        name,
                        &format!("`{missing}` is not present"),
                    )),
                }
            }
            ClaimCheck::Predicate(predicate) => {
                if predicate(claim) {
                    Ok(())
                } else {
                    Err(JwtError::claim_mismatch(name, "rejected by predicate"))
                }
            }
        }
    }
}

fn string_or_set<J: JsonTraits>(claim: &Claim<J>) -> Option<BTreeSet<String>> {
    match claim.kind() {
        ValueKind::String => claim
            .as_string()
            .ok()
            .map(|s| BTreeSet::from([s.to_string()])),
        _ => claim.as_set().ok(),
    }
}

impl<J: JsonTraits> Clone for ClaimCheck<J> {
    fn clone(&self) -> Self {
        match self {
            ClaimCheck::Equals(claim) => ClaimCheck::Equals(claim.clone()),
            ClaimCheck::OneOf(set) => ClaimCheck::OneOf(set.clone()),
            ClaimCheck::ContainsAll(set) => ClaimCheck::ContainsAll(set.clone()),
            ClaimCheck::Predicate(predicate) => ClaimCheck::Predicate(Arc::clone(predicate)),
        }
    }
}

impl<J: JsonTraits> fmt::Debug for ClaimCheck<J> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClaimCheck::Equals(claim) => f.debug_tuple("Equals").field(claim).finish(),
            ClaimCheck::OneOf(set) => f.debug_tuple("OneOf").field(set).finish(),
            ClaimCheck::ContainsAll(set) => f.debug_tuple("ContainsAll").field(set).finish(),
            ClaimCheck::Predicate(_) => f.write_str("Predicate"),
        }
    }
}

fn keep_first(slot: &mut Option<JwtError>, result: JwtResult<()>) {
    if let Err(error) = result {
        slot.get_or_insert(error);
    }
}

/// Checks decoded tokens against an explicit allow-list and claim policy.
///
/// Nothing is trusted implicitly: a verifier with an empty allow-list rejects
/// every token, including unsigned ones.
pub struct Verifier<J: JsonTraits = SerdeJson> {
    algorithms: BTreeMap<String, AlgorithmDescriptor>,
    checks: BTreeMap<String, ClaimCheck<J>>,
    expected_type: Option<String>,
    options: VerificationOptions,
}

impl Verifier<SerdeJson> {
    /// Verifier over the bundled `serde_json` backend.
    pub fn new() -> Self {
        Self::with_backend()
    }
}

impl Default for Verifier<SerdeJson> {
    fn default() -> Self {
        Self::new()
    }
}

impl<J: JsonTraits> Verifier<J> {
    /// Verifier over any backend.
    pub fn with_backend() -> Self {
        Self {
            algorithms: BTreeMap::new(),
            checks: BTreeMap::new(),
            expected_type: None,
            options: VerificationOptions::default(),
        }
    }

    /// Allow tokens signed by `provider`, under the provider's name.
    pub fn allow_algorithm<A: Algorithm + 'static>(self, provider: A) -> Self {
        self.allow_descriptor(AlgorithmDescriptor::new(provider))
    }

    /// Allow a described provider. A later entry with the same name wins.
    pub fn allow_descriptor(mut self, descriptor: AlgorithmDescriptor) -> Self {
        self.algorithms
            .insert(descriptor.name().to_string(), descriptor);
        self
    }

    /// Require `iss` to equal `issuer`.
    pub fn with_issuer(self, issuer: impl Into<String>) -> Self {
        self.with_claim(registered::ISSUER, issuer.into())
    }

    /// Require `iss` to be one of `issuers`.
    pub fn with_issuers<I, S>(mut self, issuers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let accepted = issuers.into_iter().map(Into::into).collect();
        self.checks
            .insert(registered::ISSUER.to_string(), ClaimCheck::OneOf(accepted));
        self
    }

    /// Require `sub` to equal `subject`.
    pub fn with_subject(self, subject: impl Into<String>) -> Self {
        self.with_claim(registered::SUBJECT, subject.into())
    }

    /// Require `aud` to contain `audience`. Repeated calls accumulate.
    pub fn with_audience(self, audience: impl Into<String>) -> Self {
        self.with_audiences([audience.into()])
    }

    /// Require `aud` to contain every one of `audiences`.
    pub fn with_audiences<I, S>(mut self, audiences: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = registered::AUDIENCE.to_string();
        let mut required = match self.checks.remove(&name) {
            Some(ClaimCheck::ContainsAll(existing)) => existing,
            _ => BTreeSet::new(),
        };
        required.extend(audiences.into_iter().map(Into::into));
        self.checks.insert(name, ClaimCheck::ContainsAll(required));
        self
    }

    /// Require `jti` to equal `id`.
    pub fn with_id(self, id: impl Into<String>) -> Self {
        self.with_claim(registered::ID, id.into())
    }

    /// Require header `typ` to equal `token_type`, ignoring ASCII case.
    pub fn with_type(mut self, token_type: impl Into<String>) -> Self {
        self.expected_type = Some(token_type.into());
        self
    }

    /// Require payload claim `name` to equal `claim`.
    pub fn with_claim(mut self, name: impl Into<String>, claim: impl Into<Claim<J>>) -> Self {
        self.checks
            .insert(name.into(), ClaimCheck::Equals(claim.into()));
        self
    }

    /// Require payload claim `name` to satisfy `predicate`.
    pub fn with_claim_fn<F>(mut self, name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&Claim<J>) -> bool + Send + Sync + 'static,
    {
        self.checks
            .insert(name.into(), ClaimCheck::Predicate(Arc::new(predicate)));
        self
    }

    /// Same leeway for `exp`, `nbf` and `iat`.
    pub fn leeway(mut self, leeway: Duration) -> Self {
        self.options = self.options.with_leeway(leeway);
        self
    }

    /// Leeway for `exp`.
    pub fn expires_at_leeway(mut self, leeway: Duration) -> Self {
        self.options = self.options.with_expires_at_leeway(leeway);
        self
    }

    /// Leeway for `nbf`.
    pub fn not_before_leeway(mut self, leeway: Duration) -> Self {
        self.options = self.options.with_not_before_leeway(leeway);
        self
    }

    /// Leeway for `iat`.
    pub fn issued_at_leeway(mut self, leeway: Duration) -> Self {
        self.options = self.options.with_issued_at_leeway(leeway);
        self
    }

    /// Require a time claim to be present.
    pub fn require(mut self, claim: TimeClaim) -> Self {
        self.options = self.options.require(claim);
        self
    }

    /// Reject tokens older than `max_age`, measured from `iat`.
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.options = self.options.with_max_age(max_age);
        self
    }

    /// Pin "now".
    pub fn with_clock(mut self, now: DateTime<Utc>) -> Self {
        self.options = self.options.with_clock(now);
        self
    }

    /// Replace the whole time policy.
    pub fn with_options(mut self, options: VerificationOptions) -> Self {
        self.options = options;
        self
    }

    /// Time policy in force.
    pub fn options(&self) -> &VerificationOptions {
        &self.options
    }

    /// Names of the allowed algorithms.
    pub fn allowed_algorithms(&self) -> impl Iterator<Item = &str> {
        self.algorithms.keys().map(String::as_str)
    }

    /// Verify a decoded token.
    pub fn verify(&self, token: &DecodedToken<J>) -> JwtResult<()> {
        let descriptor = self.lookup(token)?;

        let claims = self.check_claims(token.header(), token.payload());
        let signature = descriptor
            .provider()
            .verify(token.signing_input().as_bytes(), token.signature())
            .map_err(|_| JwtError::InvalidSignature);
        let outcome = signature.and(claims);

        let sub_hash = token
            .payload()
            .subject()
            .ok()
            .flatten()
            .map(jwtkit_common::fingerprint);
        match &outcome {
            Ok(()) => tracing::debug!(
                alg = descriptor.name(),
                sub_hash = sub_hash.as_deref(),
                "token verified"
            ),
            Err(error) => tracing::debug!(
                alg = descriptor.name(),
                sub_hash = sub_hash.as_deref(),
                kind = %error.kind(),
                "token rejected"
            ),
        }
        outcome
    }

    /// Decode `token` with default limits, verify it and return it.
    pub fn verify_str(&self, token: &str) -> JwtResult<DecodedToken<J>> {
        let decoded = Decoder::<J>::with_backend().decode(token)?;
        self.verify(&decoded)?;
        Ok(decoded)
    }

    fn lookup(&self, token: &DecodedToken<J>) -> JwtResult<&AlgorithmDescriptor> {
        let alg = match token.algorithm() {
            Ok(Some(alg)) => alg,
            Ok(None) => return Err(JwtError::invalid_algorithm("token has no `alg` header")),
            Err(_) => return Err(JwtError::invalid_algorithm("`alg` header is not a string")),
        };
        self.algorithms.get(alg).ok_or_else(|| {
            tracing::debug!(alg, "algorithm not in allow-list");
            JwtError::InvalidAlgorithm(format!("algorithm `{alg}` is not allowed"))
        })
    }

    fn check_claims(&self, header: &Header<J>, payload: &Payload<J>) -> JwtResult<()> {
        let mut first = None;
        keep_first(&mut first, self.options.check_times(payload));
        if let Some(expected) = &self.expected_type {
            keep_first(&mut first, check_type(header, expected));
        }
        for (name, check) in &self.checks {
            keep_first(&mut first, check.evaluate(name, payload.get(name)));
        }
        first.map_or(Ok(()), Err)
    }
}

fn check_type<J: JsonTraits>(header: &Header<J>, expected: &str) -> JwtResult<()> {
    match header.token_type() {
        Ok(Some(actual)) if actual.eq_ignore_ascii_case(expected) => Ok(()),
        Ok(Some(_)) => Err(JwtError::claim_mismatch(registered::TYPE, "value does not match")),
        Ok(None) => Err(JwtError::claim_mismatch(registered::TYPE, "claim is missing")),
        Err(_) => Err(JwtError::claim_mismatch(registered::TYPE, "expected a string")),
    }
}

impl<J: JsonTraits> Clone for Verifier<J> {
    fn clone(&self) -> Self {
        Self {
            algorithms: self.algorithms.clone(),
            checks: self.checks.clone(),
            expected_type: self.expected_type.clone(),
            options: self.options.clone(),
        }
    }
}

impl<J: JsonTraits> fmt::Debug for Verifier<J> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Verifier")
            .field("algorithms", &self.algorithms.keys().collect::<Vec<_>>())
            .field("checks", &self.checks)
            .field("expected_type", &self.expected_type)
            .field("options", &self.options)
            .finish()
    }
}
