//! Verification and decoding options.

use crate::error::{JwtError, JwtResult};
use crate::json::JsonTraits;
use crate::types::{registered, Payload};
use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeSet;

/// Default upper bound on one token segment.
pub const DEFAULT_MAX_SEGMENT_LEN: usize = 1024 * 1024;
/// Default upper bound on a whole token.
pub const DEFAULT_MAX_TOKEN_LEN: usize = 4 * DEFAULT_MAX_SEGMENT_LEN;

/// Registered time claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TimeClaim {
    /// `exp`
    ExpiresAt,
    /// `nbf`
    NotBefore,
    /// `iat`
    IssuedAt,
}

impl TimeClaim {
    /// Claim name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            TimeClaim::ExpiresAt => registered::EXPIRES_AT,
            TimeClaim::NotBefore => registered::NOT_BEFORE,
            TimeClaim::IssuedAt => registered::ISSUED_AT,
        }
    }
}

/// Time-claim policy used by the verifier.
///
/// Present time claims are checked against the clock widened by the matching
/// leeway. Absent ones only fail when listed in `required`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationOptions {
    /// Leeway for `exp`.
    pub expires_at_leeway: Duration,
    /// Leeway for `nbf`.
    pub not_before_leeway: Duration,
    /// Leeway for `iat`.
    pub issued_at_leeway: Duration,
    /// Validate expiry.
    pub validate_exp: bool,
    /// Validate not-before.
    pub validate_nbf: bool,
    /// Validate issued-at.
    pub validate_iat: bool,
    /// Time claims that must be present.
    pub required: BTreeSet<TimeClaim>,
    /// Maximum age measured from `iat`. Implies `iat` is required.
    pub max_age: Option<Duration>,
    /// Fixed "now", for deterministic checks.
    pub clock: Option<DateTime<Utc>>,
}

impl Default for VerificationOptions {
    fn default() -> Self {
        Self {
            expires_at_leeway: Duration::zero(),
            not_before_leeway: Duration::zero(),
            issued_at_leeway: Duration::zero(),
            validate_exp: true,
            validate_nbf: true,
            validate_iat: true,
            required: BTreeSet::new(),
            max_age: None,
            clock: None,
        }
    }
}

impl VerificationOptions {
    /// Create strict validation options: no leeway and `exp` required.
    pub fn strict() -> Self {
        Self::default().require(TimeClaim::ExpiresAt)
    }

    /// Set the same leeway for every time claim.
    pub fn with_leeway(mut self, leeway: Duration) -> Self {
        self.expires_at_leeway = leeway;
        self.not_before_leeway = leeway;
        self.issued_at_leeway = leeway;
        self
    }

    /// Set the leeway for `exp`.
    pub fn with_expires_at_leeway(mut self, leeway: Duration) -> Self {
        self.expires_at_leeway = leeway;
        self
    }

    /// Set the leeway for `nbf`.
    pub fn with_not_before_leeway(mut self, leeway: Duration) -> Self {
        self.not_before_leeway = leeway;
        self
    }

    /// Set the leeway for `iat`.
    pub fn with_issued_at_leeway(mut self, leeway: Duration) -> Self {
        self.issued_at_leeway = leeway;
        self
    }

    /// Set whether to validate expiration.
    pub fn validate_expiration(mut self, validate: bool) -> Self {
        self.validate_exp = validate;
        self
    }

    /// Set whether to validate not-before.
    pub fn validate_not_before(mut self, validate: bool) -> Self {
        self.validate_nbf = validate;
        self
    }

    /// Set whether to validate issued-at.
    pub fn validate_issued_at(mut self, validate: bool) -> Self {
        self.validate_iat = validate;
        self
    }

    /// Require a time claim to be present.
    pub fn require(mut self, claim: TimeClaim) -> Self {
        self.required.insert(claim);
        self
    }

    /// Reject tokens whose `iat` is older than `max_age`.
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = Some(max_age);
        self
    }

    /// Pin the clock.
    pub fn with_clock(mut self, now: DateTime<Utc>) -> Self {
        self.clock = Some(now);
        self
    }

    /// Current time under this policy.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.unwrap_or_else(Utc::now)
    }

    /// Check `exp`, `nbf`, `iat` and the maximum age, in that order.
    pub fn check_times<J: JsonTraits>(&self, payload: &Payload<J>) -> JwtResult<()> {
        let now = self.now().timestamp();

        let exp = self.time_claim(payload, TimeClaim::ExpiresAt)?;
        if let Some(exp) = exp.filter(|_| self.validate_exp) {
            let leeway = self.expires_at_leeway.num_seconds();
            if exp < now.saturating_sub(leeway) {
                return Err(JwtError::TokenExpired {
                    leeway_secs: leeway,
                });
            }
        }

        let nbf = self.time_claim(payload, TimeClaim::NotBefore)?;
        if let Some(nbf) = nbf.filter(|_| self.validate_nbf) {
            let leeway = self.not_before_leeway.num_seconds();
            if nbf > now.saturating_add(leeway) {
                return Err(JwtError::TokenNotYetValid {
                    leeway_secs: leeway,
                });
            }
        }

        let iat = self.time_claim(payload, TimeClaim::IssuedAt)?;
        let leeway = self.issued_at_leeway.num_seconds();
        if let Some(iat) = iat.filter(|_| self.validate_iat) {
            if iat > now.saturating_add(leeway) {
                return Err(JwtError::TokenIssuedInFuture {
                    leeway_secs: leeway,
                });
            }
        }

        if let Some(max_age) = self.max_age {
            let iat = iat.ok_or_else(|| {
                JwtError::claim_mismatch(registered::ISSUED_AT, "required for maximum age check")
            })?;
            let oldest = now
                .saturating_sub(max_age.num_seconds())
                .saturating_sub(leeway);
            if iat < oldest {
                return Err(JwtError::TokenExpired {
                    leeway_secs: leeway,
                });
            }
        }

        Ok(())
    }

    fn time_claim<J: JsonTraits>(
        &self,
        payload: &Payload<J>,
        claim: TimeClaim,
    ) -> JwtResult<Option<i64>> {
        match payload.get(claim.name()) {
            Some(value) => value.as_integer().map(Some),
            None if self.required.contains(&claim) => Err(JwtError::claim_mismatch(
                claim.name(),
                "required claim is missing",
            )),
            None => Ok(None),
        }
    }
}

/// Limits applied while decoding untrusted input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Maximum length of the whole token, in bytes.
    pub max_token_len: usize,
    /// Maximum length of any single segment, in bytes.
    pub max_segment_len: usize,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            max_token_len: DEFAULT_MAX_TOKEN_LEN,
            max_segment_len: DEFAULT_MAX_SEGMENT_LEN,
        }
    }
}

impl DecodeOptions {
    /// Set the maximum token length.
    pub fn with_max_token_len(mut self, len: usize) -> Self {
        self.max_token_len = len;
        self
    }

    /// Set the maximum segment length.
    pub fn with_max_segment_len(mut self, len: usize) -> Self {
        self.max_segment_len = len;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::json::SerdeJson;
    use crate::types::ClaimMap;

    const NOW: i64 = 1_700_000_000;

    fn clock() -> DateTime<Utc> {
        DateTime::from_timestamp(NOW, 0).unwrap()
    }

    fn payload(json: &str) -> Payload<SerdeJson> {
        Payload::from(ClaimMap::parse(json).unwrap())
    }

    #[test]
    fn test_expiry_boundary_with_and_without_leeway() {
        let token = payload(&format!(r#"{{"exp":{}}}"#, NOW - 1));
        let strict = VerificationOptions::default().with_clock(clock());
        assert_eq!(
            strict.check_times(&token),
            Err(JwtError::TokenExpired { leeway_secs: 0 })
        );
        let lenient = strict.with_expires_at_leeway(Duration::seconds(1));
        assert!(lenient.check_times(&token).is_ok());
    }

    #[test]
    fn test_exp_equal_to_now_is_valid() {
        let token = payload(&format!(r#"{{"exp":{NOW}}}"#));
        let options = VerificationOptions::default().with_clock(clock());
        assert!(options.check_times(&token).is_ok());
    }

    #[test]
    fn test_not_before_and_issued_at_in_future() {
        let options = VerificationOptions::default().with_clock(clock());
        let nbf = payload(&format!(r#"{{"nbf":{}}}"#, NOW + 5));
        assert_eq!(
            options.check_times(&nbf).unwrap_err().kind(),
            ErrorKind::TokenNotYetValid
        );
        let iat = payload(&format!(r#"{{"iat":{}}}"#, NOW + 5));
        assert_eq!(
            options.check_times(&iat),
            Err(JwtError::TokenIssuedInFuture { leeway_secs: 0 })
        );
        let lenient = options.with_leeway(Duration::seconds(5));
        assert!(lenient.check_times(&nbf).is_ok());
        assert!(lenient.check_times(&iat).is_ok());
    }

    #[test]
    fn test_absent_claims_only_fail_when_required() {
        let empty = payload("{}");
        assert!(VerificationOptions::default().check_times(&empty).is_ok());
        let err = VerificationOptions::strict().check_times(&empty).unwrap_err();
        assert_eq!(
            err,
            JwtError::claim_mismatch("exp", "required claim is missing")
        );
    }

    #[test]
    fn test_disabled_checks_are_skipped() {
        let token = payload(&format!(r#"{{"exp":{}}}"#, NOW - 100));
        let options = VerificationOptions::default()
            .with_clock(clock())
            .validate_expiration(false);
        assert!(options.check_times(&token).is_ok());
    }

    #[test]
    fn test_malformed_time_claim_is_type_mismatch() {
        let token = payload(r#"{"exp":"tomorrow"}"#);
        let err = VerificationOptions::default().check_times(&token).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ClaimTypeMismatch);
    }

    #[test]
    fn test_max_age() {
        let options = VerificationOptions::default()
            .with_clock(clock())
            .with_max_age(Duration::seconds(60));
        assert!(options
            .check_times(&payload(&format!(r#"{{"iat":{}}}"#, NOW - 60)))
            .is_ok());
        assert_eq!(
            options
                .check_times(&payload(&format!(r#"{{"iat":{}}}"#, NOW - 61)))
                .unwrap_err()
                .kind(),
            ErrorKind::TokenExpired
        );
        assert_eq!(
            options.check_times(&payload("{}")).unwrap_err().kind(),
            ErrorKind::ClaimMismatch
        );
    }
}
