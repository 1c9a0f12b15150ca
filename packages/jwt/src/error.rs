//! JWT error types
//!
//! Every fallible operation in the crate returns [`JwtResult`]. Each variant
//! of [`JwtError`] maps to one stable [`ErrorKind`] tag, which is what callers
//! should match on when they only care about the category of a failure.

use crate::json::ValueKind;
use std::fmt;

/// JWT operation result type
pub type JwtResult<T> = Result<T, JwtError>;

/// Stable category tag for a [`JwtError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed base64 padding, alphabet or length.
    Base64Decode,
    /// JSON text could not be parsed.
    Parse,
    /// JSON value could not be rendered as text.
    Serialization,
    /// Token does not have the `header.payload.signature` shape.
    TokenFormat,
    /// Typed accessor used against a value of another kind.
    ClaimTypeMismatch,
    /// Algorithm not allow-listed, or key unusable for the algorithm.
    InvalidAlgorithm,
    /// Key material could not be parsed or is too weak.
    InvalidKey,
    /// Operation not supported by this provider (signing with a public key).
    InvalidOperation,
    /// Signing failed.
    SignatureGeneration,
    /// Signature does not match the signed data.
    InvalidSignature,
    /// `exp` is in the past.
    TokenExpired,
    /// `nbf` is in the future.
    TokenNotYetValid,
    /// `iat` is in the future.
    TokenIssuedInFuture,
    /// A required claim is missing or did not match.
    ClaimMismatch,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Base64Decode => "base64_decode",
            ErrorKind::Parse => "parse",
            ErrorKind::Serialization => "serialization",
            ErrorKind::TokenFormat => "token_format",
            ErrorKind::ClaimTypeMismatch => "claim_type_mismatch",
            ErrorKind::InvalidAlgorithm => "invalid_algorithm",
            ErrorKind::InvalidKey => "invalid_key",
            ErrorKind::InvalidOperation => "invalid_operation",
            ErrorKind::SignatureGeneration => "signature_generation",
            ErrorKind::InvalidSignature => "invalid_signature",
            ErrorKind::TokenExpired => "token_expired",
            ErrorKind::TokenNotYetValid => "token_not_yet_valid",
            ErrorKind::TokenIssuedInFuture => "token_issued_in_future",
            ErrorKind::ClaimMismatch => "claim_mismatch",
        };
        f.write_str(name)
    }
}

/// JWT error types
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JwtError {
    /// Malformed base64 input
    #[error("base64 decode error: {0}")]
    Base64Decode(String),
    /// Malformed JSON text
    #[error("JSON parse error: {0}")]
    Parse(String),
    /// JSON value could not be serialized
    #[error("serialization error: {0}")]
    Serialization(String),
    /// Token structure is invalid
    #[error("invalid token format: {0}")]
    TokenFormat(String),
    /// Claim accessor used against the wrong value kind
    #[error("claim type mismatch: expected {expected}, found {actual}")]
    ClaimTypeMismatch {
        /// Kind requested by the caller.
        expected: ValueKind,
        /// Kind actually stored.
        actual: ValueKind,
    },
    /// Numeric claim does not fit the requested type
    #[error("claim value out of range: {0}")]
    ClaimOutOfRange(String),
    /// Set claim contains the same string twice
    #[error("duplicate entry in set claim: {0}")]
    DuplicateSetEntry(String),
    /// Algorithm is not allowed or does not fit the key
    #[error("invalid algorithm: {0}")]
    InvalidAlgorithm(String),
    /// Key material is malformed or too weak
    #[error("invalid key: {0}")]
    InvalidKey(String),
    /// Provider cannot perform the requested operation
    #[error("invalid operation: {0}")]
    InvalidOperation(String),
    /// Signing failed
    #[error("signature generation failed: {0}")]
    SignatureGeneration(String),
    /// Signature verification failed
    #[error("invalid signature")]
    InvalidSignature,
    /// Token `exp` has passed
    #[error("token expired (leeway {leeway_secs}s)")]
    TokenExpired {
        /// Leeway applied to the check, in seconds.
        leeway_secs: i64,
    },
    /// Token `nbf` has not been reached
    #[error("token not yet valid (leeway {leeway_secs}s)")]
    TokenNotYetValid {
        /// Leeway applied to the check, in seconds.
        leeway_secs: i64,
    },
    /// Token `iat` lies in the future
    #[error("token issued in the future (leeway {leeway_secs}s)")]
    TokenIssuedInFuture {
        /// Leeway applied to the check, in seconds.
        leeway_secs: i64,
    },
    /// Claim missing or predicate failed
    #[error("claim `{claim}` mismatch: {reason}")]
    ClaimMismatch {
        /// Name of the offending claim.
        claim: String,
        /// Human readable reason.
        reason: String,
    },
}

impl JwtError {
    /// Stable category of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            JwtError::Base64Decode(_) => ErrorKind::Base64Decode,
            JwtError::Parse(_) => ErrorKind::Parse,
            JwtError::Serialization(_) => ErrorKind::Serialization,
            JwtError::TokenFormat(_) => ErrorKind::TokenFormat,
            JwtError::ClaimTypeMismatch { .. }
            | JwtError::ClaimOutOfRange(_)
            | JwtError::DuplicateSetEntry(_) => ErrorKind::ClaimTypeMismatch,
            JwtError::InvalidAlgorithm(_) => ErrorKind::InvalidAlgorithm,
            JwtError::InvalidKey(_) => ErrorKind::InvalidKey,
            JwtError::InvalidOperation(_) => ErrorKind::InvalidOperation,
            JwtError::SignatureGeneration(_) => ErrorKind::SignatureGeneration,
            JwtError::InvalidSignature => ErrorKind::InvalidSignature,
            JwtError::TokenExpired { .. } => ErrorKind::TokenExpired,
            JwtError::TokenNotYetValid { .. } => ErrorKind::TokenNotYetValid,
            JwtError::TokenIssuedInFuture { .. } => ErrorKind::TokenIssuedInFuture,
            JwtError::ClaimMismatch { .. } => ErrorKind::ClaimMismatch,
        }
    }

    /// Create a base64 decode error
    #[inline]
    #[must_use]
    pub fn base64(msg: &str) -> Self {
        JwtError::Base64Decode(msg.to_string())
    }

    /// Create a JSON parse error
    #[inline]
    #[must_use]
    pub fn parse(msg: &str) -> Self {
        JwtError::Parse(msg.to_string())
    }

    /// Create a serialization error
    #[inline]
    #[must_use]
    pub fn serialization(msg: &str) -> Self {
        JwtError::Serialization(msg.to_string())
    }

    /// Create a token format error
    #[inline]
    #[must_use]
    pub fn token_format(msg: &str) -> Self {
        JwtError::TokenFormat(msg.to_string())
    }

    /// Create a claim type mismatch error
    #[inline]
    #[must_use]
    pub fn type_mismatch(expected: ValueKind, actual: ValueKind) -> Self {
        JwtError::ClaimTypeMismatch { expected, actual }
    }

    /// Create an invalid algorithm error
    #[inline]
    #[must_use]
    pub fn invalid_algorithm(msg: &str) -> Self {
        JwtError::InvalidAlgorithm(msg.to_string())
    }

    /// Create an invalid key error
    #[inline]
    #[must_use]
    pub fn invalid_key(msg: &str) -> Self {
        JwtError::InvalidKey(msg.to_string())
    }

    /// Create an invalid operation error
    #[inline]
    #[must_use]
    pub fn invalid_operation(msg: &str) -> Self {
        JwtError::InvalidOperation(msg.to_string())
    }

    /// Create a signature generation error
    #[inline]
    #[must_use]
    pub fn signing(msg: &str) -> Self {
        JwtError::SignatureGeneration(msg.to_string())
    }

    /// Create a claim mismatch error
    #[inline]
    #[must_use]
    pub fn claim_mismatch(claim: &str, reason: &str) -> Self {
        JwtError::ClaimMismatch {
            claim: claim.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Whether this error came from a time-based claim check.
    #[must_use]
    pub fn is_time_error(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::TokenExpired | ErrorKind::TokenNotYetValid | ErrorKind::TokenIssuedInFuture
        )
    }
}
