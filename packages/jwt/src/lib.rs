//! JSON Web Token issuing and verification.
//!
//! Tokens are built with [`TokenBuilder`], parsed with [`Decoder`] and checked
//! with [`Verifier`]. Claims are stored through a pluggable JSON backend
//! ([`JsonTraits`]); [`SerdeJson`] is the default. Signing and verification go
//! through the [`Algorithm`] trait, implemented for `none`, HMAC, RSA,
//! RSA-PSS, ECDSA and EdDSA (Ed25519 and Ed448).
//!
//! ```
//! use chrono::Duration;
//! use jwtkit::{Hmac, Jwt};
//!
//! let token = Jwt::builder()
//!     .set_issuer("auth.example")
//!     .set_audience("example")
//!     .set_expires_in(Duration::seconds(135))
//!     .sign(&Hmac::hs256(b"secret"))
//!     .unwrap();
//!
//! let decoded = Jwt::decode(&token).unwrap();
//! Jwt::verifier()
//!     .allow_algorithm(Hmac::hs256(b"secret"))
//!     .with_issuer("auth.example")
//!     .with_audience("example")
//!     .verify(&decoded)
//!     .unwrap();
//! ```

pub mod algorithms;
pub mod base64;
pub mod builder;
pub mod claim;
pub mod decoder;
pub mod error;
pub mod json;
pub mod keys;
pub mod traits;
pub mod types;
pub mod validation;
pub mod verifier;

mod utils;

pub use algorithms::{
    AlgorithmDescriptor, AlgorithmId, EdCurve, EdDsa, Ecdsa, EcdsaCurve, Hmac, NoneAlgorithm, Rsa,
};
pub use builder::TokenBuilder;
pub use claim::Claim;
pub use decoder::{DecodedToken, Decoder};
pub use error::{ErrorKind, JwtError, JwtResult};
pub use json::{JsonTraits, SerdeJson, ValueKind};
pub use keys::KeyMaterial;
pub use traits::Algorithm;
pub use types::{ClaimMap, Header, Payload};
pub use validation::{DecodeOptions, TimeClaim, VerificationOptions};
pub use verifier::Verifier;

/// Entry point over the default `serde_json` backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct Jwt;

impl Jwt {
    /// Start building a token.
    pub fn builder() -> TokenBuilder {
        TokenBuilder::new()
    }

    /// Decode a token with default limits.
    pub fn decode(token: &str) -> JwtResult<DecodedToken> {
        Decoder::new().decode(token)
    }

    /// Start configuring a verifier.
    pub fn verifier() -> Verifier {
        Verifier::new()
    }
}

/// Start building a token.
pub fn create() -> TokenBuilder {
    Jwt::builder()
}

/// Decode a token with default limits.
pub fn decode(token: &str) -> JwtResult<DecodedToken> {
    Jwt::decode(token)
}

/// Start configuring a verifier.
pub fn verify() -> Verifier {
    Jwt::verifier()
}
