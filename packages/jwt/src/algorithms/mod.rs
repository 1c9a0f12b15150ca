//! Algorithm providers and the closed set of algorithm names.
//!
//! Each family lives in its own module and implements [`Algorithm`]. The
//! builder and verifier only ever see the trait, so adding a family touches
//! this module and nothing else.

pub mod ecdsa;
pub mod eddsa;
pub mod hmac;
pub mod none;
pub mod rsa;

pub use self::ecdsa::{Ecdsa, EcdsaCurve};
pub use self::eddsa::{EdCurve, EdDsa};
pub use self::hmac::Hmac;
pub use self::none::NoneAlgorithm;
pub use self::rsa::Rsa;

use crate::error::{JwtError, JwtResult};
use crate::traits::Algorithm;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Every algorithm name this crate can provide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AlgorithmId {
    /// Unsigned token.
    None,
    /// HMAC with SHA-256.
    Hs256,
    /// HMAC with SHA-384.
    Hs384,
    /// HMAC with SHA-512.
    Hs512,
    /// RSASSA-PKCS1-v1_5 with SHA-256.
    Rs256,
    /// RSASSA-PKCS1-v1_5 with SHA-384.
    Rs384,
    /// RSASSA-PKCS1-v1_5 with SHA-512.
    Rs512,
    /// RSASSA-PSS with SHA-256 and MGF1-SHA-256.
    Ps256,
    /// RSASSA-PSS with SHA-384 and MGF1-SHA-384.
    Ps384,
    /// RSASSA-PSS with SHA-512 and MGF1-SHA-512.
    Ps512,
    /// ECDSA over P-256 with SHA-256.
    Es256,
    /// ECDSA over P-384 with SHA-384.
    Es384,
    /// ECDSA over P-521 with SHA-512.
    Es512,
    /// ECDSA over secp256k1 with SHA-256.
    Es256k,
    /// Ed25519.
    EdDsa,
}

impl AlgorithmId {
    /// All identifiers, in declaration order.
    pub const ALL: [AlgorithmId; 15] = [
        AlgorithmId::None,
        AlgorithmId::Hs256,
        AlgorithmId::Hs384,
        AlgorithmId::Hs512,
        AlgorithmId::Rs256,
        AlgorithmId::Rs384,
        AlgorithmId::Rs512,
        AlgorithmId::Ps256,
        AlgorithmId::Ps384,
        AlgorithmId::Ps512,
        AlgorithmId::Es256,
        AlgorithmId::Es384,
        AlgorithmId::Es512,
        AlgorithmId::Es256k,
        AlgorithmId::EdDsa,
    ];

    /// Header `alg` value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            AlgorithmId::None => "none",
            AlgorithmId::Hs256 => "HS256",
            AlgorithmId::Hs384 => "HS384",
            AlgorithmId::Hs512 => "HS512",
            AlgorithmId::Rs256 => "RS256",
            AlgorithmId::Rs384 => "RS384",
            AlgorithmId::Rs512 => "RS512",
            AlgorithmId::Ps256 => "PS256",
            AlgorithmId::Ps384 => "PS384",
            AlgorithmId::Ps512 => "PS512",
            AlgorithmId::Es256 => "ES256",
            AlgorithmId::Es384 => "ES384",
            AlgorithmId::Es512 => "ES512",
            AlgorithmId::Es256k => "ES256K",
            AlgorithmId::EdDsa => "EdDSA",
        }
    }

    /// Whether signing and verifying use the same secret.
    #[must_use]
    pub const fn is_symmetric(self) -> bool {
        matches!(self, AlgorithmId::Hs256 | AlgorithmId::Hs384 | AlgorithmId::Hs512)
    }
}

impl fmt::Display for AlgorithmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlgorithmId {
    type Err = JwtError;

    /// Exact, case-sensitive match on the header `alg` value.
    fn from_str(s: &str) -> JwtResult<Self> {
        AlgorithmId::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| JwtError::InvalidAlgorithm(format!("unknown algorithm `{s}`")))
    }
}

/// An algorithm name bound to the provider that signs or verifies it.
///
/// The verifier's allow-list is a map of these keyed by name.
#[derive(Clone)]
pub struct AlgorithmDescriptor {
    name: String,
    provider: Arc<dyn Algorithm>,
}

impl AlgorithmDescriptor {
    /// Describe `provider` under its own name.
    pub fn new<A: Algorithm + 'static>(provider: A) -> Self {
        Self::from_shared(Arc::new(provider))
    }

    /// Describe an already shared provider.
    pub fn from_shared(provider: Arc<dyn Algorithm>) -> Self {
        Self {
            name: provider.name().to_string(),
            provider,
        }
    }

    /// Algorithm name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Provider handle.
    pub fn provider(&self) -> &Arc<dyn Algorithm> {
        &self.provider
    }
}

impl fmt::Debug for AlgorithmDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlgorithmDescriptor")
            .field("name", &self.name)
            .field("can_sign", &self.provider.can_sign())
            .finish()
    }
}

pub(crate) fn wrong_family(id: AlgorithmId, family: &str) -> JwtError {
    JwtError::InvalidAlgorithm(format!("{id} is not an {family} algorithm"))
}
