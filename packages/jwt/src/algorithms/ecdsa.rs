//! ECDSA-based algorithms (ES256, ES384, ES512, ES256K).
//!
//! Signatures travel as fixed-width `r || s`, each half as wide as the
//! curve's field. A key for a different curve than the algorithm names is
//! refused at construction with [`JwtError::InvalidAlgorithm`].

use super::{wrong_family, AlgorithmId};
use crate::base64::decode_segment;
use crate::error::{JwtError, JwtResult};
use crate::traits::Algorithm;
use std::fmt;

/// Curves behind the ECDSA algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EcdsaCurve {
    /// NIST P-256, used by ES256.
    P256,
    /// NIST P-384, used by ES384.
    P384,
    /// NIST P-521, used by ES512.
    P521,
    /// secp256k1, used by ES256K.
    Secp256k1,
}

impl EcdsaCurve {
    /// All supported curves.
    pub const ALL: [EcdsaCurve; 4] = [
        EcdsaCurve::P256,
        EcdsaCurve::P384,
        EcdsaCurve::P521,
        EcdsaCurve::Secp256k1,
    ];

    /// Curve required by an ES* identifier.
    pub fn for_algorithm(id: AlgorithmId) -> JwtResult<Self> {
        match id {
            AlgorithmId::Es256 => Ok(EcdsaCurve::P256),
            AlgorithmId::Es384 => Ok(EcdsaCurve::P384),
            AlgorithmId::Es512 => Ok(EcdsaCurve::P521),
            AlgorithmId::Es256k => Ok(EcdsaCurve::Secp256k1),
            other => Err(wrong_family(other, "ECDSA")),
        }
    }

    /// Algorithm signing over this curve.
    #[must_use]
    pub const fn algorithm(self) -> AlgorithmId {
        match self {
            EcdsaCurve::P256 => AlgorithmId::Es256,
            EcdsaCurve::P384 => AlgorithmId::Es384,
            EcdsaCurve::P521 => AlgorithmId::Es512,
            EcdsaCurve::Secp256k1 => AlgorithmId::Es256k,
        }
    }

    /// Conventional curve name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            EcdsaCurve::P256 => "P-256",
            EcdsaCurve::P384 => "P-384",
            EcdsaCurve::P521 => "P-521",
            EcdsaCurve::Secp256k1 => "secp256k1",
        }
    }

    /// Width of a field element and of a private scalar, in bytes.
    #[must_use]
    pub const fn field_len(self) -> usize {
        match self {
            EcdsaCurve::P256 | EcdsaCurve::Secp256k1 => 32,
            EcdsaCurve::P384 => 48,
            EcdsaCurve::P521 => 66,
        }
    }

    /// Width of a JWS signature, in bytes.
    #[must_use]
    pub const fn signature_len(self) -> usize {
        2 * self.field_len()
    }
}

impl fmt::Display for EcdsaCurve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

macro_rules! curve_backend {
    ($module:ident, $curve:ident) => {
        curve_backend!($module, $curve, |signature: Signature| signature);
    };
    ($module:ident, $curve:ident, $prepare:expr) => {
        mod $module {
            use crate::error::{JwtError, JwtResult};
            use $curve::ecdsa::signature::{Signer, Verifier};
            use $curve::ecdsa::{Signature, SigningKey, VerifyingKey};
            use $curve::elliptic_curve::sec1::ToEncodedPoint;
            use $curve::pkcs8::{DecodePrivateKey, DecodePublicKey};
            use $curve::{PublicKey, SecretKey};

            pub(super) type Signing = SigningKey;
            pub(super) type Verifying = VerifyingKey;

            pub(super) fn secret_from_pem(pem: &str) -> Option<SecretKey> {
                SecretKey::from_pkcs8_pem(pem)
                    .ok()
                    .or_else(|| SecretKey::from_sec1_pem(pem).ok())
            }

            pub(super) fn public_from_pem(pem: &str) -> Option<PublicKey> {
                PublicKey::from_public_key_pem(pem).ok()
            }

            pub(super) fn secret_from_scalar(scalar: &[u8]) -> JwtResult<SecretKey> {
                SecretKey::from_slice(scalar)
                    .map_err(|_| JwtError::invalid_key("scalar is not a valid private key"))
            }

            pub(super) fn keypair(secret: &SecretKey) -> JwtResult<(SigningKey, VerifyingKey)> {
                let signing = SigningKey::from_slice(&secret.to_bytes())
                    .map_err(|_| JwtError::invalid_key("unusable EC private key"))?;
                let verifying = verifying_from_public(&secret.public_key())?;
                Ok((signing, verifying))
            }

            pub(super) fn verifying_from_public(public: &PublicKey) -> JwtResult<VerifyingKey> {
                verifying_from_sec1(public.to_encoded_point(false).as_bytes())
            }

            pub(super) fn verifying_from_sec1(bytes: &[u8]) -> JwtResult<VerifyingKey> {
                VerifyingKey::from_sec1_bytes(bytes)
                    .map_err(|_| JwtError::invalid_key("invalid EC public point"))
            }

            pub(super) fn sign(key: &SigningKey, data: &[u8]) -> JwtResult<Vec<u8>> {
                let signature: Signature = key
                    .try_sign(data)
                    .map_err(|e| JwtError::SignatureGeneration(e.to_string()))?;
                Ok(signature.to_bytes().to_vec())
            }

            pub(super) fn verify(key: &VerifyingKey, data: &[u8], signature: &[u8]) -> JwtResult<()> {
                let prepare: fn(Signature) -> Signature = $prepare;
                let signature =
                    Signature::from_slice(signature).map_err(|_| JwtError::InvalidSignature)?;
                key.verify(data, &prepare(signature))
                    .map_err(|_| JwtError::InvalidSignature)
            }
        }
    };
}

curve_backend!(p256_backend, p256);
curve_backend!(p384_backend, p384);
curve_backend!(p521_backend, p521);
// k256 only verifies low-S signatures; other issuers emit either form.
curve_backend!(k256_backend, k256, |signature: Signature| {
    signature.normalize_s().unwrap_or(signature)
});

enum SigningKeys {
    P256(p256_backend::Signing),
    P384(p384_backend::Signing),
    P521(p521_backend::Signing),
    Secp256k1(k256_backend::Signing),
}

#[derive(Clone)]
enum VerifyingKeys {
    P256(p256_backend::Verifying),
    P384(p384_backend::Verifying),
    P521(p521_backend::Verifying),
    Secp256k1(k256_backend::Verifying),
}

fn keypair_from_pem(curve: EcdsaCurve, pem: &str) -> Option<JwtResult<(SigningKeys, VerifyingKeys)>> {
    Some(match curve {
        EcdsaCurve::P256 => p256_backend::keypair(&p256_backend::secret_from_pem(pem)?)
            .map(|(s, v)| (SigningKeys::P256(s), VerifyingKeys::P256(v))),
        EcdsaCurve::P384 => p384_backend::keypair(&p384_backend::secret_from_pem(pem)?)
            .map(|(s, v)| (SigningKeys::P384(s), VerifyingKeys::P384(v))),
        EcdsaCurve::P521 => p521_backend::keypair(&p521_backend::secret_from_pem(pem)?)
            .map(|(s, v)| (SigningKeys::P521(s), VerifyingKeys::P521(v))),
        EcdsaCurve::Secp256k1 => k256_backend::keypair(&k256_backend::secret_from_pem(pem)?)
            .map(|(s, v)| (SigningKeys::Secp256k1(s), VerifyingKeys::Secp256k1(v))),
    })
}

fn verifying_from_pem(curve: EcdsaCurve, pem: &str) -> Option<JwtResult<VerifyingKeys>> {
    Some(match curve {
        EcdsaCurve::P256 => p256_backend::verifying_from_public(&p256_backend::public_from_pem(pem)?)
            .map(VerifyingKeys::P256),
        EcdsaCurve::P384 => p384_backend::verifying_from_public(&p384_backend::public_from_pem(pem)?)
            .map(VerifyingKeys::P384),
        EcdsaCurve::P521 => p521_backend::verifying_from_public(&p521_backend::public_from_pem(pem)?)
            .map(VerifyingKeys::P521),
        EcdsaCurve::Secp256k1 => {
            k256_backend::verifying_from_public(&k256_backend::public_from_pem(pem)?)
                .map(VerifyingKeys::Secp256k1)
        }
    })
}

fn verifying_from_sec1(curve: EcdsaCurve, bytes: &[u8]) -> JwtResult<VerifyingKeys> {
    match curve {
        EcdsaCurve::P256 => p256_backend::verifying_from_sec1(bytes).map(VerifyingKeys::P256),
        EcdsaCurve::P384 => p384_backend::verifying_from_sec1(bytes).map(VerifyingKeys::P384),
        EcdsaCurve::P521 => p521_backend::verifying_from_sec1(bytes).map(VerifyingKeys::P521),
        EcdsaCurve::Secp256k1 => {
            k256_backend::verifying_from_sec1(bytes).map(VerifyingKeys::Secp256k1)
        }
    }
}

fn keypair_from_scalar(curve: EcdsaCurve, scalar: &[u8]) -> JwtResult<(SigningKeys, VerifyingKeys)> {
    match curve {
        EcdsaCurve::P256 => p256_backend::keypair(&p256_backend::secret_from_scalar(scalar)?)
            .map(|(s, v)| (SigningKeys::P256(s), VerifyingKeys::P256(v))),
        EcdsaCurve::P384 => p384_backend::keypair(&p384_backend::secret_from_scalar(scalar)?)
            .map(|(s, v)| (SigningKeys::P384(s), VerifyingKeys::P384(v))),
        EcdsaCurve::P521 => p521_backend::keypair(&p521_backend::secret_from_scalar(scalar)?)
            .map(|(s, v)| (SigningKeys::P521(s), VerifyingKeys::P521(v))),
        EcdsaCurve::Secp256k1 => k256_backend::keypair(&k256_backend::secret_from_scalar(scalar)?)
            .map(|(s, v)| (SigningKeys::Secp256k1(s), VerifyingKeys::Secp256k1(v))),
    }
}

fn curve_mismatch(expected: EcdsaCurve, found: EcdsaCurve) -> JwtError {
    JwtError::InvalidAlgorithm(format!(
        "{} requires a {expected} key, found a {found} key",
        expected.algorithm()
    ))
}

/// ECDSA provider.
pub struct Ecdsa {
    curve: EcdsaCurve,
    signing: Option<SigningKeys>,
    verifying: VerifyingKeys,
}

impl Ecdsa {
    /// Signing provider from a PKCS#8 or SEC1 PEM private key.
    pub fn from_private_pem(id: AlgorithmId, pem: &str) -> JwtResult<Self> {
        let curve = EcdsaCurve::for_algorithm(id)?;
        if let Some(keys) = keypair_from_pem(curve, pem) {
            let (signing, verifying) = keys?;
            return Ok(Self {
                curve,
                signing: Some(signing),
                verifying,
            });
        }
        match EcdsaCurve::ALL
            .into_iter()
            .find(|other| *other != curve && keypair_from_pem(*other, pem).is_some())
        {
            Some(found) => Err(curve_mismatch(curve, found)),
            None => Err(JwtError::InvalidKey(format!(
                "not a {curve} private key"
            ))),
        }
    }

    /// Verifying provider from an SPKI PEM public key.
    pub fn from_public_pem(id: AlgorithmId, pem: &str) -> JwtResult<Self> {
        let curve = EcdsaCurve::for_algorithm(id)?;
        if let Some(verifying) = verifying_from_pem(curve, pem) {
            return Ok(Self {
                curve,
                signing: None,
                verifying: verifying?,
            });
        }
        match EcdsaCurve::ALL
            .into_iter()
            .find(|other| *other != curve && verifying_from_pem(*other, pem).is_some())
        {
            Some(found) => Err(curve_mismatch(curve, found)),
            None => Err(JwtError::InvalidKey(format!("not a {curve} public key"))),
        }
    }

    /// Signing provider from a raw big-endian private scalar.
    ///
    /// The scalar must be exactly [`EcdsaCurve::field_len`] bytes.
    pub fn from_private_scalar(id: AlgorithmId, scalar: &[u8]) -> JwtResult<Self> {
        let curve = EcdsaCurve::for_algorithm(id)?;
        if scalar.len() != curve.field_len() {
            return Err(JwtError::InvalidKey(format!(
                "{curve} scalar must be {} bytes, got {}",
                curve.field_len(),
                scalar.len()
            )));
        }
        let (signing, verifying) = keypair_from_scalar(curve, scalar)?;
        Ok(Self {
            curve,
            signing: Some(signing),
            verifying,
        })
    }

    /// Verifying provider from a SEC1 encoded point.
    pub fn from_public_sec1(id: AlgorithmId, point: &[u8]) -> JwtResult<Self> {
        let curve = EcdsaCurve::for_algorithm(id)?;
        Ok(Self {
            curve,
            signing: None,
            verifying: verifying_from_sec1(curve, point)?,
        })
    }

    /// Verifying provider from base64url affine coordinates, as found in a
    /// JWK (`x`, `y`).
    pub fn from_components(id: AlgorithmId, x: &str, y: &str) -> JwtResult<Self> {
        let curve = EcdsaCurve::for_algorithm(id)?;
        let x = decode_segment(x)?;
        let y = decode_segment(y)?;
        if x.len() != curve.field_len() || y.len() != curve.field_len() {
            return Err(JwtError::InvalidKey(format!(
                "{curve} coordinates must be {} bytes each",
                curve.field_len()
            )));
        }
        let mut point = Vec::with_capacity(1 + 2 * curve.field_len());
        point.push(0x04);
        point.extend_from_slice(&x);
        point.extend_from_slice(&y);
        Self::from_public_sec1(id, &point)
    }

    /// Curve of this provider.
    pub fn curve(&self) -> EcdsaCurve {
        self.curve
    }

    /// Verify-only copy of this provider.
    #[must_use]
    pub fn to_verifier(&self) -> Self {
        Self {
            curve: self.curve,
            signing: None,
            verifying: self.verifying.clone(),
        }
    }
}

impl fmt::Debug for Ecdsa {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ecdsa")
            .field("alg", &self.curve.algorithm().as_str())
            .field("curve", &self.curve.name())
            .field("has_private_key", &self.signing.is_some())
            .finish()
    }
}

impl Algorithm for Ecdsa {
    fn name(&self) -> &str {
        self.curve.algorithm().as_str()
    }

    fn sign(&self, data: &[u8]) -> JwtResult<Vec<u8>> {
        match &self.signing {
            Some(SigningKeys::P256(key)) => p256_backend::sign(key, data),
            Some(SigningKeys::P384(key)) => p384_backend::sign(key, data),
            Some(SigningKeys::P521(key)) => p521_backend::sign(key, data),
            Some(SigningKeys::Secp256k1(key)) => k256_backend::sign(key, data),
            None => Err(JwtError::invalid_operation(
                "ECDSA provider holds only a public key",
            )),
        }
    }

    fn verify(&self, data: &[u8], signature: &[u8]) -> JwtResult<()> {
        if signature.len() != self.curve.signature_len() {
            return Err(JwtError::InvalidSignature);
        }
        match &self.verifying {
            VerifyingKeys::P256(key) => p256_backend::verify(key, data, signature),
            VerifyingKeys::P384(key) => p384_backend::verify(key, data, signature),
            VerifyingKeys::P521(key) => p521_backend::verify(key, data, signature),
            VerifyingKeys::Secp256k1(key) => k256_backend::verify(key, data, signature),
        }
    }

    fn can_sign(&self) -> bool {
        self.signing.is_some()
    }
}
