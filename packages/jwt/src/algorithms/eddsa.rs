//! EdDSA over Ed25519 and Ed448.
//!
//! The whole message is signed directly, with no pre-hash and an empty
//! context. PEM keys pick their curve from the PKCS#8 or SPKI algorithm OID;
//! raw keys pick it from their length.

use super::AlgorithmId;
use crate::error::{JwtError, JwtResult};
use crate::traits::Algorithm;
use const_oid::db::rfc8410::{ID_ED_25519, ID_ED_448};
use const_oid::ObjectIdentifier;
use der::asn1::OctetStringRef;
use der::{Decode, Document, SecretDocument};
use ed25519_dalek::pkcs8::DecodePrivateKey;
use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey, SECRET_KEY_LENGTH};
use pkcs8::PrivateKeyInfo;
use spki::SubjectPublicKeyInfoRef;
use std::fmt;
use zeroize::Zeroizing;

const ED25519_PUBLIC_LEN: usize = 32;
const ED448_KEY_LEN: usize = 57;
const ED448_SIGNATURE_LEN: usize = 114;

/// Edwards curves behind EdDSA.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdCurve {
    /// Ed25519 (RFC 8032 section 5.1).
    Ed25519,
    /// Ed448 (RFC 8032 section 5.2).
    Ed448,
}

impl EdCurve {
    fn from_oid(oid: ObjectIdentifier) -> Option<Self> {
        if oid == ID_ED_25519 {
            Some(EdCurve::Ed25519)
        } else if oid == ID_ED_448 {
            Some(EdCurve::Ed448)
        } else {
            None
        }
    }

    /// Width of a signature, in bytes.
    #[must_use]
    pub const fn signature_len(self) -> usize {
        match self {
            EdCurve::Ed25519 => ed25519_dalek::SIGNATURE_LENGTH,
            EdCurve::Ed448 => ED448_SIGNATURE_LEN,
        }
    }
}

enum Keys {
    Ed25519 {
        signing: Option<SigningKey>,
        verifying: VerifyingKey,
    },
    Ed448 {
        seed: Option<Zeroizing<[u8; ED448_KEY_LEN]>>,
        public: [u8; ED448_KEY_LEN],
    },
}

/// EdDSA provider.
pub struct EdDsa {
    keys: Keys,
}

impl EdDsa {
    /// Signing provider from a PKCS#8 PEM private key.
    pub fn from_private_pem(pem: &str) -> JwtResult<Self> {
        let (_, document) = SecretDocument::from_pem(pem)
            .map_err(|e| JwtError::InvalidKey(format!("not a PEM private key: {e}")))?;
        let info = PrivateKeyInfo::try_from(document.as_bytes())
            .map_err(|e| JwtError::InvalidKey(format!("not a PKCS#8 private key: {e}")))?;
        match EdCurve::from_oid(info.algorithm.oid) {
            Some(EdCurve::Ed25519) => {
                let signing = SigningKey::from_pkcs8_der(document.as_bytes()).map_err(|e| {
                    JwtError::InvalidKey(format!("not an Ed25519 private key: {e}"))
                })?;
                Ok(Self::from_signing_key(signing))
            }
            Some(EdCurve::Ed448) => {
                let seed = OctetStringRef::from_der(info.private_key)
                    .map_err(|e| JwtError::InvalidKey(format!("malformed Ed448 private key: {e}")))?;
                Self::ed448_from_seed(seed.as_bytes())
            }
            None => Err(JwtError::InvalidKey(format!(
                "{} is not an EdDSA key algorithm",
                info.algorithm.oid
            ))),
        }
    }

    /// Verifying provider from an SPKI PEM public key.
    pub fn from_public_pem(pem: &str) -> JwtResult<Self> {
        let (_, document) = Document::from_pem(pem)
            .map_err(|e| JwtError::InvalidKey(format!("not a PEM public key: {e}")))?;
        let info = SubjectPublicKeyInfoRef::try_from(document.as_bytes())
            .map_err(|e| JwtError::InvalidKey(format!("not an SPKI public key: {e}")))?;
        let key = info.subject_public_key.raw_bytes();
        match EdCurve::from_oid(info.algorithm.oid) {
            Some(EdCurve::Ed25519) => Self::ed25519_from_public(key),
            Some(EdCurve::Ed448) => Self::ed448_from_public(key),
            None => Err(JwtError::InvalidKey(format!(
                "{} is not an EdDSA key algorithm",
                info.algorithm.oid
            ))),
        }
    }

    /// Signing provider from a raw seed: 32 bytes for Ed25519, 57 for Ed448.
    pub fn from_private_bytes(seed: &[u8]) -> JwtResult<Self> {
        match seed.len() {
            SECRET_KEY_LENGTH => {
                let mut bytes = Zeroizing::new([0u8; SECRET_KEY_LENGTH]);
                bytes.copy_from_slice(seed);
                Ok(Self::from_signing_key(SigningKey::from_bytes(&bytes)))
            }
            ED448_KEY_LEN => Self::ed448_from_seed(seed),
            other => Err(JwtError::InvalidKey(format!(
                "EdDSA seed must be {SECRET_KEY_LENGTH} or {ED448_KEY_LEN} bytes, got {other}"
            ))),
        }
    }

    /// Verifying provider from a raw public key: 32 bytes for Ed25519, 57
    /// for Ed448.
    pub fn from_public_bytes(public: &[u8]) -> JwtResult<Self> {
        match public.len() {
            ED25519_PUBLIC_LEN => Self::ed25519_from_public(public),
            ED448_KEY_LEN => Self::ed448_from_public(public),
            other => Err(JwtError::InvalidKey(format!(
                "EdDSA public key must be {ED25519_PUBLIC_LEN} or {ED448_KEY_LEN} bytes, got {other}"
            ))),
        }
    }

    fn from_signing_key(signing: SigningKey) -> Self {
        let verifying = signing.verifying_key();
        Self {
            keys: Keys::Ed25519 {
                signing: Some(signing),
                verifying,
            },
        }
    }

    fn ed25519_from_public(public: &[u8]) -> JwtResult<Self> {
        let bytes: &[u8; ED25519_PUBLIC_LEN] = public
            .try_into()
            .map_err(|_| JwtError::invalid_key("Ed25519 public key must be 32 bytes"))?;
        let verifying = VerifyingKey::from_bytes(bytes)
            .map_err(|_| JwtError::invalid_key("invalid Ed25519 public key"))?;
        Ok(Self {
            keys: Keys::Ed25519 {
                signing: None,
                verifying,
            },
        })
    }

    fn ed448_from_seed(seed: &[u8]) -> JwtResult<Self> {
        let seed: [u8; ED448_KEY_LEN] = seed.try_into().map_err(|_| {
            JwtError::InvalidKey(format!(
                "Ed448 seed must be {ED448_KEY_LEN} bytes, got {}",
                seed.len()
            ))
        })?;
        let seed = Zeroizing::new(seed);
        let private = ed448_rust::PrivateKey::from(*seed);
        let mut public = [0u8; ED448_KEY_LEN];
        public.copy_from_slice(&ed448_rust::PublicKey::from(&private).as_byte()[..]);
        Ok(Self {
            keys: Keys::Ed448 {
                seed: Some(seed),
                public,
            },
        })
    }

    fn ed448_from_public(public: &[u8]) -> JwtResult<Self> {
        let bytes: [u8; ED448_KEY_LEN] = public
            .try_into()
            .map_err(|_| JwtError::invalid_key("Ed448 public key must be 57 bytes"))?;
        ed448_rust::PublicKey::try_from(&bytes[..])
            .map_err(|_| JwtError::invalid_key("invalid Ed448 public key"))?;
        Ok(Self {
            keys: Keys::Ed448 {
                seed: None,
                public: bytes,
            },
        })
    }

    /// Curve of this provider.
    pub fn curve(&self) -> EdCurve {
        match self.keys {
            Keys::Ed25519 { .. } => EdCurve::Ed25519,
            Keys::Ed448 { .. } => EdCurve::Ed448,
        }
    }

    /// Raw public key bytes.
    pub fn public_key_bytes(&self) -> Vec<u8> {
        match &self.keys {
            Keys::Ed25519 { verifying, .. } => verifying.to_bytes().to_vec(),
            Keys::Ed448 { public, .. } => public.to_vec(),
        }
    }

    /// Verify-only copy of this provider.
    #[must_use]
    pub fn to_verifier(&self) -> Self {
        let keys = match &self.keys {
            Keys::Ed25519 { verifying, .. } => Keys::Ed25519 {
                signing: None,
                verifying: *verifying,
            },
            Keys::Ed448 { public, .. } => Keys::Ed448 {
                seed: None,
                public: *public,
            },
        };
        Self { keys }
    }
}

impl fmt::Debug for EdDsa {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EdDsa")
            .field("curve", &self.curve())
            .field("has_private_key", &self.can_sign())
            .finish()
    }
}

impl Algorithm for EdDsa {
    fn name(&self) -> &str {
        AlgorithmId::EdDsa.as_str()
    }

    fn sign(&self, data: &[u8]) -> JwtResult<Vec<u8>> {
        match &self.keys {
            Keys::Ed25519 {
                signing: Some(signing),
                ..
            } => signing
                .try_sign(data)
                .map(|signature| signature.to_bytes().to_vec())
                .map_err(|e| JwtError::SignatureGeneration(e.to_string())),
            Keys::Ed448 {
                seed: Some(seed), ..
            } => ed448_rust::PrivateKey::from(**seed)
                .sign(data, None)
                .map(|signature| signature.to_vec())
                .map_err(|_| JwtError::signing("Ed448 signing failed")),
            _ => Err(JwtError::invalid_operation(
                "EdDSA provider holds only a public key",
            )),
        }
    }

    fn verify(&self, data: &[u8], signature: &[u8]) -> JwtResult<()> {
        if signature.len() != self.curve().signature_len() {
            return Err(JwtError::InvalidSignature);
        }
        match &self.keys {
            Keys::Ed25519 { verifying, .. } => {
                let signature =
                    Signature::from_slice(signature).map_err(|_| JwtError::InvalidSignature)?;
                verifying
                    .verify_strict(data, &signature)
                    .map_err(|_| JwtError::InvalidSignature)
            }
            Keys::Ed448 { public, .. } => ed448_rust::PublicKey::try_from(&public[..])
                .map_err(|_| JwtError::InvalidSignature)?
                .verify(data, signature, None)
                .map_err(|_| JwtError::InvalidSignature),
        }
    }

    fn can_sign(&self) -> bool {
        match &self.keys {
            Keys::Ed25519 { signing, .. } => signing.is_some(),
            Keys::Ed448 { seed, .. } => seed.is_some(),
        }
    }
}
