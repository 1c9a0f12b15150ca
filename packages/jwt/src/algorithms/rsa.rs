//! RSA-based algorithms (RS256/384/512 and PS256/384/512).

use super::{wrong_family, AlgorithmId};
use crate::base64::decode_segment;
use crate::error::{JwtError, JwtResult};
use crate::keys::MIN_RSA_BITS;
use crate::traits::Algorithm;
use rand_core::OsRng;
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey};
use rsa::traits::PublicKeyParts;
use rsa::{BigUint, Pkcs1v15Sign, Pss, RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha256, Sha384, Sha512};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Padding {
    Pkcs1v15,
    Pss,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Hash {
    Sha256,
    Sha384,
    Sha512,
}

impl Hash {
    fn digest(self, data: &[u8]) -> Vec<u8> {
        match self {
            Hash::Sha256 => Sha256::digest(data).to_vec(),
            Hash::Sha384 => Sha384::digest(data).to_vec(),
            Hash::Sha512 => Sha512::digest(data).to_vec(),
        }
    }

    fn pkcs1v15(self) -> Pkcs1v15Sign {
        match self {
            Hash::Sha256 => Pkcs1v15Sign::new::<Sha256>(),
            Hash::Sha384 => Pkcs1v15Sign::new::<Sha384>(),
            Hash::Sha512 => Pkcs1v15Sign::new::<Sha512>(),
        }
    }

    // Salt length equals the digest length; MGF1 uses the same digest.
    fn pss(self) -> Pss {
        match self {
            Hash::Sha256 => Pss::new::<Sha256>(),
            Hash::Sha384 => Pss::new::<Sha384>(),
            Hash::Sha512 => Pss::new::<Sha512>(),
        }
    }
}

fn scheme(id: AlgorithmId) -> JwtResult<(Padding, Hash)> {
    match id {
        AlgorithmId::Rs256 => Ok((Padding::Pkcs1v15, Hash::Sha256)),
        AlgorithmId::Rs384 => Ok((Padding::Pkcs1v15, Hash::Sha384)),
        AlgorithmId::Rs512 => Ok((Padding::Pkcs1v15, Hash::Sha512)),
        AlgorithmId::Ps256 => Ok((Padding::Pss, Hash::Sha256)),
        AlgorithmId::Ps384 => Ok((Padding::Pss, Hash::Sha384)),
        AlgorithmId::Ps512 => Ok((Padding::Pss, Hash::Sha512)),
        other => Err(wrong_family(other, "RSA")),
    }
}

/// RSA provider.
///
/// Built from a private key it signs and verifies; built from a public key it
/// only verifies. Moduli below 2048 bits are rejected at construction.
pub struct Rsa {
    id: AlgorithmId,
    padding: Padding,
    hash: Hash,
    public: RsaPublicKey,
    private: Option<RsaPrivateKey>,
}

impl Rsa {
    /// Signing provider from a PKCS#8 or PKCS#1 PEM private key.
    pub fn from_private_pem(id: AlgorithmId, pem: &str) -> JwtResult<Self> {
        let key = RsaPrivateKey::from_pkcs8_pem(pem)
            .or_else(|_| RsaPrivateKey::from_pkcs1_pem(pem))
            .map_err(|e| JwtError::InvalidKey(format!("not an RSA private key: {e}")))?;
        Self::from_private_key(id, key)
    }

    /// Verifying provider from an SPKI or PKCS#1 PEM public key.
    pub fn from_public_pem(id: AlgorithmId, pem: &str) -> JwtResult<Self> {
        let key = RsaPublicKey::from_public_key_pem(pem)
            .or_else(|_| RsaPublicKey::from_pkcs1_pem(pem))
            .map_err(|e| JwtError::InvalidKey(format!("not an RSA public key: {e}")))?;
        Self::from_public_key(id, key)
    }

    /// Verifying provider from base64url modulus and exponent, as found in a
    /// JWK (`n`, `e`).
    pub fn from_components(id: AlgorithmId, modulus: &str, exponent: &str) -> JwtResult<Self> {
        let n = BigUint::from_bytes_be(&decode_segment(modulus)?);
        let e = BigUint::from_bytes_be(&decode_segment(exponent)?);
        let key = RsaPublicKey::new(n, e)
            .map_err(|e| JwtError::InvalidKey(format!("invalid RSA components: {e}")))?;
        Self::from_public_key(id, key)
    }

    /// Signing provider from a parsed private key.
    pub fn from_private_key(id: AlgorithmId, key: RsaPrivateKey) -> JwtResult<Self> {
        let mut provider = Self::from_public_key(id, key.to_public_key())?;
        key.validate()
            .map_err(|e| JwtError::InvalidKey(format!("inconsistent RSA private key: {e}")))?;
        provider.private = Some(key);
        Ok(provider)
    }

    /// Verifying provider from a parsed public key.
    pub fn from_public_key(id: AlgorithmId, key: RsaPublicKey) -> JwtResult<Self> {
        let (padding, hash) = scheme(id)?;
        let bits = key.n().bits();
        if bits < MIN_RSA_BITS {
            return Err(JwtError::InvalidKey(format!(
                "RSA modulus of {bits} bits is below the {MIN_RSA_BITS}-bit minimum"
            )));
        }
        Ok(Self {
            id,
            padding,
            hash,
            public: key,
            private: None,
        })
    }

    /// Verify-only copy of this provider.
    #[must_use]
    pub fn to_verifier(&self) -> Self {
        Self {
            id: self.id,
            padding: self.padding,
            hash: self.hash,
            public: self.public.clone(),
            private: None,
        }
    }

    /// Modulus size in bits.
    pub fn key_bits(&self) -> usize {
        self.public.n().bits()
    }
}

impl fmt::Debug for Rsa {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rsa")
            .field("alg", &self.id.as_str())
            .field("bits", &self.key_bits())
            .field("has_private_key", &self.private.is_some())
            .finish()
    }
}

impl Algorithm for Rsa {
    fn name(&self) -> &str {
        self.id.as_str()
    }

    fn sign(&self, data: &[u8]) -> JwtResult<Vec<u8>> {
        let private = self
            .private
            .as_ref()
            .ok_or_else(|| JwtError::invalid_operation("RSA provider holds only a public key"))?;
        let hashed = self.hash.digest(data);
        let signed = match self.padding {
            Padding::Pkcs1v15 => private.sign_with_rng(&mut OsRng, self.hash.pkcs1v15(), &hashed),
            Padding::Pss => private.sign_with_rng(&mut OsRng, self.hash.pss(), &hashed),
        };
        signed.map_err(|e| JwtError::SignatureGeneration(e.to_string()))
    }

    fn verify(&self, data: &[u8], signature: &[u8]) -> JwtResult<()> {
        let hashed = self.hash.digest(data);
        let verified = match self.padding {
            Padding::Pkcs1v15 => self.public.verify(self.hash.pkcs1v15(), &hashed, signature),
            Padding::Pss => self.public.verify(self.hash.pss(), &hashed, signature),
        };
        verified.map_err(|_| JwtError::InvalidSignature)
    }

    fn can_sign(&self) -> bool {
        self.private.is_some()
    }
}
