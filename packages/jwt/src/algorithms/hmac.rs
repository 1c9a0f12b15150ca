//! HMAC-based algorithms (HS256, HS384, HS512).

use super::{wrong_family, AlgorithmId};
use crate::error::{JwtError, JwtResult};
use crate::traits::Algorithm;
use crate::utils::constant_time_eq;
use ::hmac::digest::KeyInit;
use ::hmac::{Hmac as HmacCore, Mac};
use sha2::{Sha256, Sha384, Sha512};
use std::fmt;
use zeroize::Zeroizing;

type HmacSha256 = HmacCore<Sha256>;
type HmacSha384 = HmacCore<Sha384>;
type HmacSha512 = HmacCore<Sha512>;

/// HMAC provider holding a shared secret.
///
/// The secret is wiped on drop. Any secret length is accepted; secrets shorter
/// than the digest output are reported at debug level only.
pub struct Hmac {
    id: AlgorithmId,
    secret: Zeroizing<Vec<u8>>,
}

impl Hmac {
    /// Provider for any HS* identifier.
    pub fn new(id: AlgorithmId, secret: impl AsRef<[u8]>) -> JwtResult<Self> {
        if !id.is_symmetric() {
            return Err(wrong_family(id, "HMAC"));
        }
        Ok(Self::with_id(id, secret))
    }

    /// HS256 provider.
    pub fn hs256(secret: impl AsRef<[u8]>) -> Self {
        Self::with_id(AlgorithmId::Hs256, secret)
    }

    /// HS384 provider.
    pub fn hs384(secret: impl AsRef<[u8]>) -> Self {
        Self::with_id(AlgorithmId::Hs384, secret)
    }

    /// HS512 provider.
    pub fn hs512(secret: impl AsRef<[u8]>) -> Self {
        Self::with_id(AlgorithmId::Hs512, secret)
    }

    fn with_id(id: AlgorithmId, secret: impl AsRef<[u8]>) -> Self {
        let secret = Zeroizing::new(secret.as_ref().to_vec());
        let recommended = crate::keys::recommended_key_size(id) / 8;
        if secret.len() < recommended {
            tracing::debug!(
                alg = id.as_str(),
                secret_len = secret.len(),
                recommended,
                "HMAC secret shorter than digest output"
            );
        }
        Self { id, secret }
    }

    fn mac(&self, data: &[u8]) -> JwtResult<Vec<u8>> {
        fn run<M: Mac + KeyInit>(secret: &[u8], data: &[u8]) -> JwtResult<Vec<u8>> {
            let mut mac = <M as KeyInit>::new_from_slice(secret)
                .map_err(|_| JwtError::invalid_key("invalid HMAC key"))?;
            mac.update(data);
            Ok(mac.finalize().into_bytes().to_vec())
        }

        match self.id {
            AlgorithmId::Hs256 => run::<HmacSha256>(&self.secret, data),
            AlgorithmId::Hs384 => run::<HmacSha384>(&self.secret, data),
            _ => run::<HmacSha512>(&self.secret, data),
        }
    }
}

impl fmt::Debug for Hmac {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hmac")
            .field("alg", &self.id.as_str())
            .field("secret", &"<redacted>")
            .finish()
    }
}

impl Algorithm for Hmac {
    fn name(&self) -> &str {
        self.id.as_str()
    }

    fn sign(&self, data: &[u8]) -> JwtResult<Vec<u8>> {
        self.mac(data)
    }

    fn verify(&self, data: &[u8], signature: &[u8]) -> JwtResult<()> {
        let expected = self.mac(data)?;
        if constant_time_eq(&expected, signature) {
            Ok(())
        } else {
            Err(JwtError::InvalidSignature)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn test_hs256_rfc4231_case_2() {
        let mac = Hmac::hs256(b"Jefe");
        let sig = mac.sign(b"what do ya want for nothing?").unwrap();
        assert_eq!(
            sig,
            hex!("5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843")
        );
    }

    #[test]
    fn test_output_lengths() {
        assert_eq!(Hmac::hs256(b"k").sign(b"d").unwrap().len(), 32);
        assert_eq!(Hmac::hs384(b"k").sign(b"d").unwrap().len(), 48);
        assert_eq!(Hmac::hs512(b"k").sign(b"d").unwrap().len(), 64);
    }

    #[test]
    fn test_verify_rejects_wrong_secret_and_truncation() {
        let mac = Hmac::hs256(b"secret");
        let sig = mac.sign(b"data").unwrap();
        assert!(mac.verify(b"data", &sig).is_ok());
        assert_eq!(
            Hmac::hs256(b"other").verify(b"data", &sig),
            Err(JwtError::InvalidSignature)
        );
        assert_eq!(mac.verify(b"data", &sig[..16]), Err(JwtError::InvalidSignature));
        assert_eq!(mac.verify(b"data", &[]), Err(JwtError::InvalidSignature));
    }

    #[test]
    fn test_new_rejects_other_families() {
        let err = Hmac::new(AlgorithmId::Rs256, b"secret").unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::InvalidAlgorithm);
        assert_eq!(Hmac::new(AlgorithmId::Hs512, b"s").unwrap().name(), "HS512");
    }

    #[test]
    fn test_debug_redacts_secret() {
        let rendered = format!("{:?}", Hmac::hs256(b"super-secret"));
        assert!(!rendered.contains("super"));
    }
}
