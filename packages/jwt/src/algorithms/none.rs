//! The `none` algorithm.

use super::AlgorithmId;
use crate::error::{JwtError, JwtResult};
use crate::traits::Algorithm;

/// Unsigned tokens.
///
/// Signing yields an empty signature and verification accepts only an empty
/// signature. A verifier accepts such tokens only when this provider is
/// explicitly allow-listed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoneAlgorithm;

impl Algorithm for NoneAlgorithm {
    fn name(&self) -> &str {
        AlgorithmId::None.as_str()
    }

    fn sign(&self, _data: &[u8]) -> JwtResult<Vec<u8>> {
        Ok(Vec::new())
    }

    fn verify(&self, _data: &[u8], signature: &[u8]) -> JwtResult<()> {
        if signature.is_empty() {
            Ok(())
        } else {
            Err(JwtError::InvalidSignature)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_none_only_accepts_empty_signature() {
        let none = NoneAlgorithm;
        assert_eq!(none.name(), "none");
        assert!(none.sign(b"a.b").unwrap().is_empty());
        assert!(none.verify(b"a.b", b"").is_ok());
        assert_eq!(none.verify(b"a.b", b"x"), Err(JwtError::InvalidSignature));
    }
}
