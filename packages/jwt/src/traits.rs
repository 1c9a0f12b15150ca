//! Core signing contract.

use crate::error::JwtResult;
use std::sync::Arc;

/// Signing algorithm interface.
///
/// A provider owns its key material and is immutable after construction, so
/// one instance can be shared across threads and calls. `data` is always the
/// exact `header.payload` text of the token.
pub trait Algorithm: Send + Sync {
    /// Header `alg` value, e.g. `"HS256"`.
    fn name(&self) -> &str;

    /// Sign `data`.
    ///
    /// Providers built from a public key only fail with
    /// [`crate::JwtError::InvalidOperation`].
    fn sign(&self, data: &[u8]) -> JwtResult<Vec<u8>>;

    /// Check `signature` over `data`. Mismatch is
    /// [`crate::JwtError::InvalidSignature`].
    fn verify(&self, data: &[u8], signature: &[u8]) -> JwtResult<()>;

    /// Whether [`Algorithm::sign`] can succeed.
    fn can_sign(&self) -> bool {
        true
    }
}

/// Implementation of Algorithm for Arc<T> to allow shared ownership.
impl<T: Algorithm + ?Sized> Algorithm for Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn sign(&self, data: &[u8]) -> JwtResult<Vec<u8>> {
        (**self).sign(data)
    }

    fn verify(&self, data: &[u8], signature: &[u8]) -> JwtResult<()> {
        (**self).verify(data, signature)
    }

    fn can_sign(&self) -> bool {
        (**self).can_sign()
    }
}

impl<T: Algorithm + ?Sized> Algorithm for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn sign(&self, data: &[u8]) -> JwtResult<Vec<u8>> {
        (**self).sign(data)
    }

    fn verify(&self, data: &[u8], signature: &[u8]) -> JwtResult<()> {
        (**self).verify(data, signature)
    }

    fn can_sign(&self) -> bool {
        (**self).can_sign()
    }
}

impl<T: Algorithm + ?Sized> Algorithm for &T {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn sign(&self, data: &[u8]) -> JwtResult<Vec<u8>> {
        (**self).sign(data)
    }

    fn verify(&self, data: &[u8], signature: &[u8]) -> JwtResult<()> {
        (**self).verify(data, signature)
    }

    fn can_sign(&self) -> bool {
        (**self).can_sign()
    }
}
