//! Key material and provider construction by algorithm name.
//!
//! Useful when the algorithm comes from configuration rather than code:
//! [`provider`] picks the family for an [`AlgorithmId`] and refuses key
//! material that does not belong to it.

use crate::algorithms::{AlgorithmDescriptor, AlgorithmId, EdDsa, Ecdsa, Hmac, NoneAlgorithm, Rsa};
use crate::error::{JwtError, JwtResult};

/// Smallest RSA modulus accepted, in bits.
pub const MIN_RSA_BITS: usize = 2048;

/// Key material handed to [`provider`].
#[derive(Clone, Copy)]
pub enum KeyMaterial<'a> {
    /// No key; only valid for `none`.
    Empty,
    /// Shared secret for HS*.
    Secret(&'a [u8]),
    /// PEM private key; the provider can sign and verify.
    PrivatePem(&'a str),
    /// PEM public key; the provider can only verify.
    PublicPem(&'a str),
}

impl KeyMaterial<'_> {
    fn label(&self) -> &'static str {
        match self {
            KeyMaterial::Empty => "no key",
            KeyMaterial::Secret(_) => "a shared secret",
            KeyMaterial::PrivatePem(_) => "a PEM private key",
            KeyMaterial::PublicPem(_) => "a PEM public key",
        }
    }
}

impl std::fmt::Debug for KeyMaterial<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Recommended key size for an algorithm, in bits.
#[must_use]
pub fn recommended_key_size(id: AlgorithmId) -> usize {
    match id {
        AlgorithmId::None => 0,
        AlgorithmId::Hs256 | AlgorithmId::Es256 | AlgorithmId::Es256k | AlgorithmId::EdDsa => 256,
        AlgorithmId::Hs384 | AlgorithmId::Es384 => 384,
        AlgorithmId::Hs512 => 512,
        AlgorithmId::Es512 => 521,
        AlgorithmId::Rs256
        | AlgorithmId::Rs384
        | AlgorithmId::Rs512
        | AlgorithmId::Ps256
        | AlgorithmId::Ps384
        | AlgorithmId::Ps512 => MIN_RSA_BITS,
    }
}

/// Build the provider for `id` from `material`.
pub fn provider(id: AlgorithmId, material: KeyMaterial<'_>) -> JwtResult<AlgorithmDescriptor> {
    let descriptor = match (id, material) {
        (AlgorithmId::None, KeyMaterial::Empty) => AlgorithmDescriptor::new(NoneAlgorithm),
        (AlgorithmId::Hs256 | AlgorithmId::Hs384 | AlgorithmId::Hs512, KeyMaterial::Secret(secret)) => {
            AlgorithmDescriptor::new(Hmac::new(id, secret)?)
        }
        (
            AlgorithmId::Rs256
            | AlgorithmId::Rs384
            | AlgorithmId::Rs512
            | AlgorithmId::Ps256
            | AlgorithmId::Ps384
            | AlgorithmId::Ps512,
            KeyMaterial::PrivatePem(pem),
        ) => AlgorithmDescriptor::new(Rsa::from_private_pem(id, pem)?),
        (
            AlgorithmId::Rs256
            | AlgorithmId::Rs384
            | AlgorithmId::Rs512
            | AlgorithmId::Ps256
            | AlgorithmId::Ps384
            | AlgorithmId::Ps512,
            KeyMaterial::PublicPem(pem),
        ) => AlgorithmDescriptor::new(Rsa::from_public_pem(id, pem)?),
        (
            AlgorithmId::Es256 | AlgorithmId::Es384 | AlgorithmId::Es512 | AlgorithmId::Es256k,
            KeyMaterial::PrivatePem(pem),
        ) => AlgorithmDescriptor::new(Ecdsa::from_private_pem(id, pem)?),
        (
            AlgorithmId::Es256 | AlgorithmId::Es384 | AlgorithmId::Es512 | AlgorithmId::Es256k,
            KeyMaterial::PublicPem(pem),
        ) => AlgorithmDescriptor::new(Ecdsa::from_public_pem(id, pem)?),
        (AlgorithmId::EdDsa, KeyMaterial::PrivatePem(pem)) => {
            AlgorithmDescriptor::new(EdDsa::from_private_pem(pem)?)
        }
        (AlgorithmId::EdDsa, KeyMaterial::PublicPem(pem)) => {
            AlgorithmDescriptor::new(EdDsa::from_public_pem(pem)?)
        }
        (id, material) => {
            return Err(JwtError::InvalidKey(format!(
                "{id} cannot be used with {}",
                material.label()
            )))
        }
    };
    tracing::trace!(alg = descriptor.name(), "provider constructed");
    Ok(descriptor)
}
