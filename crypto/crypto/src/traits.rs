// Copyright © Aptos Foundation
// Parts of the project are originally copyright © Meta Platforms, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Shared vocabulary for keys and signatures: the error type raised when key material does not
//! parse, and the signing/verification traits implemented by every scheme in this crate.

use crate::hash::{DefaultHasher, HashValue};
use aptos_bcs_utils::Serializable;
use thiserror::Error;

/// An error type for key and signature validation issues, see [`ValidCryptoMaterial`].
///
/// This enum reflects there are two interesting causes of validation failure for the ingestion of
/// key or signature material: deserialization errors (often, due to mangled material or curve
/// equation failure for ECC) and validation errors (material recognizable but unacceptable for
/// use, e.g. unsafe).
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CryptoMaterialError {
    /// Struct to be signed does not serialize correctly.
    #[error("struct to be signed does not serialize correctly")]
    SerializationError,
    /// Key or signature material does not deserialize correctly.
    #[error("key or signature material does not deserialize correctly")]
    DeserializationError,
    /// Key or signature material deserializes, but is otherwise not valid.
    #[error("key or signature material is not valid")]
    ValidationError,
    /// Key, threshold or signature material does not have the expected size.
    #[error("key, threshold or signature material does not have the expected size")]
    WrongLengthError,
    /// Part of the signature or key is not canonical resulting to malleability issues.
    #[error("part of the signature or key is not canonical")]
    CanonicalRepresentationError,
    /// A curve point (i.e., a public key) lies on a small group.
    #[error("a curve point lies on a small group")]
    SmallSubgroupError,
    /// A curve point (i.e., a public key) does not satisfy the curve equation.
    #[error("a curve point does not satisfy the curve equation")]
    PointNotOnCurveError,
    /// BitVec errors in accountable multi-sig schemes.
    #[error("bitmap error: {0}")]
    BitVecError(String),
}

/// Key or signature material with a fixed canonical byte representation.
pub trait ValidCryptoMaterial: Sized + for<'a> TryFrom<&'a [u8], Error = CryptoMaterialError> {
    /// Canonical byte representation, without any length prefix.
    fn to_bytes(&self) -> Vec<u8>;
}

/// A value that is hashed and signed under its own domain-separation seed.
///
/// The seed is `sha3_256(b"APTOS::" ++ TYPE_NAME)`, so two types with the same BCS layout but
/// different names never produce colliding signing messages.
pub trait CryptoHash: Serializable {
    const TYPE_NAME: &'static str;

    fn hash_seed() -> HashValue {
        DefaultHasher::prefixed_hash(Self::TYPE_NAME.as_bytes())
    }

    fn hash(&self) -> Result<HashValue, CryptoMaterialError> {
        Ok(HashValue::sha3_256_of(&signing_message(self)?))
    }
}

/// Bytes a signer actually signs for `message`: its seed followed by its BCS encoding.
pub fn signing_message<T: CryptoHash + ?Sized>(
    message: &T,
) -> Result<Vec<u8>, CryptoMaterialError> {
    let body = message
        .bcs_to_bytes()
        .map_err(|_| CryptoMaterialError::SerializationError)?;
    let mut bytes = T::hash_seed().to_vec();
    bytes.extend_from_slice(&body);
    Ok(bytes)
}

/// A private key able to produce signatures of type `Self::SignatureMaterial`.
pub trait SigningKey {
    type VerifyingKeyMaterial: VerifyingKey<SignatureMaterial = Self::SignatureMaterial>;
    type SignatureMaterial: Signature<VerifyingKeyMaterial = Self::VerifyingKeyMaterial>;

    /// Signs `message` verbatim. Prefer [`SigningKey::sign`] for protocol messages so the domain
    /// seed is never forgotten.
    fn sign_arbitrary_message(&self, message: &[u8]) -> Self::SignatureMaterial;

    fn sign<T: CryptoHash + ?Sized>(
        &self,
        message: &T,
    ) -> Result<Self::SignatureMaterial, CryptoMaterialError> {
        Ok(self.sign_arbitrary_message(&signing_message(message)?))
    }

    fn verifying_key(&self) -> Self::VerifyingKeyMaterial;
}

/// A public key against which signatures are checked.
pub trait VerifyingKey: Sized {
    type SignatureMaterial: Signature<VerifyingKeyMaterial = Self>;

    fn verify_signature<T: CryptoHash + ?Sized>(
        &self,
        message: &T,
        signature: &Self::SignatureMaterial,
    ) -> anyhow::Result<()> {
        signature.verify(message, self)
    }
}

/// A signature checkable against a [`VerifyingKey`].
pub trait Signature: Sized {
    type VerifyingKeyMaterial: VerifyingKey<SignatureMaterial = Self>;

    fn verify<T: CryptoHash + ?Sized>(
        &self,
        message: &T,
        public_key: &Self::VerifyingKeyMaterial,
    ) -> anyhow::Result<()> {
        self.verify_arbitrary_msg(&signing_message(message)?, public_key)
    }

    /// Checks the signature over `message` verbatim.
    fn verify_arbitrary_msg(
        &self,
        message: &[u8],
        public_key: &Self::VerifyingKeyMaterial,
    ) -> anyhow::Result<()>;
}
