// Copyright © Aptos Foundation
// Parts of the project are originally copyright © Meta Platforms, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Ed25519 keys and signatures backed by `ed25519-dalek`.
//!
//! Verification is strict: small-order public keys and non-canonical `S` scalars are rejected,
//! so each message has exactly one accepted signature per key.

use crate::traits::{
    CryptoMaterialError, Signature, SigningKey, ValidCryptoMaterial, VerifyingKey,
};
use aptos_bcs_utils::{BcsError, Deserializable, Deserializer, Serializable, Serializer};
use rand::{CryptoRng, RngCore};
use std::fmt;

/// The length of the Ed25519PrivateKey
pub const ED25519_PRIVATE_KEY_LENGTH: usize = ed25519_dalek::SECRET_KEY_LENGTH;
/// The length of the Ed25519PublicKey
pub const ED25519_PUBLIC_KEY_LENGTH: usize = ed25519_dalek::PUBLIC_KEY_LENGTH;
/// The length of the Ed25519Signature
pub const ED25519_SIGNATURE_LENGTH: usize = ed25519_dalek::SIGNATURE_LENGTH;

/// An Ed25519 private key. Deliberately not `Clone`: copies of secret material are made
/// explicitly through [`Ed25519PrivateKey::to_bytes`].
pub struct Ed25519PrivateKey(ed25519_dalek::SecretKey);

/// An Ed25519 public key
#[derive(Clone, Eq, PartialEq)]
pub struct Ed25519PublicKey(ed25519_dalek::PublicKey);

/// An Ed25519 signature
#[derive(Clone, Eq, PartialEq)]
pub struct Ed25519Signature(ed25519_dalek::Signature);

impl Ed25519PrivateKey {
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        Ed25519PrivateKey(ed25519_dalek::SecretKey::generate(rng))
    }

    pub fn to_bytes(&self) -> [u8; ED25519_PRIVATE_KEY_LENGTH] {
        self.0.to_bytes()
    }

    pub fn public_key(&self) -> Ed25519PublicKey {
        Ed25519PublicKey((&self.0).into())
    }
}

impl TryFrom<&[u8]> for Ed25519PrivateKey {
    type Error = CryptoMaterialError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        if bytes.len() != ED25519_PRIVATE_KEY_LENGTH {
            return Err(CryptoMaterialError::WrongLengthError);
        }
        ed25519_dalek::SecretKey::from_bytes(bytes)
            .map(Ed25519PrivateKey)
            .map_err(|_| CryptoMaterialError::DeserializationError)
    }
}

impl fmt::Debug for Ed25519PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ed25519PrivateKey(<elided secret>)")
    }
}

impl SigningKey for Ed25519PrivateKey {
    type SignatureMaterial = Ed25519Signature;
    type VerifyingKeyMaterial = Ed25519PublicKey;

    fn sign_arbitrary_message(&self, message: &[u8]) -> Ed25519Signature {
        let public_key: ed25519_dalek::PublicKey = (&self.0).into();
        let expanded = ed25519_dalek::ExpandedSecretKey::from(&self.0);
        Ed25519Signature(expanded.sign(message, &public_key))
    }

    fn verifying_key(&self) -> Ed25519PublicKey {
        self.public_key()
    }
}

impl Ed25519PublicKey {
    pub fn to_bytes(&self) -> [u8; ED25519_PUBLIC_KEY_LENGTH] {
        self.0.to_bytes()
    }
}

impl TryFrom<&[u8]> for Ed25519PublicKey {
    type Error = CryptoMaterialError;

    /// Rejects material that is not exactly 32 bytes or does not decompress to a curve point.
    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        if bytes.len() != ED25519_PUBLIC_KEY_LENGTH {
            return Err(CryptoMaterialError::WrongLengthError);
        }
        ed25519_dalek::PublicKey::from_bytes(bytes)
            .map(Ed25519PublicKey)
            .map_err(|_| CryptoMaterialError::PointNotOnCurveError)
    }
}

impl ValidCryptoMaterial for Ed25519PublicKey {
    fn to_bytes(&self) -> Vec<u8> {
        self.0.to_bytes().to_vec()
    }
}

impl VerifyingKey for Ed25519PublicKey {
    type SignatureMaterial = Ed25519Signature;
}

impl fmt::Display for Ed25519PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0.as_bytes()))
    }
}

impl fmt::Debug for Ed25519PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ed25519PublicKey({})", self)
    }
}

impl std::hash::Hash for Ed25519PublicKey {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.as_bytes().hash(state)
    }
}

impl Serializable for Ed25519PublicKey {
    fn serialize(&self, serializer: &mut Serializer) -> aptos_bcs_utils::Result<()> {
        serializer.serialize_bytes(self.0.as_bytes())
    }
}

impl Deserializable for Ed25519PublicKey {
    fn deserialize(deserializer: &mut Deserializer<'_>) -> aptos_bcs_utils::Result<Self> {
        let bytes = deserializer.deserialize_bytes()?;
        Ed25519PublicKey::try_from(bytes.as_slice())
            .map_err(|e| BcsError::invalid_value("Ed25519PublicKey", e))
    }
}

impl Ed25519Signature {
    pub fn to_bytes(&self) -> [u8; ED25519_SIGNATURE_LENGTH] {
        self.0.to_bytes()
    }
}

impl TryFrom<&[u8]> for Ed25519Signature {
    type Error = CryptoMaterialError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        if bytes.len() != ED25519_SIGNATURE_LENGTH {
            return Err(CryptoMaterialError::WrongLengthError);
        }
        ed25519_dalek::Signature::try_from(bytes)
            .map(Ed25519Signature)
            .map_err(|_| CryptoMaterialError::DeserializationError)
    }
}

impl ValidCryptoMaterial for Ed25519Signature {
    fn to_bytes(&self) -> Vec<u8> {
        self.0.to_bytes().to_vec()
    }
}

impl Signature for Ed25519Signature {
    type VerifyingKeyMaterial = Ed25519PublicKey;

    fn verify_arbitrary_msg(
        &self,
        message: &[u8],
        public_key: &Ed25519PublicKey,
    ) -> anyhow::Result<()> {
        public_key
            .0
            .verify_strict(message, &self.0)
            .map_err(|e| anyhow::anyhow!("Ed25519 signature verification failed: {}", e))
    }
}

impl fmt::Debug for Ed25519Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ed25519Signature(0x{})", hex::encode(self.0.to_bytes()))
    }
}

impl Serializable for Ed25519Signature {
    fn serialize(&self, serializer: &mut Serializer) -> aptos_bcs_utils::Result<()> {
        serializer.serialize_bytes(&self.0.to_bytes())
    }
}

impl Deserializable for Ed25519Signature {
    fn deserialize(deserializer: &mut Deserializer<'_>) -> aptos_bcs_utils::Result<Self> {
        let bytes = deserializer.deserialize_bytes()?;
        Ed25519Signature::try_from(bytes.as_slice())
            .map_err(|e| BcsError::invalid_value("Ed25519Signature", e))
    }
}
