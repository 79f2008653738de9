// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! ECDSA over secp256k1, backed by `libsecp256k1`.
//!
//! The curve operates on 32-byte digests, so every message is first hashed with SHA3-256. Public
//! keys use the 65-byte uncompressed SEC1 form and signatures the 64-byte `r || s` form. A
//! signature whose `s` lies in the upper half of the group order is rejected as malleable;
//! signing always produces the low-`s` form.

use crate::{
    hash::HashValue,
    traits::{CryptoMaterialError, Signature, SigningKey, ValidCryptoMaterial, VerifyingKey},
};
use aptos_bcs_utils::{BcsError, Deserializable, Deserializer, Serializable, Serializer};
use rand::{CryptoRng, RngCore};
use std::fmt;

pub const PRIVATE_KEY_LENGTH: usize = libsecp256k1::util::SECRET_KEY_SIZE;
pub const PUBLIC_KEY_LENGTH: usize = libsecp256k1::util::FULL_PUBLIC_KEY_SIZE;
pub const SIGNATURE_LENGTH: usize = libsecp256k1::util::SIGNATURE_SIZE;

pub struct PrivateKey(libsecp256k1::SecretKey);

#[derive(Clone, Eq, PartialEq)]
pub struct PublicKey(libsecp256k1::PublicKey);

#[derive(Clone, Eq, PartialEq)]
pub struct Secp256k1Signature(libsecp256k1::Signature);

fn message_digest(message: &[u8]) -> libsecp256k1::Message {
    libsecp256k1::Message::parse(HashValue::sha3_256_of(message).as_ref())
}

impl PrivateKey {
    /// Draws random scalars until one is a valid non-zero key below the group order.
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        loop {
            let mut bytes = [0u8; PRIVATE_KEY_LENGTH];
            rng.fill_bytes(&mut bytes);
            if let Ok(key) = libsecp256k1::SecretKey::parse(&bytes) {
                return PrivateKey(key);
            }
        }
    }

    pub fn to_bytes(&self) -> [u8; PRIVATE_KEY_LENGTH] {
        self.0.serialize()
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey(libsecp256k1::PublicKey::from_secret_key(&self.0))
    }
}

impl TryFrom<&[u8]> for PrivateKey {
    type Error = CryptoMaterialError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        if bytes.len() != PRIVATE_KEY_LENGTH {
            return Err(CryptoMaterialError::WrongLengthError);
        }
        libsecp256k1::SecretKey::parse_slice(bytes)
            .map(PrivateKey)
            .map_err(|_| CryptoMaterialError::DeserializationError)
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secp256k1PrivateKey(<elided secret>)")
    }
}

impl SigningKey for PrivateKey {
    type SignatureMaterial = Secp256k1Signature;
    type VerifyingKeyMaterial = PublicKey;

    fn sign_arbitrary_message(&self, message: &[u8]) -> Secp256k1Signature {
        let (signature, _recovery_id) = libsecp256k1::sign(&message_digest(message), &self.0);
        Secp256k1Signature(signature)
    }

    fn verifying_key(&self) -> PublicKey {
        self.public_key()
    }
}

impl PublicKey {
    pub fn to_bytes(&self) -> [u8; PUBLIC_KEY_LENGTH] {
        self.0.serialize()
    }
}

impl TryFrom<&[u8]> for PublicKey {
    type Error = CryptoMaterialError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        if bytes.len() != PUBLIC_KEY_LENGTH {
            return Err(CryptoMaterialError::WrongLengthError);
        }
        libsecp256k1::PublicKey::parse_slice(bytes, Some(libsecp256k1::PublicKeyFormat::Full))
            .map(PublicKey)
            .map_err(|_| CryptoMaterialError::PointNotOnCurveError)
    }
}

impl ValidCryptoMaterial for PublicKey {
    fn to_bytes(&self) -> Vec<u8> {
        self.0.serialize().to_vec()
    }
}

impl VerifyingKey for PublicKey {
    type SignatureMaterial = Secp256k1Signature;
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0.serialize()))
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secp256k1PublicKey({})", self)
    }
}

impl Serializable for PublicKey {
    fn serialize(&self, serializer: &mut Serializer) -> aptos_bcs_utils::Result<()> {
        serializer.serialize_bytes(&self.0.serialize())
    }
}

impl Deserializable for PublicKey {
    fn deserialize(deserializer: &mut Deserializer<'_>) -> aptos_bcs_utils::Result<Self> {
        let bytes = deserializer.deserialize_bytes()?;
        PublicKey::try_from(bytes.as_slice())
            .map_err(|e| BcsError::invalid_value("Secp256k1PublicKey", e))
    }
}

impl Secp256k1Signature {
    pub fn to_bytes(&self) -> [u8; SIGNATURE_LENGTH] {
        self.0.serialize()
    }
}

impl TryFrom<&[u8]> for Secp256k1Signature {
    type Error = CryptoMaterialError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        if bytes.len() != SIGNATURE_LENGTH {
            return Err(CryptoMaterialError::WrongLengthError);
        }
        let signature = libsecp256k1::Signature::parse_standard_slice(bytes)
            .map_err(|_| CryptoMaterialError::DeserializationError)?;
        if signature.s.is_high() {
            return Err(CryptoMaterialError::CanonicalRepresentationError);
        }
        Ok(Secp256k1Signature(signature))
    }
}

impl ValidCryptoMaterial for Secp256k1Signature {
    fn to_bytes(&self) -> Vec<u8> {
        self.0.serialize().to_vec()
    }
}

impl Signature for Secp256k1Signature {
    type VerifyingKeyMaterial = PublicKey;

    fn verify_arbitrary_msg(&self, message: &[u8], public_key: &PublicKey) -> anyhow::Result<()> {
        if self.0.s.is_high() {
            anyhow::bail!(CryptoMaterialError::CanonicalRepresentationError);
        }
        if libsecp256k1::verify(&message_digest(message), &self.0, &public_key.0) {
            Ok(())
        } else {
            anyhow::bail!("secp256k1 signature verification failed")
        }
    }
}

impl fmt::Debug for Secp256k1Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secp256k1Signature(0x{})", hex::encode(self.0.serialize()))
    }
}

impl Serializable for Secp256k1Signature {
    fn serialize(&self, serializer: &mut Serializer) -> aptos_bcs_utils::Result<()> {
        serializer.serialize_bytes(&self.0.serialize())
    }
}

impl Deserializable for Secp256k1Signature {
    fn deserialize(deserializer: &mut Deserializer<'_>) -> aptos_bcs_utils::Result<Self> {
        let bytes = deserializer.deserialize_bytes()?;
        Secp256k1Signature::try_from(bytes.as_slice())
            .map_err(|e| BcsError::invalid_value("Secp256k1Signature", e))
    }
}
