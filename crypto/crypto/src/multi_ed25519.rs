// Copyright © Aptos Foundation
// Parts of the project are originally copyright © Meta Platforms, Inc.
// SPDX-License-Identifier: Apache-2.0

//! This file implements traits for MultiEd25519 public keys and signatures.
//!
//! A K-of-N public key is the concatenation of N Ed25519 public keys followed by the one byte
//! threshold K. A signature is the concatenation of the partial signatures, ordered by signer
//! index, followed by a 4-byte bitmap in which bit `7 - (i % 8)` of byte `i / 8` marks signer `i`.

use crate::{
    ed25519::{
        ED25519_PUBLIC_KEY_LENGTH, ED25519_SIGNATURE_LENGTH, Ed25519PublicKey, Ed25519Signature,
    },
    traits::{CryptoMaterialError, Signature, ValidCryptoMaterial, VerifyingKey},
};
use aptos_bcs_utils::{BcsError, Deserializable, Deserializer, Serializable, Serializer};
use std::fmt;
use thiserror::Error;

const MIN_NUM_OF_KEYS: usize = 2;
/// Maximum number of keys, bounded by the bitmap width.
pub const MAX_NUM_OF_KEYS: usize = 32;
pub const BITMAP_NUM_OF_BYTES: usize = 4;
const THRESHOLD_NUM_OF_BYTES: usize = 1;

/// Why a set of signer indices cannot be turned into a bitmap.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum BitmapError {
    #[error("signer index {0} is out of range, at most {max} signers are supported", max = MAX_NUM_OF_KEYS)]
    IndexOutOfRange(u8),
    #[error("duplicate signer index {0}")]
    Duplicate(u8),
    #[error("signer indices must be sorted in ascending order, {1} follows {0}")]
    Unsorted(u8, u8),
}

impl From<BitmapError> for CryptoMaterialError {
    fn from(e: BitmapError) -> Self {
        CryptoMaterialError::BitVecError(e.to_string())
    }
}

/// Builds the 4-byte signer bitmap. Indices must be strictly ascending and below 32.
pub fn create_bitmap(indices: &[u8]) -> Result<[u8; BITMAP_NUM_OF_BYTES], BitmapError> {
    let mut bitmap = [0u8; BITMAP_NUM_OF_BYTES];
    let mut previous: Option<u8> = None;
    for &index in indices {
        if index as usize >= MAX_NUM_OF_KEYS {
            return Err(BitmapError::IndexOutOfRange(index));
        }
        match previous {
            Some(prev) if prev == index => return Err(BitmapError::Duplicate(index)),
            Some(prev) if prev > index => return Err(BitmapError::Unsorted(prev, index)),
            _ => {},
        }
        bitmap_set_bit(&mut bitmap, index);
        previous = Some(index);
    }
    Ok(bitmap)
}

fn bitmap_set_bit(bitmap: &mut [u8; BITMAP_NUM_OF_BYTES], index: u8) {
    let bucket = index as usize / 8;
    let bucket_pos = index % 8;
    bitmap[bucket] |= 128 >> bucket_pos;
}

fn bitmap_get_bit(bitmap: &[u8; BITMAP_NUM_OF_BYTES], index: usize) -> bool {
    let bucket = index / 8;
    let bucket_pos = index % 8;
    (bitmap[bucket] & (128 >> bucket_pos)) != 0
}

/// Indices of the set bits, ascending.
pub fn bitmap_indices(bitmap: &[u8; BITMAP_NUM_OF_BYTES]) -> Vec<u8> {
    (0..MAX_NUM_OF_KEYS)
        .filter(|&i| bitmap_get_bit(bitmap, i))
        .map(|i| i as u8)
        .collect()
}

fn bitmap_count_ones(bitmap: &[u8; BITMAP_NUM_OF_BYTES]) -> u32 {
    bitmap.iter().map(|byte| byte.count_ones()).sum()
}

/// Vector of public keys in the multi-key Ed25519 structure along with the threshold.
#[derive(Clone, Eq, Hash, PartialEq)]
pub struct MultiEd25519PublicKey {
    public_keys: Vec<Ed25519PublicKey>,
    threshold: u8,
}

impl MultiEd25519PublicKey {
    /// Requires between 2 and 32 keys and `1 <= threshold <= public_keys.len()`.
    pub fn new(
        public_keys: Vec<Ed25519PublicKey>,
        threshold: u8,
    ) -> Result<Self, CryptoMaterialError> {
        let num_of_public_keys = public_keys.len();
        if threshold == 0 || num_of_public_keys < threshold as usize {
            Err(CryptoMaterialError::ValidationError)
        } else if !(MIN_NUM_OF_KEYS..=MAX_NUM_OF_KEYS).contains(&num_of_public_keys) {
            Err(CryptoMaterialError::WrongLengthError)
        } else {
            Ok(MultiEd25519PublicKey {
                public_keys,
                threshold,
            })
        }
    }

    pub fn public_keys(&self) -> &[Ed25519PublicKey] {
        &self.public_keys
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }
}

impl TryFrom<&[u8]> for MultiEd25519PublicKey {
    type Error = CryptoMaterialError;

    fn try_from(bytes: &[u8]) -> Result<Self, CryptoMaterialError> {
        let Some((&threshold, key_bytes)) = bytes.split_last() else {
            return Err(CryptoMaterialError::WrongLengthError);
        };
        if key_bytes.len() % ED25519_PUBLIC_KEY_LENGTH != 0 {
            return Err(CryptoMaterialError::WrongLengthError);
        }
        let public_keys = key_bytes
            .chunks_exact(ED25519_PUBLIC_KEY_LENGTH)
            .map(Ed25519PublicKey::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        MultiEd25519PublicKey::new(public_keys, threshold)
    }
}

impl ValidCryptoMaterial for MultiEd25519PublicKey {
    fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(
            self.public_keys.len() * ED25519_PUBLIC_KEY_LENGTH + THRESHOLD_NUM_OF_BYTES,
        );
        for key in &self.public_keys {
            bytes.extend_from_slice(&key.to_bytes());
        }
        bytes.push(self.threshold);
        bytes
    }
}

impl VerifyingKey for MultiEd25519PublicKey {
    type SignatureMaterial = MultiEd25519Signature;
}

impl fmt::Display for MultiEd25519PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(ValidCryptoMaterial::to_bytes(self)))
    }
}

impl fmt::Debug for MultiEd25519PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MultiEd25519PublicKey({}-of-{}, {})",
            self.threshold,
            self.public_keys.len(),
            self
        )
    }
}

impl Serializable for MultiEd25519PublicKey {
    fn serialize(&self, serializer: &mut Serializer) -> aptos_bcs_utils::Result<()> {
        serializer.serialize_bytes(&ValidCryptoMaterial::to_bytes(self))
    }
}

impl Deserializable for MultiEd25519PublicKey {
    fn deserialize(deserializer: &mut Deserializer<'_>) -> aptos_bcs_utils::Result<Self> {
        let bytes = deserializer.deserialize_bytes()?;
        MultiEd25519PublicKey::try_from(bytes.as_slice())
            .map_err(|e| BcsError::invalid_value("MultiEd25519PublicKey", e))
    }
}

/// Partial signatures ordered by signer index, plus the bitmap naming the signers.
#[derive(Clone, Eq, PartialEq)]
pub struct MultiEd25519Signature {
    signatures: Vec<Ed25519Signature>,
    bitmap: [u8; BITMAP_NUM_OF_BYTES],
}

impl MultiEd25519Signature {
    /// Pairs signatures with an existing bitmap. The number of set bits must equal the number of
    /// signatures.
    pub fn new(
        signatures: Vec<Ed25519Signature>,
        bitmap: [u8; BITMAP_NUM_OF_BYTES],
    ) -> Result<Self, CryptoMaterialError> {
        if bitmap_count_ones(&bitmap) as usize != signatures.len() {
            return Err(CryptoMaterialError::BitVecError(format!(
                "bitmap has {} signers but {} signatures were supplied",
                bitmap_count_ones(&bitmap),
                signatures.len()
            )));
        }
        Ok(MultiEd25519Signature { signatures, bitmap })
    }

    /// Builds the signature from `(signature, signer index)` pairs in ascending index order.
    pub fn from_signer_indices(
        signatures: Vec<(Ed25519Signature, u8)>,
    ) -> Result<Self, CryptoMaterialError> {
        let indices: Vec<u8> = signatures.iter().map(|(_, index)| *index).collect();
        let bitmap = create_bitmap(&indices)?;
        let signatures = signatures.into_iter().map(|(sig, _)| sig).collect();
        Ok(MultiEd25519Signature { signatures, bitmap })
    }

    pub fn signatures(&self) -> &[Ed25519Signature] {
        &self.signatures
    }

    pub fn bitmap(&self) -> &[u8; BITMAP_NUM_OF_BYTES] {
        &self.bitmap
    }
}

impl TryFrom<&[u8]> for MultiEd25519Signature {
    type Error = CryptoMaterialError;

    fn try_from(bytes: &[u8]) -> Result<Self, CryptoMaterialError> {
        if bytes.len() < BITMAP_NUM_OF_BYTES {
            return Err(CryptoMaterialError::WrongLengthError);
        }
        let (sig_bytes, bitmap_bytes) = bytes.split_at(bytes.len() - BITMAP_NUM_OF_BYTES);
        if sig_bytes.len() % ED25519_SIGNATURE_LENGTH != 0 {
            return Err(CryptoMaterialError::WrongLengthError);
        }
        let bitmap = <[u8; BITMAP_NUM_OF_BYTES]>::try_from(bitmap_bytes)
            .map_err(|_| CryptoMaterialError::WrongLengthError)?;
        let signatures = sig_bytes
            .chunks_exact(ED25519_SIGNATURE_LENGTH)
            .map(Ed25519Signature::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        MultiEd25519Signature::new(signatures, bitmap)
    }
}

impl ValidCryptoMaterial for MultiEd25519Signature {
    fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(
            self.signatures.len() * ED25519_SIGNATURE_LENGTH + BITMAP_NUM_OF_BYTES,
        );
        for signature in &self.signatures {
            bytes.extend_from_slice(&signature.to_bytes());
        }
        bytes.extend_from_slice(&self.bitmap);
        bytes
    }
}

impl Signature for MultiEd25519Signature {
    type VerifyingKeyMaterial = MultiEd25519PublicKey;

    /// Walks the bitmap in index order and checks each partial signature against the key at that
    /// index. Any failure rejects the whole signature.
    fn verify_arbitrary_msg(
        &self,
        message: &[u8],
        public_key: &MultiEd25519PublicKey,
    ) -> anyhow::Result<()> {
        let indices = bitmap_indices(&self.bitmap);
        if indices.len() != self.signatures.len() {
            anyhow::bail!(CryptoMaterialError::BitVecError(
                "bitmap does not match the number of signatures".to_string()
            ));
        }
        if indices.len() < public_key.threshold as usize {
            anyhow::bail!(CryptoMaterialError::BitVecError(format!(
                "{} signatures do not reach the threshold of {}",
                indices.len(),
                public_key.threshold
            )));
        }
        for (index, signature) in indices.iter().zip(self.signatures.iter()) {
            let key = public_key
                .public_keys
                .get(*index as usize)
                .ok_or_else(|| {
                    CryptoMaterialError::BitVecError(format!(
                        "signer index {} exceeds the {} public keys",
                        index,
                        public_key.public_keys.len()
                    ))
                })?;
            signature.verify_arbitrary_msg(message, key)?;
        }
        Ok(())
    }
}

impl fmt::Debug for MultiEd25519Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MultiEd25519Signature(signers: {:?}, 0x{})",
            bitmap_indices(&self.bitmap),
            hex::encode(ValidCryptoMaterial::to_bytes(self))
        )
    }
}

impl Serializable for MultiEd25519Signature {
    fn serialize(&self, serializer: &mut Serializer) -> aptos_bcs_utils::Result<()> {
        serializer.serialize_bytes(&ValidCryptoMaterial::to_bytes(self))
    }
}

impl Deserializable for MultiEd25519Signature {
    fn deserialize(deserializer: &mut Deserializer<'_>) -> aptos_bcs_utils::Result<Self> {
        let bytes = deserializer.deserialize_bytes()?;
        MultiEd25519Signature::try_from(bytes.as_slice())
            .map_err(|e| BcsError::invalid_value("MultiEd25519Signature", e))
    }
}
