// Copyright © Aptos Foundation
// Parts of the project are originally copyright © Meta Platforms, Inc.
// SPDX-License-Identifier: Apache-2.0

//! SHA3-256 hashing and the domain-separation prefixes mixed into every signed or hashed
//! protocol message.
//!
//! A type that is hashed or signed is identified by a name such as `RawTransaction`. Its prefix is
//! `sha3_256(b"APTOS::" ++ name)`; the prefix is always hashed, never used raw, so every prefix is
//! exactly [`HashValue::LENGTH`] bytes.

use aptos_bcs_utils::{BcsError, Deserializable, Deserializer, Serializable, Serializer};
use hex::FromHex;
use std::{fmt, str::FromStr};
use tiny_keccak::{Hasher, Sha3};

/// Prefix prepended to a type name before it is hashed into a domain-separation seed.
pub const HASH_PREFIX: &[u8] = b"APTOS::";

/// Output value of our hash function.
#[derive(Clone, Copy, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct HashValue {
    hash: [u8; HashValue::LENGTH],
}

impl HashValue {
    /// The length of the hash in bytes.
    pub const LENGTH: usize = 32;

    pub const fn new(hash: [u8; HashValue::LENGTH]) -> Self {
        HashValue { hash }
    }

    pub fn from_slice<T: AsRef<[u8]>>(bytes: T) -> Result<Self, HashValueParseError> {
        <[u8; Self::LENGTH]>::try_from(bytes.as_ref())
            .map_err(|_| HashValueParseError)
            .map(Self::new)
    }

    pub fn sha3_256_of(buffer: &[u8]) -> Self {
        let mut sha3 = Sha3::v256();
        sha3.update(buffer);
        Self::from_keccak(sha3)
    }

    /// Hashes the concatenation of `buffers` without materializing it.
    pub fn sha3_256_of_all(buffers: &[&[u8]]) -> Self {
        let mut sha3 = Sha3::v256();
        for buffer in buffers {
            sha3.update(buffer);
        }
        Self::from_keccak(sha3)
    }

    fn from_keccak(state: Sha3) -> Self {
        let mut hash = Self::zero();
        state.finalize(hash.as_mut());
        hash
    }

    pub const fn zero() -> Self {
        HashValue {
            hash: [0; HashValue::LENGTH],
        }
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.hash.to_vec()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.hash)
    }

    pub fn to_hex_literal(&self) -> String {
        format!("0x{}", self.to_hex())
    }

    pub fn from_hex<T: AsRef<[u8]>>(hex: T) -> Result<Self, HashValueParseError> {
        <[u8; Self::LENGTH]>::from_hex(hex)
            .map_err(|_| HashValueParseError)
            .map(Self::new)
    }
}

impl AsRef<[u8; HashValue::LENGTH]> for HashValue {
    fn as_ref(&self) -> &[u8; HashValue::LENGTH] {
        &self.hash
    }
}

impl AsMut<[u8]> for HashValue {
    fn as_mut(&mut self) -> &mut [u8] {
        &mut self.hash
    }
}

impl std::ops::Deref for HashValue {
    type Target = [u8; Self::LENGTH];

    fn deref(&self) -> &Self::Target {
        &self.hash
    }
}

impl fmt::LowerHex for HashValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            write!(f, "0x")?;
        }
        for byte in &self.hash {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl fmt::Debug for HashValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HashValue(")?;
        <Self as fmt::LowerHex>::fmt(self, f)?;
        write!(f, ")")
    }
}

impl fmt::Display for HashValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        <Self as fmt::LowerHex>::fmt(self, f)
    }
}

impl FromStr for HashValue {
    type Err = HashValueParseError;

    fn from_str(s: &str) -> Result<Self, HashValueParseError> {
        HashValue::from_hex(s.strip_prefix("0x").unwrap_or(s))
    }
}

/// Written as length-prefixed bytes, matching how the chain encodes `HashValue`.
impl Serializable for HashValue {
    fn serialize(&self, serializer: &mut Serializer) -> aptos_bcs_utils::Result<()> {
        serializer.serialize_bytes(&self.hash)
    }
}

impl Deserializable for HashValue {
    fn deserialize(deserializer: &mut Deserializer<'_>) -> aptos_bcs_utils::Result<Self> {
        let bytes = deserializer.deserialize_bytes()?;
        HashValue::from_slice(&bytes).map_err(|e| BcsError::invalid_value("HashValue", e))
    }
}

/// Parse error when attempting to construct a HashValue
#[derive(Clone, Copy, Debug, thiserror::Error)]
#[error("unable to parse HashValue")]
pub struct HashValueParseError;

/// Computes domain-separation seeds and prefixed hashes.
pub struct DefaultHasher;

impl DefaultHasher {
    /// `sha3_256(b"APTOS::" ++ type_name)`.
    pub fn prefixed_hash(type_name: &[u8]) -> HashValue {
        HashValue::sha3_256_of_all(&[HASH_PREFIX, type_name])
    }

    /// Hash of `bytes` under the seed derived from `type_name`.
    pub fn hash_with_seed(type_name: &[u8], bytes: &[u8]) -> HashValue {
        let seed = Self::prefixed_hash(type_name);
        HashValue::sha3_256_of_all(&[seed.as_ref(), bytes])
    }
}
