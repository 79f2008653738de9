// Copyright (c) The Diem Core Contributors
// Copyright (c) The Move Contributors
// SPDX-License-Identifier: Apache-2.0

use aptos_bcs_utils::{Deserializable, Deserializer, Serializable, Serializer};
use hex::FromHex;
use serde::{
    de::Error as DeError, Deserialize, Deserializer as SerdeDeserializer, Serialize,
    Serializer as SerdeSerializer,
};
use std::{fmt, str::FromStr};
use thiserror::Error;

/// A struct that represents an account address.
#[derive(Ord, PartialOrd, Eq, PartialEq, Hash, Clone, Copy, Default)]
pub struct AccountAddress([u8; AccountAddress::LENGTH]);

impl AccountAddress {
    /// The number of bytes in an address.
    pub const LENGTH: usize = 32;
    /// Hex address: 0x0
    pub const ZERO: Self = Self([0u8; Self::LENGTH]);
    /// Hex address: 0x1
    pub const ONE: Self = Self::get_hex_address_one();
    /// Hex address: 0x3
    pub const THREE: Self = Self::from_suffix(3);
    /// Hex address: 0xA
    pub const TEN: Self = Self::from_suffix(0xa);

    pub const fn new(address: [u8; Self::LENGTH]) -> Self {
        Self(address)
    }

    const fn get_hex_address_one() -> Self {
        Self::from_suffix(1)
    }

    const fn from_suffix(suffix: u8) -> Self {
        let mut addr = [0u8; AccountAddress::LENGTH];
        addr[AccountAddress::LENGTH - 1] = suffix;
        Self(addr)
    }

    /// Addresses `0x0` through `0xf`, which display in short form.
    pub fn is_special(&self) -> bool {
        self.0[..Self::LENGTH - 1].iter().all(|x| *x == 0) && self.0[Self::LENGTH - 1] < 0b10000
    }

    /// Parses `0x` followed by 1 to 64 hex digits, left-padding with zeros.
    pub fn from_hex_literal(literal: &str) -> Result<Self, AccountAddressParseError> {
        let hex = literal
            .strip_prefix("0x")
            .ok_or_else(|| AccountAddressParseError::MissingPrefix(literal.to_string()))?;
        Self::from_relaxed_hex(literal, hex)
    }

    /// Accepts the long form only: `0x` followed by exactly 64 hex digits, except for special
    /// addresses which may also use the short form `0x0`..`0xf`.
    pub fn from_str_strict(s: &str) -> Result<Self, AccountAddressParseError> {
        let hex = s
            .strip_prefix("0x")
            .ok_or_else(|| AccountAddressParseError::MissingPrefix(s.to_string()))?;
        if hex.len() == Self::LENGTH * 2 {
            return Self::from_hex(hex);
        }
        let address = Self::from_relaxed_hex(s, hex)?;
        if hex.len() == 1 && address.is_special() {
            Ok(address)
        } else {
            Err(AccountAddressParseError::NotLongForm(s.to_string()))
        }
    }

    fn from_relaxed_hex(original: &str, hex: &str) -> Result<Self, AccountAddressParseError> {
        if hex.is_empty() || hex.len() > Self::LENGTH * 2 {
            return Err(AccountAddressParseError::InvalidLength(original.to_string()));
        }
        let padded = format!("{:0>width$}", hex, width = Self::LENGTH * 2);
        Self::from_hex(padded)
    }

    pub fn from_hex<T: AsRef<[u8]>>(hex: T) -> Result<Self, AccountAddressParseError> {
        <[u8; Self::LENGTH]>::from_hex(hex.as_ref())
            .map_err(|e| AccountAddressParseError::InvalidHex(e.to_string()))
            .map(Self)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// `0x` followed by all 64 hex digits.
    pub fn to_hex_literal(&self) -> String {
        format!("0x{}", self.to_hex())
    }

    /// The AIP-40 representation: special addresses in short form, the rest in long form.
    pub fn to_standard_string(&self) -> String {
        if self.is_special() {
            format!("0x{:x}", self.0[Self::LENGTH - 1])
        } else {
            self.to_hex_literal()
        }
    }

    /// Hex without leading zeros, used in type names.
    pub fn short_str_lossless(&self) -> String {
        let hex_str = hex::encode(self.0).trim_start_matches('0').to_string();
        if hex_str.is_empty() {
            "0".to_string()
        } else {
            hex_str
        }
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }

    pub fn into_bytes(self) -> [u8; Self::LENGTH] {
        self.0
    }

    pub fn from_bytes<T: AsRef<[u8]>>(bytes: T) -> Result<Self, AccountAddressParseError> {
        <[u8; Self::LENGTH]>::try_from(bytes.as_ref())
            .map_err(|_| AccountAddressParseError::InvalidLength(hex::encode(bytes.as_ref())))
            .map(Self)
    }
}

impl AsRef<[u8]> for AccountAddress {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl std::ops::Deref for AccountAddress {
    type Target = [u8; Self::LENGTH];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Display for AccountAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_standard_string())
    }
}

impl fmt::Debug for AccountAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex_literal())
    }
}

impl fmt::LowerHex for AccountAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            write!(f, "0x")?;
        }
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl From<[u8; AccountAddress::LENGTH]> for AccountAddress {
    fn from(bytes: [u8; AccountAddress::LENGTH]) -> Self {
        Self::new(bytes)
    }
}

impl TryFrom<&[u8]> for AccountAddress {
    type Error = AccountAddressParseError;

    fn try_from(bytes: &[u8]) -> Result<AccountAddress, AccountAddressParseError> {
        Self::from_bytes(bytes)
    }
}

/// Relaxed parsing: the `0x` prefix is optional and short forms are left-padded.
impl FromStr for AccountAddress {
    type Err = AccountAddressParseError;

    fn from_str(s: &str) -> Result<Self, AccountAddressParseError> {
        let hex = s.strip_prefix("0x").unwrap_or(s);
        Self::from_relaxed_hex(s, hex)
    }
}

impl Serializable for AccountAddress {
    fn serialize(&self, serializer: &mut Serializer) -> aptos_bcs_utils::Result<()> {
        serializer.serialize_fixed_bytes(&self.0);
        Ok(())
    }
}

impl Deserializable for AccountAddress {
    fn deserialize(deserializer: &mut Deserializer<'_>) -> aptos_bcs_utils::Result<Self> {
        let bytes = deserializer.deserialize_fixed_bytes(Self::LENGTH)?;
        let mut address = [0u8; Self::LENGTH];
        address.copy_from_slice(&bytes);
        Ok(Self(address))
    }
}

impl<'de> Deserialize<'de> for AccountAddress {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: SerdeDeserializer<'de>,
    {
        let s = <String as Deserialize>::deserialize(deserializer)?;
        AccountAddress::from_str(&s).map_err(DeError::custom)
    }
}

impl Serialize for AccountAddress {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: SerdeSerializer,
    {
        serializer.serialize_str(&self.to_standard_string())
    }
}

#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum AccountAddressParseError {
    #[error("address '{0}' must start with 0x")]
    MissingPrefix(String),
    #[error("address '{0}' must have between 1 and 64 hex digits")]
    InvalidLength(String),
    #[error("address '{0}' must be in long form: 0x followed by 64 hex digits")]
    NotLongForm(String),
    #[error("invalid hex in address: {0}")]
    InvalidHex(String),
}
