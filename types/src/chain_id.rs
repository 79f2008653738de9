// Copyright © Aptos Foundation
// Parts of the project are originally copyright © Meta Platforms, Inc.
// SPDX-License-Identifier: Apache-2.0

use anyhow::{bail, format_err, Error, Result};
use aptos_bcs_utils::{BcsError, Deserializable, Deserializer, Serializable, Serializer};
use serde::{de::Error as DeError, Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// A registry of named chain IDs.
/// Its main purpose is to improve human readability of reserved chain IDs in config files and CLI.
/// When signing transactions for such chains, the numerical chain ID should still be used
/// (e.g. MAINNET has numeric chain ID 1, TESTNET has chain ID 2, etc).
#[repr(u8)]
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum NamedChain {
    /// Users might accidentally initialize the ChainId field to 0, hence reserving ChainId 0 for
    /// accidental initialization.
    /// MAINNET is the Aptos mainnet production chain and is reserved for 1
    MAINNET = 1,
    // Even though these CHAIN IDs do not correspond to MAINNET, changing them should be avoided
    // since they can break test environments for various organisations.
    TESTNET = 2,
    DEVNET = 3,
    TESTING = 4,
    PREMAINNET = 5,
}

const MAINNET: &str = "mainnet";
const TESTNET: &str = "testnet";
const DEVNET: &str = "devnet";
const TESTING: &str = "testing";
const PREMAINNET: &str = "premainnet";

impl NamedChain {
    fn str_to_chain_id(string: &str) -> Result<ChainId> {
        let named_chain = match string.to_lowercase().as_str() {
            MAINNET => NamedChain::MAINNET,
            TESTNET => NamedChain::TESTNET,
            DEVNET => NamedChain::DEVNET,
            TESTING => NamedChain::TESTING,
            PREMAINNET => NamedChain::PREMAINNET,
            _ => bail!("Not a reserved chain: {:?}", string),
        };
        Ok(ChainId::new(named_chain.id()))
    }

    pub fn id(&self) -> u8 {
        *self as u8
    }

    pub fn from_chain_id(chain_id: &ChainId) -> Result<NamedChain, String> {
        match chain_id.id() {
            1 => Ok(NamedChain::MAINNET),
            2 => Ok(NamedChain::TESTNET),
            3 => Ok(NamedChain::DEVNET),
            4 => Ok(NamedChain::TESTING),
            5 => Ok(NamedChain::PREMAINNET),
            _ => Err(String::from("Not a named chain!")),
        }
    }
}

impl FromStr for NamedChain {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let chain_id = NamedChain::str_to_chain_id(s)?;
        NamedChain::from_chain_id(&chain_id).map_err(|e| format_err!("{}", e))
    }
}

impl fmt::Display for NamedChain {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            NamedChain::MAINNET => MAINNET,
            NamedChain::TESTNET => TESTNET,
            NamedChain::DEVNET => DEVNET,
            NamedChain::TESTING => TESTING,
            NamedChain::PREMAINNET => PREMAINNET,
        };
        write!(f, "{}", name)
    }
}

/// Note: u7 in a u8 is uleb-compatible, and any usage of this should be aware
/// that this field maybe updated to be uleb64 in the future
#[derive(Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ChainId(u8);

impl ChainId {
    pub fn new(id: u8) -> Self {
        assert!(id > 0, "cannot have chain ID of 0");
        Self(id)
    }

    pub fn id(&self) -> u8 {
        self.0
    }

    pub fn test() -> Self {
        ChainId::new(NamedChain::TESTING.id())
    }

    pub fn mainnet() -> Self {
        ChainId::new(NamedChain::MAINNET.id())
    }

    pub fn is_mainnet(&self) -> bool {
        self.0 == NamedChain::MAINNET.id()
    }

    pub fn is_testnet(&self) -> bool {
        self.0 == NamedChain::TESTNET.id()
    }
}

impl Default for ChainId {
    fn default() -> Self {
        Self::test()
    }
}

impl fmt::Debug for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match NamedChain::from_chain_id(self) {
            Ok(chain) => write!(f, "{}", chain),
            Err(_) => write!(f, "{}", self.0),
        }
    }
}

impl FromStr for ChainId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.is_empty() {
            bail!("Cannot create chain ID from empty string");
        }
        NamedChain::str_to_chain_id(s).or_else(|_err| {
            let value = s.parse::<u8>()?;
            if value == 0 {
                bail!("Chain ID cannot be 0");
            }
            Ok(ChainId::new(value))
        })
    }
}

impl Serializable for ChainId {
    fn serialize(&self, serializer: &mut Serializer) -> aptos_bcs_utils::Result<()> {
        serializer.serialize_u8(self.0);
        Ok(())
    }
}

impl Deserializable for ChainId {
    fn deserialize(deserializer: &mut Deserializer<'_>) -> aptos_bcs_utils::Result<Self> {
        match deserializer.deserialize_u8()? {
            0 => Err(BcsError::invalid_value("ChainId", "chain ID cannot be 0")),
            id => Ok(ChainId(id)),
        }
    }
}

impl Serialize for ChainId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_string())
        } else {
            serializer.serialize_u8(self.0)
        }
    }
}

impl<'de> Deserialize<'de> for ChainId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s = <String as Deserialize>::deserialize(deserializer)?;
            ChainId::from_str(&s).map_err(DeError::custom)
        } else {
            match <u8 as Deserialize>::deserialize(deserializer)? {
                0 => Err(DeError::custom("chain ID cannot be 0")),
                id => Ok(ChainId(id)),
            }
        }
    }
}
