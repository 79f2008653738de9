// Copyright (c) The Diem Core Contributors
// Copyright (c) The Move Contributors
// SPDX-License-Identifier: Apache-2.0

//! An identifier is the name of an entity (module, resource, function, etc) in Move.
//!
//! A valid identifier is a non-empty ASCII string made of letters, digits and underscores.

use aptos_bcs_utils::{BcsError, Deserializable, Deserializer, Serializable, Serializer};
use serde::{de::Error as DeError, Deserialize, Serialize};
use std::{borrow::Borrow, fmt, ops::Deref, str::FromStr};
use thiserror::Error;

/// Return true if this character can appear in a Move identifier.
pub const fn is_valid_identifier_char(c: char) -> bool {
    matches!(c, '_' | 'a'..='z' | 'A'..='Z' | '0'..='9')
}

/// Describes what identifiers are allowed.
pub fn is_valid(s: &str) -> bool {
    !s.is_empty() && s.chars().all(is_valid_identifier_char)
}

#[derive(Clone, Debug, Eq, Error, PartialEq)]
#[error("invalid identifier '{0}'")]
pub struct IdentifierError(pub String);

/// An owned identifier.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Identifier(Box<str>);

impl Identifier {
    /// Creates a new `Identifier` instance.
    pub fn new(s: impl Into<Box<str>>) -> Result<Self, IdentifierError> {
        let s = s.into();
        if is_valid(&s) {
            Ok(Self(s))
        } else {
            Err(IdentifierError(s.into_string()))
        }
    }

    pub fn is_valid(s: impl AsRef<str>) -> bool {
        is_valid(s.as_ref())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0.into_string()
    }
}

impl FromStr for Identifier {
    type Err = IdentifierError;

    fn from_str(data: &str) -> Result<Self, IdentifierError> {
        Self::new(data)
    }
}

impl Deref for Identifier {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Identifier {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.0)
    }
}

impl Serializable for Identifier {
    fn serialize(&self, serializer: &mut Serializer) -> aptos_bcs_utils::Result<()> {
        serializer.serialize_str(&self.0)
    }
}

impl Deserializable for Identifier {
    fn deserialize(deserializer: &mut Deserializer<'_>) -> aptos_bcs_utils::Result<Self> {
        let s = deserializer.deserialize_str()?;
        Identifier::new(s).map_err(|e| BcsError::invalid_value("Identifier", e))
    }
}

impl Serialize for Identifier {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Identifier {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = <String as Deserialize>::deserialize(deserializer)?;
        Identifier::new(s).map_err(DeError::custom)
    }
}
