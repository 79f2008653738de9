// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

use thiserror::Error;

pub type Result<T, E = BcsError> = std::result::Result<T, E>;

/// Failures raised while writing or reading BCS bytes. None of them are recoverable: a decode
/// that hits one of these must be abandoned as a whole.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum BcsError {
    #[error("unexpected end of buffer: requested {requested} bytes, {remaining} remaining")]
    EndOfBuffer { requested: usize, remaining: usize },
    #[error("invalid boolean byte {0:#04x}")]
    InvalidBool(u8),
    #[error("overflow while parsing uleb128-encoded u32 value")]
    Uleb128Overflow,
    #[error("non-canonical uleb128 encoding")]
    NonCanonicalUleb128,
    #[error("sequence length {0} exceeds the maximum encodable length")]
    ExceededMaxLen(usize),
    #[error("unknown variant index {index} for {type_name}")]
    UnknownVariant { type_name: &'static str, index: u32 },
    #[error("invalid utf-8 string: {0}")]
    InvalidUtf8(String),
    #[error("{remaining} bytes remain after decoding")]
    RemainingInput { remaining: usize },
    #[error("invalid hex string: {0}")]
    InvalidHex(String),
    #[error("invalid value for {type_name}: {reason}")]
    InvalidValue {
        type_name: &'static str,
        reason: String,
    },
}

impl BcsError {
    pub fn unknown_variant(type_name: &'static str, index: u32) -> Self {
        Self::UnknownVariant { type_name, index }
    }

    pub fn invalid_value(type_name: &'static str, reason: impl ToString) -> Self {
        Self::InvalidValue {
            type_name,
            reason: reason.to_string(),
        }
    }
}
