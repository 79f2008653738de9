// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

//! A hand-driven implementation of Binary Canonical Serialization (BCS).
//!
//! Values opt into the format through two capabilities:
//!
//! * [`Serializable`] writes a value into a [`Serializer`]. Composite values never look at the
//!   internals of their fields, they only call the fields' own `serialize`.
//! * [`Deserializable`] constructs a value out of a [`Deserializer`]. It is a static constructor
//!   keyed by the target type, since decoding happens before an instance exists.
//!
//! Encoding rules:
//!
//! | Value | Encoding |
//! |-------|----------|
//! | `bool` | one byte, `0x00` or `0x01` |
//! | `u8`..`u256` | fixed width, little-endian |
//! | sequence lengths, enum tags | ULEB128, at most `u32::MAX` |
//! | bytes / string | ULEB128 length followed by the raw bytes |
//! | fixed bytes | raw bytes, length known from context |
//! | `vector<T>` | ULEB128 length followed by each element |
//! | `option<T>` | presence byte followed by the value when present |

mod deserializer;
mod error;
mod serializer;

pub use deserializer::{Deserializable, Deserializer};
pub use error::{BcsError, Result};
pub use ethnum::U256;
pub use serializer::{FixedBytes, Serializable, Serializer};

/// Largest sequence length that may be written or read. Lengths are carried as ULEB128-encoded
/// 32-bit values.
pub const MAX_SEQUENCE_LENGTH: usize = u32::MAX as usize;

/// Maximum number of bytes a ULEB128-encoded `u32` may occupy.
pub const MAX_ULEB128_U32_BYTES: usize = 5;

/// Serializes `value` and returns the resulting bytes.
pub fn to_bytes<T: Serializable + ?Sized>(value: &T) -> Result<Vec<u8>> {
    value.bcs_to_bytes()
}

/// Decodes a `T` from `bytes`, failing if any input is left over.
pub fn from_bytes<T: Deserializable>(bytes: &[u8]) -> Result<T> {
    T::from_bcs_bytes(bytes)
}

/// Decodes a `0x`-prefixed (or bare) hex string into a `T`.
pub fn from_hex<T: Deserializable>(hex_str: &str) -> Result<T> {
    let bytes = hex::decode(hex_str.strip_prefix("0x").unwrap_or(hex_str))
        .map_err(|e| BcsError::InvalidHex(e.to_string()))?;
    T::from_bcs_bytes(&bytes)
}
