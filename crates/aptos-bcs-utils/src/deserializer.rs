// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

use crate::{BcsError, MAX_ULEB128_U32_BYTES, Result};
use ethnum::U256;

/// A value that can be constructed from BCS bytes.
pub trait Deserializable: Sized {
    fn deserialize(deserializer: &mut Deserializer<'_>) -> Result<Self>;

    /// Decodes a complete value; leftover bytes are an error.
    fn from_bcs_bytes(bytes: &[u8]) -> Result<Self> {
        let mut deserializer = Deserializer::new(bytes);
        let value = Self::deserialize(&mut deserializer)?;
        deserializer.end()?;
        Ok(value)
    }
}

/// Read cursor over BCS input. Every read is bounds-checked and advances the cursor.
#[derive(Clone, Debug)]
pub struct Deserializer<'a> {
    input: &'a [u8],
    offset: usize,
}

impl<'a> Deserializer<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Self { input, offset: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.input.len() - self.offset
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn end(&self) -> Result<()> {
        match self.remaining() {
            0 => Ok(()),
            remaining => Err(BcsError::RemainingInput { remaining }),
        }
    }

    fn read(&mut self, len: usize) -> Result<&'a [u8]> {
        let remaining = self.remaining();
        if len > remaining {
            return Err(BcsError::EndOfBuffer {
                requested: len,
                remaining,
            });
        }
        let bytes = &self.input[self.offset..self.offset + len];
        self.offset += len;
        Ok(bytes)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut array = [0u8; N];
        array.copy_from_slice(self.read(N)?);
        Ok(array)
    }

    pub fn deserialize<T: Deserializable>(&mut self) -> Result<T> {
        T::deserialize(self)
    }

    pub fn deserialize_bool(&mut self) -> Result<bool> {
        match self.deserialize_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            byte => Err(BcsError::InvalidBool(byte)),
        }
    }

    pub fn deserialize_u8(&mut self) -> Result<u8> {
        Ok(self.read(1)?[0])
    }

    pub fn deserialize_u16(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    pub fn deserialize_u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    pub fn deserialize_u64(&mut self) -> Result<u64> {
        Ok(u64::from_le_bytes(self.read_array()?))
    }

    pub fn deserialize_u128(&mut self) -> Result<u128> {
        Ok(u128::from_le_bytes(self.read_array()?))
    }

    pub fn deserialize_u256(&mut self) -> Result<U256> {
        Ok(U256::from_le_bytes(self.read_array()?))
    }

    /// Reads a ULEB128 value that must fit in 32 bits. Stops with an overflow error as soon as the
    /// accumulated value leaves the `u32` range, even when more continuation bytes follow.
    pub fn deserialize_uleb128_as_u32(&mut self) -> Result<u32> {
        let mut value: u64 = 0;
        for shift in (0..MAX_ULEB128_U32_BYTES * 7).step_by(7) {
            let byte = self.deserialize_u8()?;
            let digit = u64::from(byte & 0x7f);
            value |= digit << shift;
            if value > u64::from(u32::MAX) {
                return Err(BcsError::Uleb128Overflow);
            }
            if byte & 0x80 == 0 {
                if shift > 0 && digit == 0 {
                    return Err(BcsError::NonCanonicalUleb128);
                }
                return Ok(value as u32);
            }
        }
        Err(BcsError::Uleb128Overflow)
    }

    pub fn deserialize_variant_index(&mut self) -> Result<u32> {
        self.deserialize_uleb128_as_u32()
    }

    pub fn deserialize_len(&mut self) -> Result<usize> {
        Ok(self.deserialize_uleb128_as_u32()? as usize)
    }

    pub fn deserialize_bytes(&mut self) -> Result<Vec<u8>> {
        let len = self.deserialize_len()?;
        Ok(self.read(len)?.to_vec())
    }

    pub fn deserialize_fixed_bytes(&mut self, len: usize) -> Result<Vec<u8>> {
        Ok(self.read(len)?.to_vec())
    }

    pub fn deserialize_str(&mut self) -> Result<String> {
        String::from_utf8(self.deserialize_bytes()?)
            .map_err(|e| BcsError::InvalidUtf8(e.to_string()))
    }

    pub fn deserialize_vector<T: Deserializable>(&mut self) -> Result<Vec<T>> {
        let len = self.deserialize_len()?;
        // Cap the preallocation by what the input could possibly hold.
        let mut values = Vec::with_capacity(len.min(self.remaining()));
        for _ in 0..len {
            values.push(T::deserialize(self)?);
        }
        Ok(values)
    }

    pub fn deserialize_option<T: Deserializable>(&mut self) -> Result<Option<T>> {
        if self.deserialize_bool()? {
            Ok(Some(T::deserialize(self)?))
        } else {
            Ok(None)
        }
    }
}

macro_rules! impl_deserializable_primitive {
    ($ty:ty, $method:ident) => {
        impl Deserializable for $ty {
            fn deserialize(deserializer: &mut Deserializer<'_>) -> Result<Self> {
                deserializer.$method()
            }
        }
    };
}

impl_deserializable_primitive!(bool, deserialize_bool);
impl_deserializable_primitive!(u8, deserialize_u8);
impl_deserializable_primitive!(u16, deserialize_u16);
impl_deserializable_primitive!(u32, deserialize_u32);
impl_deserializable_primitive!(u64, deserialize_u64);
impl_deserializable_primitive!(u128, deserialize_u128);
impl_deserializable_primitive!(U256, deserialize_u256);
impl_deserializable_primitive!(String, deserialize_str);

impl<T: Deserializable> Deserializable for Vec<T> {
    fn deserialize(deserializer: &mut Deserializer<'_>) -> Result<Self> {
        deserializer.deserialize_vector()
    }
}

impl<T: Deserializable> Deserializable for Option<T> {
    fn deserialize(deserializer: &mut Deserializer<'_>) -> Result<Self> {
        deserializer.deserialize_option()
    }
}

impl<T: Deserializable> Deserializable for Box<T> {
    fn deserialize(deserializer: &mut Deserializer<'_>) -> Result<Self> {
        Ok(Box::new(T::deserialize(deserializer)?))
    }
}
