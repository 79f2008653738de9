// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

use crate::{BcsError, MAX_SEQUENCE_LENGTH, Result};
use ethnum::U256;

const INITIAL_CAPACITY: usize = 64;

/// A value that knows how to write its own canonical bytes.
pub trait Serializable {
    fn serialize(&self, serializer: &mut Serializer) -> Result<()>;

    fn bcs_to_bytes(&self) -> Result<Vec<u8>> {
        let mut serializer = Serializer::new();
        self.serialize(&mut serializer)?;
        Ok(serializer.into_bytes())
    }

    fn bcs_to_hex(&self) -> Result<String> {
        Ok(format!("0x{}", hex::encode(self.bcs_to_bytes()?)))
    }
}

/// Growable BCS output buffer. Every call appends at the end of the buffer; none of them are
/// idempotent.
#[derive(Clone, Debug)]
pub struct Serializer {
    output: Vec<u8>,
}

impl Default for Serializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Serializer {
    pub fn new() -> Self {
        Self::with_capacity(INITIAL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            output: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.output.len()
    }

    pub fn is_empty(&self) -> bool {
        self.output.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.output
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.output
    }

    fn ensure_capacity(&mut self, additional: usize) {
        let needed = self.output.len() + additional;
        if needed > self.output.capacity() {
            let mut capacity = self.output.capacity().max(INITIAL_CAPACITY);
            while capacity < needed {
                capacity *= 2;
            }
            self.output.reserve_exact(capacity - self.output.len());
        }
    }

    fn write(&mut self, bytes: &[u8]) {
        self.ensure_capacity(bytes.len());
        self.output.extend_from_slice(bytes);
    }

    pub fn serialize<T: Serializable + ?Sized>(&mut self, value: &T) -> Result<()> {
        value.serialize(self)
    }

    pub fn serialize_bool(&mut self, value: bool) {
        self.write(&[value as u8]);
    }

    pub fn serialize_u8(&mut self, value: u8) {
        self.write(&[value]);
    }

    pub fn serialize_u16(&mut self, value: u16) {
        self.write(&value.to_le_bytes());
    }

    pub fn serialize_u32(&mut self, value: u32) {
        self.write(&value.to_le_bytes());
    }

    pub fn serialize_u64(&mut self, value: u64) {
        self.write(&value.to_le_bytes());
    }

    pub fn serialize_u128(&mut self, value: u128) {
        self.write(&value.to_le_bytes());
    }

    pub fn serialize_u256(&mut self, value: &U256) {
        self.write(&value.to_le_bytes());
    }

    /// Writes 7 bits per byte, least significant group first, with the continuation bit set on
    /// every byte but the last.
    pub fn serialize_u32_as_uleb128(&mut self, value: u32) {
        let mut value = value;
        while value >= 0x80 {
            self.write(&[((value & 0x7f) as u8) | 0x80]);
            value >>= 7;
        }
        self.write(&[value as u8]);
    }

    pub fn serialize_variant_index(&mut self, index: u32) {
        self.serialize_u32_as_uleb128(index);
    }

    pub fn serialize_len(&mut self, len: usize) -> Result<()> {
        if len > MAX_SEQUENCE_LENGTH {
            return Err(BcsError::ExceededMaxLen(len));
        }
        self.serialize_u32_as_uleb128(len as u32);
        Ok(())
    }

    /// Length-prefixed byte sequence.
    pub fn serialize_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.serialize_len(bytes.len())?;
        self.write(bytes);
        Ok(())
    }

    /// Raw bytes with no length prefix; the reader must learn the length elsewhere.
    pub fn serialize_fixed_bytes(&mut self, bytes: &[u8]) {
        self.write(bytes);
    }

    pub fn serialize_str(&mut self, value: &str) -> Result<()> {
        self.serialize_bytes(value.as_bytes())
    }

    pub fn serialize_vector<T: Serializable>(&mut self, values: &[T]) -> Result<()> {
        self.serialize_len(values.len())?;
        for value in values {
            value.serialize(self)?;
        }
        Ok(())
    }

    pub fn serialize_option<T: Serializable>(&mut self, value: Option<&T>) -> Result<()> {
        match value {
            Some(value) => {
                self.serialize_bool(true);
                value.serialize(self)
            },
            None => {
                self.serialize_bool(false);
                Ok(())
            },
        }
    }
}

/// Bytes written verbatim, without a length prefix.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct FixedBytes(Vec<u8>);

impl FixedBytes {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.0
    }

    pub fn deserialize(deserializer: &mut crate::Deserializer<'_>, len: usize) -> Result<Self> {
        Ok(Self(deserializer.deserialize_fixed_bytes(len)?))
    }
}

impl From<Vec<u8>> for FixedBytes {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl Serializable for FixedBytes {
    fn serialize(&self, serializer: &mut Serializer) -> Result<()> {
        serializer.serialize_fixed_bytes(&self.0);
        Ok(())
    }
}

macro_rules! impl_serializable_primitive {
    ($ty:ty, $method:ident) => {
        impl Serializable for $ty {
            fn serialize(&self, serializer: &mut Serializer) -> Result<()> {
                serializer.$method(*self);
                Ok(())
            }
        }
    };
}

impl_serializable_primitive!(bool, serialize_bool);
impl_serializable_primitive!(u8, serialize_u8);
impl_serializable_primitive!(u16, serialize_u16);
impl_serializable_primitive!(u32, serialize_u32);
impl_serializable_primitive!(u64, serialize_u64);
impl_serializable_primitive!(u128, serialize_u128);

impl Serializable for U256 {
    fn serialize(&self, serializer: &mut Serializer) -> Result<()> {
        serializer.serialize_u256(self);
        Ok(())
    }
}

impl Serializable for str {
    fn serialize(&self, serializer: &mut Serializer) -> Result<()> {
        serializer.serialize_str(self)
    }
}

impl Serializable for String {
    fn serialize(&self, serializer: &mut Serializer) -> Result<()> {
        serializer.serialize_str(self)
    }
}

impl<T: Serializable> Serializable for Vec<T> {
    fn serialize(&self, serializer: &mut Serializer) -> Result<()> {
        serializer.serialize_vector(self)
    }
}

impl<T: Serializable> Serializable for Option<T> {
    fn serialize(&self, serializer: &mut Serializer) -> Result<()> {
        serializer.serialize_option(self.as_ref())
    }
}

impl<T: Serializable + ?Sized> Serializable for Box<T> {
    fn serialize(&self, serializer: &mut Serializer) -> Result<()> {
        (**self).serialize(serializer)
    }
}

impl<T: Serializable + ?Sized> Serializable for &T {
    fn serialize(&self, serializer: &mut Serializer) -> Result<()> {
        (**self).serialize(serializer)
    }
}
