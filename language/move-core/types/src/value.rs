// Copyright (c) The Diem Core Contributors
// Copyright (c) The Move Contributors
// SPDX-License-Identifier: Apache-2.0

//! Typed Move values as they appear in transaction arguments.
//!
//! A `MoveValue` knows its own shape, so it can be checked against a parameter's [`TypeTag`]
//! before it is encoded. Decoding needs the type from outside, see
//! [`MoveValue::simple_deserialize`].

use crate::{account_address::AccountAddress, language_storage::TypeTag};
use aptos_bcs_utils::{BcsError, Deserializer, Serializable, Serializer, U256};
use std::fmt;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum MoveValue {
    Bool(bool),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    U128(u128),
    U256(U256),
    Address(AccountAddress),
    Vector(Vec<MoveValue>),
    /// A `0x1::string::String`.
    String(String),
    /// A `0x1::option::Option<T>`.
    Option(Option<Box<MoveValue>>),
}

impl MoveValue {
    pub fn vector_u8(v: Vec<u8>) -> Self {
        MoveValue::Vector(v.into_iter().map(MoveValue::U8).collect())
    }

    pub fn vector_address(v: Vec<AccountAddress>) -> Self {
        MoveValue::Vector(v.into_iter().map(MoveValue::Address).collect())
    }

    pub fn some(inner: MoveValue) -> Self {
        MoveValue::Option(Some(Box::new(inner)))
    }

    pub fn none() -> Self {
        MoveValue::Option(None)
    }

    pub fn simple_serialize(&self) -> aptos_bcs_utils::Result<Vec<u8>> {
        self.bcs_to_bytes()
    }

    /// Decodes a complete value of type `ty` from `blob`.
    pub fn simple_deserialize(blob: &[u8], ty: &TypeTag) -> aptos_bcs_utils::Result<Self> {
        let mut deserializer = Deserializer::new(blob);
        let value = Self::deserialize_as(&mut deserializer, ty)?;
        deserializer.end()?;
        Ok(value)
    }

    fn deserialize_as(
        deserializer: &mut Deserializer<'_>,
        ty: &TypeTag,
    ) -> aptos_bcs_utils::Result<Self> {
        Ok(match ty {
            TypeTag::Bool => MoveValue::Bool(deserializer.deserialize_bool()?),
            TypeTag::U8 => MoveValue::U8(deserializer.deserialize_u8()?),
            TypeTag::U16 => MoveValue::U16(deserializer.deserialize_u16()?),
            TypeTag::U32 => MoveValue::U32(deserializer.deserialize_u32()?),
            TypeTag::U64 => MoveValue::U64(deserializer.deserialize_u64()?),
            TypeTag::U128 => MoveValue::U128(deserializer.deserialize_u128()?),
            TypeTag::U256 => MoveValue::U256(deserializer.deserialize_u256()?),
            TypeTag::Address => MoveValue::Address(deserializer.deserialize()?),
            TypeTag::Vector(inner) => {
                let len = deserializer.deserialize_len()?;
                let mut values = Vec::with_capacity(len.min(deserializer.remaining()));
                for _ in 0..len {
                    values.push(Self::deserialize_as(deserializer, inner)?);
                }
                MoveValue::Vector(values)
            },
            TypeTag::Struct(tag) if tag.is_string() => {
                MoveValue::String(deserializer.deserialize_str()?)
            },
            TypeTag::Struct(tag) if tag.is_object() => {
                MoveValue::Address(deserializer.deserialize()?)
            },
            TypeTag::Struct(tag) if tag.is_option() => {
                let inner = tag.type_args.first().ok_or_else(|| {
                    BcsError::invalid_value("MoveValue", "option without a type argument")
                })?;
                // Options are vectors of length zero or one on the wire.
                match deserializer.deserialize_len()? {
                    0 => MoveValue::Option(None),
                    1 => MoveValue::some(Self::deserialize_as(deserializer, inner)?),
                    n => {
                        return Err(BcsError::invalid_value(
                            "MoveValue",
                            format!("option with {} elements", n),
                        ))
                    },
                }
            },
            other => {
                return Err(BcsError::invalid_value(
                    "MoveValue",
                    format!("cannot decode a value of type {}", other),
                ))
            },
        })
    }

    /// Whether this value has the shape `ty` describes. `Object<T>` accepts any address and the
    /// empty option accepts any inner type.
    pub fn matches_type(&self, ty: &TypeTag) -> bool {
        match (self, ty) {
            (MoveValue::Bool(_), TypeTag::Bool)
            | (MoveValue::U8(_), TypeTag::U8)
            | (MoveValue::U16(_), TypeTag::U16)
            | (MoveValue::U32(_), TypeTag::U32)
            | (MoveValue::U64(_), TypeTag::U64)
            | (MoveValue::U128(_), TypeTag::U128)
            | (MoveValue::U256(_), TypeTag::U256)
            | (MoveValue::Address(_), TypeTag::Address) => true,
            (MoveValue::Address(_), TypeTag::Struct(tag)) => tag.is_object(),
            (MoveValue::Vector(values), TypeTag::Vector(inner)) => {
                values.iter().all(|value| value.matches_type(inner))
            },
            (MoveValue::String(_), TypeTag::Struct(tag)) => tag.is_string(),
            (MoveValue::Option(value), TypeTag::Struct(tag)) if tag.is_option() => {
                match (value, tag.type_args.first()) {
                    (None, _) => true,
                    (Some(value), Some(inner)) => value.matches_type(inner),
                    (Some(_), None) => false,
                }
            },
            _ => false,
        }
    }
}

impl Serializable for MoveValue {
    fn serialize(&self, serializer: &mut Serializer) -> aptos_bcs_utils::Result<()> {
        match self {
            MoveValue::Bool(b) => serializer.serialize_bool(*b),
            MoveValue::U8(i) => serializer.serialize_u8(*i),
            MoveValue::U16(i) => serializer.serialize_u16(*i),
            MoveValue::U32(i) => serializer.serialize_u32(*i),
            MoveValue::U64(i) => serializer.serialize_u64(*i),
            MoveValue::U128(i) => serializer.serialize_u128(*i),
            MoveValue::U256(i) => serializer.serialize_u256(i),
            MoveValue::Address(a) => a.serialize(serializer)?,
            MoveValue::Vector(values) => serializer.serialize_vector(values)?,
            MoveValue::String(s) => serializer.serialize_str(s)?,
            MoveValue::Option(None) => serializer.serialize_len(0)?,
            MoveValue::Option(Some(value)) => {
                serializer.serialize_len(1)?;
                value.serialize(serializer)?;
            },
        }
        Ok(())
    }
}

impl fmt::Display for MoveValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveValue::Bool(b) => write!(f, "{}", b),
            MoveValue::U8(i) => write!(f, "{}u8", i),
            MoveValue::U16(i) => write!(f, "{}u16", i),
            MoveValue::U32(i) => write!(f, "{}u32", i),
            MoveValue::U64(i) => write!(f, "{}u64", i),
            MoveValue::U128(i) => write!(f, "{}u128", i),
            MoveValue::U256(i) => write!(f, "{}u256", i),
            MoveValue::Address(a) => write!(f, "@{}", a),
            MoveValue::Vector(values) => {
                write!(f, "vector[")?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", value)?;
                }
                write!(f, "]")
            },
            MoveValue::String(s) => write!(f, "{:?}", s),
            MoveValue::Option(None) => write!(f, "none"),
            MoveValue::Option(Some(value)) => write!(f, "some({})", value),
        }
    }
}

/// Encodes each value into the blob an entry function argument carries.
pub fn serialize_values<'a, I>(vals: I) -> aptos_bcs_utils::Result<Vec<Vec<u8>>>
where
    I: IntoIterator<Item = &'a MoveValue>,
{
    vals.into_iter().map(MoveValue::simple_serialize).collect()
}
