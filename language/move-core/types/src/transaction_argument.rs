// Copyright (c) The Diem Core Contributors
// Copyright (c) The Move Contributors
// SPDX-License-Identifier: Apache-2.0

use crate::{account_address::AccountAddress, value::MoveValue};
use anyhow::{anyhow, Error, Result};
use aptos_bcs_utils::{BcsError, Deserializable, Deserializer, Serializable, Serializer, U256};
use std::fmt;

/// A self-describing script argument: a variant tag followed by the value.
///
/// Scripts carry no ABI, so unlike entry function arguments each value brings its own type.
#[derive(Clone, Hash, Eq, PartialEq)]
pub enum TransactionArgument {
    U8(u8),
    U64(u64),
    U128(u128),
    Address(AccountAddress),
    U8Vector(Vec<u8>),
    Bool(bool),
    U16(u16),
    U32(u32),
    U256(U256),
    /// Bytes that are already the BCS encoding of some value.
    Serialized(Vec<u8>),
}

impl TransactionArgument {
    fn variant_index(&self) -> u32 {
        match self {
            TransactionArgument::U8(_) => 0,
            TransactionArgument::U64(_) => 1,
            TransactionArgument::U128(_) => 2,
            TransactionArgument::Address(_) => 3,
            TransactionArgument::U8Vector(_) => 4,
            TransactionArgument::Bool(_) => 5,
            TransactionArgument::U16(_) => 6,
            TransactionArgument::U32(_) => 7,
            TransactionArgument::U256(_) => 8,
            TransactionArgument::Serialized(_) => 9,
        }
    }
}

impl fmt::Debug for TransactionArgument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionArgument::U8(value) => write!(f, "{{U8: {}}}", value),
            TransactionArgument::U16(value) => write!(f, "{{U16: {}}}", value),
            TransactionArgument::U32(value) => write!(f, "{{U32: {}}}", value),
            TransactionArgument::U64(value) => write!(f, "{{U64: {}}}", value),
            TransactionArgument::U128(value) => write!(f, "{{U128: {}}}", value),
            TransactionArgument::U256(value) => write!(f, "{{U256: {}}}", value),
            TransactionArgument::Bool(boolean) => write!(f, "{{BOOL: {}}}", boolean),
            TransactionArgument::Address(address) => write!(f, "{{ADDRESS: {:?}}}", address),
            TransactionArgument::U8Vector(vector) => {
                write!(f, "{{U8Vector: 0x{}}}", hex::encode(vector))
            },
            TransactionArgument::Serialized(bytes) => {
                write!(f, "{{Serialized: 0x{}}}", hex::encode(bytes))
            },
        }
    }
}

impl Serializable for TransactionArgument {
    fn serialize(&self, serializer: &mut Serializer) -> aptos_bcs_utils::Result<()> {
        serializer.serialize_variant_index(self.variant_index());
        match self {
            TransactionArgument::U8(i) => serializer.serialize_u8(*i),
            TransactionArgument::U16(i) => serializer.serialize_u16(*i),
            TransactionArgument::U32(i) => serializer.serialize_u32(*i),
            TransactionArgument::U64(i) => serializer.serialize_u64(*i),
            TransactionArgument::U128(i) => serializer.serialize_u128(*i),
            TransactionArgument::U256(i) => serializer.serialize_u256(i),
            TransactionArgument::Bool(b) => serializer.serialize_bool(*b),
            TransactionArgument::Address(a) => a.serialize(serializer)?,
            TransactionArgument::U8Vector(v) | TransactionArgument::Serialized(v) => {
                serializer.serialize_bytes(v)?
            },
        }
        Ok(())
    }
}

impl Deserializable for TransactionArgument {
    fn deserialize(deserializer: &mut Deserializer<'_>) -> aptos_bcs_utils::Result<Self> {
        Ok(match deserializer.deserialize_variant_index()? {
            0 => TransactionArgument::U8(deserializer.deserialize_u8()?),
            1 => TransactionArgument::U64(deserializer.deserialize_u64()?),
            2 => TransactionArgument::U128(deserializer.deserialize_u128()?),
            3 => TransactionArgument::Address(AccountAddress::deserialize(deserializer)?),
            4 => TransactionArgument::U8Vector(deserializer.deserialize_bytes()?),
            5 => TransactionArgument::Bool(deserializer.deserialize_bool()?),
            6 => TransactionArgument::U16(deserializer.deserialize_u16()?),
            7 => TransactionArgument::U32(deserializer.deserialize_u32()?),
            8 => TransactionArgument::U256(deserializer.deserialize_u256()?),
            9 => TransactionArgument::Serialized(deserializer.deserialize_bytes()?),
            index => return Err(BcsError::unknown_variant("TransactionArgument", index)),
        })
    }
}

impl TryFrom<TransactionArgument> for MoveValue {
    type Error = Error;

    fn try_from(val: TransactionArgument) -> Result<Self> {
        Ok(match val {
            TransactionArgument::U8(i) => MoveValue::U8(i),
            TransactionArgument::U16(i) => MoveValue::U16(i),
            TransactionArgument::U32(i) => MoveValue::U32(i),
            TransactionArgument::U64(i) => MoveValue::U64(i),
            TransactionArgument::U128(i) => MoveValue::U128(i),
            TransactionArgument::U256(i) => MoveValue::U256(i),
            TransactionArgument::Address(a) => MoveValue::Address(a),
            TransactionArgument::Bool(b) => MoveValue::Bool(b),
            TransactionArgument::U8Vector(v) => MoveValue::vector_u8(v),
            TransactionArgument::Serialized(_) => {
                return Err(anyhow!("serialized argument has no known type: {:?}", val))
            },
        })
    }
}

impl TryFrom<MoveValue> for TransactionArgument {
    type Error = Error;

    fn try_from(val: MoveValue) -> Result<Self> {
        Ok(match val {
            MoveValue::U8(i) => TransactionArgument::U8(i),
            MoveValue::U16(i) => TransactionArgument::U16(i),
            MoveValue::U32(i) => TransactionArgument::U32(i),
            MoveValue::U64(i) => TransactionArgument::U64(i),
            MoveValue::U128(i) => TransactionArgument::U128(i),
            MoveValue::U256(i) => TransactionArgument::U256(i),
            MoveValue::Address(a) => TransactionArgument::Address(a),
            MoveValue::Bool(b) => TransactionArgument::Bool(b),
            MoveValue::Vector(v) if v.iter().all(|mv| matches!(mv, MoveValue::U8(_))) => {
                TransactionArgument::U8Vector(
                    v.into_iter()
                        .filter_map(|mv| match mv {
                            MoveValue::U8(byte) => Some(byte),
                            _ => None,
                        })
                        .collect(),
                )
            },
            // Anything else is passed through as its canonical bytes.
            other => TransactionArgument::Serialized(other.simple_serialize()?),
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        account_address::AccountAddress, transaction_argument::TransactionArgument,
        value::MoveValue,
    };
    use aptos_bcs_utils::{Deserializable, Serializable, U256};

    #[test]
    fn test_from_and_to_move_value() {
        let vals = vec![
            TransactionArgument::U8(1),
            TransactionArgument::U16(u16::MAX),
            TransactionArgument::U32(u32::MAX),
            TransactionArgument::U64(u64::MAX),
            TransactionArgument::U128(u128::MAX),
            TransactionArgument::U256(U256::MAX),
            TransactionArgument::Bool(true),
            TransactionArgument::Address(AccountAddress::from_hex_literal("0x1").unwrap()),
            TransactionArgument::U8Vector(vec![1, 2, 3, 4]),
        ];
        for val in vals {
            let ret: TransactionArgument =
                MoveValue::try_from(val.clone()).unwrap().try_into().unwrap();
            assert_eq!(ret, val);
        }
    }

    #[test]
    fn test_structured_values_become_serialized() {
        let value = MoveValue::String("hi".to_string());
        let arg = TransactionArgument::try_from(value).unwrap();
        assert_eq!(arg, TransactionArgument::Serialized(vec![2, b'h', b'i']));
    }

    #[test]
    fn test_arguments_carry_their_tag() {
        assert_eq!(TransactionArgument::U64(1).bcs_to_bytes().unwrap(), vec![
            1, 1, 0, 0, 0, 0, 0, 0, 0
        ]);
        assert_eq!(TransactionArgument::Bool(true).bcs_to_bytes().unwrap(), vec![5, 1]);
        assert_eq!(
            TransactionArgument::U8Vector(vec![0xab]).bcs_to_bytes().unwrap(),
            vec![4, 1, 0xab]
        );
        assert_eq!(TransactionArgument::U16(2).bcs_to_bytes().unwrap(), vec![6, 2, 0]);

        let arg = TransactionArgument::Serialized(vec![9, 9]);
        assert_eq!(
            TransactionArgument::from_bcs_bytes(&arg.bcs_to_bytes().unwrap()).unwrap(),
            arg
        );
        assert!(TransactionArgument::from_bcs_bytes(&[10, 0]).is_err());
    }
}
