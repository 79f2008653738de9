// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

use crate::transaction::EntryFunction;
use aptos_bcs_utils::{BcsError, Deserializable, Deserializer, Serializable, Serializer};
use move_core_types::account_address::AccountAddress;

/// A multisig transaction that allows an owner of a multisig account to execute a pre-approved
/// transaction as the multisig account.
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct Multisig {
    pub multisig_address: AccountAddress,

    /// Transaction payload is optional if already stored on chain.
    pub transaction_payload: Option<MultisigTransactionPayload>,
}

impl Multisig {
    pub fn new(
        multisig_address: AccountAddress,
        transaction_payload: Option<MultisigTransactionPayload>,
    ) -> Self {
        Self {
            multisig_address,
            transaction_payload,
        }
    }
}

impl Serializable for Multisig {
    fn serialize(&self, serializer: &mut Serializer) -> aptos_bcs_utils::Result<()> {
        self.multisig_address.serialize(serializer)?;
        serializer.serialize_option(self.transaction_payload.as_ref())
    }
}

impl Deserializable for Multisig {
    fn deserialize(deserializer: &mut Deserializer<'_>) -> aptos_bcs_utils::Result<Self> {
        Ok(Self {
            multisig_address: deserializer.deserialize()?,
            transaction_payload: deserializer.deserialize_option()?,
        })
    }
}

/// The payload a multisig account executes. Only entry functions can be executed this way; the
/// enum leaves room for more kinds later.
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub enum MultisigTransactionPayload {
    EntryFunction(EntryFunction),
}

impl Serializable for MultisigTransactionPayload {
    fn serialize(&self, serializer: &mut Serializer) -> aptos_bcs_utils::Result<()> {
        match self {
            MultisigTransactionPayload::EntryFunction(entry_function) => {
                serializer.serialize_variant_index(0);
                entry_function.serialize(serializer)
            },
        }
    }
}

impl Deserializable for MultisigTransactionPayload {
    fn deserialize(deserializer: &mut Deserializer<'_>) -> aptos_bcs_utils::Result<Self> {
        match deserializer.deserialize_variant_index()? {
            0 => Ok(MultisigTransactionPayload::EntryFunction(
                deserializer.deserialize()?,
            )),
            index => Err(BcsError::unknown_variant(
                "MultisigTransactionPayload",
                index,
            )),
        }
    }
}
