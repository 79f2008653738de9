// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! Signing messages for transactions with more than one signer.
//!
//! A plain [`RawTransaction`] is signed under its own seed. When secondary signers or a fee payer
//! take part, every signer instead signs a wrapper that also commits to their addresses. Both
//! wrappers share the `RawTransactionWithData` seed: the enum tag and the extra addresses inside
//! the wrapper are what tell the two apart, and validators expect exactly this layout.
//!
//! The wrappers only borrow the transaction, so building a signing message never copies it.

use crate::transaction::RawTransaction;
use aptos_bcs_utils::{Serializable, Serializer};
use aptos_crypto::{signing_message, CryptoHash, CryptoMaterialError};
use move_core_types::account_address::AccountAddress;

/// Seed name shared by the multi-agent and fee-payer wrappers.
const RAW_TRANSACTION_WITH_DATA: &str = "RawTransactionWithData";

const MULTI_AGENT_VARIANT: u32 = 0;
const FEE_PAYER_VARIANT: u32 = 1;

/// A raw transaction together with the ordered addresses of its secondary signers.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct MultiAgentRawTransaction<'a> {
    raw_txn: &'a RawTransaction,
    secondary_signer_addresses: &'a [AccountAddress],
}

impl<'a> MultiAgentRawTransaction<'a> {
    pub fn new(
        raw_txn: &'a RawTransaction,
        secondary_signer_addresses: &'a [AccountAddress],
    ) -> Self {
        Self {
            raw_txn,
            secondary_signer_addresses,
        }
    }

    pub fn raw_txn(&self) -> &'a RawTransaction {
        self.raw_txn
    }

    pub fn secondary_signer_addresses(&self) -> &'a [AccountAddress] {
        self.secondary_signer_addresses
    }

    pub fn signing_message(&self) -> Result<Vec<u8>, CryptoMaterialError> {
        signing_message(self)
    }
}

impl Serializable for MultiAgentRawTransaction<'_> {
    fn serialize(&self, serializer: &mut Serializer) -> aptos_bcs_utils::Result<()> {
        serializer.serialize_variant_index(MULTI_AGENT_VARIANT);
        self.raw_txn.serialize(serializer)?;
        serializer.serialize_vector(self.secondary_signer_addresses)
    }
}

impl CryptoHash for MultiAgentRawTransaction<'_> {
    const TYPE_NAME: &'static str = RAW_TRANSACTION_WITH_DATA;
}

/// A multi-agent transaction whose gas is paid by `fee_payer_address`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FeePayerRawTransaction<'a> {
    raw_txn: &'a RawTransaction,
    secondary_signer_addresses: &'a [AccountAddress],
    fee_payer_address: AccountAddress,
}

impl<'a> FeePayerRawTransaction<'a> {
    pub fn new(
        raw_txn: &'a RawTransaction,
        secondary_signer_addresses: &'a [AccountAddress],
        fee_payer_address: AccountAddress,
    ) -> Self {
        Self {
            raw_txn,
            secondary_signer_addresses,
            fee_payer_address,
        }
    }

    pub fn raw_txn(&self) -> &'a RawTransaction {
        self.raw_txn
    }

    pub fn secondary_signer_addresses(&self) -> &'a [AccountAddress] {
        self.secondary_signer_addresses
    }

    pub fn fee_payer_address(&self) -> AccountAddress {
        self.fee_payer_address
    }

    pub fn signing_message(&self) -> Result<Vec<u8>, CryptoMaterialError> {
        signing_message(self)
    }
}

impl Serializable for FeePayerRawTransaction<'_> {
    fn serialize(&self, serializer: &mut Serializer) -> aptos_bcs_utils::Result<()> {
        serializer.serialize_variant_index(FEE_PAYER_VARIANT);
        self.raw_txn.serialize(serializer)?;
        serializer.serialize_vector(self.secondary_signer_addresses)?;
        self.fee_payer_address.serialize(serializer)
    }
}

impl CryptoHash for FeePayerRawTransaction<'_> {
    const TYPE_NAME: &'static str = RAW_TRANSACTION_WITH_DATA;
}

/// The exact bytes an external signer must sign for `transaction`: the hash of its seed followed
/// by its BCS encoding.
pub fn generate_signing_message<T: CryptoHash + ?Sized>(
    transaction: &T,
) -> Result<Vec<u8>, CryptoMaterialError> {
    signing_message(transaction)
}
