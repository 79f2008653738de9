// Copyright © Aptos Foundation
// Parts of the project are originally copyright © Meta Platforms, Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::{
    chain_id::ChainId,
    transaction::authenticator::{
        AccountAuthenticator, AnyPublicKey, AnySignature, SingleKeyAuthenticator,
        TransactionAuthenticator,
    },
};
use anyhow::{ensure, Result};
use aptos_bcs_utils::{BcsError, Deserializable, Deserializer, Serializable, Serializer};
use aptos_crypto::{
    ed25519::{Ed25519PrivateKey, Ed25519PublicKey, Ed25519Signature},
    hash::DefaultHasher,
    multi_ed25519::{MultiEd25519PublicKey, MultiEd25519Signature},
    secp256k1_ecdsa, signing_message, CryptoHash, CryptoMaterialError, HashValue, SigningKey,
};
use move_core_types::account_address::AccountAddress;
use once_cell::sync::OnceCell;
use std::{
    collections::BTreeSet,
    fmt::{self, Debug},
    ops::Deref,
};

pub mod authenticator;
mod multisig;
mod script;
pub mod signing_message;

pub use multisig::{Multisig, MultisigTransactionPayload};
pub use script::{EntryFunction, Script};
pub use signing_message::{
    generate_signing_message, FeePayerRawTransaction, MultiAgentRawTransaction,
};

/// Seed under which a committed user transaction is hashed.
const COMMITTED_TRANSACTION: &[u8] = b"Transaction";

/// Variant of a user transaction inside the on-chain `Transaction` enum.
const USER_TRANSACTION_VARIANT: u8 = 0;

/// RawTransaction is the portion of a transaction that a client signs.
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct RawTransaction {
    /// Sender's address.
    sender: AccountAddress,

    /// Sequence number of this transaction. This must match the sequence number
    /// stored in the sender's account at the time the transaction executes.
    sequence_number: u64,

    /// The transaction payload, e.g., a script to execute.
    payload: TransactionPayload,

    /// Maximal total gas to spend for this transaction.
    max_gas_amount: u64,

    /// Price to be paid per gas unit.
    gas_unit_price: u64,

    /// Expiration timestamp for this transaction, represented
    /// as seconds from the Unix Epoch. If the current blockchain timestamp
    /// is greater than or equal to this time, then the transaction has
    /// expired and will be discarded. This can be set to a large value far
    /// in the future to indicate that a transaction does not expire.
    expiration_timestamp_secs: u64,

    /// Chain ID of the Aptos network this transaction is intended for.
    chain_id: ChainId,
}

impl RawTransaction {
    /// Create a new `RawTransaction` with a payload.
    pub fn new(
        sender: AccountAddress,
        sequence_number: u64,
        payload: TransactionPayload,
        max_gas_amount: u64,
        gas_unit_price: u64,
        expiration_timestamp_secs: u64,
        chain_id: ChainId,
    ) -> Self {
        RawTransaction {
            sender,
            sequence_number,
            payload,
            max_gas_amount,
            gas_unit_price,
            expiration_timestamp_secs,
            chain_id,
        }
    }

    /// Create a new `RawTransaction` with a script.
    ///
    /// A script transaction contains only code to execute. No publishing is allowed in scripts.
    pub fn new_script(
        sender: AccountAddress,
        sequence_number: u64,
        script: Script,
        max_gas_amount: u64,
        gas_unit_price: u64,
        expiration_timestamp_secs: u64,
        chain_id: ChainId,
    ) -> Self {
        Self::new(
            sender,
            sequence_number,
            TransactionPayload::Script(script),
            max_gas_amount,
            gas_unit_price,
            expiration_timestamp_secs,
            chain_id,
        )
    }

    /// Create a new `RawTransaction` with an entry function.
    pub fn new_entry_function(
        sender: AccountAddress,
        sequence_number: u64,
        entry_function: EntryFunction,
        max_gas_amount: u64,
        gas_unit_price: u64,
        expiration_timestamp_secs: u64,
        chain_id: ChainId,
    ) -> Self {
        Self::new(
            sender,
            sequence_number,
            TransactionPayload::EntryFunction(entry_function),
            max_gas_amount,
            gas_unit_price,
            expiration_timestamp_secs,
            chain_id,
        )
    }

    /// Create a new `RawTransaction` of multisig type.
    pub fn new_multisig(
        sender: AccountAddress,
        sequence_number: u64,
        multisig: Multisig,
        max_gas_amount: u64,
        gas_unit_price: u64,
        expiration_timestamp_secs: u64,
        chain_id: ChainId,
    ) -> Self {
        Self::new(
            sender,
            sequence_number,
            TransactionPayload::Multisig(multisig),
            max_gas_amount,
            gas_unit_price,
            expiration_timestamp_secs,
            chain_id,
        )
    }

    /// Signs the given `RawTransaction`. Note that this consumes the `RawTransaction` and turns it
    /// into a `SignatureCheckedTransaction`.
    ///
    /// For a transaction that has just been signed, its signature is expected to be valid.
    pub fn sign(
        self,
        private_key: &Ed25519PrivateKey,
        public_key: Ed25519PublicKey,
    ) -> Result<SignatureCheckedTransaction> {
        let signature = private_key.sign(&self)?;
        Ok(SignatureCheckedTransaction(SignedTransaction::new(
            self, public_key, signature,
        )))
    }

    /// Signs the given multi-agent `RawTransaction`, which is a transaction with secondary
    /// signers in addition to a sender. The private keys of the sender and the
    /// secondary signers are used to sign the transaction.
    ///
    /// The order and length of the secondary keys provided here have to match the order and
    /// length of the `secondary_signers`.
    pub fn sign_multi_agent(
        self,
        sender_private_key: &Ed25519PrivateKey,
        secondary_signers: Vec<AccountAddress>,
        secondary_private_keys: Vec<&Ed25519PrivateKey>,
    ) -> Result<SignatureCheckedTransaction> {
        ensure!(
            secondary_private_keys.len() == secondary_signers.len(),
            "number of secondary private keys and number of secondary signers don't match"
        );
        let message = MultiAgentRawTransaction::new(&self, &secondary_signers);
        let sender_authenticator = ed25519_authenticator(sender_private_key, &message)?;
        let secondary_authenticators = secondary_private_keys
            .into_iter()
            .map(|key| ed25519_authenticator(key, &message))
            .collect::<Result<Vec<_>>>()?;

        Ok(SignatureCheckedTransaction(
            SignedTransaction::new_multi_agent(
                self,
                sender_authenticator,
                secondary_signers,
                secondary_authenticators,
            ),
        ))
    }

    /// Signs the given fee-payer `RawTransaction`, which is a transaction with secondary
    /// signers and a gas payer in addition to a sender. The private keys of the sender, the
    /// secondary signers, and gas payer signer are used to sign the transaction.
    ///
    /// The order and length of the secondary keys provided here have to match the order and
    /// length of the `secondary_signers`.
    pub fn sign_fee_payer(
        self,
        sender_private_key: &Ed25519PrivateKey,
        secondary_signers: Vec<AccountAddress>,
        secondary_private_keys: Vec<&Ed25519PrivateKey>,
        fee_payer_address: AccountAddress,
        fee_payer_private_key: &Ed25519PrivateKey,
    ) -> Result<SignatureCheckedTransaction> {
        ensure!(
            secondary_private_keys.len() == secondary_signers.len(),
            "number of secondary private keys and number of secondary signers don't match"
        );
        let message = FeePayerRawTransaction::new(&self, &secondary_signers, fee_payer_address);
        let sender_authenticator = ed25519_authenticator(sender_private_key, &message)?;
        let secondary_authenticators = secondary_private_keys
            .into_iter()
            .map(|key| ed25519_authenticator(key, &message))
            .collect::<Result<Vec<_>>>()?;
        let fee_payer_authenticator = ed25519_authenticator(fee_payer_private_key, &message)?;

        Ok(SignatureCheckedTransaction(
            SignedTransaction::new_fee_payer(
                self,
                sender_authenticator,
                secondary_signers,
                secondary_authenticators,
                fee_payer_address,
                fee_payer_authenticator,
            ),
        ))
    }

    /// Signs the given `RawTransaction` with a secp256k1 key, wrapped as a single-key sender.
    pub fn sign_secp256k1_ecdsa(
        self,
        private_key: &secp256k1_ecdsa::PrivateKey,
        public_key: secp256k1_ecdsa::PublicKey,
    ) -> Result<SignatureCheckedTransaction> {
        let signature = private_key.sign(&self)?;
        Ok(SignatureCheckedTransaction(
            SignedTransaction::new_secp256k1_ecdsa(self, public_key, signature),
        ))
    }

    pub fn into_payload(self) -> TransactionPayload {
        self.payload
    }

    pub fn payload(&self) -> &TransactionPayload {
        &self.payload
    }

    /// Return the sender of this transaction.
    pub fn sender(&self) -> AccountAddress {
        self.sender
    }

    pub fn sequence_number(&self) -> u64 {
        self.sequence_number
    }

    pub fn max_gas_amount(&self) -> u64 {
        self.max_gas_amount
    }

    pub fn gas_unit_price(&self) -> u64 {
        self.gas_unit_price
    }

    pub fn set_gas_unit_price(&mut self, gas_unit_price: u64) {
        self.gas_unit_price = gas_unit_price;
    }

    pub fn expiration_timestamp_secs(&self) -> u64 {
        self.expiration_timestamp_secs
    }

    pub fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    /// Return the signing message for creating transaction signature.
    pub fn signing_message(&self) -> Result<Vec<u8>, CryptoMaterialError> {
        signing_message(self)
    }
}

fn ed25519_authenticator<T: CryptoHash + ?Sized>(
    private_key: &Ed25519PrivateKey,
    message: &T,
) -> Result<AccountAuthenticator> {
    let signature = private_key.sign(message)?;
    Ok(AccountAuthenticator::ed25519(
        private_key.public_key(),
        signature,
    ))
}

impl CryptoHash for RawTransaction {
    const TYPE_NAME: &'static str = "RawTransaction";
}

impl Serializable for RawTransaction {
    fn serialize(&self, serializer: &mut Serializer) -> aptos_bcs_utils::Result<()> {
        self.sender.serialize(serializer)?;
        serializer.serialize_u64(self.sequence_number);
        self.payload.serialize(serializer)?;
        serializer.serialize_u64(self.max_gas_amount);
        serializer.serialize_u64(self.gas_unit_price);
        serializer.serialize_u64(self.expiration_timestamp_secs);
        self.chain_id.serialize(serializer)
    }
}

impl Deserializable for RawTransaction {
    fn deserialize(deserializer: &mut Deserializer<'_>) -> aptos_bcs_utils::Result<Self> {
        Ok(RawTransaction {
            sender: deserializer.deserialize()?,
            sequence_number: deserializer.deserialize_u64()?,
            payload: deserializer.deserialize()?,
            max_gas_amount: deserializer.deserialize_u64()?,
            gas_unit_price: deserializer.deserialize_u64()?,
            expiration_timestamp_secs: deserializer.deserialize_u64()?,
            chain_id: deserializer.deserialize()?,
        })
    }
}

/// Different kinds of transactions.
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub enum TransactionPayload {
    /// A transaction that executes code.
    Script(Script),
    /// A transaction that executes an existing entry function published on-chain.
    EntryFunction(EntryFunction),
    /// A multisig transaction that allows an owner of a multisig account to execute a pre-approved
    /// transaction as the multisig account.
    Multisig(Multisig),
}

impl TransactionPayload {
    /// Index 1 belonged to module bundles, which the chain no longer accepts.
    const MODULE_BUNDLE_VARIANT: u32 = 1;

    fn variant_index(&self) -> u32 {
        match self {
            TransactionPayload::Script(_) => 0,
            TransactionPayload::EntryFunction(_) => 2,
            TransactionPayload::Multisig(_) => 3,
        }
    }

    pub fn is_multisig(&self) -> bool {
        matches!(self, Self::Multisig(_))
    }

    pub fn multisig_address(&self) -> Option<AccountAddress> {
        match self {
            Self::Multisig(multisig) => Some(multisig.multisig_address),
            _ => None,
        }
    }

    pub fn payload_type(&self) -> &'static str {
        match self {
            Self::Script(_) => "script",
            Self::EntryFunction(_) => "entry_function",
            Self::Multisig(_) => "multisig",
        }
    }
}

impl Serializable for TransactionPayload {
    fn serialize(&self, serializer: &mut Serializer) -> aptos_bcs_utils::Result<()> {
        serializer.serialize_variant_index(self.variant_index());
        match self {
            TransactionPayload::Script(script) => script.serialize(serializer),
            TransactionPayload::EntryFunction(entry_function) => {
                entry_function.serialize(serializer)
            },
            TransactionPayload::Multisig(multisig) => multisig.serialize(serializer),
        }
    }
}

impl Deserializable for TransactionPayload {
    fn deserialize(deserializer: &mut Deserializer<'_>) -> aptos_bcs_utils::Result<Self> {
        Ok(match deserializer.deserialize_variant_index()? {
            0 => TransactionPayload::Script(deserializer.deserialize()?),
            Self::MODULE_BUNDLE_VARIANT => {
                return Err(BcsError::invalid_value(
                    "TransactionPayload",
                    "module bundle payloads are no longer supported",
                ))
            },
            2 => TransactionPayload::EntryFunction(deserializer.deserialize()?),
            3 => TransactionPayload::Multisig(deserializer.deserialize()?),
            index => return Err(BcsError::unknown_variant("TransactionPayload", index)),
        })
    }
}

impl From<EntryFunction> for TransactionPayload {
    fn from(entry_function: EntryFunction) -> Self {
        TransactionPayload::EntryFunction(entry_function)
    }
}

impl From<Script> for TransactionPayload {
    fn from(script: Script) -> Self {
        TransactionPayload::Script(script)
    }
}

/// A transaction that has been signed.
///
/// A `SignedTransaction` is a single transaction that can be atomically executed. Clients submit
/// these to validator nodes, and the validator and executor submits these to the VM.
///
/// **IMPORTANT:** The signature of a `SignedTransaction` is not guaranteed to be verified. For a
/// transaction whose signature is statically guaranteed to be verified, see
/// [`SignatureCheckedTransaction`].
#[derive(Clone, Eq)]
pub struct SignedTransaction {
    /// The raw transaction
    raw_txn: RawTransaction,

    /// Public key and signature to authenticate
    authenticator: TransactionAuthenticator,

    /// A cached hash of the transaction.
    committed_hash: OnceCell<HashValue>,
}

/// PartialEq ignores the cached OnceCell field that may or may not be initialized.
impl PartialEq for SignedTransaction {
    fn eq(&self, other: &Self) -> bool {
        self.raw_txn == other.raw_txn && self.authenticator == other.authenticator
    }
}

/// A transaction for which the signature has been verified. Created by
/// [`SignedTransaction::check_signature`] and [`RawTransaction::sign`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SignatureCheckedTransaction(SignedTransaction);

impl SignatureCheckedTransaction {
    /// Returns the `SignedTransaction` within.
    pub fn into_inner(self) -> SignedTransaction {
        self.0
    }

    /// Returns the `RawTransaction` within.
    pub fn into_raw_transaction(self) -> RawTransaction {
        self.0.into_raw_transaction()
    }
}

impl Deref for SignatureCheckedTransaction {
    type Target = SignedTransaction;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Debug for SignedTransaction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "SignedTransaction {{ \n \
             {{ raw_txn: {:#?}, \n \
             authenticator: {:#?}, \n \
             }} \n \
             }}",
            self.raw_txn, self.authenticator
        )
    }
}

impl SignedTransaction {
    pub fn new_signed_transaction(
        raw_txn: RawTransaction,
        authenticator: TransactionAuthenticator,
    ) -> SignedTransaction {
        SignedTransaction {
            raw_txn,
            authenticator,
            committed_hash: OnceCell::new(),
        }
    }

    pub fn new(
        raw_txn: RawTransaction,
        public_key: Ed25519PublicKey,
        signature: Ed25519Signature,
    ) -> SignedTransaction {
        let authenticator = TransactionAuthenticator::ed25519(public_key, signature);
        Self::new_signed_transaction(raw_txn, authenticator)
    }

    pub fn new_fee_payer(
        raw_txn: RawTransaction,
        sender: AccountAuthenticator,
        secondary_signer_addresses: Vec<AccountAddress>,
        secondary_signers: Vec<AccountAuthenticator>,
        fee_payer_address: AccountAddress,
        fee_payer_signer: AccountAuthenticator,
    ) -> Self {
        let authenticator = TransactionAuthenticator::fee_payer(
            sender,
            secondary_signer_addresses,
            secondary_signers,
            fee_payer_address,
            fee_payer_signer,
        );
        Self::new_signed_transaction(raw_txn, authenticator)
    }

    pub fn new_multisig(
        raw_txn: RawTransaction,
        public_key: MultiEd25519PublicKey,
        signature: MultiEd25519Signature,
    ) -> SignedTransaction {
        let authenticator = TransactionAuthenticator::multi_ed25519(public_key, signature);
        Self::new_signed_transaction(raw_txn, authenticator)
    }

    pub fn new_multi_agent(
        raw_txn: RawTransaction,
        sender: AccountAuthenticator,
        secondary_signer_addresses: Vec<AccountAddress>,
        secondary_signers: Vec<AccountAuthenticator>,
    ) -> Self {
        let authenticator = TransactionAuthenticator::multi_agent(
            sender,
            secondary_signer_addresses,
            secondary_signers,
        );
        Self::new_signed_transaction(raw_txn, authenticator)
    }

    pub fn new_secp256k1_ecdsa(
        raw_txn: RawTransaction,
        public_key: secp256k1_ecdsa::PublicKey,
        signature: secp256k1_ecdsa::Secp256k1Signature,
    ) -> SignedTransaction {
        let authenticator = AccountAuthenticator::single_key(SingleKeyAuthenticator::new(
            AnyPublicKey::secp256k1_ecdsa(public_key),
            AnySignature::secp256k1_ecdsa(signature),
        ));
        Self::new_single_sender(raw_txn, authenticator)
    }

    pub fn new_single_sender(
        raw_txn: RawTransaction,
        authenticator: AccountAuthenticator,
    ) -> SignedTransaction {
        Self::new_signed_transaction(
            raw_txn,
            TransactionAuthenticator::single_sender(authenticator),
        )
    }

    pub fn authenticator(&self) -> TransactionAuthenticator {
        self.authenticator.clone()
    }

    pub fn authenticator_ref(&self) -> &TransactionAuthenticator {
        &self.authenticator
    }

    pub fn sender(&self) -> AccountAddress {
        self.raw_txn.sender
    }

    pub fn into_raw_transaction(self) -> RawTransaction {
        self.raw_txn
    }

    pub fn raw_transaction_ref(&self) -> &RawTransaction {
        &self.raw_txn
    }

    pub fn sequence_number(&self) -> u64 {
        self.raw_txn.sequence_number
    }

    pub fn chain_id(&self) -> ChainId {
        self.raw_txn.chain_id
    }

    pub fn payload(&self) -> &TransactionPayload {
        &self.raw_txn.payload
    }

    pub fn multisig_address(&self) -> Option<AccountAddress> {
        self.raw_txn.payload.multisig_address()
    }

    pub fn max_gas_amount(&self) -> u64 {
        self.raw_txn.max_gas_amount
    }

    pub fn gas_unit_price(&self) -> u64 {
        self.raw_txn.gas_unit_price
    }

    pub fn expiration_timestamp_secs(&self) -> u64 {
        self.raw_txn.expiration_timestamp_secs
    }

    /// Checks that the signature of given transaction. Returns `Ok(SignatureCheckedTransaction)` if
    /// the signature is valid.
    pub fn check_signature(self) -> Result<SignatureCheckedTransaction> {
        self.authenticator.verify(&self.raw_txn)?;
        Ok(SignatureCheckedTransaction(self))
    }

    pub fn verify_signature(&self) -> Result<()> {
        self.authenticator.verify(&self.raw_txn)?;
        Ok(())
    }

    pub fn contains_duplicate_signers(&self) -> bool {
        let mut all_signer_addresses = self.authenticator.secondary_signer_addresses();
        all_signer_addresses.push(self.sender());
        if let Some(fee_payer) = self.authenticator.fee_payer_address() {
            all_signer_addresses.push(fee_payer);
        }
        let mut s = BTreeSet::new();
        all_signer_addresses.iter().any(|a| !s.insert(*a))
    }

    pub fn is_multi_agent(&self) -> bool {
        matches!(
            self.authenticator,
            TransactionAuthenticator::MultiAgent { .. }
        )
    }

    /// Returns the hash when the transaction is committed onchain.
    pub fn committed_hash(&self) -> aptos_bcs_utils::Result<HashValue> {
        self.committed_hash
            .get_or_try_init(|| {
                let mut serializer = Serializer::new();
                serializer.serialize_u8(USER_TRANSACTION_VARIANT);
                self.serialize(&mut serializer)?;
                Ok(DefaultHasher::hash_with_seed(
                    COMMITTED_TRANSACTION,
                    serializer.as_bytes(),
                ))
            })
            .copied()
    }
}

impl Serializable for SignedTransaction {
    fn serialize(&self, serializer: &mut Serializer) -> aptos_bcs_utils::Result<()> {
        self.raw_txn.serialize(serializer)?;
        self.authenticator.serialize(serializer)
    }
}

impl Deserializable for SignedTransaction {
    fn deserialize(deserializer: &mut Deserializer<'_>) -> aptos_bcs_utils::Result<Self> {
        let raw_txn = deserializer.deserialize()?;
        let authenticator = deserializer.deserialize()?;
        Ok(SignedTransaction::new_signed_transaction(
            raw_txn,
            authenticator,
        ))
    }
}
