// Copyright © Aptos Foundation
// Parts of the project are originally copyright © Meta Platforms, Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::transaction::{
    signing_message::{FeePayerRawTransaction, MultiAgentRawTransaction},
    RawTransaction,
};
use anyhow::{bail, ensure, Error, Result};
use aptos_bcs_utils::{BcsError, Deserializable, Deserializer, Serializable, Serializer};
use aptos_crypto::{
    ed25519::{Ed25519PublicKey, Ed25519Signature},
    multi_ed25519::{
        bitmap_indices, create_bitmap, MultiEd25519PublicKey, MultiEd25519Signature,
        BITMAP_NUM_OF_BYTES, MAX_NUM_OF_KEYS,
    },
    secp256k1_ecdsa, CryptoHash, CryptoMaterialError, HashValue, Signature, ValidCryptoMaterial,
};
use move_core_types::account_address::AccountAddress;
use std::{fmt, str::FromStr};
use thiserror::Error;
use tracing::debug;

/// Maximum number of signatures supported in `TransactionAuthenticator`,
/// across all `AccountAuthenticator`s included.
pub const MAX_NUM_OF_SIGS: usize = 32;

/// An error enum for issues related to transaction or account authentication.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{:?}", self)]
pub enum AuthenticationError {
    /// The number of signatures exceeds the maximum supported.
    MaxSignaturesExceeded,
}

/// Each transaction submitted to the Aptos blockchain contains a `TransactionAuthenticator`. During
/// transaction execution, the executor will check if every `AccountAuthenticator`'s signature on
/// the transaction hash is well-formed and whether the sha3 hash of the
/// `AccountAuthenticator`'s `AuthenticationKeyPreimage` matches the `AuthenticationKey` stored
/// under the participating signer's account address.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TransactionAuthenticator {
    /// Single Ed25519 signature
    Ed25519 {
        public_key: Ed25519PublicKey,
        signature: Ed25519Signature,
    },
    /// K-of-N multisignature
    MultiEd25519 {
        public_key: MultiEd25519PublicKey,
        signature: MultiEd25519Signature,
    },
    /// Multi-agent transaction.
    MultiAgent {
        sender: AccountAuthenticator,
        secondary_signer_addresses: Vec<AccountAddress>,
        secondary_signers: Vec<AccountAuthenticator>,
    },
    /// Optional Multi-agent transaction with a fee payer.
    FeePayer {
        sender: AccountAuthenticator,
        secondary_signer_addresses: Vec<AccountAddress>,
        secondary_signers: Vec<AccountAuthenticator>,
        fee_payer_address: AccountAddress,
        fee_payer_signer: AccountAuthenticator,
    },
    SingleSender {
        sender: AccountAuthenticator,
    },
}

impl TransactionAuthenticator {
    /// Create a single-signature ed25519 authenticator
    pub fn ed25519(public_key: Ed25519PublicKey, signature: Ed25519Signature) -> Self {
        Self::Ed25519 {
            public_key,
            signature,
        }
    }

    /// Create a (optional) multi-agent fee payer authenticator
    pub fn fee_payer(
        sender: AccountAuthenticator,
        secondary_signer_addresses: Vec<AccountAddress>,
        secondary_signers: Vec<AccountAuthenticator>,
        fee_payer_address: AccountAddress,
        fee_payer_signer: AccountAuthenticator,
    ) -> Self {
        Self::FeePayer {
            sender,
            secondary_signer_addresses,
            secondary_signers,
            fee_payer_address,
            fee_payer_signer,
        }
    }

    /// Create a multisignature ed25519 authenticator
    pub fn multi_ed25519(
        public_key: MultiEd25519PublicKey,
        signature: MultiEd25519Signature,
    ) -> Self {
        Self::MultiEd25519 {
            public_key,
            signature,
        }
    }

    /// Create a multi-agent authenticator
    pub fn multi_agent(
        sender: AccountAuthenticator,
        secondary_signer_addresses: Vec<AccountAddress>,
        secondary_signers: Vec<AccountAuthenticator>,
    ) -> Self {
        Self::MultiAgent {
            sender,
            secondary_signer_addresses,
            secondary_signers,
        }
    }

    /// Create a single-sender authenticator
    pub fn single_sender(sender: AccountAuthenticator) -> Self {
        Self::SingleSender { sender }
    }

    fn variant_index(&self) -> u32 {
        match self {
            Self::Ed25519 { .. } => 0,
            Self::MultiEd25519 { .. } => 1,
            Self::MultiAgent { .. } => 2,
            Self::FeePayer { .. } => 3,
            Self::SingleSender { .. } => 4,
        }
    }

    /// Return Ok if all AccountAuthenticator's public keys match their signatures, Err otherwise
    pub fn verify(&self, raw_txn: &RawTransaction) -> Result<()> {
        let num_sigs: usize = self.sender().number_of_signatures()
            + self
                .secondary_signers()
                .iter()
                .map(|auth| auth.number_of_signatures())
                .sum::<usize>()
            + self
                .fee_payer_signer()
                .map_or(0, |auth| auth.number_of_signatures());
        if num_sigs > MAX_NUM_OF_SIGS {
            return Err(Error::new(AuthenticationError::MaxSignaturesExceeded));
        }
        self.verify_inner(raw_txn).inspect_err(|e| {
            debug!(
                sender = %raw_txn.sender(),
                error = %e,
                "transaction authenticator rejected"
            );
        })
    }

    fn verify_inner(&self, raw_txn: &RawTransaction) -> Result<()> {
        match self {
            Self::Ed25519 {
                public_key,
                signature,
            } => signature.verify(raw_txn, public_key),
            Self::MultiEd25519 {
                public_key,
                signature,
            } => signature.verify(raw_txn, public_key),
            Self::MultiAgent {
                sender,
                secondary_signer_addresses,
                secondary_signers,
            } => {
                let message = MultiAgentRawTransaction::new(raw_txn, secondary_signer_addresses);
                verify_signers(&message, sender, secondary_signer_addresses, secondary_signers)
            },
            Self::FeePayer {
                sender,
                secondary_signer_addresses,
                secondary_signers,
                fee_payer_address,
                fee_payer_signer,
            } => {
                let message = FeePayerRawTransaction::new(
                    raw_txn,
                    secondary_signer_addresses,
                    *fee_payer_address,
                );
                verify_signers(&message, sender, secondary_signer_addresses, secondary_signers)?;
                fee_payer_signer.verify(&message)
            },
            Self::SingleSender { sender } => sender.verify(raw_txn),
        }
    }

    pub fn sender(&self) -> AccountAuthenticator {
        match self {
            Self::Ed25519 {
                public_key,
                signature,
            } => AccountAuthenticator::ed25519(public_key.clone(), signature.clone()),
            Self::MultiEd25519 {
                public_key,
                signature,
            } => AccountAuthenticator::multi_ed25519(public_key.clone(), signature.clone()),
            Self::MultiAgent { sender, .. }
            | Self::FeePayer { sender, .. }
            | Self::SingleSender { sender } => sender.clone(),
        }
    }

    pub fn secondary_signer_addresses(&self) -> Vec<AccountAddress> {
        match self {
            Self::Ed25519 { .. } | Self::MultiEd25519 { .. } | Self::SingleSender { .. } => {
                vec![]
            },
            Self::MultiAgent {
                secondary_signer_addresses,
                ..
            }
            | Self::FeePayer {
                secondary_signer_addresses,
                ..
            } => secondary_signer_addresses.to_vec(),
        }
    }

    pub fn secondary_signers(&self) -> Vec<AccountAuthenticator> {
        match self {
            Self::Ed25519 { .. } | Self::MultiEd25519 { .. } | Self::SingleSender { .. } => {
                vec![]
            },
            Self::MultiAgent {
                secondary_signers, ..
            }
            | Self::FeePayer {
                secondary_signers, ..
            } => secondary_signers.to_vec(),
        }
    }

    pub fn fee_payer_address(&self) -> Option<AccountAddress> {
        match self {
            Self::FeePayer {
                fee_payer_address, ..
            } => Some(*fee_payer_address),
            _ => None,
        }
    }

    pub fn fee_payer_signer(&self) -> Option<AccountAuthenticator> {
        match self {
            Self::FeePayer {
                fee_payer_signer, ..
            } => Some(fee_payer_signer.clone()),
            _ => None,
        }
    }
}

/// Checks the sender and every secondary signer against the same wrapped message.
fn verify_signers<T: CryptoHash + ?Sized>(
    message: &T,
    sender: &AccountAuthenticator,
    secondary_signer_addresses: &[AccountAddress],
    secondary_signers: &[AccountAuthenticator],
) -> Result<()> {
    ensure!(
        secondary_signers.len() == secondary_signer_addresses.len(),
        "The number of secondary signers ({}) does not match the number of secondary addresses ({})",
        secondary_signers.len(),
        secondary_signer_addresses.len()
    );
    sender.verify(message)?;
    for signer in secondary_signers {
        signer.verify(message)?;
    }
    Ok(())
}

impl fmt::Display for TransactionAuthenticator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Ed25519 { .. } => {
                write!(
                    f,
                    "TransactionAuthenticator[scheme: Ed25519, sender: {}]",
                    self.sender()
                )
            },
            Self::MultiEd25519 { .. } => {
                write!(
                    f,
                    "TransactionAuthenticator[scheme: MultiEd25519, sender: {}]",
                    self.sender()
                )
            },
            Self::FeePayer {
                sender,
                secondary_signer_addresses,
                secondary_signers,
                fee_payer_address,
                fee_payer_signer,
            } => {
                let mut sec_addrs: String = "".to_string();
                for sec_addr in secondary_signer_addresses {
                    sec_addrs = format!("{}\n\t\t\t{:#?},", sec_addrs, sec_addr);
                }
                let mut sec_signers: String = "".to_string();
                for sec_signer in secondary_signers {
                    sec_signers = format!("{}\n\t\t\t{:#?},", sec_signers, sec_signer);
                }
                write!(
                    f,
                    "TransactionAuthenticator[\n\
                        \tsender: {}\n\
                        \tsecondary_signer_addresses: {}\n\
                        \tsecondary_signers: {}\n\
                        \tfee_payer_address: {}\n\
                        \tfee_payer_signer: {}]",
                    sender, sec_addrs, sec_signers, fee_payer_address, fee_payer_signer,
                )
            },
            Self::MultiAgent {
                sender,
                secondary_signer_addresses,
                secondary_signers,
            } => {
                let mut sec_addrs: String = "".to_string();
                for sec_addr in secondary_signer_addresses {
                    sec_addrs = format!("{}\n\t\t\t{:#?},", sec_addrs, sec_addr);
                }
                let mut sec_signers: String = "".to_string();
                for sec_signer in secondary_signers {
                    sec_signers = format!("{}\n\t\t\t{:#?},", sec_signers, sec_signer);
                }
                write!(
                    f,
                    "TransactionAuthenticator[\n\
                        \tsender: {}\n\
                        \tsecondary_signer_addresses: {}\n\
                        \tsecondary_signers: {}]",
                    sender, sec_addrs, sec_signers,
                )
            },
            Self::SingleSender { sender } => {
                write!(f, "SingleSender[\n\tsender: {}]", sender)
            },
        }
    }
}

impl Serializable for TransactionAuthenticator {
    fn serialize(&self, serializer: &mut Serializer) -> aptos_bcs_utils::Result<()> {
        serializer.serialize_variant_index(self.variant_index());
        match self {
            Self::Ed25519 {
                public_key,
                signature,
            } => {
                public_key.serialize(serializer)?;
                signature.serialize(serializer)
            },
            Self::MultiEd25519 {
                public_key,
                signature,
            } => {
                public_key.serialize(serializer)?;
                signature.serialize(serializer)
            },
            Self::MultiAgent {
                sender,
                secondary_signer_addresses,
                secondary_signers,
            } => {
                sender.serialize(serializer)?;
                serializer.serialize_vector(secondary_signer_addresses)?;
                serializer.serialize_vector(secondary_signers)
            },
            Self::FeePayer {
                sender,
                secondary_signer_addresses,
                secondary_signers,
                fee_payer_address,
                fee_payer_signer,
            } => {
                sender.serialize(serializer)?;
                serializer.serialize_vector(secondary_signer_addresses)?;
                serializer.serialize_vector(secondary_signers)?;
                fee_payer_address.serialize(serializer)?;
                fee_payer_signer.serialize(serializer)
            },
            Self::SingleSender { sender } => sender.serialize(serializer),
        }
    }
}

impl Deserializable for TransactionAuthenticator {
    fn deserialize(deserializer: &mut Deserializer<'_>) -> aptos_bcs_utils::Result<Self> {
        Ok(match deserializer.deserialize_variant_index()? {
            0 => Self::Ed25519 {
                public_key: deserializer.deserialize()?,
                signature: deserializer.deserialize()?,
            },
            1 => Self::MultiEd25519 {
                public_key: deserializer.deserialize()?,
                signature: deserializer.deserialize()?,
            },
            2 => Self::MultiAgent {
                sender: deserializer.deserialize()?,
                secondary_signer_addresses: deserializer.deserialize_vector()?,
                secondary_signers: deserializer.deserialize_vector()?,
            },
            3 => Self::FeePayer {
                sender: deserializer.deserialize()?,
                secondary_signer_addresses: deserializer.deserialize_vector()?,
                secondary_signers: deserializer.deserialize_vector()?,
                fee_payer_address: deserializer.deserialize()?,
                fee_payer_signer: deserializer.deserialize()?,
            },
            4 => Self::SingleSender {
                sender: deserializer.deserialize()?,
            },
            index => {
                return Err(BcsError::unknown_variant(
                    "TransactionAuthenticator",
                    index,
                ))
            },
        })
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u8)]
pub enum Scheme {
    Ed25519 = 0,
    MultiEd25519 = 1,
    SingleKey = 2,
    MultiKey = 3,
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let display = match self {
            Scheme::Ed25519 => "Ed25519",
            Scheme::MultiEd25519 => "MultiEd25519",
            Scheme::SingleKey => "SingleKey",
            Scheme::MultiKey => "MultiKey",
        };
        write!(f, "Scheme::{}", display)
    }
}

/// An `AccountAuthenticator` is an abstraction of a signature scheme. It must know:
/// (1) How to check its signature against a message and public key
/// (2) How to convert its public key into an `AuthenticationKeyPreimage` structured as
/// (public_key | signature_scheme_id).
/// Each on-chain `Account` must store an `AuthenticationKey` (computed via a sha3 hash of `(public
/// key bytes | scheme as u8)`).
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum AccountAuthenticator {
    /// Ed25519 Single signature
    Ed25519 {
        public_key: Ed25519PublicKey,
        signature: Ed25519Signature,
    },
    /// Ed25519 K-of-N multisignature
    MultiEd25519 {
        public_key: MultiEd25519PublicKey,
        signature: MultiEd25519Signature,
    },
    SingleKey {
        authenticator: SingleKeyAuthenticator,
    },
    MultiKey {
        authenticator: MultiKeyAuthenticator,
    },
    /// Placeholder used when simulating a transaction whose signer is not known yet. Never
    /// verifies.
    NoAccountAuthenticator,
}

impl AccountAuthenticator {
    /// Unique identifier for the signature scheme
    pub fn scheme(&self) -> Option<Scheme> {
        match self {
            Self::Ed25519 { .. } => Some(Scheme::Ed25519),
            Self::MultiEd25519 { .. } => Some(Scheme::MultiEd25519),
            Self::SingleKey { .. } => Some(Scheme::SingleKey),
            Self::MultiKey { .. } => Some(Scheme::MultiKey),
            Self::NoAccountAuthenticator => None,
        }
    }

    /// Create a single-signature ed25519 authenticator
    pub fn ed25519(public_key: Ed25519PublicKey, signature: Ed25519Signature) -> Self {
        Self::Ed25519 {
            public_key,
            signature,
        }
    }

    /// Create a multisignature ed25519 authenticator
    pub fn multi_ed25519(
        public_key: MultiEd25519PublicKey,
        signature: MultiEd25519Signature,
    ) -> Self {
        Self::MultiEd25519 {
            public_key,
            signature,
        }
    }

    /// Create a single-signature authenticator
    pub fn single_key(authenticator: SingleKeyAuthenticator) -> Self {
        Self::SingleKey { authenticator }
    }

    /// Create a multi-signature authenticator
    pub fn multi_key(authenticator: MultiKeyAuthenticator) -> Self {
        Self::MultiKey { authenticator }
    }

    pub fn no_authenticator() -> Self {
        Self::NoAccountAuthenticator
    }

    fn variant_index(&self) -> u32 {
        match self {
            Self::Ed25519 { .. } => 0,
            Self::MultiEd25519 { .. } => 1,
            Self::SingleKey { .. } => 2,
            Self::MultiKey { .. } => 3,
            Self::NoAccountAuthenticator => 4,
        }
    }

    /// Return Ok if the authenticator's public key matches its signature, Err otherwise
    pub fn verify<T: CryptoHash + ?Sized>(&self, message: &T) -> Result<()> {
        match self {
            Self::Ed25519 {
                public_key,
                signature,
            } => signature.verify(message, public_key),
            Self::MultiEd25519 {
                public_key,
                signature,
            } => signature.verify(message, public_key),
            Self::SingleKey { authenticator } => authenticator.verify(message),
            Self::MultiKey { authenticator } => authenticator.verify(message),
            Self::NoAccountAuthenticator => bail!("No signature to verify."),
        }
    }

    /// Return the raw bytes of `self.public_key`
    pub fn public_key_bytes(&self) -> Result<Vec<u8>> {
        Ok(match self {
            Self::Ed25519 { public_key, .. } => public_key.to_bytes().to_vec(),
            Self::MultiEd25519 { public_key, .. } => ValidCryptoMaterial::to_bytes(public_key),
            Self::SingleKey { authenticator } => authenticator.public_key().bcs_to_bytes()?,
            Self::MultiKey { authenticator } => authenticator.public_keys().bcs_to_bytes()?,
            Self::NoAccountAuthenticator => bail!("No public key present."),
        })
    }

    /// Return an authentication key derived from `self`'s public key and scheme id
    pub fn authentication_key(&self) -> Result<AuthenticationKey> {
        match self.scheme() {
            Some(scheme) => Ok(AuthenticationKey::from_preimage(
                self.public_key_bytes()?,
                scheme,
            )),
            None => bail!("No authentication key for a missing authenticator."),
        }
    }

    /// Return the number of signatures included in this account authenticator.
    pub fn number_of_signatures(&self) -> usize {
        match self {
            Self::Ed25519 { .. } => 1,
            Self::MultiEd25519 { signature, .. } => signature.signatures().len(),
            Self::SingleKey { .. } => 1,
            Self::MultiKey { authenticator } => authenticator.signatures().len(),
            Self::NoAccountAuthenticator => 0,
        }
    }
}

impl fmt::Display for AccountAuthenticator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.authentication_key() {
            Ok(auth_key) => write!(
                f,
                "AccountAuthenticator[scheme id: {:?}, authentication key: {}]",
                self.scheme(),
                auth_key
            ),
            Err(_) => write!(f, "AccountAuthenticator[no authenticator]"),
        }
    }
}

impl Serializable for AccountAuthenticator {
    fn serialize(&self, serializer: &mut Serializer) -> aptos_bcs_utils::Result<()> {
        serializer.serialize_variant_index(self.variant_index());
        match self {
            Self::Ed25519 {
                public_key,
                signature,
            } => {
                public_key.serialize(serializer)?;
                signature.serialize(serializer)
            },
            Self::MultiEd25519 {
                public_key,
                signature,
            } => {
                public_key.serialize(serializer)?;
                signature.serialize(serializer)
            },
            Self::SingleKey { authenticator } => authenticator.serialize(serializer),
            Self::MultiKey { authenticator } => authenticator.serialize(serializer),
            Self::NoAccountAuthenticator => Ok(()),
        }
    }
}

impl Deserializable for AccountAuthenticator {
    fn deserialize(deserializer: &mut Deserializer<'_>) -> aptos_bcs_utils::Result<Self> {
        Ok(match deserializer.deserialize_variant_index()? {
            0 => Self::Ed25519 {
                public_key: deserializer.deserialize()?,
                signature: deserializer.deserialize()?,
            },
            1 => Self::MultiEd25519 {
                public_key: deserializer.deserialize()?,
                signature: deserializer.deserialize()?,
            },
            2 => Self::SingleKey {
                authenticator: deserializer.deserialize()?,
            },
            3 => Self::MultiKey {
                authenticator: deserializer.deserialize()?,
            },
            4 => Self::NoAccountAuthenticator,
            index => return Err(BcsError::unknown_variant("AccountAuthenticator", index)),
        })
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SingleKeyAuthenticator {
    public_key: AnyPublicKey,
    signature: AnySignature,
}

impl SingleKeyAuthenticator {
    pub fn new(public_key: AnyPublicKey, signature: AnySignature) -> Self {
        Self {
            public_key,
            signature,
        }
    }

    pub fn public_key(&self) -> &AnyPublicKey {
        &self.public_key
    }

    pub fn signature(&self) -> &AnySignature {
        &self.signature
    }

    pub fn verify<T: CryptoHash + ?Sized>(&self, message: &T) -> Result<()> {
        self.signature.verify(&self.public_key, message)
    }
}

impl Serializable for SingleKeyAuthenticator {
    fn serialize(&self, serializer: &mut Serializer) -> aptos_bcs_utils::Result<()> {
        self.public_key.serialize(serializer)?;
        self.signature.serialize(serializer)
    }
}

impl Deserializable for SingleKeyAuthenticator {
    fn deserialize(deserializer: &mut Deserializer<'_>) -> aptos_bcs_utils::Result<Self> {
        Ok(Self {
            public_key: deserializer.deserialize()?,
            signature: deserializer.deserialize()?,
        })
    }
}

/// K-of-N signatures over keys of any supported scheme. The bitmap marks which keys signed, in
/// the same layout as a MultiEd25519 bitmap.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MultiKeyAuthenticator {
    public_keys: MultiKey,
    signatures: Vec<AnySignature>,
    signatures_bitmap: Vec<u8>,
}

impl MultiKeyAuthenticator {
    /// `signatures` pairs each signature with the index of its key and must be sorted by index.
    pub fn new(public_keys: MultiKey, signatures: Vec<(u8, AnySignature)>) -> Result<Self> {
        let indices: Vec<u8> = signatures.iter().map(|(index, _)| *index).collect();
        let bitmap = create_bitmap(&indices).map_err(CryptoMaterialError::from)?;
        let authenticator = Self {
            public_keys,
            signatures: signatures.into_iter().map(|(_, sig)| sig).collect(),
            signatures_bitmap: bitmap.to_vec(),
        };
        authenticator.verify_sanity()?;
        Ok(authenticator)
    }

    pub fn public_keys(&self) -> &MultiKey {
        &self.public_keys
    }

    pub fn signatures(&self) -> &[AnySignature] {
        &self.signatures
    }

    pub fn signer_indices(&self) -> Vec<u8> {
        let mut bitmap = [0u8; BITMAP_NUM_OF_BYTES];
        bitmap[..self.signatures_bitmap.len()].copy_from_slice(&self.signatures_bitmap);
        bitmap_indices(&bitmap)
    }

    fn verify_sanity(&self) -> Result<()> {
        let indices = self.signer_indices();
        ensure!(
            indices.len() == self.signatures.len(),
            "Mismatch in the number of set bits ({}) and signatures ({})",
            indices.len(),
            self.signatures.len()
        );
        ensure!(
            indices.len() >= self.public_keys.signatures_required() as usize,
            "Not enough signatures for verification: {} of {} required",
            indices.len(),
            self.public_keys.signatures_required()
        );
        if let Some(index) = indices
            .iter()
            .find(|index| **index as usize >= self.public_keys.len())
        {
            bail!(
                "Signer index {} is out of range for {} public keys",
                index,
                self.public_keys.len()
            );
        }
        Ok(())
    }

    pub fn verify<T: CryptoHash + ?Sized>(&self, message: &T) -> Result<()> {
        self.verify_sanity()?;
        for (index, signature) in self.signer_indices().into_iter().zip(&self.signatures) {
            let public_key = self
                .public_keys
                .public_keys()
                .get(index as usize)
                .ok_or_else(|| anyhow::anyhow!("Signer index {} is out of range", index))?;
            signature.verify(public_key, message)?;
        }
        Ok(())
    }
}

impl Serializable for MultiKeyAuthenticator {
    fn serialize(&self, serializer: &mut Serializer) -> aptos_bcs_utils::Result<()> {
        self.public_keys.serialize(serializer)?;
        serializer.serialize_vector(&self.signatures)?;
        serializer.serialize_bytes(&self.signatures_bitmap)
    }
}

impl Deserializable for MultiKeyAuthenticator {
    fn deserialize(deserializer: &mut Deserializer<'_>) -> aptos_bcs_utils::Result<Self> {
        let public_keys = deserializer.deserialize()?;
        let signatures = deserializer.deserialize_vector()?;
        let signatures_bitmap = deserializer.deserialize_bytes()?;
        if signatures_bitmap.len() > BITMAP_NUM_OF_BYTES {
            return Err(BcsError::invalid_value(
                "MultiKeyAuthenticator",
                format!("bitmap of {} bytes", signatures_bitmap.len()),
            ));
        }
        Ok(Self {
            public_keys,
            signatures,
            signatures_bitmap,
        })
    }
}

/// A set of public keys of any supported scheme together with the number of signatures needed
/// to authorize.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MultiKey {
    public_keys: Vec<AnyPublicKey>,
    signatures_required: u8,
}

impl MultiKey {
    pub fn new(public_keys: Vec<AnyPublicKey>, signatures_required: u8) -> Result<Self> {
        ensure!(
            signatures_required > 0,
            "The number of required signatures is 0."
        );
        ensure!(
            public_keys.len() <= MAX_NUM_OF_KEYS,
            "The number of public keys is greater than {}.",
            MAX_NUM_OF_KEYS
        );
        ensure!(
            public_keys.len() >= signatures_required as usize,
            "The number of public keys is smaller than the number of required signatures, {} < {}",
            public_keys.len(),
            signatures_required
        );
        Ok(Self {
            public_keys,
            signatures_required,
        })
    }

    pub fn public_keys(&self) -> &[AnyPublicKey] {
        &self.public_keys
    }

    pub fn signatures_required(&self) -> u8 {
        self.signatures_required
    }

    pub fn len(&self) -> usize {
        self.public_keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.public_keys.is_empty()
    }
}

impl Serializable for MultiKey {
    fn serialize(&self, serializer: &mut Serializer) -> aptos_bcs_utils::Result<()> {
        serializer.serialize_vector(&self.public_keys)?;
        serializer.serialize_u8(self.signatures_required);
        Ok(())
    }
}

impl Deserializable for MultiKey {
    fn deserialize(deserializer: &mut Deserializer<'_>) -> aptos_bcs_utils::Result<Self> {
        let public_keys = deserializer.deserialize_vector()?;
        let signatures_required = deserializer.deserialize_u8()?;
        MultiKey::new(public_keys, signatures_required)
            .map_err(|e| BcsError::invalid_value("MultiKey", e))
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum AnySignature {
    Ed25519 {
        signature: Ed25519Signature,
    },
    Secp256k1Ecdsa {
        signature: secp256k1_ecdsa::Secp256k1Signature,
    },
}

impl AnySignature {
    pub fn ed25519(signature: Ed25519Signature) -> Self {
        Self::Ed25519 { signature }
    }

    pub fn secp256k1_ecdsa(signature: secp256k1_ecdsa::Secp256k1Signature) -> Self {
        Self::Secp256k1Ecdsa { signature }
    }

    fn variant_index(&self) -> u32 {
        match self {
            Self::Ed25519 { .. } => 0,
            Self::Secp256k1Ecdsa { .. } => 1,
        }
    }

    pub fn verify<T: CryptoHash + ?Sized>(
        &self,
        public_key: &AnyPublicKey,
        message: &T,
    ) -> Result<()> {
        match (self, public_key) {
            (Self::Ed25519 { signature }, AnyPublicKey::Ed25519 { public_key }) => {
                signature.verify(message, public_key)
            },
            (Self::Secp256k1Ecdsa { signature }, AnyPublicKey::Secp256k1Ecdsa { public_key }) => {
                signature.verify(message, public_key)
            },
            _ => bail!("Invalid key, signature pairing"),
        }
    }
}

impl Serializable for AnySignature {
    fn serialize(&self, serializer: &mut Serializer) -> aptos_bcs_utils::Result<()> {
        serializer.serialize_variant_index(self.variant_index());
        match self {
            Self::Ed25519 { signature } => signature.serialize(serializer),
            Self::Secp256k1Ecdsa { signature } => signature.serialize(serializer),
        }
    }
}

impl Deserializable for AnySignature {
    fn deserialize(deserializer: &mut Deserializer<'_>) -> aptos_bcs_utils::Result<Self> {
        Ok(match deserializer.deserialize_variant_index()? {
            0 => Self::Ed25519 {
                signature: deserializer.deserialize()?,
            },
            1 => Self::Secp256k1Ecdsa {
                signature: deserializer.deserialize()?,
            },
            index => return Err(BcsError::unknown_variant("AnySignature", index)),
        })
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum AnyPublicKey {
    Ed25519 {
        public_key: Ed25519PublicKey,
    },
    Secp256k1Ecdsa {
        public_key: secp256k1_ecdsa::PublicKey,
    },
}

impl AnyPublicKey {
    pub fn ed25519(public_key: Ed25519PublicKey) -> Self {
        Self::Ed25519 { public_key }
    }

    pub fn secp256k1_ecdsa(public_key: secp256k1_ecdsa::PublicKey) -> Self {
        Self::Secp256k1Ecdsa { public_key }
    }

    fn variant_index(&self) -> u32 {
        match self {
            Self::Ed25519 { .. } => 0,
            Self::Secp256k1Ecdsa { .. } => 1,
        }
    }
}

impl Serializable for AnyPublicKey {
    fn serialize(&self, serializer: &mut Serializer) -> aptos_bcs_utils::Result<()> {
        serializer.serialize_variant_index(self.variant_index());
        match self {
            Self::Ed25519 { public_key } => public_key.serialize(serializer),
            Self::Secp256k1Ecdsa { public_key } => public_key.serialize(serializer),
        }
    }
}

impl Deserializable for AnyPublicKey {
    fn deserialize(deserializer: &mut Deserializer<'_>) -> aptos_bcs_utils::Result<Self> {
        Ok(match deserializer.deserialize_variant_index()? {
            0 => Self::Ed25519 {
                public_key: deserializer.deserialize()?,
            },
            1 => Self::Secp256k1Ecdsa {
                public_key: deserializer.deserialize()?,
            },
            index => return Err(BcsError::unknown_variant("AnyPublicKey", index)),
        })
    }
}

/// A struct that represents an account authentication key. An account's address is the last 32
/// bytes of authentication key used to create it
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct AuthenticationKey([u8; AuthenticationKey::LENGTH]);

impl AuthenticationKey {
    /// The number of bytes in an authentication key.
    pub const LENGTH: usize = AccountAddress::LENGTH;

    /// Create an authentication key from `bytes`
    pub const fn new(bytes: [u8; Self::LENGTH]) -> Self {
        Self(bytes)
    }

    /// Return an authentication key that is impossible (in expectation) to sign for--useful for
    /// intentionally relinquishing control of an account.
    pub const fn zero() -> Self {
        Self([0; 32])
    }

    /// Create an authentication key from a preimage by taking its sha3 hash
    pub fn from_preimage(mut public_key_bytes: Vec<u8>, scheme: Scheme) -> AuthenticationKey {
        public_key_bytes.push(scheme as u8);
        AuthenticationKey::new(*HashValue::sha3_256_of(&public_key_bytes))
    }

    /// Create an authentication key from an Ed25519 public key
    pub fn ed25519(public_key: &Ed25519PublicKey) -> AuthenticationKey {
        Self::from_preimage(public_key.to_bytes().to_vec(), Scheme::Ed25519)
    }

    /// Create an authentication key from a MultiEd25519 public key
    pub fn multi_ed25519(public_key: &MultiEd25519PublicKey) -> Self {
        Self::from_preimage(ValidCryptoMaterial::to_bytes(public_key), Scheme::MultiEd25519)
    }

    /// Create an authentication key from an AnyPublicKey
    pub fn any_key(public_key: &AnyPublicKey) -> aptos_bcs_utils::Result<AuthenticationKey> {
        Ok(Self::from_preimage(
            public_key.bcs_to_bytes()?,
            Scheme::SingleKey,
        ))
    }

    /// Create an authentication key from multiple AnyPublicKeys
    pub fn multi_key(public_keys: &MultiKey) -> aptos_bcs_utils::Result<AuthenticationKey> {
        Ok(Self::from_preimage(
            public_keys.bcs_to_bytes()?,
            Scheme::MultiKey,
        ))
    }

    /// Return the authentication key as an account address
    pub fn account_address(&self) -> AccountAddress {
        AccountAddress::new(self.0)
    }

    /// Construct a vector from this authentication key
    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }
}

impl TryFrom<&[u8]> for AuthenticationKey {
    type Error = CryptoMaterialError;

    fn try_from(bytes: &[u8]) -> std::result::Result<AuthenticationKey, CryptoMaterialError> {
        if bytes.len() != Self::LENGTH {
            return Err(CryptoMaterialError::WrongLengthError);
        }
        let mut addr = [0u8; Self::LENGTH];
        addr.copy_from_slice(bytes);
        Ok(AuthenticationKey(addr))
    }
}

impl AsRef<[u8]> for AuthenticationKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::LowerHex for AuthenticationKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if f.alternate() {
            write!(f, "0x")?;
        }
        write!(f, "{}", hex::encode(self.0))
    }
}

impl fmt::Display for AuthenticationKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> std::fmt::Result {
        // Forward to the LowerHex impl with a "0x" prepended (the # flag).
        write!(f, "{:#x}", self)
    }
}

impl FromStr for AuthenticationKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        ensure!(
            !s.is_empty(),
            "authentication key string should not be empty.",
        );
        let bytes_out = ::hex::decode(s.strip_prefix("0x").unwrap_or(s))?;
        let key = AuthenticationKey::try_from(bytes_out.as_slice())?;
        Ok(key)
    }
}

impl Serializable for AuthenticationKey {
    fn serialize(&self, serializer: &mut Serializer) -> aptos_bcs_utils::Result<()> {
        serializer.serialize_fixed_bytes(&self.0);
        Ok(())
    }
}

impl Deserializable for AuthenticationKey {
    fn deserialize(deserializer: &mut Deserializer<'_>) -> aptos_bcs_utils::Result<Self> {
        let bytes = deserializer.deserialize_fixed_bytes(Self::LENGTH)?;
        AuthenticationKey::try_from(bytes.as_slice())
            .map_err(|e| BcsError::invalid_value("AuthenticationKey", e))
    }
}
