// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

use crate::transaction_builder::TransactionBuilder;
use anyhow::Result;
use aptos_crypto::{
    ed25519::{Ed25519PrivateKey, Ed25519PublicKey},
    ValidCryptoMaterial,
};
pub use aptos_types::{
    account_address, chain_id,
    transaction::{self, authenticator},
};
use aptos_types::transaction::{
    authenticator::AuthenticationKey, RawTransaction, SignedTransaction,
};
use move_core_types::account_address::AccountAddress;
use rand::{CryptoRng, RngCore};
use std::sync::atomic::{AtomicU64, Ordering};

/// LocalAccount represents an account on the Aptos blockchain. Internally it
/// holds the private / public key pair and the address of the account. You can
/// use this struct to help transfer coins, create accounts, etc.
#[derive(Debug)]
pub struct LocalAccount {
    /// Address of the account.
    address: AccountAddress,
    /// Authentication key of the account.
    key: AccountKey,
    /// Latest known sequence number of the account, it can be different from validator.
    sequence_number: AtomicU64,
}

impl LocalAccount {
    /// Create a new representation of an account locally. Note: This function
    /// does not actually create an account on the Aptos blockchain, just a
    /// local representation.
    pub fn new<T: Into<AccountKey>>(address: AccountAddress, key: T, sequence_number: u64) -> Self {
        Self {
            address,
            key: key.into(),
            sequence_number: AtomicU64::new(sequence_number),
        }
    }

    /// Generate a new account locally, deriving the address from the Ed25519 authentication key.
    pub fn generate<R>(rng: &mut R) -> Self
    where
        R: RngCore + CryptoRng,
    {
        let key = AccountKey::generate(rng);
        let address = key.authentication_key().account_address();
        Self::new(address, key, 0)
    }

    /// Recreate an account from the hex encoding of its Ed25519 private key. The address is
    /// derived from the key.
    pub fn from_private_key(private_key: &str, sequence_number: u64) -> Result<Self> {
        let bytes = hex::decode(private_key.trim_start_matches("0x"))?;
        let key = AccountKey::from_private_key(Ed25519PrivateKey::try_from(bytes.as_slice())?);
        let address = key.authentication_key().account_address();
        Ok(Self::new(address, key, sequence_number))
    }

    pub fn sign_transaction(&self, txn: RawTransaction) -> Result<SignedTransaction> {
        Ok(txn
            .sign(self.private_key(), self.public_key().clone())?
            .into_inner())
    }

    /// Fills in this account as sender and consumes its next sequence number.
    pub fn sign_with_transaction_builder(
        &self,
        builder: TransactionBuilder,
    ) -> Result<SignedTransaction> {
        let raw_txn = self.build_as_sender(builder)?;
        self.sign_transaction(raw_txn)
    }

    pub fn sign_multi_agent_with_transaction_builder(
        &self,
        secondary_signers: Vec<&Self>,
        builder: TransactionBuilder,
    ) -> Result<SignedTransaction> {
        let secondary_signer_addresses = secondary_signers
            .iter()
            .map(|signer| signer.address())
            .collect();
        let secondary_signer_privkeys = secondary_signers
            .iter()
            .map(|signer| signer.private_key())
            .collect();
        let raw_txn = self.build_as_sender(builder)?;
        Ok(raw_txn
            .sign_multi_agent(
                self.private_key(),
                secondary_signer_addresses,
                secondary_signer_privkeys,
            )?
            .into_inner())
    }

    pub fn sign_fee_payer_with_transaction_builder(
        &self,
        secondary_signers: Vec<&Self>,
        fee_payer_signer: &Self,
        builder: TransactionBuilder,
    ) -> Result<SignedTransaction> {
        let secondary_signer_addresses = secondary_signers
            .iter()
            .map(|signer| signer.address())
            .collect();
        let secondary_signer_privkeys = secondary_signers
            .iter()
            .map(|signer| signer.private_key())
            .collect();
        let raw_txn = self.build_as_sender(builder)?;
        Ok(raw_txn
            .sign_fee_payer(
                self.private_key(),
                secondary_signer_addresses,
                secondary_signer_privkeys,
                fee_payer_signer.address(),
                fee_payer_signer.private_key(),
            )?
            .into_inner())
    }

    /// Reserves the next sequence number with a single atomic increment, so concurrent builders
    /// never share one.
    fn build_as_sender(&self, builder: TransactionBuilder) -> Result<RawTransaction> {
        let sequence_number = self.increment_sequence_number();
        builder
            .sender(self.address())
            .sequence_number(sequence_number)
            .build()
    }

    pub fn address(&self) -> AccountAddress {
        self.address
    }

    pub fn private_key(&self) -> &Ed25519PrivateKey {
        self.key.private_key()
    }

    pub fn public_key(&self) -> &Ed25519PublicKey {
        self.key.public_key()
    }

    pub fn authentication_key(&self) -> AuthenticationKey {
        self.key.authentication_key()
    }

    pub fn sequence_number(&self) -> u64 {
        self.sequence_number.load(Ordering::SeqCst)
    }

    /// Returns the sequence number before the increment.
    pub fn increment_sequence_number(&self) -> u64 {
        self.sequence_number.fetch_add(1, Ordering::SeqCst)
    }

    pub fn set_sequence_number(&self, sequence_number: u64) {
        self.sequence_number.store(sequence_number, Ordering::SeqCst);
    }
}

#[derive(Debug)]
pub struct AccountKey {
    private_key: Ed25519PrivateKey,
    public_key: Ed25519PublicKey,
    authentication_key: AuthenticationKey,
}

impl AccountKey {
    pub fn generate<R>(rng: &mut R) -> Self
    where
        R: RngCore + CryptoRng,
    {
        Self::from_private_key(Ed25519PrivateKey::generate(rng))
    }

    pub fn from_private_key(private_key: Ed25519PrivateKey) -> Self {
        let public_key = private_key.public_key();
        let authentication_key = AuthenticationKey::ed25519(&public_key);

        Self {
            private_key,
            public_key,
            authentication_key,
        }
    }

    pub fn private_key(&self) -> &Ed25519PrivateKey {
        &self.private_key
    }

    pub fn public_key(&self) -> &Ed25519PublicKey {
        &self.public_key
    }

    pub fn authentication_key(&self) -> AuthenticationKey {
        self.authentication_key
    }

    /// Hex encoding of the public key, the form wallets display.
    pub fn public_key_hex(&self) -> String {
        hex::encode(ValidCryptoMaterial::to_bytes(&self.public_key))
    }
}

impl From<Ed25519PrivateKey> for AccountKey {
    fn from(private_key: Ed25519PrivateKey) -> Self {
        Self::from_private_key(private_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction_builder::TransactionFactory;
    use aptos_types::{chain_id::ChainId, transaction::TransactionPayload};
    use claims::{assert_err, assert_ok};
    use move_core_types::{identifier::Identifier, language_storage::ModuleId};
    use rand::{rngs::StdRng, SeedableRng};

    fn payload() -> TransactionPayload {
        TransactionPayload::EntryFunction(aptos_types::transaction::EntryFunction::new(
            ModuleId::new(AccountAddress::ONE, Identifier::new("aptos_account").unwrap()),
            Identifier::new("transfer").unwrap(),
            vec![],
            vec![],
        ))
    }

    #[test]
    fn test_local_account_from_private_key() {
        let account = LocalAccount::from_private_key(&format!("0x{}", "01".repeat(32)), 7).unwrap();
        assert_eq!(
            account.address().to_hex(),
            "7df415e5b21bdaa8b2946e8f1f4278b39904e51a69627494cd3e6f2996732fbd"
        );
        assert_eq!(account.sequence_number(), 7);
        assert_err!(LocalAccount::from_private_key("0x1234", 0));
    }

    #[test]
    fn test_sign_with_transaction_builder_bumps_sequence_number() {
        let mut rng = StdRng::from_seed([9; 32]);
        let account = LocalAccount::generate(&mut rng);
        let factory = TransactionFactory::new(ChainId::test());

        let first = account
            .sign_with_transaction_builder(factory.payload(payload()))
            .unwrap();
        let second = account
            .sign_with_transaction_builder(factory.payload(payload()))
            .unwrap();
        assert_eq!(first.sequence_number(), 0);
        assert_eq!(second.sequence_number(), 1);
        assert_eq!(first.sender(), account.address());
        assert_eq!(account.sequence_number(), 2);
        assert_ok!(second.verify_signature());
    }

    #[test]
    fn test_multi_agent_and_fee_payer_signing() {
        let mut rng = StdRng::from_seed([11; 32]);
        let sender = LocalAccount::generate(&mut rng);
        let secondary = LocalAccount::generate(&mut rng);
        let fee_payer = LocalAccount::generate(&mut rng);
        let factory = TransactionFactory::new(ChainId::test());

        let multi_agent = sender
            .sign_multi_agent_with_transaction_builder(vec![&secondary], factory.payload(payload()))
            .unwrap();
        assert_eq!(
            multi_agent.authenticator().secondary_signer_addresses(),
            vec![secondary.address()]
        );
        assert_ok!(multi_agent.verify_signature());

        let fee_payer_txn = sender
            .sign_fee_payer_with_transaction_builder(vec![], &fee_payer, factory.payload(payload()))
            .unwrap();
        assert_eq!(
            fee_payer_txn.authenticator().fee_payer_address(),
            Some(fee_payer.address())
        );
        assert_ok!(fee_payer_txn.verify_signature());
        // Only the sender's sequence number is consumed.
        assert_eq!(sender.sequence_number(), 2);
        assert_eq!(fee_payer.sequence_number(), 0);
    }

    #[test]
    fn test_concurrent_signing_never_reuses_a_sequence_number() {
        let mut rng = StdRng::from_seed([13; 32]);
        let account = LocalAccount::generate(&mut rng);
        account.set_sequence_number(100);
        let factory = TransactionFactory::new(ChainId::test());
        let (threads, per_thread) = (8, 50);

        let sequence_numbers: Vec<u64> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..threads)
                .map(|_| {
                    scope.spawn(|| {
                        (0..per_thread)
                            .map(|_| {
                                account
                                    .sign_with_transaction_builder(factory.payload(payload()))
                                    .unwrap()
                                    .sequence_number()
                            })
                            .collect::<Vec<_>>()
                    })
                })
                .collect();
            handles
                .into_iter()
                .flat_map(|handle| handle.join().unwrap())
                .collect()
        });

        let total = (threads * per_thread) as u64;
        let unique: std::collections::HashSet<_> = sequence_numbers.iter().copied().collect();
        assert_eq!(unique.len() as u64, total);
        assert_eq!(unique.iter().min(), Some(&100));
        assert_eq!(unique.iter().max(), Some(&(100 + total - 1)));
        assert_eq!(account.sequence_number(), 100 + total);
    }
}
