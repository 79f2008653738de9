// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

use crate::{
    chain_id::ChainId,
    transaction::{
        authenticator::{
            AccountAuthenticator, AnyPublicKey, AnySignature, AuthenticationKey, MultiKey,
            MultiKeyAuthenticator, Scheme, SingleKeyAuthenticator, TransactionAuthenticator,
            MAX_NUM_OF_SIGS,
        },
        EntryFunction, RawTransaction, SignedTransaction,
    },
};
use aptos_bcs_utils::{Deserializable, Serializable};
use aptos_crypto::{
    ed25519::{Ed25519PrivateKey, Ed25519PublicKey},
    multi_ed25519::{MultiEd25519PublicKey, MultiEd25519Signature},
    secp256k1_ecdsa, HashValue, SigningKey, ValidCryptoMaterial,
};
use claims::{assert_err, assert_ok, assert_ok_eq};
use move_core_types::{
    account_address::AccountAddress, identifier::Identifier, language_storage::ModuleId,
};
use rand::{rngs::StdRng, SeedableRng};
use std::str::FromStr;

fn ed25519_keys(n: usize) -> Vec<Ed25519PrivateKey> {
    let mut rng = StdRng::from_seed([3; 32]);
    (0..n).map(|_| Ed25519PrivateKey::generate(&mut rng)).collect()
}

fn secp256k1_key() -> secp256k1_ecdsa::PrivateKey {
    let mut rng = StdRng::from_seed([5; 32]);
    secp256k1_ecdsa::PrivateKey::generate(&mut rng)
}

fn raw_txn(sender: AccountAddress) -> RawTransaction {
    RawTransaction::new_entry_function(
        sender,
        0,
        EntryFunction::new(
            ModuleId::new(AccountAddress::ONE, Identifier::new("coin").unwrap()),
            Identifier::new("transfer").unwrap(),
            vec![],
            vec![],
        ),
        2_000_000,
        100,
        u64::MAX,
        ChainId::test(),
    )
}

#[test]
fn test_authentication_key_preimages() {
    let key = ed25519_keys(1).remove(0).public_key();

    let mut preimage = key.to_bytes().to_vec();
    preimage.push(0);
    assert_eq!(
        AuthenticationKey::ed25519(&key),
        AuthenticationKey::new(*HashValue::sha3_256_of(&preimage))
    );

    let any_key = AnyPublicKey::ed25519(key.clone());
    let mut preimage = any_key.bcs_to_bytes().unwrap();
    assert_eq!(preimage[0], 0);
    preimage.push(Scheme::SingleKey as u8);
    assert_ok_eq!(
        AuthenticationKey::any_key(&any_key),
        AuthenticationKey::new(*HashValue::sha3_256_of(&preimage))
    );

    // The same key under different schemes controls different accounts.
    assert_ne!(
        AuthenticationKey::ed25519(&key),
        AuthenticationKey::any_key(&any_key).unwrap()
    );
}

#[test]
fn test_authentication_key_parsing() {
    let auth_key = AuthenticationKey::new([0xab; 32]);
    let displayed = auth_key.to_string();
    assert!(displayed.starts_with("0xabab"));
    assert_ok_eq!(AuthenticationKey::from_str(&displayed), auth_key);
    assert_ok_eq!(
        AuthenticationKey::from_str(displayed.trim_start_matches("0x")),
        auth_key
    );
    assert_err!(AuthenticationKey::from_str(""));
    assert_err!(AuthenticationKey::from_str("0xabab"));

    assert_ok_eq!(auth_key.bcs_to_bytes(), vec![0xab; 32]);
    assert_ok_eq!(AuthenticationKey::from_bcs_bytes(&[0xab; 32]), auth_key);
    assert_eq!(AuthenticationKey::zero().account_address(), AccountAddress::ZERO);
}

#[test]
fn test_account_authenticator_authentication_key() {
    let keys = ed25519_keys(3);
    let public_keys: Vec<Ed25519PublicKey> = keys.iter().map(|k| k.public_key()).collect();
    let multi_public_key = MultiEd25519PublicKey::new(public_keys, 2).unwrap();
    let raw = raw_txn(AccountAddress::ONE);
    let signature = MultiEd25519Signature::from_signer_indices(vec![
        (keys[0].sign(&raw).unwrap(), 0),
        (keys[2].sign(&raw).unwrap(), 2),
    ])
    .unwrap();

    let authenticator =
        AccountAuthenticator::multi_ed25519(multi_public_key.clone(), signature.clone());
    assert_eq!(authenticator.scheme(), Some(Scheme::MultiEd25519));
    assert_eq!(authenticator.number_of_signatures(), 2);
    assert_ok_eq!(
        authenticator.authentication_key(),
        AuthenticationKey::multi_ed25519(&multi_public_key)
    );
    assert_ok!(authenticator.verify(&raw));

    let mut preimage = ValidCryptoMaterial::to_bytes(&multi_public_key);
    preimage.push(1);
    assert_eq!(
        AuthenticationKey::multi_ed25519(&multi_public_key),
        AuthenticationKey::new(*HashValue::sha3_256_of(&preimage))
    );

    let signed = SignedTransaction::new_multisig(raw, multi_public_key, signature);
    assert_ok!(signed.verify_signature());
    let decoded = SignedTransaction::from_bcs_bytes(&signed.bcs_to_bytes().unwrap()).unwrap();
    assert_eq!(decoded, signed);
    assert_ok!(decoded.verify_signature());
}

#[test]
fn test_no_account_authenticator() {
    let authenticator = AccountAuthenticator::no_authenticator();
    assert_eq!(authenticator.scheme(), None);
    assert_eq!(authenticator.number_of_signatures(), 0);
    assert_err!(authenticator.authentication_key());
    assert_err!(authenticator.verify(&raw_txn(AccountAddress::ONE)));
    assert_ok_eq!(authenticator.bcs_to_bytes(), vec![4]);
    assert_ok_eq!(AccountAuthenticator::from_bcs_bytes(&[4]), authenticator);
    assert_err!(AccountAuthenticator::from_bcs_bytes(&[5]));
}

#[test]
fn test_single_key_secp256k1() {
    let key = secp256k1_key();
    let public_key = AnyPublicKey::secp256k1_ecdsa(key.public_key());
    let raw = raw_txn(AuthenticationKey::any_key(&public_key).unwrap().account_address());

    let authenticator = AccountAuthenticator::single_key(SingleKeyAuthenticator::new(
        public_key.clone(),
        AnySignature::secp256k1_ecdsa(key.sign(&raw).unwrap()),
    ));
    assert_ok!(authenticator.verify(&raw));
    assert_ok_eq!(
        authenticator.authentication_key(),
        AuthenticationKey::any_key(&public_key).unwrap()
    );

    let bytes = authenticator.bcs_to_bytes().unwrap();
    // Single key, then the secp256k1 public key tag.
    assert_eq!(&bytes[..2], &[2, 1]);
    assert_ok_eq!(AccountAuthenticator::from_bcs_bytes(&bytes), authenticator);
}

#[test]
fn test_mismatched_key_and_signature_schemes() {
    let ed25519 = ed25519_keys(1).remove(0);
    let secp256k1 = secp256k1_key();
    let raw = raw_txn(AccountAddress::ONE);

    let authenticator = SingleKeyAuthenticator::new(
        AnyPublicKey::secp256k1_ecdsa(secp256k1.public_key()),
        AnySignature::ed25519(ed25519.sign(&raw).unwrap()),
    );
    assert_err!(authenticator.verify(&raw));
}

#[test]
fn test_unknown_any_key_variant() {
    let key = ed25519_keys(1).remove(0).public_key();
    let mut bytes = AnyPublicKey::ed25519(key).bcs_to_bytes().unwrap();
    bytes[0] = 3;
    assert_err!(AnyPublicKey::from_bcs_bytes(&bytes));
}

fn multi_key_fixture() -> (Vec<Ed25519PrivateKey>, secp256k1_ecdsa::PrivateKey, MultiKey) {
    let ed25519 = ed25519_keys(2);
    let secp256k1 = secp256k1_key();
    let multi_key = MultiKey::new(
        vec![
            AnyPublicKey::ed25519(ed25519[0].public_key()),
            AnyPublicKey::secp256k1_ecdsa(secp256k1.public_key()),
            AnyPublicKey::ed25519(ed25519[1].public_key()),
        ],
        2,
    )
    .unwrap();
    (ed25519, secp256k1, multi_key)
}

#[test]
fn test_multi_key_construction() {
    let (_, _, multi_key) = multi_key_fixture();
    assert_eq!(multi_key.len(), 3);
    assert_eq!(multi_key.signatures_required(), 2);
    assert_err!(MultiKey::new(multi_key.public_keys().to_vec(), 0));
    assert_err!(MultiKey::new(multi_key.public_keys().to_vec(), 4));

    let bytes = multi_key.bcs_to_bytes().unwrap();
    assert_eq!(bytes[0], 3);
    assert_eq!(*bytes.last().unwrap(), 2);
    assert_ok_eq!(MultiKey::from_bcs_bytes(&bytes), multi_key.clone());

    // A zero threshold never decodes.
    let mut zero_threshold = bytes;
    *zero_threshold.last_mut().unwrap() = 0;
    assert_err!(MultiKey::from_bcs_bytes(&zero_threshold));
}

#[test]
fn test_multi_key_authenticator() {
    let (ed25519, secp256k1, multi_key) = multi_key_fixture();
    let raw = raw_txn(
        AuthenticationKey::multi_key(&multi_key)
            .unwrap()
            .account_address(),
    );

    let authenticator = MultiKeyAuthenticator::new(multi_key.clone(), vec![
        (1, AnySignature::secp256k1_ecdsa(secp256k1.sign(&raw).unwrap())),
        (2, AnySignature::ed25519(ed25519[1].sign(&raw).unwrap())),
    ])
    .unwrap();
    assert_eq!(authenticator.signer_indices(), vec![1, 2]);
    assert_ok!(authenticator.verify(&raw));

    let account = AccountAuthenticator::multi_key(authenticator.clone());
    assert_eq!(account.number_of_signatures(), 2);
    assert_ok_eq!(
        account.authentication_key(),
        AuthenticationKey::multi_key(&multi_key).unwrap()
    );

    let bytes = account.bcs_to_bytes().unwrap();
    // The bitmap is written last as a length-prefixed 4-byte blob.
    assert_eq!(&bytes[bytes.len() - 5..], &[4, 0b0110_0000, 0, 0, 0]);
    assert_ok_eq!(AccountAuthenticator::from_bcs_bytes(&bytes), account.clone());

    let signed = SignedTransaction::new_single_sender(raw, account);
    assert_ok!(signed.verify_signature());
}

#[test]
fn test_multi_key_authenticator_failures() {
    let (ed25519, secp256k1, multi_key) = multi_key_fixture();
    let raw = raw_txn(AccountAddress::ONE);

    // Below threshold.
    assert_err!(MultiKeyAuthenticator::new(multi_key.clone(), vec![(
        0,
        AnySignature::ed25519(ed25519[0].sign(&raw).unwrap())
    )]));
    // Unsorted indices.
    assert_err!(MultiKeyAuthenticator::new(multi_key.clone(), vec![
        (2, AnySignature::ed25519(ed25519[1].sign(&raw).unwrap())),
        (0, AnySignature::ed25519(ed25519[0].sign(&raw).unwrap())),
    ]));
    // Index beyond the key set.
    assert_err!(MultiKeyAuthenticator::new(multi_key.clone(), vec![
        (0, AnySignature::ed25519(ed25519[0].sign(&raw).unwrap())),
        (5, AnySignature::ed25519(ed25519[1].sign(&raw).unwrap())),
    ]));

    // Signature placed at the wrong key index.
    let swapped = MultiKeyAuthenticator::new(multi_key, vec![
        (0, AnySignature::ed25519(ed25519[1].sign(&raw).unwrap())),
        (1, AnySignature::secp256k1_ecdsa(secp256k1.sign(&raw).unwrap())),
    ])
    .unwrap();
    assert_err!(swapped.verify(&raw));
}

#[test]
fn test_transaction_authenticator_accessors() {
    let keys = ed25519_keys(2);
    let raw = raw_txn(AccountAddress::ONE);
    let sender = AccountAuthenticator::ed25519(keys[0].public_key(), keys[0].sign(&raw).unwrap());

    let ed25519 =
        TransactionAuthenticator::ed25519(keys[0].public_key(), keys[0].sign(&raw).unwrap());
    assert_eq!(ed25519.sender(), sender);
    assert!(ed25519.secondary_signer_addresses().is_empty());
    assert_eq!(ed25519.fee_payer_address(), None);
    assert_ok!(ed25519.verify(&raw));

    let single_sender = TransactionAuthenticator::single_sender(sender.clone());
    assert_eq!(single_sender.sender(), sender);
    assert_ok!(single_sender.verify(&raw));

    // A plain signature over the raw transaction is not a multi-agent signature.
    let multi_agent = TransactionAuthenticator::multi_agent(sender, vec![], vec![]);
    assert_err!(multi_agent.verify(&raw));

    assert_err!(TransactionAuthenticator::from_bcs_bytes(&[5]));
}

#[test]
fn test_multi_agent_signer_count_mismatch() {
    let keys = ed25519_keys(2);
    let raw = raw_txn(AccountAddress::ONE);
    let signed = raw
        .clone()
        .sign_multi_agent(&keys[0], vec![AccountAddress::THREE], vec![&keys[1]])
        .unwrap();

    let truncated = TransactionAuthenticator::multi_agent(
        signed.authenticator().sender(),
        vec![AccountAddress::THREE],
        vec![],
    );
    assert_err!(truncated.verify(&raw));
}

#[test]
fn test_too_many_signatures() {
    let keys = ed25519_keys(MAX_NUM_OF_SIGS + 1);
    let raw = raw_txn(AccountAddress::ONE);
    let addresses: Vec<AccountAddress> = (1..=MAX_NUM_OF_SIGS)
        .map(|i| AccountAddress::new([i as u8; 32]))
        .collect();
    let signed = raw
        .clone()
        .sign_multi_agent(&keys[0], addresses, keys[1..].iter().collect())
        .unwrap();
    let err = signed.verify_signature().unwrap_err();
    assert!(err.to_string().contains("MaxSignaturesExceeded"));
}
