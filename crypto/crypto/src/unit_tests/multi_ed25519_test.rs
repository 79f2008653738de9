// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

use crate::{
    ed25519::{Ed25519PrivateKey, Ed25519PublicKey},
    multi_ed25519::*,
    traits::{CryptoMaterialError, Signature, SigningKey, ValidCryptoMaterial},
};
use claims::{assert_err, assert_err_eq, assert_ok, assert_ok_eq};
use rand::{rngs::StdRng, SeedableRng};

const MESSAGE: &[u8] = b"multi";

fn private_keys(n: usize) -> Vec<Ed25519PrivateKey> {
    let mut rng = StdRng::from_seed([42; 32]);
    (0..n).map(|_| Ed25519PrivateKey::generate(&mut rng)).collect()
}

fn public_keys(keys: &[Ed25519PrivateKey]) -> Vec<Ed25519PublicKey> {
    keys.iter().map(Ed25519PrivateKey::public_key).collect()
}

fn sign_with(keys: &[Ed25519PrivateKey], indices: &[u8]) -> MultiEd25519Signature {
    MultiEd25519Signature::from_signer_indices(
        indices
            .iter()
            .map(|&i| (keys[i as usize].sign_arbitrary_message(MESSAGE), i))
            .collect(),
    )
    .unwrap()
}

#[test]
fn test_create_bitmap() {
    assert_ok_eq!(create_bitmap(&[0, 2, 31]), [0b1010_0000, 0, 0, 0b0000_0001]);
    assert_ok_eq!(create_bitmap(&[]), [0, 0, 0, 0]);
    assert_ok_eq!(create_bitmap(&[8, 9]), [0, 0b1100_0000, 0, 0]);
    assert_err_eq!(create_bitmap(&[32]), BitmapError::IndexOutOfRange(32));
    assert_err_eq!(create_bitmap(&[1, 1]), BitmapError::Duplicate(1));
    assert_err_eq!(create_bitmap(&[2, 0]), BitmapError::Unsorted(2, 0));
}

#[test]
fn test_bitmap_indices() {
    assert_eq!(bitmap_indices(&[0b1010_0000, 0, 0, 0b0000_0001]), vec![0, 2, 31]);
    assert_eq!(bitmap_indices(&[0, 0, 0, 0]), Vec::<u8>::new());
}

#[test]
fn test_public_key_construction() {
    let keys = public_keys(&private_keys(3));
    assert_ok!(MultiEd25519PublicKey::new(keys.clone(), 2));
    assert_err_eq!(
        MultiEd25519PublicKey::new(keys.clone(), 0),
        CryptoMaterialError::ValidationError
    );
    assert_err_eq!(
        MultiEd25519PublicKey::new(keys.clone(), 4),
        CryptoMaterialError::ValidationError
    );
    assert_err_eq!(
        MultiEd25519PublicKey::new(keys[..1].to_vec(), 1),
        CryptoMaterialError::WrongLengthError
    );
}

#[test]
fn test_public_key_bytes() {
    let public_key = MultiEd25519PublicKey::new(public_keys(&private_keys(3)), 2).unwrap();
    let bytes = ValidCryptoMaterial::to_bytes(&public_key);
    assert_eq!(bytes.len(), 3 * 32 + 1);
    assert_eq!(*bytes.last().unwrap(), 2);
    assert_eq!(
        MultiEd25519PublicKey::try_from(bytes.as_slice()).unwrap(),
        public_key
    );
    assert_err!(MultiEd25519PublicKey::try_from(&bytes[1..]));
}

#[test]
fn test_threshold_verification() {
    let keys = private_keys(3);
    let public_key = MultiEd25519PublicKey::new(public_keys(&keys), 2).unwrap();

    assert_ok!(sign_with(&keys, &[0, 2]).verify_arbitrary_msg(MESSAGE, &public_key));
    assert_ok!(sign_with(&keys, &[0, 1, 2]).verify_arbitrary_msg(MESSAGE, &public_key));
    assert_err!(sign_with(&keys, &[1]).verify_arbitrary_msg(MESSAGE, &public_key));
    assert_err!(sign_with(&keys, &[0, 2]).verify_arbitrary_msg(b"other", &public_key));
}

#[test]
fn test_signature_at_wrong_index_fails() {
    let keys = private_keys(3);
    let public_key = MultiEd25519PublicKey::new(public_keys(&keys), 2).unwrap();
    // Signed by keys 0 and 2 but claimed as signers 0 and 1.
    let signature = MultiEd25519Signature::from_signer_indices(vec![
        (keys[0].sign_arbitrary_message(MESSAGE), 0),
        (keys[2].sign_arbitrary_message(MESSAGE), 1),
    ])
    .unwrap();
    assert_err!(signature.verify_arbitrary_msg(MESSAGE, &public_key));
}

#[test]
fn test_signer_index_beyond_keys_fails() {
    let keys = private_keys(4);
    let public_key = MultiEd25519PublicKey::new(public_keys(&keys[..3]), 2).unwrap();
    let signature = sign_with(&keys, &[0, 3]);
    assert_err!(signature.verify_arbitrary_msg(MESSAGE, &public_key));
}

#[test]
fn test_unsorted_signers_rejected() {
    let keys = private_keys(3);
    assert_err!(MultiEd25519Signature::from_signer_indices(vec![
        (keys[2].sign_arbitrary_message(MESSAGE), 2),
        (keys[0].sign_arbitrary_message(MESSAGE), 0),
    ]));
}

#[test]
fn test_signature_bytes() {
    let keys = private_keys(3);
    let signature = sign_with(&keys, &[0, 2]);
    let bytes = ValidCryptoMaterial::to_bytes(&signature);
    assert_eq!(bytes.len(), 2 * 64 + 4);
    assert_eq!(&bytes[128..], &[0b1010_0000, 0, 0, 0]);
    assert_eq!(
        MultiEd25519Signature::try_from(bytes.as_slice()).unwrap(),
        signature
    );

    // A bitmap naming three signers next to two signatures is malformed.
    let mut corrupted = bytes.clone();
    corrupted[128] = 0b1110_0000;
    assert_err!(MultiEd25519Signature::try_from(corrupted.as_slice()));
}
