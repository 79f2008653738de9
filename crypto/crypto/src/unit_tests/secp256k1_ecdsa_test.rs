// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

use crate::{
    secp256k1_ecdsa::*,
    traits::{CryptoMaterialError, Signature, SigningKey},
};
use claims::{assert_err, assert_err_eq, assert_ok};
use rand::{rngs::StdRng, SeedableRng};

/// Order of the secp256k1 group, big-endian.
const ORDER: [u8; 32] = [
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFE,
    0xBA, 0xAE, 0xDC, 0xE6, 0xAF, 0x48, 0xA0, 0x3B, 0xBF, 0xD2, 0x5E, 0x8C, 0xD0, 0x36, 0x41, 0x41,
];

fn sub_be(a: &[u8; 32], b: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    let mut borrow = 0i16;
    for i in (0..32).rev() {
        let mut diff = a[i] as i16 - b[i] as i16 - borrow;
        borrow = 0;
        if diff < 0 {
            diff += 256;
            borrow = 1;
        }
        out[i] = diff as u8;
    }
    out
}

#[test]
fn test_sign_and_verify() {
    let private_key = PrivateKey::generate(&mut StdRng::from_seed([9; 32]));
    let public_key = private_key.public_key();
    let signature = private_key.sign_arbitrary_message(b"hello");

    assert_ok!(signature.verify_arbitrary_msg(b"hello", &public_key));
    assert_err!(signature.verify_arbitrary_msg(b"hellp", &public_key));
}

#[test]
fn test_key_encodings() {
    let private_key = PrivateKey::generate(&mut StdRng::from_seed([10; 32]));
    let public_key = private_key.public_key();
    let bytes = public_key.to_bytes();
    assert_eq!(bytes.len(), PUBLIC_KEY_LENGTH);
    assert_eq!(bytes[0], 0x04);
    assert_eq!(PublicKey::try_from(&bytes[..]).unwrap(), public_key);
    assert_err_eq!(
        PublicKey::try_from(&bytes[..33]),
        CryptoMaterialError::WrongLengthError
    );
}

#[test]
fn test_high_s_rejected() {
    let private_key = PrivateKey::generate(&mut StdRng::from_seed([11; 32]));
    let signature = private_key.sign_arbitrary_message(b"payload");
    let bytes = signature.to_bytes();

    // Replacing s with n - s yields the malleated twin of a valid signature.
    let mut malleated = bytes;
    malleated[32..].copy_from_slice(&sub_be(&ORDER, &bytes[32..]));
    assert_err_eq!(
        Secp256k1Signature::try_from(&malleated[..]),
        CryptoMaterialError::CanonicalRepresentationError
    );
    assert_ok!(Secp256k1Signature::try_from(&bytes[..]));
}
