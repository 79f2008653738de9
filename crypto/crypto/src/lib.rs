// Copyright © Aptos Foundation
// Parts of the project are originally copyright © Meta Platforms, Inc.
// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

//! Cryptographic primitives consumed by the transaction model.
//!
//! The curve arithmetic itself lives in `ed25519-dalek` and `libsecp256k1`; this crate wraps the
//! keys and signatures in types that carry their canonical BCS encodings, provides the domain
//! separated SHA3-256 hashing used for signing messages, and implements the K-of-N MultiEd25519
//! threshold scheme on top of Ed25519.

pub mod ed25519;
pub mod hash;
pub mod multi_ed25519;
pub mod secp256k1_ecdsa;
pub mod traits;

#[cfg(test)]
mod unit_tests;

pub use self::{
    hash::HashValue,
    traits::{CryptoMaterialError, *},
};
