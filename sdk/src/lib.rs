// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

//! Client-side helpers for building, encoding and signing Aptos transactions.
//!
//! Entry-function payloads can be assembled from loosely typed arguments once the function's ABI
//! is known, see [`remote_abi`]. ABIs are fetched through an injected [`abi_cache::ModuleAbiSource`]
//! and memoized by [`abi_cache::AbiCache`].

pub mod abi_cache;
pub mod remote_abi;
pub mod transaction_builder;
pub mod types;

pub use aptos_bcs_utils as bcs;
pub use move_core_types as move_types;

pub mod crypto {
    pub use aptos_crypto::*;
}
