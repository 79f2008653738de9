// Copyright © Aptos Foundation
// Parts of the project are originally copyright © Meta Platforms, Inc.
// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

pub mod chain_id;
pub mod transaction;

pub use move_core_types::account_address;

#[cfg(test)]
mod unit_tests;
