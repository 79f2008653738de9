// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

mod multi_ed25519_test;
mod secp256k1_ecdsa_test;
