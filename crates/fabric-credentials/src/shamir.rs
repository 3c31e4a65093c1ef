// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Shamir's Secret Sharing, generation side only.
//!
//! Recovery (recombination) is a deliberate non-goal: the source this system
//! is modeled on generates shares but never recombines them, and guessing a
//! recovery API was explicitly ruled out. Only `split_secret` exists here.

use base64::{Engine, engine::general_purpose::STANDARD};
use sharks::Sharks;

use crate::error::{Error, Result};

const TOTAL_SHARES: usize = 5;
const THRESHOLD: u8 = 3;

/// Split `secret` into 5 base64-encoded Shamir shares with threshold 3.
pub fn split_secret(secret: &[u8]) -> Result<Vec<String>> {
    if secret.is_empty() {
        return Err(Error::InputInvalid("cannot split an empty secret".to_string()));
    }

    let sharks = Sharks(THRESHOLD);
    let dealer = sharks.dealer(secret);

    Ok(dealer
        .take(TOTAL_SHARES)
        .map(|share| STANDARD.encode(Vec::from(&share)))
        .collect())
}
