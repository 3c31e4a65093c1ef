// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! BIP-39 recovery phrase generation for the no-password identity path.

use bip39::Mnemonic;
use rand::RngCore;
use rand_core::OsRng;

use crate::error::{Error, Result};

const ENTROPY_BYTES: usize = 16; // 128-bit entropy -> 12-word phrase

/// Generate a fresh 128-bit-entropy BIP-39 mnemonic to use as the secret
/// when the caller does not supply a password.
pub fn generate_recovery_phrase() -> Result<String> {
    let mut entropy = [0u8; ENTROPY_BYTES];
    OsRng.fill_bytes(&mut entropy);

    let mnemonic = Mnemonic::from_entropy(&entropy)
        .map_err(|e| Error::InputInvalid(format!("failed to generate recovery phrase: {e}")))?;

    Ok(mnemonic.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_phrase_has_twelve_words() {
        let phrase = generate_recovery_phrase().unwrap();
        assert_eq!(phrase.split_whitespace().count(), 12);
    }

    #[test]
    fn generated_phrase_is_valid_bip39() {
        let phrase = generate_recovery_phrase().unwrap();
        assert!(Mnemonic::parse(&phrase).is_ok());
    }
}
