// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Password acceptance policy for `createPasswordIdentity`.

use crate::error::{Error, Result};

const MIN_LENGTH: usize = 8;
const MIN_SCORE: u8 = 3;

/// Reject a caller-supplied password that is too short or too weak.
///
/// Strength is estimated with zxcvbn's 0-4 scale; a score below 3 is
/// rejected, matching the "3 out of 4" acceptance bar.
pub fn validate_password(password: &str) -> Result<()> {
    if password.len() < MIN_LENGTH {
        return Err(Error::InputInvalid(format!(
            "password must be at least {MIN_LENGTH} characters"
        )));
    }

    let estimate = zxcvbn::zxcvbn(password, &[]);
    if estimate.score() < MIN_SCORE {
        return Err(Error::InputInvalid(
            "password is too weak (must score at least 3 out of 4)".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_password_is_rejected_before_scoring() {
        let result = validate_password("a1!b2@c");
        assert!(matches!(result, Err(Error::InputInvalid(_))));
    }

    #[test]
    fn weak_long_password_is_rejected() {
        let result = validate_password("aaaaaaaaaaaaaaaa");
        assert!(matches!(result, Err(Error::InputInvalid(_))));
    }

    #[test]
    fn strong_password_is_accepted() {
        assert!(validate_password("tr0ub4dor&3-correct-horse-zebra").is_ok());
    }
}
