// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Value objects shared across the custodian's public surface.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;

/// The four co-present fields of a sealed, persisted identity.
///
/// Invariant: all four fields are present together or absent together;
/// partial presence is a `StoreCorrupt` condition, never silently repaired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedIdentity {
    pub encrypted_key_pem: Vec<u8>,
    pub certificate_pem: String,
    pub kdf_salt: [u8; 16],
    pub aead_iv: [u8; 12],
}

/// An opaque capability to ask the custodian that issued it to sign bytes.
///
/// The only public operation is `sign`; nothing outside the custodian can
/// reach the private key through this trait. Signing suspends on the
/// custodian's lock, so the capability is async.
#[async_trait]
pub trait SignCapability: Send + Sync {
    /// Produce the raw 64-byte `(R || S)` ECDSA-P256 signature over
    /// `SHA-256(message)`. Fails with `NotUnlocked` if the custodian's slot
    /// holds no key.
    async fn sign(&self, message: &[u8]) -> Result<[u8; 64]>;
}

/// An immutable value object carrying a certificate and a signing
/// capability that calls back into the custodian that issued it.
#[derive(Clone)]
pub struct AppIdentity {
    pub cert_pem: String,
    sign_capability: Arc<dyn SignCapability>,
}

impl AppIdentity {
    pub fn new(cert_pem: String, sign_capability: Arc<dyn SignCapability>) -> Self {
        Self { cert_pem, sign_capability }
    }

    /// Request a raw signature from the custodian that issued this identity.
    pub async fn sign(&self, message: &[u8]) -> Result<[u8; 64]> {
        self.sign_capability.sign(message).await
    }
}

impl fmt::Debug for AppIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppIdentity")
            .field("cert_pem", &self.cert_pem)
            .field("sign_capability", &"<opaque>")
            .finish()
    }
}

/// The result of `createPasswordIdentity`: the active identity plus the
/// recovery material generated alongside it.
pub struct CreatedIdentity {
    pub identity: AppIdentity,
    /// Present only when the caller did not supply a password.
    pub recovery_phrase: Option<String>,
    /// 5 base64-encoded Shamir shares of the secret, threshold 3.
    pub recovery_shares: Vec<String>,
}
