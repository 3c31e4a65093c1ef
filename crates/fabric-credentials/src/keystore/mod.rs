// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Opaque key/value persistence, consumed only by the custodian.
//!
//! Two conforming implementations are provided: [`FileKeyStore`] (a
//! local-file JSON store) and [`SqliteKeyStore`] (an embedded database,
//! standing in for a browser-local key-value store). Both satisfy the same
//! invariants: binary values round-trip losslessly, `set` is atomic per
//! key, and anything persisted to disk is owner-only (0600/0700).

mod file_store;
mod sqlite_store;

pub use file_store::FileKeyStore;
pub use sqlite_store::SqliteKeyStore;

use async_trait::async_trait;

use crate::error::Result;

/// The standard keys the custodian persists a sealed identity under.
pub mod keys {
    pub const ENCRYPTED_PRIVATE_KEY: &str = "pbe-fabric-encrypted-private-key";
    pub const USER_CERTIFICATE: &str = "pbe-fabric-user-certificate";
    pub const KEY_DERIVATION_SALT: &str = "pbe-fabric-key-derivation-salt";
    pub const ENCRYPTION_IV: &str = "pbe-fabric-encryption-iv";
    pub const HARDWARE_CREDENTIAL_ID: &str = "hw-fabric-credential-id";
}

/// Abstract, durable key/value persistence for sealed identity material.
#[async_trait]
pub trait KeyStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Durable by the time this returns.
    async fn set(&self, key: &str, value: &[u8]) -> Result<()>;

    async fn delete(&self, key: &str) -> Result<()>;

    async fn keys(&self) -> Result<Vec<String>>;

    async fn clear(&self) -> Result<()>;

    /// Single-flush optimization for writing several entries together; the
    /// default implementation just writes them one at a time. The
    /// custodian uses this when sealing an identity so the four fields are
    /// written as a single batch where the backend supports it.
    async fn set_many(&self, entries: &[(&str, &[u8])]) -> Result<()> {
        for (key, value) in entries {
            self.set(key, value).await?;
        }
        Ok(())
    }
}
