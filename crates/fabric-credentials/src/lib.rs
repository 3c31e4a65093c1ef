// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Identity custodian for a Fabric client: seals and unseals an ECDSA-P256
//! signing key behind an opaque handle, and signs on the key's behalf
//! without ever letting it leave the custodian.

pub mod config;
pub mod crypto;
pub mod custodian;
pub mod error;
pub mod keystore;
pub mod mnemonic;
pub mod shamir;
pub mod signer;
pub mod strength;
pub mod types;

pub use config::{CredentialsConfig, StoreBackend};
pub use custodian::Custodian;
pub use error::{Error, Result};
pub use keystore::{FileKeyStore, KeyStore, SqliteKeyStore};
pub use types::{AppIdentity, CreatedIdentity, SealedIdentity, SignCapability};
