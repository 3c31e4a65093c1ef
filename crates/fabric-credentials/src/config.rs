// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Storage location configuration for the identity custodian.

use std::path::PathBuf;

use crate::error::{Error, Result};

/// Which KeyStore backend the custodian persists sealed identities through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreBackend {
    /// A local-file JSON store, one file per key under a directory with
    /// owner-only permissions.
    #[default]
    File,
    /// An embedded SQLite database, standing in for a browser-local
    /// key-value store.
    Sqlite,
}

/// Where the custodian looks for and writes sealed identity material.
#[derive(Debug, Clone)]
pub struct CredentialsConfig {
    /// Explicit storage directory override.
    pub storage_path: Option<PathBuf>,
    /// Override for the base environment variable used for path resolution
    /// (tests use this to avoid process-wide environment mutation).
    pub home_override: Option<PathBuf>,
    /// Which backend `open_keystore` should construct.
    pub backend: StoreBackend,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            storage_path: None,
            home_override: None,
            backend: StoreBackend::default(),
        }
    }
}

impl CredentialsConfig {
    /// Resolve the directory sealed identity material is stored under.
    ///
    /// Precedence: explicit `storage_path` > `FABRIC_CREDENTIALS_HOME` (or
    /// its test override) > `dirs::config_dir()`.
    pub fn storage_dir(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.storage_path {
            return Ok(custom_path.clone());
        }

        if let Some(home_override) = &self.home_override {
            return Ok(home_override.join("credentials"));
        }
        if let Ok(home) = std::env::var("FABRIC_CREDENTIALS_HOME") {
            return Ok(PathBuf::from(home).join("credentials"));
        }

        let base_dir = dirs::config_dir()
            .ok_or_else(|| Error::Config("could not determine config directory".to_string()))?;
        Ok(base_dir.join("fabric-client").join("credentials"))
    }

    /// Directory sealed per-key JSON files live under (`FileKeyStore`).
    pub fn keys_dir(&self) -> Result<PathBuf> {
        Ok(self.storage_dir()?.join("keys"))
    }

    /// Path to the embedded database file (`SqliteKeyStore`).
    pub fn sqlite_path(&self) -> Result<PathBuf> {
        Ok(self.storage_dir()?.join("identity.sqlite3"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_storage_path_wins() {
        let config = CredentialsConfig {
            storage_path: Some(PathBuf::from("/custom/path")),
            ..Default::default()
        };
        assert_eq!(config.storage_dir().unwrap(), PathBuf::from("/custom/path"));
    }

    #[test]
    fn home_override_is_used_when_no_explicit_path() {
        let config = CredentialsConfig {
            home_override: Some(PathBuf::from("/home/override")),
            ..Default::default()
        };
        assert_eq!(
            config.storage_dir().unwrap(),
            PathBuf::from("/home/override/credentials")
        );
    }

    #[test]
    fn keys_dir_and_sqlite_path_nest_under_storage_dir() {
        let config = CredentialsConfig {
            storage_path: Some(PathBuf::from("/custom/path")),
            ..Default::default()
        };
        assert_eq!(config.keys_dir().unwrap(), PathBuf::from("/custom/path/keys"));
        assert_eq!(
            config.sqlite_path().unwrap(),
            PathBuf::from("/custom/path/identity.sqlite3")
        );
    }
}
