// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Local-file JSON KeyStore backend: one file per key, written via
//! write-temp-and-rename with owner-only (0600) permissions under a
//! directory with owner-only (0700) permissions.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD};
use tokio::fs as async_fs;
use tokio::sync::Mutex as AsyncMutex;

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

use crate::config::CredentialsConfig;
use crate::error::Result;
use crate::keystore::KeyStore;

/// Persists each key as its own base64-encoded JSON file under `keys_dir`.
///
/// Concurrent writers to the *same* key serialize around a per-key
/// `tokio::sync::Mutex` so that two `set()` calls never race on the same
/// `key.tmp` temp path; writers to distinct keys proceed independently.
pub struct FileKeyStore {
    keys_dir: PathBuf,
    key_locks: StdMutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl FileKeyStore {
    pub async fn open(config: &CredentialsConfig) -> Result<Self> {
        let keys_dir = config.keys_dir()?;
        ensure_dir_with_permissions(&keys_dir, 0o700).await?;
        Ok(Self { keys_dir, key_locks: StdMutex::new(HashMap::new()) })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.keys_dir.join(format!("{key}.json"))
    }

    fn lock_for(&self, key: &str) -> Arc<AsyncMutex<()>> {
        let mut locks = self.key_locks.lock().unwrap();
        locks.entry(key.to_string()).or_insert_with(|| Arc::new(AsyncMutex::new(()))).clone()
    }
}

async fn ensure_dir_with_permissions(path: &Path, mode: u32) -> Result<()> {
    if !path.exists() {
        async_fs::create_dir_all(path).await?;
    }

    #[cfg(unix)]
    {
        let metadata = async_fs::metadata(path).await?;
        let mut permissions = metadata.permissions();
        permissions.set_mode(mode);
        async_fs::set_permissions(path, permissions).await?;
    }
    #[cfg(not(unix))]
    {
        let _ = mode;
    }

    Ok(())
}

async fn write_atomically(path: &Path, contents: &[u8]) -> Result<()> {
    let temp_path = path.with_extension("tmp");
    async_fs::write(&temp_path, contents).await?;

    #[cfg(unix)]
    {
        let metadata = async_fs::metadata(&temp_path).await?;
        let mut permissions = metadata.permissions();
        permissions.set_mode(0o600);
        async_fs::set_permissions(&temp_path, permissions).await?;
    }

    async_fs::rename(&temp_path, path).await?;
    Ok(())
}

#[async_trait]
impl KeyStore for FileKeyStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        let encoded = async_fs::read_to_string(&path).await?;
        let decoded = STANDARD
            .decode(encoded.trim())
            .map_err(|e| crate::error::Error::StoreCorrupt(format!("{key}: {e}")))?;
        Ok(Some(decoded))
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        let lock = self.lock_for(key);
        let _guard = lock.lock().await;
        let path = self.path_for(key);
        write_atomically(&path, STANDARD.encode(value).as_bytes()).await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let lock = self.lock_for(key);
        let _guard = lock.lock().await;
        let path = self.path_for(key);
        if path.exists() {
            async_fs::remove_file(&path).await?;
        }
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>> {
        let mut out = Vec::new();
        let mut entries = async_fs::read_dir(&self.keys_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            if let Some(name) = entry.path().file_stem().and_then(|s| s.to_str()) {
                out.push(name.to_string());
            }
        }
        Ok(out)
    }

    async fn clear(&self) -> Result<()> {
        for key in self.keys().await? {
            self.delete(&key).await?;
        }
        Ok(())
    }
}
