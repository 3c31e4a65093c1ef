// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Both KeyStore backends must satisfy the same contract: the custodian
//! must not depend on implementation-specific behavior.

use fabric_credentials::keystore::KeyStore;
use fabric_credentials::{CredentialsConfig, FileKeyStore, SqliteKeyStore};

async fn exercise_contract(store: &dyn KeyStore) {
    assert_eq!(store.get("absent").await.unwrap(), None);

    let value = vec![0u8, 1, 2, 0xff, 0x80];
    store.set("k1", &value).await.unwrap();
    assert_eq!(store.get("k1").await.unwrap(), Some(value.clone()));

    // Overwrite is atomic per key: never a partial value.
    store.set("k1", b"overwritten").await.unwrap();
    assert_eq!(store.get("k1").await.unwrap(), Some(b"overwritten".to_vec()));

    store.set("k2", b"another").await.unwrap();
    let mut keys = store.keys().await.unwrap();
    keys.sort();
    assert_eq!(keys, vec!["k1".to_string(), "k2".to_string()]);

    store.delete("k1").await.unwrap();
    assert_eq!(store.get("k1").await.unwrap(), None);

    store.clear().await.unwrap();
    assert!(store.keys().await.unwrap().is_empty());
}

#[tokio::test]
async fn file_keystore_satisfies_the_contract() {
    let dir = tempfile::tempdir().unwrap();
    let config = CredentialsConfig { storage_path: Some(dir.path().to_path_buf()), ..Default::default() };
    let store = FileKeyStore::open(&config).await.unwrap();
    exercise_contract(&store).await;
}

#[tokio::test]
async fn sqlite_keystore_satisfies_the_contract() {
    let dir = tempfile::tempdir().unwrap();
    let config = CredentialsConfig { storage_path: Some(dir.path().to_path_buf()), ..Default::default() };
    let store = SqliteKeyStore::open(&config).await.unwrap();
    exercise_contract(&store).await;
}
