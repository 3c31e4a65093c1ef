// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! The identity custodian: owns the private key, performs all signing, and
//! mediates all persistence of sealed material.
//!
//! Exactly one password-based identity slot is active at a time. A
//! hardware slot is a thin overlay over the same sealed data (see
//! [`Custodian::create_hardware_identity`]).

use std::sync::Arc;

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD};
use p256::ecdsa::signature::DigestSigner;
use p256::ecdsa::{Signature, SigningKey};
use p256::pkcs8::DecodePrivateKey;
use sha2::Sha256;
use tokio::sync::Mutex;

use crate::crypto;
use crate::error::{Error, Result};
use crate::keystore::{KeyStore, keys};
use crate::mnemonic;
use crate::shamir;
use crate::strength;
use crate::types::{AppIdentity, CreatedIdentity, SealedIdentity, SignCapability};

enum Slot {
    Empty,
    Sealed,
    Unlocked { signing_key: SigningKey, cert_pem: String },
}

/// Owns the unlocked key and mediates every operation that touches it.
pub struct Custodian {
    store: Arc<dyn KeyStore>,
    slot: Mutex<Slot>,
}

impl Custodian {
    pub fn new(store: Arc<dyn KeyStore>) -> Arc<Self> {
        Arc::new(Self { store, slot: Mutex::new(Slot::Empty) })
    }

    /// Whether a complete sealed identity is present in the KeyStore,
    /// independent of whether it is currently unlocked in memory.
    pub async fn does_password_identity_exist(&self) -> Result<bool> {
        match self.try_load_sealed().await? {
            Some(_) => Ok(true),
            None => Ok(false),
        }
    }

    /// `createPasswordIdentity`: seal fresh key material under a password
    /// (or a freshly generated BIP-39 mnemonic), persist it, split the
    /// secret into Shamir shares, and hold the key unlocked in memory.
    pub async fn create_password_identity(
        self: &Arc<Self>,
        cert_pem: String,
        key_pem: String,
        password: Option<String>,
    ) -> Result<CreatedIdentity> {
        let (secret, recovery_phrase) = match password {
            Some(password) => {
                strength::validate_password(&password)?;
                (password, None)
            }
            None => {
                let phrase = mnemonic::generate_recovery_phrase()?;
                (phrase.clone(), Some(phrase))
            }
        };

        let signing_key = parse_signing_key(&key_pem)?;

        let salt = crypto::generate_salt();
        let iv = crypto::generate_iv();
        let ciphertext = crypto::encrypt_key_pem(key_pem.as_bytes(), &secret, &salt, &iv)?;

        self.store
            .set_many(&[
                (keys::ENCRYPTED_PRIVATE_KEY, ciphertext.as_slice()),
                (keys::USER_CERTIFICATE, cert_pem.as_bytes()),
                (keys::KEY_DERIVATION_SALT, salt.as_slice()),
                (keys::ENCRYPTION_IV, iv.as_slice()),
            ])
            .await?;

        let recovery_shares = shamir::split_secret(secret.as_bytes())?;

        {
            let mut slot = self.slot.lock().await;
            *slot = Slot::Unlocked { signing_key, cert_pem: cert_pem.clone() };
        }
        tracing::info!("password identity created and unlocked");

        Ok(CreatedIdentity {
            identity: self.issue_identity(cert_pem),
            recovery_phrase,
            recovery_shares,
        })
    }

    /// `unlockIdentity`: re-derive the KDF key from the stored salt,
    /// AEAD-decrypt the sealed key, and hold it unlocked. On authentication
    /// failure the slot is left untouched (still `Sealed`).
    pub async fn unlock_identity(self: &Arc<Self>, password: &str) -> Result<AppIdentity> {
        let sealed = self
            .try_load_sealed()
            .await?
            .ok_or_else(|| Error::InputInvalid("no sealed identity to unlock".to_string()))?;

        let key_pem_bytes =
            crypto::decrypt_key_pem(&sealed.encrypted_key_pem, password, &sealed.kdf_salt, &sealed.aead_iv)?;
        let key_pem = String::from_utf8(key_pem_bytes)
            .map_err(|e| Error::StoreCorrupt(format!("decrypted key is not valid UTF-8: {e}")))?;
        let signing_key = parse_signing_key(&key_pem)?;

        let mut slot = self.slot.lock().await;
        *slot = Slot::Unlocked { signing_key, cert_pem: sealed.certificate_pem.clone() };
        drop(slot);

        tracing::info!("identity unlocked");
        Ok(self.issue_identity(sealed.certificate_pem))
    }

    /// `importIdentity`: hold caller-supplied PEM material unlocked without
    /// touching the KeyStore.
    pub async fn import_identity(self: &Arc<Self>, cert_pem: String, key_pem: String) -> Result<AppIdentity> {
        let signing_key = parse_signing_key(&key_pem)?;
        let mut slot = self.slot.lock().await;
        *slot = Slot::Unlocked { signing_key, cert_pem: cert_pem.clone() };
        drop(slot);
        tracing::info!("identity imported");
        Ok(self.issue_identity(cert_pem))
    }

    /// Drop the in-memory key without touching sealed storage. Re-locking
    /// requires `unlockIdentity`; there is no auto-lock timer.
    pub async fn lock_identity(&self) -> Result<()> {
        let mut slot = self.slot.lock().await;
        if matches!(*slot, Slot::Unlocked { .. }) {
            *slot = Slot::Sealed;
        }
        Ok(())
    }

    /// `deleteIdentity`: zero the sealed record and drop the in-memory key.
    pub async fn delete_identity(&self) -> Result<()> {
        self.store.clear().await?;
        let mut slot = self.slot.lock().await;
        *slot = Slot::Empty;
        tracing::info!("identity deleted");
        Ok(())
    }

    /// `exportIdentity`: serialize `{label, msp_id, certificate,
    /// private_key_pem}` and AEAD-encrypt it under the given password. This
    /// is the only sanctioned path by which key material leaves the
    /// custodian in exportable form.
    pub async fn export_identity(&self, label: &str, msp_id: &str, password: &str) -> Result<String> {
        strength::validate_password(password)?;

        let sealed = self
            .try_load_sealed()
            .await?
            .ok_or_else(|| Error::InputInvalid("no sealed identity to export".to_string()))?;

        // Exporting re-derives the key under the sealed secret implicitly
        // trusted by the caller holding `password`: the custodian does not
        // know the original secret, so export re-seals under a fresh
        // derivation rather than re-using the stored envelope.
        let slot = self.slot.lock().await;
        let private_key_pem = match &*slot {
            Slot::Unlocked { signing_key, .. } => signing_key_to_pem(signing_key)?,
            _ => return Err(Error::NotUnlocked),
        };
        drop(slot);

        let payload = serde_json::json!({
            "label": label,
            "msp_id": msp_id,
            "certificate": sealed.certificate_pem,
            "private_key_pem": private_key_pem,
        });

        let salt = crypto::generate_salt();
        let iv = crypto::generate_iv();
        let ciphertext = crypto::encrypt_key_pem(
            serde_json::to_vec(&payload)?.as_slice(),
            password,
            &salt,
            &iv,
        )?;

        let envelope = serde_json::json!({
            "version": 1,
            "salt": STANDARD.encode(salt),
            "iv": STANDARD.encode(iv),
            "ciphertext": STANDARD.encode(ciphertext),
        });

        Ok(envelope.to_string())
    }

    /// `importExportedIdentity`: decrypt a blob produced by
    /// `exportIdentity`, validate it, and re-run the password-identity
    /// creation flow with the recovered material.
    pub async fn import_exported_identity(
        self: &Arc<Self>,
        blob: &str,
        password: &str,
    ) -> Result<CreatedIdentity> {
        let envelope: serde_json::Value = serde_json::from_str(blob)
            .map_err(|e| Error::InputInvalid(format!("malformed export blob: {e}")))?;

        let decode_b64 = |field: &str| -> Result<Vec<u8>> {
            let encoded = envelope
                .get(field)
                .and_then(|v| v.as_str())
                .ok_or_else(|| Error::InputInvalid(format!("export blob missing '{field}'")))?;
            STANDARD
                .decode(encoded)
                .map_err(|e| Error::InputInvalid(format!("export blob field '{field}' is not base64: {e}")))
        };

        let salt: [u8; 16] = decode_b64("salt")?
            .try_into()
            .map_err(|_| Error::InputInvalid("export blob salt is not 16 bytes".to_string()))?;
        let iv: [u8; 12] = decode_b64("iv")?
            .try_into()
            .map_err(|_| Error::InputInvalid("export blob iv is not 12 bytes".to_string()))?;
        let ciphertext = decode_b64("ciphertext")?;

        let plaintext = crypto::decrypt_key_pem(&ciphertext, password, &salt, &iv)?;
        let payload: serde_json::Value = serde_json::from_slice(&plaintext)
            .map_err(|e| Error::InputInvalid(format!("export payload is not valid JSON: {e}")))?;

        let certificate = payload
            .get("certificate")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::InputInvalid("export payload missing 'certificate'".to_string()))?
            .to_string();
        let private_key_pem = payload
            .get("private_key_pem")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::InputInvalid("export payload missing 'private_key_pem'".to_string()))?
            .to_string();

        self.create_password_identity(certificate, private_key_pem, Some(password.to_string()))
            .await
    }

    /// Thin hardware-slot overlay: store an attestation-credential id
    /// alongside the existing sealed password identity.
    pub async fn create_hardware_identity(&self, credential_id: &str) -> Result<()> {
        if self.try_load_sealed().await?.is_none() {
            return Err(Error::InputInvalid(
                "a password identity must exist before creating a hardware slot".to_string(),
            ));
        }
        self.store.set(keys::HARDWARE_CREDENTIAL_ID, credential_id.as_bytes()).await
    }

    /// Unseal the password slot using an attestation ceremony's output as
    /// the password. The ceremony itself is external.
    pub async fn unlock_with_hardware(self: &Arc<Self>, ceremony_output: &str) -> Result<AppIdentity> {
        self.unlock_identity(ceremony_output).await
    }

    /// `sign`: the custodian's only operation that touches the private
    /// key. Requires an unlocked slot; serialized by the slot's mutex.
    pub async fn sign(&self, message: &[u8]) -> Result<[u8; 64]> {
        let slot = self.slot.lock().await;
        match &*slot {
            Slot::Unlocked { signing_key, .. } => {
                let digest = Sha256::new_with_prefix(message);
                let signature: Signature = signing_key.sign_digest(digest);
                Ok(signature.to_bytes().into())
            }
            _ => Err(Error::NotUnlocked),
        }
    }

    fn issue_identity(self: &Arc<Self>, cert_pem: String) -> AppIdentity {
        AppIdentity::new(cert_pem, Arc::new(CustodianHandle(self.clone())))
    }

    async fn try_load_sealed(&self) -> Result<Option<SealedIdentity>> {
        let encrypted_key_pem = self.store.get(keys::ENCRYPTED_PRIVATE_KEY).await?;
        let certificate_pem = self.store.get(keys::USER_CERTIFICATE).await?;
        let kdf_salt = self.store.get(keys::KEY_DERIVATION_SALT).await?;
        let aead_iv = self.store.get(keys::ENCRYPTION_IV).await?;

        let present = [
            encrypted_key_pem.is_some(),
            certificate_pem.is_some(),
            kdf_salt.is_some(),
            aead_iv.is_some(),
        ];
        let present_count = present.iter().filter(|p| **p).count();

        if present_count == 0 {
            return Ok(None);
        }
        if present_count != present.len() {
            return Err(Error::StoreCorrupt(
                "sealed identity has some fields present and others missing".to_string(),
            ));
        }

        let certificate_pem = String::from_utf8(certificate_pem.unwrap())
            .map_err(|e| Error::StoreCorrupt(format!("certificate is not valid UTF-8: {e}")))?;
        let kdf_salt: [u8; 16] = kdf_salt
            .unwrap()
            .try_into()
            .map_err(|_| Error::StoreCorrupt("kdf salt is not 16 bytes".to_string()))?;
        let aead_iv: [u8; 12] = aead_iv
            .unwrap()
            .try_into()
            .map_err(|_| Error::StoreCorrupt("aead iv is not 12 bytes".to_string()))?;

        Ok(Some(SealedIdentity {
            encrypted_key_pem: encrypted_key_pem.unwrap(),
            certificate_pem,
            kdf_salt,
            aead_iv,
        }))
    }
}

struct CustodianHandle(Arc<Custodian>);

#[async_trait]
impl SignCapability for CustodianHandle {
    async fn sign(&self, message: &[u8]) -> Result<[u8; 64]> {
        self.0.sign(message).await
    }
}

fn parse_signing_key(key_pem: &str) -> Result<SigningKey> {
    SigningKey::from_pkcs8_pem(key_pem)
        .map_err(|e| Error::InputInvalid(format!("invalid PKCS#8 private key PEM: {e}")))
}

fn signing_key_to_pem(signing_key: &SigningKey) -> Result<String> {
    use p256::pkcs8::EncodePrivateKey;
    signing_key
        .to_pkcs8_pem(Default::default())
        .map(|pem| pem.to_string())
        .map_err(|e| Error::InputInvalid(format!("failed to re-encode private key: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keystore::FileKeyStore;
    use crate::config::CredentialsConfig;
    use p256::pkcs8::EncodePrivateKey;

    fn fresh_key_pem() -> String {
        let signing_key = SigningKey::random(&mut rand_core::OsRng);
        signing_key.to_pkcs8_pem(Default::default()).unwrap().to_string()
    }

    async fn custodian_in(dir: &std::path::Path) -> Arc<Custodian> {
        let config = CredentialsConfig { storage_path: Some(dir.to_path_buf()), ..Default::default() };
        let store = Arc::new(FileKeyStore::open(&config).await.unwrap());
        Custodian::new(store)
    }

    #[tokio::test]
    async fn seal_lifecycle_matches_the_literal_scenario() {
        let dir = tempfile::tempdir().unwrap();
        let custodian = custodian_in(dir.path()).await;

        assert!(!custodian.does_password_identity_exist().await.unwrap());

        let cert_pem = "-----BEGIN CERTIFICATE-----\nMIIB\n-----END CERTIFICATE-----\n".to_string();
        let key_pem = fresh_key_pem();
        custodian
            .clone()
            .create_password_identity(cert_pem.clone(), key_pem, Some("my-strong-password-123!".to_string()))
            .await
            .unwrap();

        assert!(custodian.does_password_identity_exist().await.unwrap());

        let identity = custodian.clone().unlock_identity("my-strong-password-123!").await.unwrap();
        assert_eq!(identity.cert_pem, cert_pem);

        custodian.delete_identity().await.unwrap();
        assert!(!custodian.does_password_identity_exist().await.unwrap());
    }

    #[tokio::test]
    async fn bad_password_leaves_state_sealed() {
        let dir = tempfile::tempdir().unwrap();
        let custodian = custodian_in(dir.path()).await;

        let cert_pem = "cert".to_string();
        let key_pem = fresh_key_pem();
        custodian
            .clone()
            .create_password_identity(cert_pem, key_pem, Some("password-a-is-strong-enough".to_string()))
            .await
            .unwrap();

        let result = custodian.clone().unlock_identity("password-b-is-strong-enough").await;
        assert!(matches!(result, Err(Error::BadPassword)));

        // The sealed record is still intact and unlockable with the right password.
        assert!(custodian.does_password_identity_exist().await.unwrap());
        assert!(custodian.clone().unlock_identity("password-a-is-strong-enough").await.is_ok());
    }

    #[tokio::test]
    async fn sign_requires_an_unlocked_key() {
        let dir = tempfile::tempdir().unwrap();
        let custodian = custodian_in(dir.path()).await;
        let result = custodian.sign(b"message").await;
        assert!(matches!(result, Err(Error::NotUnlocked)));
    }

    #[tokio::test]
    async fn lock_identity_clears_the_slot_without_touching_sealed_storage() {
        let dir = tempfile::tempdir().unwrap();
        let custodian = custodian_in(dir.path()).await;
        let key_pem = fresh_key_pem();
        custodian
            .clone()
            .create_password_identity("cert".to_string(), key_pem, Some("a-strong-enough-password-9".to_string()))
            .await
            .unwrap();

        custodian.lock_identity().await.unwrap();
        assert!(matches!(custodian.sign(b"x").await, Err(Error::NotUnlocked)));
        assert!(custodian.does_password_identity_exist().await.unwrap());
    }

    #[tokio::test]
    async fn create_password_identity_without_password_yields_a_recovery_phrase() {
        let dir = tempfile::tempdir().unwrap();
        let custodian = custodian_in(dir.path()).await;
        let key_pem = fresh_key_pem();
        let created = custodian
            .clone()
            .create_password_identity("cert".to_string(), key_pem, None)
            .await
            .unwrap();

        assert!(created.recovery_phrase.is_some());
        assert_eq!(created.recovery_shares.len(), 5);
    }
}
