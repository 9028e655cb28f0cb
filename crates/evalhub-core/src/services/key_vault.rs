//! Encrypted API-key vault.
//!
//! Keys are stored as AES-256-GCM ciphertext plus nonce, both base64.
//! The cipher key is derived from a master secret (SHA-256), supplied by
//! the deployment environment - it never lives in the database.

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::domain::ApiKeyRecord;
use crate::secrets::ApiKey;

/// Errors from vault operations.
#[derive(Debug, Error)]
pub enum VaultError {
    /// Stored ciphertext or nonce is not valid base64 / wrong length.
    #[error("Invalid key record encoding: {0}")]
    Encoding(String),

    /// Authenticated decryption failed (wrong master key or corrupt row).
    #[error("API key decryption failed")]
    Decrypt,

    /// Encryption failed.
    #[error("API key encryption failed")]
    Encrypt,
}

impl From<VaultError> for crate::ports::CoreError {
    fn from(err: VaultError) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Encrypts and decrypts stored API keys.
pub struct KeyVault {
    cipher: Aes256Gcm,
}

impl KeyVault {
    /// Derive the vault cipher from a master secret.
    #[must_use]
    pub fn from_master_secret(secret: &str) -> Self {
        let digest = Sha256::digest(secret.as_bytes());
        let key = Key::<Aes256Gcm>::from_slice(&digest);
        Self {
            cipher: Aes256Gcm::new(key),
        }
    }

    /// Encrypt a plaintext key into a storable record.
    pub fn encrypt(&self, plaintext: &str) -> Result<ApiKeyRecord, VaultError> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|_| VaultError::Encrypt)?;

        Ok(ApiKeyRecord {
            encrypted_key: BASE64.encode(ciphertext),
            iv: BASE64.encode(nonce),
        })
    }

    /// Decrypt a stored record back into a usable key.
    pub fn decrypt(&self, record: &ApiKeyRecord) -> Result<ApiKey, VaultError> {
        let ciphertext = BASE64
            .decode(&record.encrypted_key)
            .map_err(|e| VaultError::Encoding(e.to_string()))?;
        let nonce_bytes = BASE64
            .decode(&record.iv)
            .map_err(|e| VaultError::Encoding(e.to_string()))?;

        if nonce_bytes.len() != 12 {
            return Err(VaultError::Encoding(format!(
                "nonce is {} bytes, expected 12",
                nonce_bytes.len()
            )));
        }

        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(&nonce_bytes), ciphertext.as_ref())
            .map_err(|_| VaultError::Decrypt)?;

        let plaintext =
            String::from_utf8(plaintext).map_err(|e| VaultError::Encoding(e.to_string()))?;
        Ok(ApiKey::new(plaintext))
    }
}
