//! Secure Storage Module
//!
//! Encrypted key/value files on disk. Each value is serialized to JSON and
//! sealed with XChaCha20-Poly1305 under a per-install key kept next to the data.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chacha20poly1305::aead::{Aead, AeadCore, KeyInit, OsRng};
use chacha20poly1305::{Key, XChaCha20Poly1305, XNonce};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

const KEY_FILE: &str = "storage.key";
const KEY_LEN: usize = 32;
const NONCE_LEN: usize = 24;

/// Secure storage using authenticated encryption
pub struct SecureStorage {
    storage_path: PathBuf,
}

impl SecureStorage {
    /// Create new secure storage rooted at `storage_path`
    pub fn new(storage_path: impl Into<PathBuf>) -> Self {
        let storage_path = storage_path.into();

        // Ensure directory exists
        if let Err(e) = std::fs::create_dir_all(&storage_path) {
            error!("Failed to create storage directory: {}", e);
        }

        debug!("Secure storage initialized at: {:?}", storage_path);

        Self { storage_path }
    }

    /// Save data encrypted
    pub fn save<T: Serialize>(&self, key: &str, data: &T) -> Result<(), StorageError> {
        let json = serde_json::to_string(data)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        let encrypted = self.encrypt(json.as_bytes())?;

        std::fs::write(self.file_path(key), encrypted)
            .map_err(|e| StorageError::Io(e.to_string()))?;

        info!("Saved encrypted data for key: {}", key);
        Ok(())
    }

    /// Load and decrypt data
    pub fn load<T: for<'de> Deserialize<'de>>(&self, key: &str) -> Result<T, StorageError> {
        let encrypted = match std::fs::read(self.file_path(key)) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StorageError::NotFound(key.to_string()))
            }
            Err(e) => return Err(StorageError::Io(e.to_string())),
        };

        let decrypted = self.decrypt(&encrypted)?;

        let json = String::from_utf8(decrypted)
            .map_err(|e| StorageError::Decryption(e.to_string()))?;

        serde_json::from_str(&json)
            .map_err(|e| StorageError::Serialization(e.to_string()))
    }

    /// Delete stored data
    pub fn delete(&self, key: &str) -> Result<(), StorageError> {
        let file_path = self.file_path(key);

        if file_path.exists() {
            std::fs::remove_file(&file_path)
                .map_err(|e| StorageError::Io(e.to_string()))?;
            info!("Deleted stored data for key: {}", key);
        }

        Ok(())
    }

    /// Check if key exists
    pub fn exists(&self, key: &str) -> bool {
        self.file_path(key).exists()
    }

    fn file_path(&self, key: &str) -> PathBuf {
        self.storage_path.join(format!("{}.dat", key))
    }

    /// Load the install key, creating it on first use
    fn cipher(&self) -> Result<XChaCha20Poly1305, StorageError> {
        let key_path = self.storage_path.join(KEY_FILE);

        let key = match std::fs::read(&key_path) {
            Ok(bytes) if bytes.len() == KEY_LEN => Key::clone_from_slice(&bytes),
            Ok(_) => return Err(StorageError::Encryption("storage key is corrupt".into())),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                let key = XChaCha20Poly1305::generate_key(&mut OsRng);
                write_private(&key_path, key.as_slice())?;
                info!("Generated new storage key");
                key
            }
            Err(e) => return Err(StorageError::Io(e.to_string())),
        };

        Ok(XChaCha20Poly1305::new(&key))
    }

    fn encrypt(&self, data: &[u8]) -> Result<Vec<u8>, StorageError> {
        let cipher = self.cipher()?;
        let nonce = XChaCha20Poly1305::generate_nonce(&mut OsRng);

        let sealed = cipher
            .encrypt(&nonce, data)
            .map_err(|_| StorageError::Encryption("encryption failed".into()))?;

        let mut out = Vec::with_capacity(NONCE_LEN + sealed.len());
        out.extend_from_slice(nonce.as_slice());
        out.extend_from_slice(&sealed);
        Ok(out)
    }

    fn decrypt(&self, data: &[u8]) -> Result<Vec<u8>, StorageError> {
        if data.len() < NONCE_LEN {
            return Err(StorageError::Decryption("ciphertext too short".into()));
        }
        let (nonce, sealed) = data.split_at(NONCE_LEN);

        self.cipher()?
            .decrypt(XNonce::from_slice(nonce), sealed)
            .map_err(|_| StorageError::Decryption("authentication failed".into()))
    }
}

#[cfg(unix)]
fn write_private(path: &Path, bytes: &[u8]) -> Result<(), StorageError> {
    use std::io::Write;
    use std::os::unix::fs::OpenOptionsExt;

    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
        .map_err(|e| StorageError::Io(e.to_string()))?;
    file.write_all(bytes)
        .map_err(|e| StorageError::Io(e.to_string()))
}

#[cfg(not(unix))]
fn write_private(path: &Path, bytes: &[u8]) -> Result<(), StorageError> {
    std::fs::write(path, bytes).map_err(|e| StorageError::Io(e.to_string()))
}

/// Storage errors
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("No stored data for key: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Encryption error: {0}")]
    Encryption(String),

    #[error("Decryption error: {0}")]
    Decryption(String),
}
