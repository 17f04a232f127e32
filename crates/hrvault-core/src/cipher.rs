//! At-rest encryption for locally stored files.
//!
//! Uses AES-256-GCM for authenticated encryption. The on-disk layout is
//! `nonce (12) ‖ tag (16) ‖ ciphertext`, so tampering with any byte fails
//! decryption.

use crate::AppError;
use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Key, Nonce,
};
use base64::{engine::general_purpose, Engine as _};

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// File-at-rest cipher for the local storage backend.
#[derive(Clone)]
pub struct FileCipher {
    cipher: Aes256Gcm,
}

impl FileCipher {
    /// Create a cipher from a raw 32-byte key (e.g. for tests).
    pub fn from_key_bytes(key_bytes: &[u8]) -> Result<Self, AppError> {
        if key_bytes.len() != 32 {
            return Err(AppError::Internal(
                "File encryption key must be 32 bytes (256 bits)".to_string(),
            ));
        }
        let key = Key::<Aes256Gcm>::from_slice(key_bytes);
        Ok(Self {
            cipher: Aes256Gcm::new(key),
        })
    }

    /// Create a cipher from a base64-encoded 32-byte key.
    pub fn from_base64(key_str: &str) -> Result<Self, AppError> {
        let key_bytes = general_purpose::STANDARD
            .decode(key_str)
            .map_err(|e| AppError::Internal(format!("Failed to decode encryption key: {}", e)))?;
        Self::from_key_bytes(&key_bytes)
    }

    /// Encrypt a buffer. Each call draws a fresh random 96-bit nonce.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, AppError> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext_and_tag = self
            .cipher
            .encrypt(&nonce, plaintext)
            .map_err(|e| AppError::Internal(format!("Encryption failed: {}", e)))?;

        // aes-gcm appends the tag; split it off so the stored layout is
        // nonce || tag || ciphertext
        let split = ciphertext_and_tag.len() - TAG_LEN;
        let mut out = Vec::with_capacity(NONCE_LEN + ciphertext_and_tag.len());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&ciphertext_and_tag[split..]);
        out.extend_from_slice(&ciphertext_and_tag[..split]);
        Ok(out)
    }

    /// Decrypt a buffer produced by [`encrypt`](Self::encrypt).
    pub fn decrypt(&self, data: &[u8]) -> Result<Vec<u8>, AppError> {
        if data.len() < NONCE_LEN + TAG_LEN {
            return Err(AppError::Internal("Encrypted data too short".to_string()));
        }

        let nonce = Nonce::from_slice(&data[..NONCE_LEN]);
        let tag = &data[NONCE_LEN..NONCE_LEN + TAG_LEN];
        let ciphertext = &data[NONCE_LEN + TAG_LEN..];

        let mut ciphertext_and_tag = Vec::with_capacity(ciphertext.len() + TAG_LEN);
        ciphertext_and_tag.extend_from_slice(ciphertext);
        ciphertext_and_tag.extend_from_slice(tag);

        self.cipher
            .decrypt(nonce, ciphertext_and_tag.as_slice())
            .map_err(|e| AppError::Internal(format!("Decryption failed: {}", e)))
    }
}
