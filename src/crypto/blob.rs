//! Encrypted JSON blobs for durable storage.
//!
//! A value is JSON serialized, sealed with AES-256-GCM, and base64
//! encoded so it fits in a string-valued key-value store.
//! Stored text: base64( IV (12) || ciphertext || tag (16) ).

use base64::Engine;
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use zeroize::Zeroize;

use super::aes::{self, AesError};
use super::kdf::PersistKey;

#[derive(Debug, Error)]
pub enum BlobError {
    #[error("Encryption failed: {0}")]
    Cipher(#[from] AesError),
    #[error("Serialization failed: {0}")]
    Serialization(serde_json::Error),
    #[error("Deserialization failed: {0}")]
    Deserialization(serde_json::Error),
    #[error("Blob is not valid base64")]
    Encoding,
}

/// Serialize and seal `value`, returning base64 text.
pub fn encrypt_blob<T: Serialize>(value: &T, key: &PersistKey) -> Result<String, BlobError> {
    let mut json = serde_json::to_vec(value).map_err(BlobError::Serialization)?;
    let sealed = aes::seal_aes_gcm(&json, key.as_bytes());
    json.zeroize();
    Ok(base64::engine::general_purpose::STANDARD.encode(sealed?))
}

/// Decode, unseal and deserialize a blob produced by `encrypt_blob`.
pub fn decrypt_blob<T: DeserializeOwned>(text: &str, key: &PersistKey) -> Result<T, BlobError> {
    let sealed = base64::engine::general_purpose::STANDARD
        .decode(text.trim())
        .map_err(|_| BlobError::Encoding)?;
    let mut json = aes::unseal_aes_gcm(&sealed, key.as_bytes())?;
    let parsed = serde_json::from_slice(&json).map_err(BlobError::Deserialization);
    json.zeroize();
    parsed
}
