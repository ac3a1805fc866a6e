//! Bearer token persistence.
//!
//! A single durable value, read before every request. There is no expiry
//! handling on this side; the server signals expiry with a 401.

use std::sync::Arc;

use thiserror::Error;

use crate::storage::{KeyValueStorage, StorageError};

#[cfg(all(feature = "keychain", target_os = "macos"))]
use super::auth::KeychainError;

/// Storage key the token lives under.
pub const TOKEN_KEY: &str = "access_token";

#[derive(Debug, Error)]
pub enum TokenStoreError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[cfg(all(feature = "keychain", target_os = "macos"))]
    #[error(transparent)]
    Keychain(#[from] KeychainError),
}

pub trait TokenStore: Send + Sync {
    fn get(&self) -> Result<Option<String>, TokenStoreError>;
    fn set(&self, token: &str) -> Result<(), TokenStoreError>;
    fn clear(&self) -> Result<(), TokenStoreError>;
}

/// Token kept in durable key-value storage under `access_token`.
pub struct StorageTokenStore {
    storage: Arc<dyn KeyValueStorage>,
}

impl StorageTokenStore {
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self { storage }
    }
}

impl TokenStore for StorageTokenStore {
    fn get(&self) -> Result<Option<String>, TokenStoreError> {
        Ok(self
            .storage
            .get_item(TOKEN_KEY)?
            .filter(|token| !token.is_empty()))
    }

    fn set(&self, token: &str) -> Result<(), TokenStoreError> {
        Ok(self.storage.set_item(TOKEN_KEY, token)?)
    }

    fn clear(&self) -> Result<(), TokenStoreError> {
        Ok(self.storage.remove_item(TOKEN_KEY)?)
    }
}
