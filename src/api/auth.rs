//! OS keychain backend for the bearer token.
//!
//! Uses the `keyring` crate so the token never touches the data directory.
//! Selected with `INVENTARIS_TOKEN_BACKEND=keychain`; built on macOS only.

use keyring::Entry;
use thiserror::Error;

use super::token::{TokenStore, TokenStoreError};

/// Keychain service name.
const SERVICE_NAME: &str = "id.my.sistem-inventaris.client";

#[derive(Debug, Error)]
pub enum KeychainError {
    #[error("Keychain operation failed: {0}")]
    OperationFailed(String),
}

impl From<keyring::Error> for KeychainError {
    fn from(err: keyring::Error) -> Self {
        KeychainError::OperationFailed(err.to_string())
    }
}

/// Token stored as a keychain password, one entry per API origin.
pub struct KeyringTokenStore {
    account: String,
}

impl KeyringTokenStore {
    /// `account` distinguishes tokens for different API origins.
    pub fn new(account: impl Into<String>) -> Self {
        Self {
            account: account.into(),
        }
    }

    fn entry(&self) -> Result<Entry, KeychainError> {
        Ok(Entry::new(SERVICE_NAME, &self.account)?)
    }
}

impl TokenStore for KeyringTokenStore {
    /// Returns `None` if no entry exists (never logged in, or logged out).
    fn get(&self) -> Result<Option<String>, TokenStoreError> {
        match self.entry()?.get_password() {
            Ok(token) => Ok(Some(token)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(KeychainError::from(e).into()),
        }
    }

    fn set(&self, token: &str) -> Result<(), TokenStoreError> {
        self.entry()?
            .set_password(token)
            .map_err(KeychainError::from)?;
        Ok(())
    }

    /// Idempotent: a missing entry is not an error.
    fn clear(&self) -> Result<(), TokenStoreError> {
        match self.entry()?.delete_credential() {
            Ok(()) => Ok(()),
            Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(KeychainError::from(e).into()),
        }
    }
}
