//! Application state for the Inventaris client.
//!
//! Ties the request client, the state container and its persistence
//! subscriber together. Every slice operation takes `&AppState`.

use std::sync::Arc;

use thiserror::Error;

use crate::api::client::ApiClient;
use crate::api::error::ApiError;
use crate::api::token::{StorageTokenStore, TokenStore};
use crate::config::{ClientConfig, TokenBackend};
use crate::crypto::{KdfError, PersistKey};
use crate::notify::Notifier;
use crate::storage::{FileStorage, KeyValueStorage, StorageError};
use crate::store::{Action, AuthAction, Persistor, SessionStatus, Store};

#[derive(Debug, Error)]
pub enum InitError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Key(#[from] KdfError),
    #[error("Keychain token backend requested but this build has no keychain support (macOS only)")]
    KeychainUnavailable,
}

pub struct AppState {
    /// HTTP client for Inventaris API communication.
    pub api: Arc<ApiClient>,
    pub store: Arc<Store>,
    pub persistor: Arc<Persistor>,
}

impl AppState {
    /// Build everything from configuration: open the data directory,
    /// pick the token backend, rehydrate the persisted session.
    pub fn bootstrap(
        config: &ClientConfig,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, InitError> {
        let storage: Arc<dyn KeyValueStorage> = Arc::new(FileStorage::open(&config.data_dir)?);
        log::debug!("Using data directory {}", config.data_dir.display());

        let tokens: Arc<dyn TokenStore> = match config.token_backend {
            TokenBackend::Storage => Arc::new(StorageTokenStore::new(storage.clone())),
            #[cfg(all(feature = "keychain", target_os = "macos"))]
            TokenBackend::Keychain => Arc::new(crate::api::auth::KeyringTokenStore::new(
                config.base_url.clone(),
            )),
            #[cfg(not(all(feature = "keychain", target_os = "macos")))]
            TokenBackend::Keychain => return Err(InitError::KeychainUnavailable),
        };

        let api = Arc::new(ApiClient::new(
            &config.base_url,
            tokens,
            notifier,
            config.timeout,
        ));
        let key = PersistKey::derive(&config.persist_secret)?;
        Ok(Self::assemble(api, storage, key))
    }

    /// Wire an already-built client to a fresh store backed by `storage`.
    ///
    /// The persisted subtree is merged before the persistence subscriber
    /// is attached, so startup never rewrites what it just read.
    pub fn assemble(
        api: Arc<ApiClient>,
        storage: Arc<dyn KeyValueStorage>,
        key: PersistKey,
    ) -> Self {
        let store = Arc::new(Store::new());
        let persistor = Arc::new(Persistor::new(storage, key));

        if let Some(persisted) = persistor.rehydrate() {
            store.dispatch(Action::Rehydrate(persisted));
        }
        persistor.attach(&store);

        Self {
            api,
            store,
            persistor,
        }
    }

    pub fn session(&self) -> SessionStatus {
        self.store.select(|s| s.auth.status())
    }

    /// Shared failure hook for slice operations: a 401 ends the session.
    ///
    /// The request client has already cleared the token and asked for the
    /// redirect; this brings the auth slice (and its durable mirror) along.
    pub fn handle_failure(&self, err: &ApiError) {
        if err.is_unauthorized() {
            log::info!("Session rejected by server, signing out");
            self.store.dispatch(Action::Auth(AuthAction::Logout));
        }
    }
}
