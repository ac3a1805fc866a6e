//! Encrypted mirror of the whitelisted state subtree.
//!
//! After every dispatch the `auth` slice is JSON serialized, sealed with
//! AES-256-GCM and written under `persist:root`, replacing whatever was
//! there. At startup the blob is read back and merged before anything
//! else touches the store. Any failure on the way back in means "start
//! empty"; it is logged and never surfaced.

use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{AuthState, RootState, Store, SubscriptionId};
use crate::crypto::{decrypt_blob, encrypt_blob, BlobError, PersistKey};
use crate::storage::{KeyValueStorage, StorageError};

/// Durable storage key of the encrypted blob.
pub const PERSIST_KEY: &str = "persist:root";

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("Persisted state storage failed: {0}")]
    Storage(#[from] StorageError),
    #[error("Persisted state unreadable: {0}")]
    Blob(#[from] BlobError),
}

/// The whitelisted subtree. Only `auth` survives a restart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    pub auth: AuthState,
}

impl PersistedState {
    pub fn from_root(state: &RootState) -> Self {
        Self {
            auth: state.auth.clone(),
        }
    }
}

pub struct Persistor {
    storage: Arc<dyn KeyValueStorage>,
    key: PersistKey,
    /// Last subtree written, to skip rewriting an unchanged blob.
    last_written: Mutex<Option<PersistedState>>,
}

impl Persistor {
    pub fn new(storage: Arc<dyn KeyValueStorage>, key: PersistKey) -> Self {
        Self {
            storage,
            key,
            last_written: Mutex::new(None),
        }
    }

    /// Read and decrypt the stored blob.
    ///
    /// `Ok(None)` when nothing is stored.
    pub fn load(&self) -> Result<Option<PersistedState>, PersistError> {
        match self.storage.get_item(PERSIST_KEY)? {
            Some(text) => Ok(Some(decrypt_blob(&text, &self.key)?)),
            None => Ok(None),
        }
    }

    /// Startup variant of `load`: failures degrade to "nothing stored".
    pub fn rehydrate(&self) -> Option<PersistedState> {
        match self.load() {
            Ok(Some(state)) => {
                log::info!("Rehydrated persisted session state");
                *self.last_written.lock().unwrap_or_else(PoisonError::into_inner) =
                    Some(state.clone());
                Some(state)
            }
            Ok(None) => None,
            Err(e) => {
                log::warn!("Discarding persisted state, starting empty: {}", e);
                None
            }
        }
    }

    /// Seal and write the whitelisted subtree of `state`.
    pub fn save(&self, state: &RootState) -> Result<(), PersistError> {
        let subtree = PersistedState::from_root(state);
        let mut last = self
            .last_written
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if last.as_ref() == Some(&subtree) {
            return Ok(());
        }

        let text = encrypt_blob(&subtree, &self.key)?;
        self.storage.set_item(PERSIST_KEY, &text)?;
        *last = Some(subtree);
        Ok(())
    }

    /// Remove the stored blob.
    pub fn purge(&self) {
        if let Err(e) = self.storage.remove_item(PERSIST_KEY) {
            log::error!("Failed to purge persisted state: {}", e);
        }
        *self
            .last_written
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Register as a store subscriber so every dispatch is mirrored.
    pub fn attach(self: &Arc<Self>, store: &Store) -> SubscriptionId {
        let persistor = Arc::clone(self);
        store.subscribe(move |state| {
            if let Err(e) = persistor.save(state) {
                log::error!("Failed to persist session state: {}", e);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::{AuthResponse, MenuItem};
    use crate::store::{Action, AuthAction, GlobalAction};
    use crate::storage::MemoryStorage;

    fn key(secret: &str) -> PersistKey {
        PersistKey::derive(secret).unwrap()
    }

    fn logged_in() -> AuthAction {
        AuthAction::LoginFulfilled(AuthResponse {
            token_type: "bearer".into(),
            expires_in: 3600,
            role: "admin".into(),
            access_token: Some("abc123".into()),
            menus: vec![MenuItem {
                key: "inventory".into(),
                icon: "IconFolderOpen".into(),
                label: "Inventory".into(),
                children: Some(vec![MenuItem {
                    key: "inventories".into(),
                    icon: String::new(),
                    label: "Inventories".into(),
                    children: None,
                }]),
            }],
        })
    }

    #[test]
    fn test_dispatch_writes_encrypted_blob() {
        let storage = Arc::new(MemoryStorage::new());
        let persistor = Arc::new(Persistor::new(storage.clone(), key("s")));
        let store = Store::new();
        persistor.attach(&store);

        store.dispatch(Action::Auth(logged_in()));

        let blob = storage.get_item(PERSIST_KEY).unwrap().unwrap();
        assert!(!blob.contains("abc123"));
        let loaded = persistor.load().unwrap().unwrap();
        assert_eq!(loaded.auth, store.get_state().auth);
    }

    #[test]
    fn test_round_trip_into_fresh_store() {
        let storage = Arc::new(MemoryStorage::new());
        {
            let persistor = Arc::new(Persistor::new(storage.clone(), key("s")));
            let store = Store::new();
            persistor.attach(&store);
            store.dispatch(Action::Auth(logged_in()));
            store.dispatch(Action::Global(GlobalAction::ToggleSider));
        }

        let persistor = Persistor::new(storage, key("s"));
        let store = Store::new();
        let persisted = persistor.rehydrate().unwrap();
        store.dispatch(Action::Rehydrate(persisted));

        let state = store.get_state();
        assert_eq!(state.auth.token.as_deref(), Some("abc123"));
        let menus = &state.auth.user.as_ref().unwrap().menus;
        assert_eq!(menus[0].children.as_ref().map(Vec::len), Some(1));
        // non-whitelisted slices reset
        assert!(!state.global.sider_collapsed);
    }

    #[test]
    fn test_wrong_key_rehydrates_empty() {
        let storage = Arc::new(MemoryStorage::new());
        let writer = Arc::new(Persistor::new(storage.clone(), key("old")));
        let store = Store::new();
        writer.attach(&store);
        store.dispatch(Action::Auth(logged_in()));

        let reader = Persistor::new(storage, key("rotated"));
        assert!(reader.load().is_err());
        assert!(reader.rehydrate().is_none());
    }

    #[test]
    fn test_corrupt_blob_rehydrates_empty() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set_item(PERSIST_KEY, "bm90IGEgYmxvYg==").unwrap();
        let persistor = Persistor::new(storage, key("s"));
        assert!(persistor.rehydrate().is_none());
    }

    #[test]
    fn test_unchanged_subtree_not_rewritten() {
        let storage = Arc::new(MemoryStorage::new());
        let persistor = Arc::new(Persistor::new(storage.clone(), key("s")));
        let store = Store::new();
        persistor.attach(&store);

        store.dispatch(Action::Auth(logged_in()));
        let first = storage.get_item(PERSIST_KEY).unwrap();
        store.dispatch(Action::Global(GlobalAction::ToggleSider));
        let second = storage.get_item(PERSIST_KEY).unwrap();
        // a rewrite would use a fresh IV and change the text
        assert_eq!(first, second);
    }

    #[test]
    fn test_purge() {
        let storage = Arc::new(MemoryStorage::new());
        let persistor = Arc::new(Persistor::new(storage.clone(), key("s")));
        let store = Store::new();
        persistor.attach(&store);
        store.dispatch(Action::Auth(logged_in()));

        persistor.purge();
        assert!(storage.get_item(PERSIST_KEY).unwrap().is_none());
        assert!(persistor.rehydrate().is_none());
    }
}
