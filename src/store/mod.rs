//! Explicit state container for the admin client.
//!
//! `Store` owns the whole `RootState` tree. State changes only through
//! `dispatch`, which runs the reducer and then every subscriber with a
//! snapshot of the new state. Async operations (login, list fetches,
//! CRUD calls) live beside each slice and dispatch pending / loaded /
//! rejected actions around their API call.

pub mod auth;
pub mod dashboard;
pub mod global;
pub mod persist;
pub mod resource;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use crate::api::types::{Borrowing, Category, Inventory, Location, Supplier};

pub use auth::{AuthAction, AuthState, SessionStatus, UserData};
pub use dashboard::{DashboardAction, DashboardState};
pub use global::{GlobalAction, GlobalState, Loadable};
pub use persist::{PersistError, PersistedState, Persistor, PERSIST_KEY};
pub use resource::{ListOutcome, Resource, ResourceAction, ResourceState};

/// Every slice of client state.
#[derive(Debug, Clone, Default)]
pub struct RootState {
    pub auth: AuthState,
    pub global: GlobalState,
    pub dashboard: DashboardState,
    pub category: ResourceState<Category>,
    pub location: ResourceState<Location>,
    pub supplier: ResourceState<Supplier>,
    pub inventory: ResourceState<Inventory>,
    pub borrowing: ResourceState<Borrowing>,
}

/// Everything that can change `RootState`.
#[derive(Debug, Clone)]
pub enum Action {
    /// Merge the persisted subtree read at startup.
    Rehydrate(PersistedState),
    Auth(AuthAction),
    Global(GlobalAction),
    Dashboard(DashboardAction),
    Category(ResourceAction<Category>),
    Location(ResourceAction<Location>),
    Supplier(ResourceAction<Supplier>),
    Inventory(ResourceAction<Inventory>),
    Borrowing(ResourceAction<Borrowing>),
}

impl RootState {
    fn reduce(&mut self, action: Action) {
        match action {
            Action::Rehydrate(persisted) => self.auth = persisted.auth.rehydrated(),
            Action::Auth(a) => self.auth.reduce(a),
            Action::Global(a) => self.global.reduce(a),
            Action::Dashboard(a) => self.dashboard.reduce(a),
            Action::Category(a) => self.category.reduce(a),
            Action::Location(a) => self.location.reduce(a),
            Action::Supplier(a) => self.supplier.reduce(a),
            Action::Inventory(a) => self.inventory.reduce(a),
            Action::Borrowing(a) => self.borrowing.reduce(a),
        }
    }
}

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

pub type Subscriber = Arc<dyn Fn(&RootState) + Send + Sync>;

pub struct Store {
    state: RwLock<RootState>,
    subscribers: RwLock<Vec<(SubscriptionId, Subscriber)>>,
    next_subscription: AtomicU64,
    next_generation: AtomicU64,
}

impl Store {
    pub fn new() -> Self {
        Self::with_state(RootState::default())
    }

    pub fn with_state(state: RootState) -> Self {
        Self {
            state: RwLock::new(state),
            subscribers: RwLock::new(Vec::new()),
            next_subscription: AtomicU64::new(1),
            next_generation: AtomicU64::new(1),
        }
    }

    /// Snapshot of the whole tree.
    pub fn get_state(&self) -> RootState {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Read part of the tree without cloning all of it.
    pub fn select<R>(&self, f: impl FnOnce(&RootState) -> R) -> R {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        f(&state)
    }

    /// Apply `action`, then notify subscribers in registration order.
    ///
    /// Subscribers receive a snapshot taken after the write lock is
    /// released, so they may dispatch themselves.
    pub fn dispatch(&self, action: Action) {
        log::trace!("dispatch {:?}", action);
        let snapshot = {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            state.reduce(action);
            state.clone()
        };

        let subscribers: Vec<Subscriber> = self
            .subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, s)| Arc::clone(s))
            .collect();
        for subscriber in subscribers {
            subscriber(&snapshot);
        }
    }

    pub fn subscribe(
        &self,
        subscriber: impl Fn(&RootState) + Send + Sync + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed));
        self.subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(subscriber)));
        id
    }

    /// Returns `false` if `id` was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self
            .subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let before = subscribers.len();
        subscribers.retain(|(sid, _)| *sid != id);
        subscribers.len() != before
    }

    /// Allocate a list request generation. Strictly increasing per store.
    pub fn next_generation(&self) -> u64 {
        self.next_generation.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_subscribers_run_after_each_dispatch() {
        let store = Store::new();
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = seen.clone();
        store.subscribe(move |state| {
            assert!(state.auth.is_error);
            counter.fetch_add(1, Ordering::SeqCst);
        });

        store.dispatch(Action::Auth(AuthAction::LoginRejected));
        store.dispatch(Action::Auth(AuthAction::LoginRejected));
        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_unsubscribe() {
        let store = Store::new();
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = seen.clone();
        let id = store.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        store.dispatch(Action::Auth(AuthAction::ClearError));
        assert!(store.unsubscribe(id));
        assert!(!store.unsubscribe(id));
        store.dispatch(Action::Auth(AuthAction::ClearError));
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_subscriber_may_dispatch() {
        let store = Arc::new(Store::new());
        let inner = Arc::downgrade(&store);
        store.subscribe(move |state| {
            if state.auth.is_error {
                if let Some(store) = inner.upgrade() {
                    store.dispatch(Action::Auth(AuthAction::ClearError));
                }
            }
        });

        store.dispatch(Action::Auth(AuthAction::LoginRejected));
        assert!(!store.get_state().auth.is_error);
    }

    #[test]
    fn test_generations_increase() {
        let store = Store::new();
        let a = store.next_generation();
        let b = store.next_generation();
        assert!(b > a);
    }

    #[test]
    fn test_select_reads_without_full_clone() {
        let store = Store::new();
        store.dispatch(Action::Global(GlobalAction::ToggleSider));
        assert!(store.select(|s| s.global.sider_collapsed));
    }
}
