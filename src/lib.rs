//! Inventaris admin client.
//!
//! Library behind the `inventaris` CLI: an authenticated request client
//! for the inventory-management REST API, a state container with one
//! slice per resource, and an encrypted durable mirror of the session.

pub mod api;
pub mod config;
pub mod crypto;
pub mod notify;
pub mod state;
pub mod storage;
pub mod store;

pub use api::{ApiClient, ApiError, Envelope, FailureKind, ListQuery};
pub use config::ClientConfig;
pub use notify::{LogNotifier, Notice, Notifier, Severity};
pub use state::AppState;
pub use store::{RootState, SessionStatus, Store};
