//! API client module for the Inventaris admin client.
//!
//! Provides the HTTP client with bearer token injection, token storage
//! backends, the canonical route table, and request/response types
//! matching the Inventaris backend API.

#[cfg(all(feature = "keychain", target_os = "macos"))]
pub mod auth;
pub mod client;
pub mod error;
pub mod routes;
pub mod token;
pub mod types;

pub use client::{ApiClient, ApiRequest};
pub use error::{ApiError, FailureKind};
pub use token::{StorageTokenStore, TokenStore};
pub use types::{Envelope, ListQuery, Meta, PageInfo, Paged};
