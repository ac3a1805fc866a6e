//! Crypto primitives for sealing persisted client state.

pub mod aes;
pub mod blob;
pub mod kdf;
pub mod utils;

pub use aes::{seal_aes_gcm, unseal_aes_gcm, AesError};
pub use blob::{decrypt_blob, encrypt_blob, BlobError};
pub use kdf::{KdfError, PersistKey};
