//! HKDF-SHA256 derivation of the state persistence key.
//!
//! The persisted auth slice is sealed under a key derived from a
//! configured secret rather than the secret itself, so rotating the
//! secret (or bumping the info string) invalidates old blobs cleanly.
//!
//! Derivation path:
//!   secret (UTF-8 bytes)
//!     -> HKDF-SHA256(salt="Inventaris-v1", info="inventaris-persist-root-v1")
//!     -> 32-byte AES-256 key

use hkdf::Hkdf;
use sha2::Sha256;
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::aes::AES_KEY_SIZE;

/// Common HKDF salt for all client derivations.
const HKDF_SALT: &[u8] = b"Inventaris-v1";

/// HKDF info for the persisted state key.
const PERSIST_HKDF_INFO: &[u8] = b"inventaris-persist-root-v1";

#[derive(Debug, Error)]
pub enum KdfError {
    #[error("Persistence secret must not be empty")]
    EmptySecret,
    #[error("HKDF derivation failed")]
    DerivationFailed,
}

/// AES-256 key used to seal persisted state. Wiped on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct PersistKey([u8; AES_KEY_SIZE]);

impl PersistKey {
    /// Derive the key from a configured secret.
    pub fn derive(secret: &str) -> Result<Self, KdfError> {
        if secret.is_empty() {
            return Err(KdfError::EmptySecret);
        }
        let hk = Hkdf::<Sha256>::new(Some(HKDF_SALT), secret.as_bytes());
        let mut okm = [0u8; AES_KEY_SIZE];
        hk.expand(PERSIST_HKDF_INFO, &mut okm)
            .map_err(|_| KdfError::DerivationFailed)?;
        Ok(Self(okm))
    }

    pub fn as_bytes(&self) -> &[u8; AES_KEY_SIZE] {
        &self.0
    }
}

impl std::fmt::Debug for PersistKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PersistKey(..)")
    }
}
