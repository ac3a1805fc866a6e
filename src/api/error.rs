//! Normalized request failures.
//!
//! Every failure the request client produces is an `ApiError` whose
//! envelope has the same `{meta, data}` shape as a successful response,
//! with `success=false`.

use serde_json::Value;
use thiserror::Error;

use super::types::Envelope;

/// Status code reported when no HTTP response was received at all.
pub const TRANSPORT_FAILURE_CODE: u16 = 500;

/// Where in the error taxonomy a failure sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// No response reached the client (connect error, DNS, reset).
    Transport,
    /// 401: session is torn down and the user sent back to login.
    Unauthorized,
    /// 403.
    Forbidden,
    /// 500.
    Server,
    /// Any other non-2xx status: validation or business rule failure.
    Rejected,
    /// 2xx response whose body was not a valid envelope.
    Decode,
    /// Request body could not be serialized; nothing was sent.
    Encode,
}

impl FailureKind {
    /// Classify a non-success HTTP status.
    pub fn from_status(status: u16) -> Self {
        match status {
            401 => FailureKind::Unauthorized,
            403 => FailureKind::Forbidden,
            500 => FailureKind::Server,
            _ => FailureKind::Rejected,
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("API request failed ({}): {}", .envelope.meta.code, .envelope.meta.message)]
pub struct ApiError {
    pub kind: FailureKind,
    pub envelope: Envelope<Value>,
}

impl ApiError {
    pub fn new(kind: FailureKind, code: u16, message: impl Into<String>) -> Self {
        Self {
            kind,
            envelope: Envelope::failure(code, message),
        }
    }

    pub fn code(&self) -> u16 {
        self.envelope.meta.code
    }

    pub fn message(&self) -> &str {
        &self.envelope.meta.message
    }

    pub fn is_unauthorized(&self) -> bool {
        self.kind == FailureKind::Unauthorized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert_eq!(FailureKind::from_status(401), FailureKind::Unauthorized);
        assert_eq!(FailureKind::from_status(403), FailureKind::Forbidden);
        assert_eq!(FailureKind::from_status(500), FailureKind::Server);
        assert_eq!(FailureKind::from_status(404), FailureKind::Rejected);
        assert_eq!(FailureKind::from_status(422), FailureKind::Rejected);
        assert_eq!(FailureKind::from_status(502), FailureKind::Rejected);
    }

    #[test]
    fn test_envelope_shape() {
        let err = ApiError::new(FailureKind::Rejected, 422, "Nama wajib diisi");
        assert!(!err.envelope.meta.success);
        assert_eq!(err.code(), 422);
        assert!(err.envelope.data.is_none());
        assert_eq!(err.to_string(), "API request failed (422): Nama wajib diisi");
    }
}
