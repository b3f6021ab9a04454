//! Lifecycle service error taxonomy.

use hubauth_store::StoreError;
use thiserror::Error;

/// Classification of a lifecycle failure, used by the transport layer to
/// pick a wire status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Malformed or missing identifiers.
    InvalidArgument,
    /// Token, ownership or expiry checks failed, or the provider rejected
    /// the exchange.
    Unauthenticated,
    /// The device is claimed by a different owner.
    PermissionDenied,
    /// The operation targets a record that does not exist.
    NotFound,
    /// Store, decode or other infrastructure failure.
    Internal,
}

/// Device-authorization lifecycle errors.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("store operation failed: {0}")]
    Store(#[source] StoreError),
}

impl AuthError {
    pub fn code(&self) -> ErrorCode {
        match self {
            AuthError::InvalidArgument(_) => ErrorCode::InvalidArgument,
            AuthError::Unauthenticated(_) => ErrorCode::Unauthenticated,
            AuthError::PermissionDenied(_) => ErrorCode::PermissionDenied,
            AuthError::NotFound(_) => ErrorCode::NotFound,
            AuthError::Internal(_) | AuthError::Store(_) => ErrorCode::Internal,
        }
    }
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            // A delete that matched nothing maps to the not-found
            // condition; everything else is an internal store failure.
            StoreError::NotFound => AuthError::NotFound("device not found".to_string()),
            other => AuthError::Store(other),
        }
    }
}
