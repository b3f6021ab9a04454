//! Error types for the hubauth-store crate.

use thiserror::Error;

/// Record store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Failed to connect to the backing store.
    #[error("cannot connect to store: {0}")]
    Connect(#[source] mongodb::error::Error),

    /// The transaction's session could not be opened.
    ///
    /// Captured at transaction creation and returned by every operation
    /// on that transaction.
    #[error("cannot open store session: {0}")]
    Session(#[source] mongodb::error::Error),

    /// A query against the store failed.
    #[error("store query failed: {0}")]
    Query(#[source] mongodb::error::Error),

    /// A stored document could not be decoded into a device record.
    #[error("cannot decode stored record: {0}")]
    Decode(String),

    /// No record matched the given keys.
    #[error("record not found")]
    NotFound,
}

impl StoreError {
    /// Classify a driver error raised while reading, separating decode
    /// failures from transport/query failures.
    pub(crate) fn from_read(err: mongodb::error::Error) -> Self {
        match *err.kind {
            mongodb::error::ErrorKind::BsonDeserialization(ref e) => {
                StoreError::Decode(e.to_string())
            }
            _ => StoreError::Query(err),
        }
    }
}
