//! # hubauth-store
//!
//! Transactional record store for authorized devices.
//!
//! The store keeps one document per device, keyed by device id, and exposes
//! all mutations through short-lived [`Transaction`] values. A transaction
//! wraps a single session against the backing store; dropping it releases
//! the session on every exit path, so callers never branch on acquisition
//! failure: a transaction whose session could not be opened keeps the
//! error and returns it from every operation.
//!
//! Two implementations are provided:
//!
//! - [`DeviceStore`]: MongoDB-backed, used in production.
//! - [`mem::MemStore`]: in-memory, used by tests and local development.

pub mod error;
pub mod mem;
pub mod mongo;
pub mod record;

use async_trait::async_trait;
use futures::stream::BoxStream;

pub use error::StoreError;
pub use mongo::{DeviceStore, StoreConfig};
pub use record::DeviceRecord;

/// Lazy, forward-only sequence of device records.
///
/// Errors (including decode failures) surface as `Err` items once the
/// stream is driven, never at call time.
pub type RecordStream = BoxStream<'static, Result<DeviceRecord, StoreError>>;

/// A store of authorized-device records.
#[async_trait]
pub trait Store: Send + Sync {
    /// Open a new transaction.
    ///
    /// Never fails: a session-acquisition error is captured inside the
    /// returned transaction and reported by its operations.
    async fn new_transaction(&self) -> Box<dyn Transaction>;
}

/// A single logical session against the record store.
///
/// `persist` and `delete` are each a single acknowledged write; the
/// transaction provides session scoping and single-statement atomicity
/// only. Two `persist` calls on one transaction are not atomic together.
/// The session is released when the transaction is dropped.
#[async_trait]
pub trait Transaction: Send {
    /// Point lookup filtered by both device id and owner.
    ///
    /// Returns `Ok(None)` when no record matches.
    async fn retrieve(
        &mut self,
        device_id: &str,
        owner: &str,
    ) -> Result<Option<DeviceRecord>, StoreError>;

    /// Point lookup by device id only, used to detect cross-owner
    /// conflicts before an owner is confirmed.
    async fn retrieve_by_device(
        &mut self,
        device_id: &str,
    ) -> Result<Option<DeviceRecord>, StoreError>;

    /// Scan records for one owner, or for all owners when `owner` is
    /// `None`.
    async fn retrieve_all(&mut self, owner: Option<&str>) -> RecordStream;

    /// Upsert the record keyed by its device id.
    async fn persist(&mut self, record: &DeviceRecord) -> Result<(), StoreError>;

    /// Remove the record matching both keys.
    ///
    /// Fails with [`StoreError::NotFound`] when no record matched.
    async fn delete(&mut self, device_id: &str, owner: &str) -> Result<(), StoreError>;
}
