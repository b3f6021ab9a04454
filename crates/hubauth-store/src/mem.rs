//! In-memory record store for tests and local development.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::StreamExt;

use crate::error::StoreError;
use crate::record::DeviceRecord;
use crate::{RecordStream, Store, Transaction};

/// In-memory store keyed by device id.
///
/// Cheap to clone; clones share the same records.
#[derive(Debug, Clone, Default)]
pub struct MemStore {
    records: Arc<Mutex<HashMap<String, DeviceRecord>>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.lock().expect("store lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl Store for MemStore {
    async fn new_transaction(&self) -> Box<dyn Transaction> {
        Box::new(MemTransaction {
            records: Arc::clone(&self.records),
        })
    }
}

struct MemTransaction {
    records: Arc<Mutex<HashMap<String, DeviceRecord>>>,
}

#[async_trait]
impl Transaction for MemTransaction {
    async fn retrieve(
        &mut self,
        device_id: &str,
        owner: &str,
    ) -> Result<Option<DeviceRecord>, StoreError> {
        let records = self.records.lock().expect("store lock poisoned");
        Ok(records
            .get(device_id)
            .filter(|r| r.owner == owner)
            .cloned())
    }

    async fn retrieve_by_device(
        &mut self,
        device_id: &str,
    ) -> Result<Option<DeviceRecord>, StoreError> {
        let records = self.records.lock().expect("store lock poisoned");
        Ok(records.get(device_id).cloned())
    }

    async fn retrieve_all(&mut self, owner: Option<&str>) -> RecordStream {
        let records = self.records.lock().expect("store lock poisoned");
        let mut matched: Vec<DeviceRecord> = records
            .values()
            .filter(|r| owner.map_or(true, |o| r.owner == o))
            .cloned()
            .collect();
        matched.sort_by(|a, b| a.device_id.cmp(&b.device_id));
        futures::stream::iter(matched.into_iter().map(Ok)).boxed()
    }

    async fn persist(&mut self, record: &DeviceRecord) -> Result<(), StoreError> {
        let mut records = self.records.lock().expect("store lock poisoned");
        records.insert(record.device_id.clone(), record.clone());
        Ok(())
    }

    async fn delete(&mut self, device_id: &str, owner: &str) -> Result<(), StoreError> {
        let mut records = self.records.lock().expect("store lock poisoned");
        match records.get(device_id) {
            Some(r) if r.owner == owner => {
                records.remove(device_id);
                Ok(())
            }
            _ => Err(StoreError::NotFound),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;

    #[tokio::test]
    async fn persist_is_an_upsert() {
        let store = MemStore::new();
        let mut tx = store.new_transaction().await;

        let mut record = DeviceRecord::unprovisioned("d1", "u1");
        tx.persist(&record).await.unwrap();
        record.access_token = "token".to_string();
        tx.persist(&record).await.unwrap();

        assert_eq!(store.len(), 1);
        let stored = tx.retrieve("d1", "u1").await.unwrap().unwrap();
        assert_eq!(stored.access_token, "token");
    }

    #[tokio::test]
    async fn retrieve_filters_by_both_keys() {
        let store = MemStore::new();
        let mut tx = store.new_transaction().await;
        tx.persist(&DeviceRecord::unprovisioned("d1", "u1"))
            .await
            .unwrap();

        assert!(tx.retrieve("d1", "u1").await.unwrap().is_some());
        assert!(tx.retrieve("d1", "other").await.unwrap().is_none());
        assert!(tx.retrieve("missing", "u1").await.unwrap().is_none());
        assert!(tx.retrieve_by_device("d1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn delete_reports_not_found() {
        let store = MemStore::new();
        let mut tx = store.new_transaction().await;
        tx.persist(&DeviceRecord::unprovisioned("d1", "u1"))
            .await
            .unwrap();

        assert!(matches!(
            tx.delete("d1", "other").await,
            Err(StoreError::NotFound)
        ));
        tx.delete("d1", "u1").await.unwrap();
        assert!(matches!(
            tx.delete("d1", "u1").await,
            Err(StoreError::NotFound)
        ));
    }

    #[tokio::test]
    async fn retrieve_all_scans_one_owner_or_everything() {
        let store = MemStore::new();
        let mut tx = store.new_transaction().await;
        for (device, owner) in [("d1", "u1"), ("d2", "u1"), ("d3", "u2")] {
            tx.persist(&DeviceRecord::unprovisioned(device, owner))
                .await
                .unwrap();
        }

        let mine: Vec<DeviceRecord> =
            tx.retrieve_all(Some("u1")).await.try_collect().await.unwrap();
        assert_eq!(mine.len(), 2);
        assert!(mine.iter().all(|r| r.owner == "u1"));

        let everyone: Vec<DeviceRecord> =
            tx.retrieve_all(None).await.try_collect().await.unwrap();
        assert_eq!(everyone.len(), 3);
    }
}
