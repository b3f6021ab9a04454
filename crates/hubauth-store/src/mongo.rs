//! MongoDB-backed record store.

use async_trait::async_trait;
use futures::StreamExt;
use mongodb::bson::{doc, Document};
use mongodb::{Client, ClientSession, Collection, IndexModel};
use tracing::info;

use crate::error::StoreError;
use crate::record::DeviceRecord;
use crate::{RecordStream, Store, Transaction};

/// Collection holding one document per authorized device.
const COLLECTION: &str = "devices";

/// Connection settings for the MongoDB record store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// MongoDB connection string.
    pub uri: String,
    /// Database name.
    pub database: String,
}

/// MongoDB record store.
///
/// Construction connects, then creates the `(owner, _id)` and `(owner)`
/// indexes idempotently.
#[derive(Clone)]
pub struct DeviceStore {
    client: Client,
    collection: Collection<DeviceRecord>,
}

impl DeviceStore {
    /// Connect to the store and ensure its indexes exist.
    pub async fn new(config: &StoreConfig) -> Result<Self, StoreError> {
        let client = Client::with_uri_str(&config.uri)
            .await
            .map_err(StoreError::Connect)?;
        let collection = client.database(&config.database).collection(COLLECTION);
        let store = Self { client, collection };
        store.ensure_indexes().await?;
        info!(database = %config.database, collection = COLLECTION, "device store ready");
        Ok(store)
    }

    async fn ensure_indexes(&self) -> Result<(), StoreError> {
        let indexes = [
            IndexModel::builder()
                .keys(doc! { "owner": 1, "_id": 1 })
                .build(),
            IndexModel::builder().keys(doc! { "owner": 1 }).build(),
        ];
        for index in indexes {
            self.collection
                .create_index(index)
                .await
                .map_err(StoreError::Query)?;
        }
        Ok(())
    }

    /// Remove every record. Used by tests and operational tooling.
    pub async fn clear(&self) -> Result<(), StoreError> {
        self.collection
            .delete_many(doc! {})
            .await
            .map_err(StoreError::Query)?;
        Ok(())
    }
}

#[async_trait]
impl Store for DeviceStore {
    async fn new_transaction(&self) -> Box<dyn Transaction> {
        // A failed session start is kept inside the transaction so every
        // operation on it reports that error instead of panicking.
        let session = self.client.start_session().await;
        Box::new(MongoTransaction {
            collection: self.collection.clone(),
            session,
        })
    }
}

/// A session-scoped transaction over the device collection.
///
/// Dropping the transaction releases the session.
pub struct MongoTransaction {
    collection: Collection<DeviceRecord>,
    session: Result<ClientSession, mongodb::error::Error>,
}

impl MongoTransaction {
    fn session(&mut self) -> Result<&mut ClientSession, StoreError> {
        match &mut self.session {
            Ok(session) => Ok(session),
            Err(err) => Err(StoreError::Session(err.clone())),
        }
    }

    async fn find_one(&mut self, filter: Document) -> Result<Option<DeviceRecord>, StoreError> {
        let collection = self.collection.clone();
        let session = self.session()?;
        collection
            .find_one(filter)
            .session(session)
            .await
            .map_err(StoreError::from_read)
    }
}

#[async_trait]
impl Transaction for MongoTransaction {
    async fn retrieve(
        &mut self,
        device_id: &str,
        owner: &str,
    ) -> Result<Option<DeviceRecord>, StoreError> {
        self.find_one(doc! { "_id": device_id, "owner": owner })
            .await
    }

    async fn retrieve_by_device(
        &mut self,
        device_id: &str,
    ) -> Result<Option<DeviceRecord>, StoreError> {
        self.find_one(doc! { "_id": device_id }).await
    }

    async fn retrieve_all(&mut self, owner: Option<&str>) -> RecordStream {
        // A failed session start fails this scan like every other
        // operation on the transaction.
        if let Err(err) = &self.session {
            let err = StoreError::Session(err.clone());
            return futures::stream::once(async move { Err(err) }).boxed();
        }
        let filter = match owner {
            Some(owner) => doc! { "owner": owner },
            None => doc! {},
        };
        // The cursor owns its own server session, keeping the stream lazy
        // and independent of this transaction's lifetime. Errors surface
        // as stream items once iteration is driven.
        match self.collection.find(filter).await {
            Ok(cursor) => cursor.map(|item| item.map_err(StoreError::from_read)).boxed(),
            Err(err) => futures::stream::once(async move { Err(StoreError::Query(err)) }).boxed(),
        }
    }

    async fn persist(&mut self, record: &DeviceRecord) -> Result<(), StoreError> {
        let collection = self.collection.clone();
        let session = self.session()?;
        collection
            .replace_one(doc! { "_id": &record.device_id }, record)
            .upsert(true)
            .session(session)
            .await
            .map_err(StoreError::Query)?;
        Ok(())
    }

    async fn delete(&mut self, device_id: &str, owner: &str) -> Result<(), StoreError> {
        let collection = self.collection.clone();
        let session = self.session()?;
        let result = collection
            .delete_one(doc! { "_id": device_id, "owner": owner })
            .session(session)
            .await
            .map_err(StoreError::Query)?;
        if result.deleted_count == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Client construction is lazy; no server is contacted until an
    // operation runs, so these tests exercise the captured-error path
    // without a MongoDB instance.
    async fn transaction_with_failed_session() -> MongoTransaction {
        let client = Client::with_uri_str("mongodb://localhost:27017")
            .await
            .unwrap();
        MongoTransaction {
            collection: client.database("hubauth_test").collection(COLLECTION),
            session: Err(mongodb::error::Error::custom("session start failed")),
        }
    }

    #[tokio::test]
    async fn failed_session_start_fails_every_operation() {
        let mut tx = transaction_with_failed_session().await;

        assert!(matches!(
            tx.retrieve("d1", "u1").await,
            Err(StoreError::Session(_))
        ));
        assert!(matches!(
            tx.retrieve_by_device("d1").await,
            Err(StoreError::Session(_))
        ));
        assert!(matches!(
            tx.persist(&DeviceRecord::unprovisioned("d1", "u1")).await,
            Err(StoreError::Session(_))
        ));
        assert!(matches!(
            tx.delete("d1", "u1").await,
            Err(StoreError::Session(_))
        ));

        let mut records = tx.retrieve_all(None).await;
        assert!(matches!(
            records.next().await,
            Some(Err(StoreError::Session(_)))
        ));
        assert!(records.next().await.is_none());
    }
}
