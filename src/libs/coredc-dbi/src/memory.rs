//! In-memory subscriber store
//!
//! Same contract as the MongoDB store: uniqueness, filtering, pagination and
//! storage order. Used by tests and by development runs without a database.

use async_trait::async_trait;
use coredc_model::{SubscriberRecord, ValidatedSubscriber};
use mongodb::bson::oid::ObjectId;
use parking_lot::RwLock;

use crate::error::{DbiError, DbiResult};
use crate::query::{Page, SubscriberFilter};
use crate::store::SubscriberStore;

/// In-memory subscriber store
#[derive(Debug, Default)]
pub struct MemorySubscriberStore {
    records: RwLock<Vec<SubscriberRecord>>,
}

impl MemorySubscriberStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored subscribers
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

#[async_trait]
impl SubscriberStore for MemorySubscriberStore {
    async fn list(&self, filter: &SubscriberFilter, page: Page) -> DbiResult<Vec<SubscriberRecord>> {
        let records = self.records.read();
        Ok(records
            .iter()
            .filter(|record| filter.matches(record))
            .skip(usize::try_from(page.offset).unwrap_or(usize::MAX))
            .take(page.limit as usize)
            .cloned()
            .collect())
    }

    async fn create(&self, record: ValidatedSubscriber) -> DbiResult<SubscriberRecord> {
        let mut record = record.without_id().into_inner();

        // Check and insert under one write lock
        let mut records = self.records.write();
        if records.iter().any(|r| r.imsi == record.imsi) {
            return Err(DbiError::Conflict(record.imsi));
        }
        record.id = Some(ObjectId::new().to_hex());
        records.push(record.clone());

        Ok(record)
    }

    async fn delete(&self, imsi: &str) -> DbiResult<bool> {
        let mut records = self.records.write();
        match records.iter().position(|r| r.imsi == imsi) {
            Some(index) => {
                records.remove(index);
                Ok(true)
            }
            None => Err(DbiError::NotFound(imsi.to_string())),
        }
    }

    async fn replace(&self, imsi: &str, record: ValidatedSubscriber) -> DbiResult<()> {
        let record = record
            .with_imsi(imsi)
            .map_err(|_| DbiError::NotFound(imsi.to_string()))?
            .into_inner();

        let mut records = self.records.write();
        let slot = records
            .iter_mut()
            .find(|r| r.imsi == imsi)
            .ok_or_else(|| DbiError::NotFound(imsi.to_string()))?;

        // The storage id is immutable
        let id = slot.id.take();
        *slot = SubscriberRecord { id, ..record };

        Ok(())
    }

    async fn ping(&self) -> DbiResult<()> {
        Ok(())
    }
}
