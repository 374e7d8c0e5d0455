//! Subscriber Store Trait
//!
//! The persistence gateway contract. Every implementation is the sole
//! authority on IMSI uniqueness for the records it holds: a losing concurrent
//! create must observe [`DbiError::Conflict`](crate::DbiError::Conflict),
//! never a silent duplicate.

use async_trait::async_trait;
use coredc_model::{SubscriberRecord, ValidatedSubscriber};

use crate::error::DbiResult;
use crate::query::{Page, SubscriberFilter};

#[async_trait]
pub trait SubscriberStore: Send + Sync {
    /// List subscribers matching `filter`, in storage order
    async fn list(&self, filter: &SubscriberFilter, page: Page) -> DbiResult<Vec<SubscriberRecord>>;

    /// Insert a new subscriber
    ///
    /// Returns the stored record with its storage id. Fails with `Conflict`
    /// when the IMSI already exists.
    async fn create(&self, record: ValidatedSubscriber) -> DbiResult<SubscriberRecord>;

    /// Delete the subscriber with `imsi`
    ///
    /// Fails with `NotFound` when nothing matched.
    async fn delete(&self, imsi: &str) -> DbiResult<bool>;

    /// Replace the subscriber stored at `imsi`
    ///
    /// The path IMSI always wins over the IMSI inside `record`. Fails with
    /// `NotFound` when nothing matched and `Conflict` on a unique-key clash.
    async fn replace(&self, imsi: &str, record: ValidatedSubscriber) -> DbiResult<()>;

    /// Check the store is reachable
    async fn ping(&self) -> DbiResult<()>;

    /// Make sure the unique IMSI constraint exists
    ///
    /// Idempotent and safe to call concurrently. Returns false when the
    /// constraint could not be established yet.
    async fn ensure_indexes(&self) -> bool {
        true
    }
}
