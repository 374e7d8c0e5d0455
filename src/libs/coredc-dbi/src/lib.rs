//! Core Deployment Controller Database Interface
//!
//! This crate provides the subscriber persistence gateway: a
//! [`SubscriberStore`] trait with a MongoDB implementation and an in-memory
//! implementation sharing the same contract.

pub mod error;
pub mod query;
pub mod store;
pub mod mongoc;
pub mod memory;

// Re-export the mongodb crate for consumers that need direct collection access
pub use mongodb;

pub use error::{DbiError, DbiResult};
pub use query::{escape_regex, Page, SubscriberFilter, DEFAULT_LIMIT, MAX_OFFSET};
pub use store::SubscriberStore;
pub use mongoc::{masked_db_uri, MongoSubscriberStore, MongocConfig, SUBSCRIBERS_COLLECTION};
pub use memory::MemorySubscriberStore;
