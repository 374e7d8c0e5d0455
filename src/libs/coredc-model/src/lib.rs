//! Core Deployment Controller Subscriber Model
//!
//! This crate provides the subscriber document model stored in the
//! `subscribers` collection and the validators applied to untrusted input
//! before it reaches storage.
//!
//! # Modules
//!
//! - [`types`] - Field names, defaults and coded enumerations
//! - [`validate`] - IMSI and hex credential validators
//! - [`subscriber`] - Subscriber record graph and record validation
//! - `testutil` - Fixtures for tests (`testutil` feature)

pub mod types;
pub mod validate;
pub mod subscriber;
#[cfg(any(test, feature = "testutil"))]
pub mod testutil;


pub use types::{AmbrUnit, PdnType};
pub use validate::{
    normalize_hex, validate_hex, validate_imsi, validate_security, CanonicalSecurity,
    ValidationError, ValidationResult,
};
pub use subscriber::{
    Ambr, AmbrValue, Arp, Qos, Security, Session, Slice, SubscriberRecord, UeAddress,
    ValidatedSubscriber,
};
