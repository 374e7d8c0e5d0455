//! Core Deployment Controller API Daemon Library
//!
//! Request routing and handlers for the `/core` HTTP surface: subscriber
//! management backed by a [`coredc_dbi::SubscriberStore`] and read-only
//! forwarding to the MME and SMF.

pub mod context;
pub mod core_handler;
pub mod subscriber_handler;

pub use context::{CoreContext, UpstreamConfig, DEFAULT_MME_URL, DEFAULT_SMF_URL};
pub use core_handler::{handle_request, ForwardedResource};
