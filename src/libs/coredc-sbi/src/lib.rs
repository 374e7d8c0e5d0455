//! Core Deployment Controller SBI Library
//!
//! HTTP plumbing for the controller: message structures, an HTTP/1.1 server,
//! an HTTP/1.1 upstream client, and the backend forwarding layer.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use coredc_sbi::{SbiRequest, Upstream};
//!
//! async fn example() {
//!     let mme = Upstream::new("mme", "http://mme:9091", Duration::from_secs(5)).unwrap();
//!     let response = mme.relay("/enb-info", &SbiRequest::get("/core/enb-info")).await;
//!     println!("{}", response.status);
//! }
//! ```
//!
//! # Modules
//!
//! - [`message`] - Request, response and problem details structures
//! - [`client`] - HTTP/1.1 client with a per-call deadline
//! - [`server`] - HTTP/1.1 server and error response helpers
//! - [`proxy`] - Upstream forwarding and failure mapping
//! - [`error`] - Error types

pub mod error;
pub mod message;

pub mod client;
pub mod proxy;
pub mod server;

// Re-export commonly used types
pub use client::{SbiClient, SbiClientConfig, DEFAULT_REQUEST_TIMEOUT};
pub use error::{SbiError, SbiResult};
pub use message::{
    InvalidParam, ProblemDetails, SbiHeader, SbiHttpMessage, SbiRequest, SbiResponse,
    CONTENT_TYPE_JSON, CONTENT_TYPE_PROBLEM,
};
pub use proxy::{ForwardError, Upstream};
pub use server::{
    send_bad_request, send_conflict, send_error, send_internal_error, send_method_not_allowed,
    send_not_found, send_problem, send_unprocessable_entity, SbiRequestHandler, SbiServer,
    SbiServerConfig,
};
