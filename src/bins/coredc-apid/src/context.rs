//! Controller Context
//!
//! Everything a request handler needs, built once at startup and shared by
//! reference.

use std::sync::Arc;
use std::time::Duration;

use coredc_dbi::SubscriberStore;
use coredc_sbi::{SbiResult, Upstream, DEFAULT_REQUEST_TIMEOUT};

pub const DEFAULT_MME_URL: &str = "http://mme:9091";
pub const DEFAULT_SMF_URL: &str = "http://smf:9091";

/// Upstream network functions
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    /// MME metrics endpoint (eNB and UE information)
    pub mme_url: String,
    /// SMF metrics endpoint (PDU session information)
    pub smf_url: String,
    /// Deadline for one forwarded call
    pub timeout: Duration,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            mme_url: DEFAULT_MME_URL.to_string(),
            smf_url: DEFAULT_SMF_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT),
        }
    }
}

/// Shared controller state
pub struct CoreContext {
    pub store: Arc<dyn SubscriberStore>,
    pub mme: Upstream,
    pub smf: Upstream,
}

impl CoreContext {
    pub fn new(store: Arc<dyn SubscriberStore>, upstreams: &UpstreamConfig) -> SbiResult<Self> {
        Ok(Self {
            store,
            mme: Upstream::new("mme", &upstreams.mme_url, upstreams.timeout)?,
            smf: Upstream::new("smf", &upstreams.smf_url, upstreams.timeout)?,
        })
    }
}
