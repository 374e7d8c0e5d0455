//! Core Request Router
//!
//! Routes every request under `/core` to its handler.

use coredc_sbi::{send_internal_error, send_method_not_allowed, send_not_found, SbiRequest, SbiResponse};
use serde_json::json;

use crate::context::CoreContext;
use crate::subscriber_handler::{handle_subscriber, handle_subscribers};

pub const CORE_PREFIX: &str = "core";

/// Upstream path for a forwarded resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForwardedResource {
    EnbInfo,
    UeInfo,
    PduInfo,
}

impl ForwardedResource {
    pub fn from_segment(segment: &str) -> Option<Self> {
        match segment {
            "enb-info" => Some(Self::EnbInfo),
            "ue-info" => Some(Self::UeInfo),
            "pdu-info" => Some(Self::PduInfo),
            _ => None,
        }
    }

    pub fn path(self) -> &'static str {
        match self {
            Self::EnbInfo => "/enb-info",
            Self::UeInfo => "/ue-info",
            Self::PduInfo => "/pdu-info",
        }
    }
}

/// Handle one request
pub async fn handle_request(ctx: &CoreContext, request: SbiRequest) -> SbiResponse {
    let method = request.header.method.to_uppercase();
    let parts = request.header.resource_components();

    log::debug!("{method} {}", request.header.uri);

    if parts.first().copied() != Some(CORE_PREFIX) {
        return send_not_found(&format!("Unknown resource: {}", request.header.path()), None);
    }

    match parts.as_slice() {
        [_] => match method.as_str() {
            "GET" => core_endpoints(),
            _ => send_method_not_allowed(&method, "/core"),
        },
        [_, "subscribers"] => handle_subscribers(ctx, &method, &request).await,
        [_, "subscribers", imsi] => handle_subscriber(ctx, imsi, &method, &request).await,
        [_, segment] => match ForwardedResource::from_segment(segment) {
            Some(resource) if method == "GET" => forward(ctx, resource, &request).await,
            Some(resource) => send_method_not_allowed(&method, &format!("/core{}", resource.path())),
            None => send_not_found(&format!("Unknown resource: {}", request.header.path()), None),
        },
        _ => send_not_found(&format!("Unknown resource: {}", request.header.path()), None),
    }
}

/// `GET /core`
fn core_endpoints() -> SbiResponse {
    let body = json!({
        "endpoints": {
            "/subscribers": "Information and management of subscribers registered in the core",
            "/enb-info": "Information about all connected eNBs and their details (TAs, PLMNs, number of UEs)",
            "/ue-info": "Information about all connected LTE UEs (active eNB, TAI, PDN info)",
            "/pdu-info": "Information about all PDU sessions (IMSI/SUPI, DNN, IPs, S-NSSAI, QoS, state)",
        }
    });
    SbiResponse::ok()
        .with_json_body(&body)
        .unwrap_or_else(|e| send_internal_error(&e.to_string()))
}

async fn forward(ctx: &CoreContext, resource: ForwardedResource, request: &SbiRequest) -> SbiResponse {
    let upstream = match resource {
        ForwardedResource::EnbInfo | ForwardedResource::UeInfo => &ctx.mme,
        ForwardedResource::PduInfo => &ctx.smf,
    };
    upstream.relay(resource.path(), request).await
}
