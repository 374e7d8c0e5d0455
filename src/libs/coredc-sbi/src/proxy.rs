//! Backend Forwarding
//!
//! Relays read requests to a fixed upstream and translates transport failures
//! into stable 502/504 outcomes. A single attempt is made per call.

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::client::{SbiClient, SbiClientConfig};
use crate::error::{SbiError, SbiResult};
use crate::message::{SbiRequest, SbiResponse, CONTENT_TYPE_JSON};

/// Headers never copied to the upstream request
const HOP_BY_HOP_HEADERS: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
    "host",
    "content-length",
    // Bodies are relayed as text and must arrive uncompressed
    "accept-encoding",
];

/// Forwarding failure
///
/// `Display` is for logs only; clients get [`ForwardError::to_response`],
/// which never carries the underlying error text.
#[derive(Error, Debug)]
pub enum ForwardError {
    #[error("Could not connect to {url}: {source}")]
    UpstreamUnavailable { url: String, source: SbiError },
    #[error("Backend {url} did not respond in time")]
    UpstreamTimeout { url: String },
    #[error("Unexpected error contacting {url}: {source}")]
    Upstream { url: String, source: SbiError },
}

#[derive(Serialize)]
struct ForwardErrorBody<'a> {
    error: &'a str,
    detail: String,
}

impl ForwardError {
    /// Classify a transport error for the destination `url`
    pub fn from_sbi(url: impl Into<String>, error: SbiError) -> Self {
        let url = url.into();
        if error.is_timeout() {
            Self::UpstreamTimeout { url }
        } else if error.is_connect_failure() {
            Self::UpstreamUnavailable { url, source: error }
        } else {
            Self::Upstream { url, source: error }
        }
    }

    /// HTTP status reported to the client
    pub fn status_code(&self) -> u16 {
        match self {
            Self::UpstreamTimeout { .. } => 504,
            Self::UpstreamUnavailable { .. } | Self::Upstream { .. } => 502,
        }
    }

    /// Client-facing detail
    pub fn detail(&self) -> String {
        match self {
            Self::UpstreamUnavailable { url, .. } => format!("Could not connect to {url}"),
            Self::UpstreamTimeout { url } => format!("Backend {url} did not respond in time"),
            Self::Upstream { .. } => "Unexpected error contacting backend".to_string(),
        }
    }

    /// Build the `{"error", "detail"}` response
    pub fn to_response(&self) -> SbiResponse {
        let error = match self {
            Self::UpstreamTimeout { .. } => "Gateway timeout",
            Self::UpstreamUnavailable { .. } | Self::Upstream { .. } => "Bad gateway",
        };
        let body = ForwardErrorBody {
            error,
            detail: self.detail(),
        };

        SbiResponse::with_status(self.status_code())
            .with_json_body(&body)
            .unwrap_or_else(|_| SbiResponse::with_status(self.status_code()))
    }
}

/// One upstream network function
#[derive(Debug, Clone)]
pub struct Upstream {
    name: String,
    client: SbiClient,
}

impl Upstream {
    /// Create an upstream from its base URL
    pub fn new(name: impl Into<String>, base_url: &str, timeout: Duration) -> SbiResult<Self> {
        let config = SbiClientConfig::from_url(base_url)?.with_request_timeout(timeout);
        Ok(Self {
            name: name.into(),
            client: SbiClient::new(config),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base_uri(&self) -> String {
        self.client.config().base_uri()
    }

    /// Relay `request` to `path` on this upstream
    ///
    /// The inbound query string is appended unchanged and end-to-end headers
    /// are copied. A successful exchange returns the upstream status and JSON
    /// body as is.
    pub async fn forward(&self, path: &str, request: &SbiRequest) -> Result<SbiResponse, ForwardError> {
        let url = format!("{}{}", self.base_uri(), path);
        let target = match request.header.query() {
            Some(query) if !query.is_empty() => format!("{path}?{query}"),
            _ => path.to_string(),
        };

        let mut upstream_request = SbiRequest::get(target);
        for (key, value) in &request.http.headers {
            if !HOP_BY_HOP_HEADERS.contains(&key.as_str()) {
                upstream_request.http.set_header(key.as_str(), value.as_str());
            }
        }

        let response = self
            .client
            .send_request(upstream_request)
            .await
            .map_err(|e| ForwardError::from_sbi(&url, e))?;

        let content = response.http.content.unwrap_or_default();
        if let Err(e) = serde_json::from_str::<serde_json::Value>(&content) {
            return Err(ForwardError::Upstream {
                url,
                source: SbiError::InvalidResponse(format!("body is not JSON: {e}")),
            });
        }

        log::info!("Proxy to {url}: {}", response.status);
        Ok(SbiResponse::with_status(response.status).with_body(content, CONTENT_TYPE_JSON))
    }

    /// Relay and convert any failure into its client-facing response
    pub async fn relay(&self, path: &str, request: &SbiRequest) -> SbiResponse {
        match self.forward(path, request).await {
            Ok(response) => response,
            Err(e) => {
                log::error!("[{}] {e}", self.name);
                e.to_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_error_mapping() {
        let url = "http://mme:9091/enb-info";

        let err = ForwardError::from_sbi(url, SbiError::ConnectionError("refused".to_string()));
        assert_eq!(err.status_code(), 502);
        assert_eq!(err.detail(), "Could not connect to http://mme:9091/enb-info");

        let err = ForwardError::from_sbi(url, SbiError::Timeout);
        assert_eq!(err.status_code(), 504);
        assert_eq!(err.detail(), "Backend http://mme:9091/enb-info did not respond in time");

        let err = ForwardError::from_sbi(url, SbiError::HyperError("connection reset".to_string()));
        assert_eq!(err.status_code(), 502);
        assert_eq!(err.detail(), "Unexpected error contacting backend");
    }

    #[test]
    fn test_forward_error_response_hides_cause() {
        let err = ForwardError::from_sbi(
            "http://smf:9091/pdu-info",
            SbiError::InvalidResponse("secret internals".to_string()),
        );
        let response = err.to_response();
        assert_eq!(response.status, 502);

        let body: serde_json::Value = response.json_body().unwrap();
        assert_eq!(body["error"], "Bad gateway");
        assert_eq!(body["detail"], "Unexpected error contacting backend");
        assert!(!response.http.content.unwrap().contains("secret"));
    }

    #[test]
    fn test_timeout_response_body() {
        let response = ForwardError::UpstreamTimeout {
            url: "http://mme:9091/ue-info".to_string(),
        }
        .to_response();
        assert_eq!(response.status, 504);

        let body: serde_json::Value = response.json_body().unwrap();
        assert_eq!(body["error"], "Gateway timeout");
    }

    #[test]
    fn test_upstream_rejects_bad_url() {
        assert!(Upstream::new("mme", "ftp://mme:9091", Duration::from_secs(5)).is_err());

        let upstream = Upstream::new("mme", "http://mme:9091", Duration::from_secs(5)).unwrap();
        assert_eq!(upstream.name(), "mme");
        assert_eq!(upstream.base_uri(), "http://mme:9091");
    }
}
