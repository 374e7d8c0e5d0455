//! SBI HTTP/1.1 Client
//!
//! Plain HTTP/1.1 client for upstream calls. Every request opens its own
//! connection, and the whole exchange (connect, request, body) runs under a
//! single deadline, so an expired call leaves nothing behind.

use std::time::Duration;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::header::{CONTENT_LENGTH, HOST};
use hyper::{Method, Request, Uri};
use hyper_util::rt::TokioIo;
use tokio::net::TcpStream;
use url::Url;

use crate::error::{SbiError, SbiResult};
use crate::message::{SbiHttpMessage, SbiRequest, SbiResponse};

/// Default request deadline in seconds
pub const DEFAULT_REQUEST_TIMEOUT: u64 = 5;

/// Client configuration
#[derive(Debug, Clone)]
pub struct SbiClientConfig {
    /// Target host (FQDN or IP)
    pub host: String,
    /// Target port
    pub port: u16,
    /// Deadline for the whole exchange
    pub request_timeout: Duration,
}

impl Default for SbiClientConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 80,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT),
        }
    }
}

impl SbiClientConfig {
    /// Create a new client configuration
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// Parse a base URL such as `http://mme:9091`
    ///
    /// Only `http` is supported; the port defaults to 80.
    pub fn from_url(base_url: &str) -> SbiResult<Self> {
        let url = Url::parse(base_url)
            .map_err(|e| SbiError::InvalidUri(format!("{base_url}: {e}")))?;

        if url.scheme() != "http" {
            return Err(SbiError::InvalidUri(format!(
                "{base_url}: unsupported scheme {}",
                url.scheme()
            )));
        }

        let host = url
            .host_str()
            .ok_or_else(|| SbiError::InvalidUri(format!("{base_url}: missing host")))?;
        let port = url.port_or_known_default().unwrap_or(80);

        Ok(Self::new(host, port))
    }

    /// Set request timeout
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Build the base URI
    pub fn base_uri(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    /// Value of the Host header sent upstream
    fn host_header(&self) -> String {
        if self.port == 80 {
            self.host.clone()
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

/// HTTP/1.1 client bound to one upstream
#[derive(Debug, Clone)]
pub struct SbiClient {
    config: SbiClientConfig,
}

impl SbiClient {
    /// Create a new client
    pub fn new(config: SbiClientConfig) -> Self {
        Self { config }
    }

    /// Create a client with host and port
    pub fn with_host_port(host: impl Into<String>, port: u16) -> Self {
        Self::new(SbiClientConfig::new(host, port))
    }

    /// Get the client configuration
    pub fn config(&self) -> &SbiClientConfig {
        &self.config
    }

    /// Send a request and receive a response
    ///
    /// `request.header.uri` is the origin-form path (with query) on the
    /// upstream. `Host` and `Content-Length` are always regenerated.
    pub async fn send_request(&self, request: SbiRequest) -> SbiResult<SbiResponse> {
        tokio::time::timeout(self.config.request_timeout, self.exchange(request))
            .await
            .map_err(|_| SbiError::Timeout)?
    }

    async fn exchange(&self, request: SbiRequest) -> SbiResult<SbiResponse> {
        let method = Method::from_bytes(request.header.method.to_uppercase().as_bytes())
            .map_err(|_| SbiError::InvalidMethod(request.header.method.clone()))?;

        let uri: Uri = request
            .header
            .uri
            .parse()
            .map_err(|e| SbiError::InvalidUri(format!("{}: {e}", request.header.uri)))?;

        let mut req_builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(HOST, self.config.host_header());

        for (key, value) in &request.http.headers {
            if key == HOST.as_str() || key == CONTENT_LENGTH.as_str() {
                continue;
            }
            req_builder = req_builder.header(key.as_str(), value.as_str());
        }

        let body = request
            .http
            .content
            .map(|c| Full::new(Bytes::from(c)))
            .unwrap_or_else(|| Full::new(Bytes::new()));

        let http_request = req_builder
            .body(body)
            .map_err(|e| SbiError::InvalidUri(e.to_string()))?;

        let addr = format!("{}:{}", self.config.host, self.config.port);
        let stream = TcpStream::connect(&addr)
            .await
            .map_err(|e| SbiError::ConnectionError(format!("{addr}: {e}")))?;

        let (mut sender, conn) = hyper::client::conn::http1::handshake(TokioIo::new(stream))
            .await
            .map_err(|e| SbiError::ConnectionError(format!("{addr}: {e}")))?;

        tokio::spawn(async move {
            if let Err(e) = conn.await {
                log::debug!("HTTP connection error [{addr}]: {e}");
            }
        });

        let response = sender.send_request(http_request).await?;
        convert_response(response).await
    }

    /// Send a GET request
    pub async fn get(&self, path: &str) -> SbiResult<SbiResponse> {
        self.send_request(SbiRequest::get(path)).await
    }
}

/// Convert hyper response to SbiResponse
async fn convert_response(response: hyper::Response<Incoming>) -> SbiResult<SbiResponse> {
    let status = response.status().as_u16();

    let mut http = SbiHttpMessage::new();
    for (key, value) in response.headers() {
        if let Ok(v) = value.to_str() {
            http.set_header(key.as_str(), v);
        }
    }

    let body_bytes = response
        .into_body()
        .collect()
        .await
        .map_err(|e| SbiError::InvalidResponse(e.to_string()))?
        .to_bytes();

    if !body_bytes.is_empty() {
        let content = String::from_utf8(body_bytes.to_vec())
            .map_err(|e| SbiError::InvalidResponse(format!("body is not UTF-8: {e}")))?;
        http.set_content(content);
    }

    let mut sbi_response = SbiResponse::with_status(status);
    sbi_response.http = http;
    Ok(sbi_response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_config() {
        let config = SbiClientConfig::new("localhost", 8080)
            .with_request_timeout(Duration::from_millis(250));

        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 8080);
        assert_eq!(config.request_timeout, Duration::from_millis(250));
        assert_eq!(config.base_uri(), "http://localhost:8080");
        assert_eq!(config.host_header(), "localhost:8080");
    }

    #[test]
    fn test_config_from_url() {
        let config = SbiClientConfig::from_url("http://mme:9091").unwrap();
        assert_eq!(config.host, "mme");
        assert_eq!(config.port, 9091);
        assert_eq!(config.request_timeout, Duration::from_secs(5));

        let config = SbiClientConfig::from_url("http://smf/").unwrap();
        assert_eq!(config.port, 80);
        assert_eq!(config.host_header(), "smf");

        assert!(SbiClientConfig::from_url("https://mme:9091").is_err());
        assert!(SbiClientConfig::from_url("mme:9091").is_err());
    }

    #[test]
    fn test_client_creation() {
        let client = SbiClient::with_host_port("127.0.0.1", 9091);
        assert_eq!(client.config().host, "127.0.0.1");
        assert_eq!(client.config().port, 9091);
    }

    #[tokio::test]
    async fn test_connection_refused() {
        // Bind then drop to get a port nobody listens on
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let client = SbiClient::with_host_port("127.0.0.1", port);
        let err = client.get("/enb-info").await.unwrap_err();
        assert!(err.is_connect_failure(), "unexpected error: {err}");
    }
}
