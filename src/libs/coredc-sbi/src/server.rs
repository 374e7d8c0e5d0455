//! SBI HTTP/1.1 Server
//!
//! HTTP/1.1 server implementation using hyper. Requests are converted to
//! [`SbiRequest`] and handed to a single handler; each connection is served on
//! its own task.

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::Service;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tokio::sync::{oneshot, Mutex};

use crate::error::{SbiError, SbiResult};
use crate::message::{
    InvalidParam, ProblemDetails, SbiHeader, SbiHttpMessage, SbiRequest, SbiResponse,
    CONTENT_TYPE_PROBLEM,
};

/// Server configuration
#[derive(Debug, Clone)]
pub struct SbiServerConfig {
    /// Bind address
    pub addr: SocketAddr,
}

impl Default for SbiServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
        }
    }
}

impl SbiServerConfig {
    /// Create a new server configuration
    pub fn new(addr: SocketAddr) -> Self {
        Self { addr }
    }

    /// Create configuration with host and port
    pub fn with_host_port(host: impl AsRef<str>, port: u16) -> SbiResult<Self> {
        let addr: SocketAddr = format!("{}:{}", host.as_ref(), port)
            .parse()
            .map_err(|e| SbiError::InvalidUri(format!("Invalid address: {}", e)))?;
        Ok(Self::new(addr))
    }
}

/// Request handler trait
pub trait SbiRequestHandler: Send + Sync + 'static {
    /// Handle an incoming request
    fn handle(&self, request: SbiRequest) -> Pin<Box<dyn Future<Output = SbiResponse> + Send>>;
}

/// Function-based request handler
impl<F, Fut> SbiRequestHandler for F
where
    F: Fn(SbiRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = SbiResponse> + Send + 'static,
{
    fn handle(&self, request: SbiRequest) -> Pin<Box<dyn Future<Output = SbiResponse> + Send>> {
        Box::pin(self(request))
    }
}

/// Hyper service wrapper
struct SbiService<H: SbiRequestHandler> {
    handler: Arc<H>,
}

impl<H: SbiRequestHandler> Clone for SbiService<H> {
    fn clone(&self) -> Self {
        Self {
            handler: self.handler.clone(),
        }
    }
}

impl<H: SbiRequestHandler> Service<Request<Incoming>> for SbiService<H> {
    type Response = Response<Full<Bytes>>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: Request<Incoming>) -> Self::Future {
        let handler = self.handler.clone();

        Box::pin(async move {
            let sbi_response = match convert_request(req).await {
                Ok(sbi_request) => handler.handle(sbi_request).await,
                Err(rejection) => rejection,
            };
            Ok(convert_response(sbi_response))
        })
    }
}

/// Convert hyper request to SbiRequest
///
/// A body that cannot be read or is not UTF-8 is answered directly.
async fn convert_request<B>(req: Request<B>) -> Result<SbiRequest, SbiResponse>
where
    B: hyper::body::Body,
    B::Error: std::fmt::Display,
{
    let method = req.method().to_string();
    let uri = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());

    let mut http = SbiHttpMessage::new();
    for (key, value) in req.headers() {
        if let Ok(v) = value.to_str() {
            http.set_header(key.as_str(), v);
        }
    }

    if let Some(query) = req.uri().query() {
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            http.set_param(key, value);
        }
    }

    let bytes = match req.into_body().collect().await {
        Ok(body) => body.to_bytes(),
        Err(e) => {
            log::warn!("Failed to read request body: {e}");
            return Err(send_bad_request("Failed to read request body", None));
        }
    };

    if !bytes.is_empty() {
        match String::from_utf8(bytes.to_vec()) {
            Ok(content) => http.set_content(content),
            Err(e) => {
                log::warn!("Rejected {method} {uri}: body is not UTF-8 ({e})");
                return Err(send_unprocessable_entity(
                    "Request body is not valid UTF-8",
                    vec![InvalidParam::new("body", e.to_string())],
                ));
            }
        }
    }

    Ok(SbiRequest {
        header: SbiHeader::with_method_uri(method, uri),
        http,
    })
}

/// Convert SbiResponse to hyper response
fn convert_response(sbi_response: SbiResponse) -> Response<Full<Bytes>> {
    let mut builder = Response::builder().status(sbi_response.status);

    for (key, value) in &sbi_response.http.headers {
        builder = builder.header(key.as_str(), value.as_str());
    }

    let body = sbi_response
        .http
        .content
        .map(|c| Full::new(Bytes::from(c)))
        .unwrap_or_else(|| Full::new(Bytes::new()));

    builder.body(body).unwrap_or_else(|e| {
        log::error!("Failed to build response: {e}");
        let mut response = Response::new(Full::new(Bytes::from("Internal Server Error")));
        *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
        response
    })
}

/// Server state
enum ServerState {
    Stopped,
    Running(oneshot::Sender<()>),
}

/// HTTP/1.1 server
pub struct SbiServer {
    config: SbiServerConfig,
    state: Arc<Mutex<ServerState>>,
}

impl SbiServer {
    /// Create a new server
    pub fn new(config: SbiServerConfig) -> Self {
        Self {
            config,
            state: Arc::new(Mutex::new(ServerState::Stopped)),
        }
    }

    /// Create a server with address
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self::new(SbiServerConfig::new(addr))
    }

    /// Get the server configuration
    pub fn config(&self) -> &SbiServerConfig {
        &self.config
    }

    /// Start the server with a request handler
    ///
    /// Returns the bound address, which differs from the configured one when
    /// port 0 is requested.
    pub async fn start<H: SbiRequestHandler>(&self, handler: H) -> SbiResult<SocketAddr> {
        let mut state = self.state.lock().await;

        if matches!(*state, ServerState::Running(_)) {
            return Err(SbiError::ServerError("Server already running".to_string()));
        }

        let listener = TcpListener::bind(self.config.addr)
            .await
            .map_err(|e| SbiError::ServerError(format!("Failed to bind {}: {}", self.config.addr, e)))?;
        let local_addr = listener.local_addr()?;

        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();
        *state = ServerState::Running(shutdown_tx);
        drop(state);

        let handler = Arc::new(handler);

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    result = listener.accept() => {
                        match result {
                            Ok((stream, peer)) => {
                                let io = TokioIo::new(stream);
                                let service = SbiService {
                                    handler: handler.clone(),
                                };

                                tokio::spawn(async move {
                                    if let Err(e) = http1::Builder::new()
                                        .serve_connection(io, service)
                                        .await
                                    {
                                        log::debug!("HTTP connection error [{peer}]: {e}");
                                    }
                                });
                            }
                            Err(e) => {
                                log::warn!("Accept error: {e}");
                            }
                        }
                    }
                    _ = &mut shutdown_rx => {
                        break;
                    }
                }
            }
        });

        log::info!("HTTP server listening on {local_addr}");
        Ok(local_addr)
    }

    /// Stop the server
    pub async fn stop(&self) -> SbiResult<()> {
        let mut state = self.state.lock().await;

        if let ServerState::Running(shutdown_tx) = std::mem::replace(&mut *state, ServerState::Stopped) {
            let _ = shutdown_tx.send(());
        }

        Ok(())
    }

    /// Check if the server is running
    pub async fn is_running(&self) -> bool {
        let state = self.state.lock().await;
        matches!(*state, ServerState::Running(_))
    }
}

/// Build a problem details response
pub fn send_error(
    status: u16,
    title: &str,
    detail: &str,
    cause: Option<&str>,
) -> SbiResponse {
    let problem = ProblemDetails::with_status(status as i32)
        .with_title(title)
        .with_detail(detail);

    let problem = if let Some(c) = cause {
        problem.with_cause(c)
    } else {
        problem
    };

    send_problem(status, &problem)
}

/// Serialize an already built problem details body
pub fn send_problem(status: u16, problem: &ProblemDetails) -> SbiResponse {
    match serde_json::to_string(problem) {
        Ok(json) => SbiResponse::with_status(status).with_body(json, CONTENT_TYPE_PROBLEM),
        Err(_) => SbiResponse::with_status(status),
    }
}

/// Send a 400 Bad Request error response
pub fn send_bad_request(detail: &str, cause: Option<&str>) -> SbiResponse {
    send_error(400, "Bad Request", detail, cause)
}

/// Send a 404 Not Found error response
pub fn send_not_found(detail: &str, cause: Option<&str>) -> SbiResponse {
    send_error(404, "Not Found", detail, cause)
}

/// Send a 405 Method Not Allowed error response
pub fn send_method_not_allowed(method: &str, resource: &str) -> SbiResponse {
    send_error(
        405,
        "Method Not Allowed",
        &format!("Method {} not allowed for resource {}", method, resource),
        Some("METHOD_NOT_ALLOWED"),
    )
}

/// Send a 409 Conflict error response
pub fn send_conflict(detail: &str) -> SbiResponse {
    send_error(409, "Conflict", detail, Some("CONFLICT"))
}

/// Send a 422 Unprocessable Entity error response
pub fn send_unprocessable_entity(detail: &str, invalid_params: Vec<InvalidParam>) -> SbiResponse {
    let problem = invalid_params.into_iter().fold(
        ProblemDetails::with_status(422)
            .with_title("Unprocessable Entity")
            .with_detail(detail)
            .with_cause("VALIDATION_FAILED"),
        ProblemDetails::with_invalid_param,
    );
    send_problem(422, &problem)
}

/// Send a 500 Internal Server Error response
pub fn send_internal_error(detail: &str) -> SbiResponse {
    send_error(500, "Internal Server Error", detail, Some("INTERNAL_ERROR"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_config() {
        let config = SbiServerConfig::with_host_port("0.0.0.0", 8080).unwrap();
        assert_eq!(config.addr.port(), 8080);

        assert!(SbiServerConfig::with_host_port("not an address", 8080).is_err());
    }

    #[test]
    fn test_send_error() {
        let response = send_error(404, "Not Found", "Subscriber 999999999999999 not found", None);
        assert_eq!(response.status, 404);
        assert_eq!(
            response.http.get_header("content-type").map(String::as_str),
            Some(CONTENT_TYPE_PROBLEM)
        );

        let problem: ProblemDetails = response.json_body().unwrap();
        assert_eq!(problem.status, Some(404));
        assert_eq!(problem.detail.as_deref(), Some("Subscriber 999999999999999 not found"));
    }

    #[test]
    fn test_send_unprocessable_entity() {
        let response = send_unprocessable_entity(
            "Provide either OP or OPC, not both",
            vec![InvalidParam::new("security", "Provide either OP or OPC, not both")],
        );
        assert_eq!(response.status, 422);

        let problem: ProblemDetails = response.json_body().unwrap();
        assert_eq!(problem.cause.as_deref(), Some("VALIDATION_FAILED"));
        assert_eq!(problem.invalid_params.unwrap()[0].param, "security");
    }

    #[test]
    fn test_convert_response_keeps_status_and_body() {
        let response = convert_response(SbiResponse::created().with_body("{}", "application/json"));
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()["content-type"], "application/json");
    }

    #[tokio::test]
    async fn test_convert_request_decodes_query_and_body() {
        let req = Request::builder()
            .method("POST")
            .uri("/core/subscribers?name=a%20b")
            .header("Content-Type", "application/json")
            .body(Full::new(Bytes::from_static(b"{\"name\":\"caf\xc3\xa9\"}")))
            .unwrap();

        let request = convert_request(req).await.unwrap();
        assert_eq!(request.header.path(), "/core/subscribers");
        assert_eq!(request.http.get_param("name").map(String::as_str), Some("a b"));
        assert_eq!(request.http.content.as_deref(), Some("{\"name\":\"caf\u{e9}\"}"));
    }

    #[tokio::test]
    async fn test_convert_request_rejects_non_utf8_body() {
        let req = Request::builder()
            .method("POST")
            .uri("/core/subscribers")
            .body(Full::new(Bytes::from_static(b"{\"name\":\"\xffAMEMARK\"}")))
            .unwrap();

        let response = convert_request(req).await.unwrap_err();
        assert_eq!(response.status, 422);

        let problem: ProblemDetails = response.json_body().unwrap();
        assert_eq!(problem.invalid_params.unwrap()[0].param, "body");
    }

    #[tokio::test]
    async fn test_start_stop() {
        let server = SbiServer::with_addr(SocketAddr::from(([127, 0, 0, 1], 0)));
        let addr = server
            .start(|_request: SbiRequest| async { SbiResponse::ok() })
            .await
            .unwrap();
        assert_ne!(addr.port(), 0);
        assert!(server.is_running().await);

        let again = server
            .start(|_request: SbiRequest| async { SbiResponse::ok() })
            .await;
        assert!(again.is_err());

        server.stop().await.unwrap();
        assert!(!server.is_running().await);
    }
}
