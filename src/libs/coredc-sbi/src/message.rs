//! SBI Message Structures
//!
//! Request and response structures shared by the server, the upstream client
//! and the handlers.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Content type for JSON bodies
pub const CONTENT_TYPE_JSON: &str = "application/json";
/// Content type for problem details bodies
pub const CONTENT_TYPE_PROBLEM: &str = "application/problem+json";

/// Request line of a message
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SbiHeader {
    /// HTTP method (GET, POST, PUT, DELETE)
    pub method: String,
    /// Origin-form URI: path plus optional query string
    pub uri: String,
}

impl SbiHeader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new header with method and URI
    pub fn with_method_uri(method: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            uri: uri.into(),
        }
    }

    /// Path without the query string
    pub fn path(&self) -> &str {
        self.uri.split('?').next().unwrap_or(&self.uri)
    }

    /// Raw query string, still percent-encoded
    pub fn query(&self) -> Option<&str> {
        self.uri.split_once('?').map(|(_, q)| q)
    }

    /// Non-empty path segments
    pub fn resource_components(&self) -> Vec<&str> {
        self.path()
            .split('/')
            .filter(|segment| !segment.is_empty())
            .collect()
    }
}

/// HTTP part of a message
///
/// Header names are stored lower case.
#[derive(Debug, Clone, Default)]
pub struct SbiHttpMessage {
    /// Decoded query parameters
    pub params: HashMap<String, String>,
    /// HTTP headers
    pub headers: HashMap<String, String>,
    /// Body content
    pub content: Option<String>,
}

impl SbiHttpMessage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a query parameter
    pub fn set_param(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.params.insert(key.into(), value.into());
    }

    /// Get a query parameter
    pub fn get_param(&self, key: &str) -> Option<&String> {
        self.params.get(key)
    }

    /// Set a header
    pub fn set_header(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.headers
            .insert(key.into().to_ascii_lowercase(), value.into());
    }

    /// Get a header
    pub fn get_header(&self, key: &str) -> Option<&String> {
        self.headers.get(&key.to_ascii_lowercase())
    }

    /// Set the body content
    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = Some(content.into());
    }
}

/// SBI Request
#[derive(Debug, Clone, Default)]
pub struct SbiRequest {
    /// Request header
    pub header: SbiHeader,
    /// HTTP message (params, headers, body)
    pub http: SbiHttpMessage,
}

impl SbiRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a GET request
    pub fn get(uri: impl Into<String>) -> Self {
        Self {
            header: SbiHeader::with_method_uri("GET", uri),
            http: SbiHttpMessage::new(),
        }
    }

    /// Create a POST request
    pub fn post(uri: impl Into<String>) -> Self {
        Self {
            header: SbiHeader::with_method_uri("POST", uri),
            http: SbiHttpMessage::new(),
        }
    }

    /// Create a PUT request
    pub fn put(uri: impl Into<String>) -> Self {
        Self {
            header: SbiHeader::with_method_uri("PUT", uri),
            http: SbiHttpMessage::new(),
        }
    }

    /// Create a DELETE request
    pub fn delete(uri: impl Into<String>) -> Self {
        Self {
            header: SbiHeader::with_method_uri("DELETE", uri),
            http: SbiHttpMessage::new(),
        }
    }

    /// Set JSON body content
    pub fn with_json_body<T: Serialize>(mut self, body: &T) -> Result<Self, serde_json::Error> {
        let json = serde_json::to_string(body)?;
        self.http.set_content(json);
        self.http.set_header("Content-Type", CONTENT_TYPE_JSON);
        Ok(self)
    }

    /// Set raw body content
    pub fn with_body(mut self, content: impl Into<String>, content_type: impl Into<String>) -> Self {
        self.http.set_content(content);
        self.http.set_header("Content-Type", content_type);
        self
    }

    /// Add a query parameter
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.http.set_param(key, value);
        self
    }

    /// Add a header
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.http.set_header(key, value);
        self
    }
}

/// SBI Response
#[derive(Debug, Clone, Default)]
pub struct SbiResponse {
    /// HTTP message (headers, body)
    pub http: SbiHttpMessage,
    /// HTTP status code
    pub status: u16,
}

impl SbiResponse {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a response with status code
    pub fn with_status(status: u16) -> Self {
        Self {
            status,
            ..Default::default()
        }
    }

    /// Create a successful response (200 OK)
    pub fn ok() -> Self {
        Self::with_status(200)
    }

    /// Create a created response (201 Created)
    pub fn created() -> Self {
        Self::with_status(201)
    }

    /// Set JSON body content
    pub fn with_json_body<T: Serialize>(mut self, body: &T) -> Result<Self, serde_json::Error> {
        let json = serde_json::to_string(body)?;
        self.http.set_content(json);
        self.http.set_header("Content-Type", CONTENT_TYPE_JSON);
        Ok(self)
    }

    /// Set raw body content
    pub fn with_body(mut self, content: impl Into<String>, content_type: impl Into<String>) -> Self {
        self.http.set_content(content);
        self.http.set_header("Content-Type", content_type);
        self
    }

    /// Add a header
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.http.set_header(key, value);
        self
    }

    /// Check if response is successful (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Parse JSON body
    pub fn json_body<T: for<'de> Deserialize<'de>>(&self) -> Result<T, serde_json::Error> {
        let content = self.http.content.as_deref().unwrap_or("{}");
        serde_json::from_str(content)
    }
}

/// Problem Details - RFC 7807 compliant error response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProblemDetails {
    /// A URI reference that identifies the problem type
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub problem_type: Option<String>,
    /// A short, human-readable summary of the problem type
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// The HTTP status code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<i32>,
    /// A human-readable explanation specific to this occurrence
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// A URI reference that identifies the specific occurrence
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
    /// Application-specific error cause
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
    /// Invalid parameters
    #[serde(rename = "invalidParams", skip_serializing_if = "Option::is_none")]
    pub invalid_params: Option<Vec<InvalidParam>>,
}

impl ProblemDetails {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status(status: i32) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_cause(mut self, cause: impl Into<String>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    pub fn with_invalid_param(mut self, param: InvalidParam) -> Self {
        self.invalid_params.get_or_insert_with(Vec::new).push(param);
        self
    }
}

/// Invalid Parameter for ProblemDetails
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InvalidParam {
    /// Parameter name
    pub param: String,
    /// Reason why the parameter is invalid
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl InvalidParam {
    pub fn new(param: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            param: param.into(),
            reason: Some(reason.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sbi_header() {
        let header = SbiHeader::with_method_uri("GET", "/core/subscribers/001010000000001?x=1");

        assert_eq!(header.method, "GET");
        assert_eq!(header.path(), "/core/subscribers/001010000000001");
        assert_eq!(header.query(), Some("x=1"));
        assert_eq!(
            header.resource_components(),
            vec!["core", "subscribers", "001010000000001"]
        );

        let root = SbiHeader::with_method_uri("GET", "/core/");
        assert_eq!(root.resource_components(), vec!["core"]);
        assert_eq!(root.query(), None);
    }

    #[test]
    fn test_sbi_request() {
        let request = SbiRequest::get("/test")
            .with_param("key", "value")
            .with_header("Accept", "application/json");

        assert_eq!(request.header.method, "GET");
        assert_eq!(request.http.get_param("key"), Some(&"value".to_string()));
        assert_eq!(
            request.http.get_header("accept"),
            Some(&"application/json".to_string())
        );
    }

    #[test]
    fn test_sbi_response() {
        let response = SbiResponse::ok()
            .with_body(r#"{"status":"ok"}"#, "application/json");

        assert!(response.is_success());
        assert_eq!(response.status, 200);

        let body: serde_json::Value = response.json_body().unwrap();
        assert_eq!(body["status"], "ok");
    }

    #[test]
    fn test_problem_details() {
        let problem = ProblemDetails::with_status(422)
            .with_title("Unprocessable Entity")
            .with_detail("Invalid IMSI")
            .with_invalid_param(InvalidParam::new("imsi", "expected 14 or 15 digits"));

        let json = serde_json::to_value(&problem).unwrap();
        assert_eq!(json["status"], 422);
        assert_eq!(json["invalidParams"][0]["param"], "imsi");
        assert!(json.get("type").is_none());
    }
}
