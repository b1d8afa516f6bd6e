//! XRPC client implementation
//!
//! This module implements the XRPC request/response protocol used by
//! AT Protocol services: request building, error handling, and the
//! reqwest-backed HTTP client.
//!
//! The client is deliberately retry-free. Every call is made exactly
//! once; callers that cannot tolerate a failure abort instead of
//! retrying.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

// =============================================================================
// Error Types
// =============================================================================

/// XRPC error with HTTP status and message
///
/// Represents errors returned from XRPC endpoints, covering both
/// network failures (status 0) and application-level errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XrpcError {
    /// HTTP status code (0 when the request never reached the server)
    status: u16,
    /// Error code (e.g., "InvalidRequest", "NotFound")
    error: String,
    /// Human-readable error message
    message: String,
}

impl XrpcError {
    /// Create a new XRPC error
    pub fn new(status: u16, error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            error: error.into(),
            message: message.into(),
        }
    }

    /// Get the HTTP status code
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Get the error code
    pub fn error(&self) -> &str {
        &self.error
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Check if this error came from an authentication failure
    pub fn is_auth_error(&self) -> bool {
        self.status == 401 || self.error == "AuthenticationRequired"
    }
}

impl std::fmt::Display for XrpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "XRPC error {}: {} - {}",
            self.status, self.error, self.message
        )
    }
}

impl std::error::Error for XrpcError {}

/// Standard XRPC error response body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XrpcErrorResponse {
    /// Error code
    pub error: String,
    /// Error message
    pub message: String,
}

// =============================================================================
// Request Types
// =============================================================================

/// HTTP method for XRPC requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    /// GET request (used for queries)
    Get,
    /// POST request (used for procedures)
    Post,
}

/// XRPC request parameters
///
/// A request to an XRPC endpoint: method, NSID, query parameters,
/// headers, and optional JSON body.
#[derive(Debug, Clone)]
pub struct XrpcRequest {
    /// HTTP method
    pub method: HttpMethod,
    /// NSID path (e.g., "app.bsky.graph.getListBlocks")
    pub nsid: String,
    /// Query parameters
    pub params: HashMap<String, String>,
    /// Request headers
    pub headers: HashMap<String, String>,
    /// Request body (for POST)
    pub body: Option<Vec<u8>>,
}

impl XrpcRequest {
    /// Create a new GET request (query)
    pub fn query(nsid: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            nsid: nsid.into(),
            params: HashMap::new(),
            headers: HashMap::new(),
            body: None,
        }
    }

    /// Create a new POST request (procedure)
    pub fn procedure(nsid: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Post,
            nsid: nsid.into(),
            params: HashMap::new(),
            headers: HashMap::new(),
            body: None,
        }
    }

    /// Add a query parameter
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Add a header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Set the request body from a JSON-serializable value
    pub fn json_body<T: Serialize>(mut self, value: &T) -> Result<Self, serde_json::Error> {
        self.body = Some(serde_json::to_vec(value)?);
        Ok(self)
    }
}

// =============================================================================
// Response Types
// =============================================================================

/// XRPC response with headers and typed data
#[derive(Debug, Clone)]
pub struct XrpcResponse<T> {
    /// HTTP status code
    pub status: u16,
    /// Response headers
    pub headers: HashMap<String, String>,
    /// Response data
    pub data: T,
}

impl<T> XrpcResponse<T> {
    /// Create a new response
    pub fn new(status: u16, headers: HashMap<String, String>, data: T) -> Self {
        Self {
            status,
            headers,
            data,
        }
    }

    /// Get a header value
    pub fn header(&self, key: &str) -> Option<&String> {
        self.headers.get(key)
    }
}

// =============================================================================
// Client Configuration
// =============================================================================

/// Configuration for the XRPC client
#[derive(Debug, Clone)]
pub struct XrpcClientConfig {
    /// Base service URL (e.g., "https://bsky.social")
    pub service_url: String,
    /// Request timeout
    pub timeout: Duration,
    /// User agent string
    pub user_agent: String,
}

impl Default for XrpcClientConfig {
    fn default() -> Self {
        Self {
            service_url: "https://bsky.social".to_string(),
            timeout: Duration::from_secs(30),
            user_agent: format!("modlist-audit/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl XrpcClientConfig {
    /// Create a new config with a service URL
    pub fn new(service_url: impl Into<String>) -> Self {
        Self {
            service_url: service_url.into(),
            ..Default::default()
        }
    }

    /// Set the timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

// =============================================================================
// Client
// =============================================================================

use reqwest::{Client as ReqwestClient, Response as ReqwestResponse};

/// XRPC client for making requests to AT Protocol services
///
/// Wraps a reqwest client and maps `{service}/xrpc/{nsid}` endpoints
/// to typed requests and responses. The client holds the bearer token
/// for the active session, if any; a clone carries the token it was
/// made with, and later changes to either side stay local.
#[derive(Debug, Clone)]
pub struct XrpcClient {
    /// HTTP client
    client: ReqwestClient,
    /// Configuration
    config: XrpcClientConfig,
    /// Authorization header value for authenticated requests
    auth_header: Option<String>,
}

impl XrpcClient {
    /// Create a new XRPC client
    pub fn new(config: XrpcClientConfig) -> Self {
        let client = ReqwestClient::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            config,
            auth_header: None,
        }
    }

    /// Set or clear the Authorization header sent with every request
    pub fn set_auth_header(&mut self, value: Option<String>) {
        self.auth_header = value;
    }

    /// Whether the client currently carries an Authorization header
    pub fn is_authenticated(&self) -> bool {
        self.auth_header.is_some()
    }

    /// Make a query request (GET)
    pub async fn query<T>(&self, request: XrpcRequest) -> Result<XrpcResponse<T>, XrpcError>
    where
        T: for<'de> Deserialize<'de>,
    {
        self.execute_request(request).await
    }

    /// Make a procedure request (POST)
    pub async fn procedure<T>(&self, request: XrpcRequest) -> Result<XrpcResponse<T>, XrpcError>
    where
        T: for<'de> Deserialize<'de>,
    {
        self.execute_request(request).await
    }

    /// Execute an XRPC request
    async fn execute_request<T>(&self, request: XrpcRequest) -> Result<XrpcResponse<T>, XrpcError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let url = format!("{}/xrpc/{}", self.config.service_url, request.nsid);

        let mut req = match request.method {
            HttpMethod::Get => self.client.get(&url),
            HttpMethod::Post => self.client.post(&url),
        };

        for (key, value) in &request.params {
            req = req.query(&[(key, value)]);
        }

        if let Some(auth) = &self.auth_header {
            req = req.header("Authorization", auth);
        }

        for (key, value) in &request.headers {
            req = req.header(key, value);
        }

        if let Some(body) = &request.body {
            req = req.header("Content-Type", "application/json").body(body.clone());
        }

        let response = req
            .send()
            .await
            .map_err(|e| XrpcError::new(0, "NetworkError", format!("Request failed: {}", e)))?;

        self.parse_response(response).await
    }

    /// Parse a reqwest response into an XrpcResponse
    async fn parse_response<T>(
        &self,
        response: ReqwestResponse,
    ) -> Result<XrpcResponse<T>, XrpcError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let status = response.status().as_u16();

        let mut headers = HashMap::new();
        for (key, value) in response.headers() {
            if let Ok(value_str) = value.to_str() {
                headers.insert(key.to_string(), value_str.to_string());
            }
        }

        if !response.status().is_success() {
            let error_body = response.text().await.unwrap_or_default();

            if let Ok(error_response) = serde_json::from_str::<XrpcErrorResponse>(&error_body) {
                return Err(XrpcError::new(
                    status,
                    error_response.error,
                    error_response.message,
                ));
            }
            return Err(XrpcError::new(
                status,
                "Unknown",
                format!("HTTP {}: {}", status, error_body),
            ));
        }

        let body = response
            .text()
            .await
            .map_err(|e| XrpcError::new(0, "ParseError", format!("Failed to read response: {}", e)))?;

        let data: T = serde_json::from_str(&body)
            .map_err(|e| XrpcError::new(0, "ParseError", format!("Failed to parse JSON: {}", e)))?;

        Ok(XrpcResponse::new(status, headers, data))
    }

    /// Get the client configuration
    pub fn config(&self) -> &XrpcClientConfig {
        &self.config
    }

    /// Get the service URL
    pub fn service_url(&self) -> &str {
        &self.config.service_url
    }
}

// =============================================================================
// Tests
// =============================================================================
