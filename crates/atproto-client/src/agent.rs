//! BskyAgent - authenticated client for Bluesky/AT Protocol
//!
//! The agent authenticates against a PDS with an identifier and an
//! app password, holds the resulting session, and exposes the
//! authenticated XRPC client for callers that issue their own calls.
//!
//! # Example
//!
//! ```rust,no_run
//! use atproto_client::BskyAgent;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut agent = BskyAgent::new("https://bsky.social");
//!     agent.login("alice.bsky.social", "app-password").await?;
//!     println!("Logged in as {}", agent.did().unwrap());
//!     Ok(())
//! }
//! ```

use crate::session::AtpSessionData;
use crate::xrpc::{XrpcClient, XrpcClientConfig, XrpcError, XrpcRequest};
use serde::Serialize;
use thiserror::Error;
use tracing::info;

/// Errors that can occur during agent operations
#[derive(Debug, Error)]
pub enum AgentError {
    /// XRPC error
    #[error("XRPC error: {0}")]
    Xrpc(#[from] XrpcError),

    /// No active session
    #[error("No active session - please login first")]
    NoSession,

    /// Serialization error building a request
    #[error("Request serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for agent operations
pub type Result<T> = std::result::Result<T, AgentError>;

/// Login request parameters for `com.atproto.server.createSession`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginRequest {
    /// User identifier (handle or email)
    identifier: String,
    /// App password
    password: String,
}

/// Agent for interacting with an AT Protocol service
///
/// Holds the service URL, the XRPC client, and the active session.
/// The audit runs on a single logical thread, so the session is plain
/// owned state behind `&mut self` rather than shared behind a lock.
pub struct BskyAgent {
    /// Service URL (PDS)
    service: String,
    /// XRPC client; carries the bearer token once logged in
    client: XrpcClient,
    /// Current session data
    session: Option<AtpSessionData>,
}

impl BskyAgent {
    /// Create a new agent with default configuration
    ///
    /// # Arguments
    ///
    /// * `service` - The PDS service URL (e.g., "https://bsky.social")
    pub fn new(service: impl Into<String>) -> Self {
        let service = service.into();
        let config = XrpcClientConfig::new(service.clone());
        Self::with_config(service, config)
    }

    /// Create a new agent with a custom XRPC configuration
    pub fn with_config(service: impl Into<String>, config: XrpcClientConfig) -> Self {
        Self {
            service: service.into(),
            client: XrpcClient::new(config),
            session: None,
        }
    }

    /// Login to the service with an identifier and app password
    ///
    /// On success the agent holds the session and the underlying
    /// client sends the access token with every subsequent request.
    pub async fn login(
        &mut self,
        identifier: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<AtpSessionData> {
        let request = LoginRequest {
            identifier: identifier.into(),
            password: password.into(),
        };

        let xrpc_request =
            XrpcRequest::procedure("com.atproto.server.createSession").json_body(&request)?;

        let session: AtpSessionData = self
            .client
            .procedure(xrpc_request)
            .await
            .map(|r| r.data)?;

        self.client
            .set_auth_header(Some(format!("Bearer {}", session.access_jwt)));
        info!(handle = %session.handle, did = %session.did, "session created");

        self.session = Some(session.clone());
        Ok(session)
    }

    /// Logout and clear the session
    pub fn logout(&mut self) {
        self.session = None;
        self.client.set_auth_header(None);
    }

    /// Get the current session data
    pub fn session(&self) -> Option<&AtpSessionData> {
        self.session.as_ref()
    }

    /// Check if there's an active session
    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    /// Get the current user's DID
    pub fn did(&self) -> Option<String> {
        self.session.as_ref().map(|s| s.did.clone())
    }

    /// Get the current user's handle
    pub fn handle(&self) -> Option<String> {
        self.session.as_ref().map(|s| s.handle.clone())
    }

    /// Get the service URL
    pub fn service(&self) -> &str {
        &self.service
    }

    /// Get the XRPC client (authenticated after login)
    pub fn client(&self) -> &XrpcClient {
        &self.client
    }
}
