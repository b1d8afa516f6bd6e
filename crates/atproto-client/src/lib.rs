//! AT Protocol client library
//!
//! This crate provides the slice of an AT Protocol client that the
//! modlist audit needs: the XRPC transport, password-based login via
//! `com.atproto.server.createSession`, and the resulting session data.
//!
//! Token refresh, rate limiting, and retry policy are intentionally out
//! of scope here; the audit makes a single short-lived authenticated
//! pass over the API.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod agent;
pub mod session;
pub mod xrpc;

pub use agent::{AgentError, BskyAgent};
pub use session::AtpSessionData;
pub use xrpc::{XrpcClient, XrpcClientConfig, XrpcError, XrpcRequest, XrpcResponse};
