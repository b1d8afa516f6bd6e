//! AT Protocol session data
//!
//! The audit holds exactly one session for the duration of a run, so
//! this module carries only the active-session structure returned by
//! `com.atproto.server.createSession`. There is no persistence and no
//! refresh flow; a run that outlives its access token simply fails.

use serde::{Deserialize, Serialize};

/// Active session data used by the agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AtpSessionData {
    /// Access JWT token for authenticated requests
    pub access_jwt: String,

    /// Refresh JWT token (unused by the audit, returned by the server)
    pub refresh_jwt: String,

    /// The user's DID
    pub did: String,

    /// The user's handle
    pub handle: String,

    /// The user's email address (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Whether the session is active
    #[serde(default = "default_active")]
    pub active: bool,

    /// Account status (e.g., "takendown", "suspended", "deactivated")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

fn default_active() -> bool {
    true
}
