//! Runtime configuration
//!
//! Credentials and service location come from the environment; the
//! binary loads a `.env` file first, so either works. App passwords
//! are never logged.

use std::env;
use thiserror::Error;

/// Service used when `MODLIST_AUDIT_SERVICE` is not set
pub const DEFAULT_SERVICE: &str = "https://bsky.social";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable is unset or empty
    #[error("required environment variable {0} is not set")]
    MissingVar(&'static str),
}

/// Settings for one audit run
#[derive(Debug, Clone)]
pub struct AuditConfig {
    /// Account identifier (handle or DID) to sign in with
    pub identifier: String,
    /// App password for the account
    pub app_password: String,
    /// Base URL of the PDS to talk to
    pub service: String,
}

impl AuditConfig {
    /// Load configuration from the environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            identifier: require("MODLIST_AUDIT_IDENTIFIER")?,
            app_password: require("MODLIST_AUDIT_APP_PASSWORD")?,
            service: env::var("MODLIST_AUDIT_SERVICE")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| DEFAULT_SERVICE.to_string()),
        })
    }
}

/// Read a required variable, treating empty as unset
fn require(name: &'static str) -> Result<String, ConfigError> {
    env::var(name)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::MissingVar(name))
}
