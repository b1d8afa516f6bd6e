//! Core logic for the moderation-list follow audit
//!
//! This crate implements the audit pipeline: collect the account's
//! blocked and muted moderation lists, gather their members, lift the
//! list blocks long enough to read the full follow graph, restore the
//! blocks, and report which followed accounts sit on those lists.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod audit;
pub mod collect;
pub mod config;
pub mod graph;
pub mod report;
pub mod testing;
pub mod toggle;

pub use audit::{run_audit, AuditError};
pub use config::AuditConfig;
pub use graph::{GraphApi, XrpcGraphApi};
pub use report::OverlapReport;
