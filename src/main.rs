//! Moderation-list follow audit
//!
//! Signs in with an app password, enumerates the account's blocked and
//! muted moderation lists, temporarily lifts the list blocks to read
//! the full follow graph, restores the blocks, and prints which
//! followed accounts sit on those lists.

use anyhow::Context;
use atproto_client::BskyAgent;
use audit_core::graph::XrpcGraphApi;
use audit_core::toggle::SETTLE_DELAY;
use audit_core::{run_audit, AuditConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AuditConfig::from_env().context("loading configuration")?;

    let mut agent = BskyAgent::new(&config.service);
    let session = agent
        .login(&config.identifier, &config.app_password)
        .await
        .context("signing in")?;
    info!(handle = %session.handle, "signed in");

    let api = XrpcGraphApi::new(agent.client().clone(), session.did.clone());
    let report = run_audit(&api, Some(session.did), SETTLE_DELAY)
        .await
        .context("running audit")?;

    print!("{report}");
    Ok(())
}
