//! Guild Permission Inspector - Main Entry Point
//!
//! Resolves one member's effective permissions from an exported snapshot.

use anyhow::{Context, Result};
use tracing::info;

use guild_perms::config::{Config, LogFormat};
use guild_perms::inspect;

fn main() -> Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_new(&config.log_filter)
        .unwrap_or_else(|_| "guild_perms=info".into());
    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .init(),
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .pretty()
            .init(),
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        snapshot = %config.snapshot_path.display(),
        member_id = %config.member_id,
        "Inspecting member permissions"
    );

    let bundle = inspect::load_bundle(&config.snapshot_path)?;
    let report = inspect::inspect(&bundle, config.member_id, config.channel_id)
        .context("Permission resolution failed")?;

    info!(raw = report.raw, "Resolved permissions");
    println!(
        "{}",
        serde_json::to_string_pretty(&report).context("Failed to encode report")?
    );

    Ok(())
}
