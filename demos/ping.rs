//! Ping a running Piccolo Editor.
//!
//! Demonstrates:
//! - Configuring the bridge
//! - Verifying the editor with the liveness probe
//! - Sending a command and printing its result
//!
//! Usage:
//!   cargo run --example ping
//!   PICCOLO_PORT=6400 cargo run --example ping

// ============================================================================
// Imports
// ============================================================================

use anyhow::{Context, Result};
use piccolo_bridge::{BridgeConfig, ConnectionManager};
use tracing_subscriber::EnvFilter;

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run().await {
        eprintln!("\n[ERROR] {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    println!("=== ping: Editor liveness ===\n");

    let port = std::env::var("PICCOLO_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(6400);

    let config = BridgeConfig::new().with_host("127.0.0.1").with_port(port);
    println!("[1] Connecting to editor at {}...", config.address());

    let manager = ConnectionManager::new(config);

    let ack = manager
        .ping()
        .await
        .context("is the Piccolo Editor running?")?;
    println!("    ✓ Editor answered: {ack}\n");

    println!("[2] Sending add_cube...");
    let result = manager
        .send_command("add_cube", None)
        .await
        .context("add_cube command failed")?;
    println!("    ✓ Result: {result}\n");

    manager.disconnect().await;
    println!("=== Done ===");

    Ok(())
}
