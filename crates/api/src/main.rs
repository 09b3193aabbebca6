//! Sprain/Strain Knowledge Server - Main Entry Point
//!
//! `lesiones-server` runs the HTTP API; `lesiones-server seed` loads the demo
//! case into the configured graph database and exits.

use anyhow::Context;
use api::{init_logging, run_server, AppConfig};
use graph_store::Neo4jHttpStore;
use scoring::seed_demo_case;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("Failed to load configuration")?;
    init_logging(&config.logging)?;

    info!("=== Lesiones API v{} ===", env!("CARGO_PKG_VERSION"));

    if std::env::args().nth(1).as_deref() == Some("seed") {
        let store = Neo4jHttpStore::new(config.graph.clone())?;
        let statements = seed_demo_case(&store)
            .await
            .context("Failed to seed demo case")?;
        info!("Seed complete: {} statements", statements);
        return Ok(());
    }

    run_server(config).await?;

    Ok(())
}
