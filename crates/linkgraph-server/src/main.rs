//! linkgraph binary
//!
//! Runs one overview pass over the configured store and prints it as JSON.
//!
//! # Usage
//!
//! ```bash
//! # With config file
//! linkgraph --config linkgraph.yaml
//!
//! # With environment variables only
//! LINKGRAPH_LOGGING__LEVEL=debug linkgraph
//! ```

use clap::Parser;
use tracing::info;

use linkgraph_domain::LoaderConfig;
use linkgraph_server::{init_logging, seed_demo_data, GraphService, LoggingConfig, ServerConfig};
use linkgraph_storage::MemoryDataStore;

/// linkgraph - batched social graph queries
#[derive(Parser, Debug)]
#[command(name = "linkgraph")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file (YAML)
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = if let Some(config_path) = args.config {
        ServerConfig::load(&config_path)?
    } else {
        ServerConfig::from_env()?
    };

    init_logging(LoggingConfig::from(&config.logging));
    info!(version = env!("CARGO_PKG_VERSION"), "starting linkgraph");

    // "memory" is the only backend validate() accepts
    info!(backend = %config.storage.backend, "using in-memory storage backend");
    let service = GraphService::new(
        MemoryDataStore::new_shared(),
        LoaderConfig::from(&config.loader),
    );

    if config.storage.seed_demo_data {
        seed_demo_data(&service.mutations()).await?;
    }

    let pass = service.begin_pass();
    let overview = service.network_overview(&pass).await?;
    println!("{}", serde_json::to_string_pretty(&overview)?);

    Ok(())
}
