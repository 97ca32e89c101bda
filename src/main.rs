//! GraphQL Cache Proxy
//!
//! A caching reverse proxy in front of one upstream GraphQL endpoint, built
//! with Tokio and Axum.
//!
//! # Architecture Overview
//!
//! ```text
//!                  ┌──────────────────────────────────────────────────────┐
//!                  │                  GRAPHQL CACHE PROXY                 │
//!                  │                                                      │
//!   POST /graphql  │  ┌─────────┐   ┌─────────┐   ┌──────────────────┐    │
//!  ────────────────┼─▶│  http   │──▶│ routing │──▶│ graphql handler  │────┼──▶ Upstream
//!                  │  │ server  │   │classify │   │ cache → upstream │◀───┼─── GraphQL
//!   OPTIONS *      │  └─────────┘   └────┬────┘   └────────┬─────────┘    │
//!  ────────────────┼─────────────────────┤                 │              │
//!                  │                     ▼                 ▼              │
//!                  │               ┌──────────┐     ┌────────────┐        │
//!                  │               │   cors   │     │   cache    │◀───────┼──▶ Redis
//!                  │               │ preflight│     │redis/memory│        │
//!                  │               └──────────┘     └────────────┘        │
//!                  │                                                      │
//!                  │  config · observability · lifecycle                  │
//!                  └──────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use graphql_cache_proxy::config::{loader, Overrides};
use graphql_cache_proxy::lifecycle::{signals, startup, Shutdown};
use graphql_cache_proxy::observability::{logging, metrics};

#[derive(Debug, Parser)]
#[command(name = "graphql-cache-proxy", version)]
#[command(about = "Caching reverse proxy for a GraphQL endpoint", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long, env = "GRAPHQL_PROXY_CONFIG")]
    config: Option<PathBuf>,

    #[command(flatten)]
    overrides: Overrides,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Deployment settings may come from a .env file; load it before clap reads the environment.
    let dotenv = loader::load_dotenv();
    let cli = Cli::parse();

    let config = loader::load(cli.config.as_deref(), &cli.overrides)?;

    logging::init(&config);
    loader::log_dotenv(&dotenv);
    tracing::info!(environment = %config.environment, "graphql-cache-proxy starting");

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let bind_address = config.listener.bind_address.clone();
    let server = startup::build_server(config).await?;

    let listener = TcpListener::bind(&bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        signals::wait_for_signal().await;
        shutdown.trigger();
    });

    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
