//! Dual-protocol API server.
//!
//! # Architecture Overview
//!
//! ```text
//!                       ┌──────────────────────────────────────────────────────┐
//!                       │                     ms-project                        │
//!                       │                                                       │
//!   RPC (h2) ───┐       │  ┌──────────┐   ┌─────────┐   ┌────────────────────┐ │
//!               ├───────┼─▶│ listener │──▶│  demux  │─┬▶│ tonic server (grpc)│─┐
//!   JSON (h1) ──┘       │  │ (+TLS)   │   │ classify│ │ └────────────────────┘ │
//!                       │  └──────────┘   └─────────┘ │ ┌────────────────────┐ │
//!                       │                             └▶│ axum gateway (http)│─┤
//!                       │                               └────────────────────┘ │
//!                       │                                                    ▼ │
//!                       │  ┌─────────────────────────────────────────────────┐ │
//!                       │  │ rpc::InterceptorChain                            │ │
//!                       │  │   authorize → rate limit → handler → observers   │ │
//!                       │  └──────────────────────┬──────────────────────────┘ │
//!                       │                         ▼                            │
//!                       │  ┌─────────────────────────────────────────────────┐ │
//!                       │  │ services: accounts, catalog, login, ping         │ │
//!                       │  └─────────────────────────────────────────────────┘ │
//!                       └──────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use ms_project::config::{load_config, ServerConfig};
use ms_project::lifecycle::{shutdown_signal, Endpoint};
use ms_project::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "ms-project", version)]
#[command(about = "Dual-protocol (binary RPC + JSON) API server", long_about = None)]
struct Cli {
    /// Log request metadata for every call
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Run {
        #[arg(short, long, default_value = "config.toml")]
        config: PathBuf,
    },
    /// Load and validate a configuration file, then exit
    CheckConfig {
        #[arg(short, long, default_value = "config.toml")]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::CheckConfig { config } => {
            load_config(&config)?;
            println!("{}: ok", config.display());
            Ok(())
        }
        Commands::Run { config } => {
            let mut config = load_config(&config)?;
            config.observability.verbose |= cli.verbose;
            run(config).await
        }
    }
}

async fn run(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    logging::init(&config.observability.log_level);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "ms-project starting");

    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_connections = config.listener.max_connections,
        tls = config.listener.tls.is_some(),
        rate_limit_quota = config.rate_limit.quota,
        rate_limit_window_secs = config.rate_limit.window_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        // validated at load time
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        }
    }

    let endpoint = Endpoint::new(config).await?.bind().await?;
    let handle = endpoint.handle();
    tokio::spawn(async move {
        shutdown_signal().await;
        handle.trigger();
    });

    endpoint.run().await?;
    tracing::info!("Shutdown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn prints_version() {
        let err = Cli::try_parse_from(["ms-project", "--version"]).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::DisplayVersion);
    }

    #[test]
    fn verbose_flag_is_global() {
        let cli = Cli::try_parse_from(["ms-project", "run", "--verbose", "-c", "dev.toml"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Run { config } if config == PathBuf::from("dev.toml")));
    }
}
