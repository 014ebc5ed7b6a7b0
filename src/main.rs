//! govsearch - Main Entry Point
//!
//! Boots the tool server: loads configuration, resolves the provider
//! credential, wires the shared rate budget into the provider client and
//! tool registry, and serves the request/response protocol over stdio.

use clap::{Parser, Subcommand};
use govsearch::config::ServerConfig;
use govsearch::observability::{init_default_logging, HealthServer};
use govsearch::provider::budget::{Clock, RateBudget, SystemClock};
use govsearch::provider::client::{ProviderClient, ProviderClientConfig};
use govsearch::server::ToolServer;
use govsearch::tools::ToolRegistry;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info};

/// Federal procurement search tools over the HigherGov API
#[derive(Parser)]
#[command(name = "govsearch")]
#[command(about = "Federal procurement search tool server")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the tool server on stdio
    Run,
    /// Validate configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_default_logging();

    info!("Starting govsearch v{}", env!("CARGO_PKG_VERSION"));

    let config = match load_configuration(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Run => run_server(config).await,
        Commands::Config { show } => handle_config_command(config, show),
    };

    if let Err(e) = result {
        error!("Command failed: {}", e);
        process::exit(1);
    }

    info!("Shutdown complete");
}

fn load_configuration(
    config_path: &Option<PathBuf>,
) -> Result<ServerConfig, Box<dyn std::error::Error>> {
    match config_path {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            Ok(ServerConfig::load_from_file(path)?)
        }
        None => {
            // Try default locations; every knob has a default, so a missing
            // file just means stock settings
            let default_paths = vec!["govsearch.toml", "config/govsearch.toml"];

            for path_str in default_paths {
                let path = PathBuf::from(path_str);
                if path.exists() {
                    info!("Loading configuration from: {}", path.display());
                    return Ok(ServerConfig::load_from_file(&path)?);
                }
            }

            info!("No configuration file found, using defaults");
            Ok(ServerConfig::default())
        }
    }
}

/// Bootstrap factory - builds the server with injected dependencies
fn build_server(
    config: &ServerConfig,
) -> Result<(ToolServer, Arc<RateBudget>), Box<dyn std::error::Error>> {
    // The credential check happens here, at startup, never at call time
    let api_key = config.resolve_api_key()?;

    let budget = Arc::new(RateBudget::new(
        config.limits.requests_per_second,
        config.limits.requests_per_day,
    ));

    let client_config = ProviderClientConfig {
        api_key,
        base_url: config.provider.base_url.clone(),
        timeout: Duration::from_secs(config.provider.request_timeout_secs),
        policy: config.limits.on_exhaustion,
    };
    let client = Arc::new(ProviderClient::new(client_config, budget.clone())?);

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let registry = Arc::new(ToolRegistry::with_default_tools(
        client,
        clock,
        Duration::from_secs(config.limits.invocation_timeout_secs),
    )?);

    Ok((ToolServer::new(registry), budget))
}

async fn run_server(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let (server, budget) = build_server(&config)?;

    if config.health.enabled {
        let health_server = Arc::new(HealthServer::new(config.health.port, budget));
        tokio::spawn(async move {
            if let Err(e) = health_server.start().await {
                error!("Health server error: {}", e);
            }
        });
    }

    let mut sigint = signal::unix::signal(signal::unix::SignalKind::interrupt())?;
    let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())?;

    info!("Serving tool calls on stdio");

    // Dropping the serve future on a signal aborts in-flight invocations,
    // which is exactly the cancellation contract
    tokio::select! {
        result = server.serve(tokio::io::stdin(), tokio::io::stdout()) => {
            result?;
            info!("Input closed, shutting down");
        }
        _ = sigint.recv() => {
            info!("Received SIGINT, shutting down");
        }
        _ = sigterm.recv() => {
            info!("Received SIGTERM, shutting down");
        }
    }

    Ok(())
}

fn handle_config_command(
    config: ServerConfig,
    show: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if show {
        println!("{}", toml::to_string_pretty(&config)?);
    }

    // Credential presence is part of a valid configuration
    config.resolve_api_key()?;

    info!("Configuration validation complete");
    Ok(())
}
