mod runtime;

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use robowarehouse_config::WarehouseConfig;
use robowarehouse_logging::init_logger;
use robowarehouse_vision::decode_upload;

#[derive(Parser)]
#[command(name = "robowarehouse")]
#[command(about = "RoboWarehouse: photo-based inventory intake")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP intake server
    Serve {
        /// Port to bind the HTTP server to
        #[arg(short, long)]
        port: Option<u16>,
        /// Path to config.yaml
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Check whether a local server is up
    Status {
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Recognize the label in one image without storing anything
    Scan {
        /// Image file to read
        image: PathBuf,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Print the effective configuration as YAML
    Config {
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port, config } => {
            let loaded = runtime::load_config(config).await?;
            init_logger(&runtime::log_settings(&loaded.config))?;
            loaded.log_warnings();

            let mut config = loaded.config;
            if let Some(port) = port {
                config.server.port = port;
            }
            run_server(config).await?;
        }
        Commands::Status { port } => {
            let loaded = runtime::load_config(None).await?;
            let port = port.unwrap_or(loaded.config.server.port);
            let client = reqwest::Client::new();
            match client.get(format!("http://localhost:{port}/")).send().await {
                Ok(resp) => {
                    let body: serde_json::Value = resp.json().await?;
                    println!("{}", serde_json::to_string_pretty(&body)?);
                }
                Err(_) => {
                    println!("RoboWarehouse is not running on port {port}");
                }
            }
        }
        Commands::Scan { image, config } => {
            let loaded = runtime::load_config(config).await?;
            init_logger(&runtime::log_settings(&loaded.config))?;
            loaded.log_warnings();
            scan_file(&loaded.config, image).await?;
        }
        Commands::Config { config } => {
            let loaded = runtime::load_config(config).await?;
            for warning in &loaded.warnings {
                eprintln!("warning: {warning}");
            }
            print!("{}", serde_yaml::to_string(&loaded.config)?);
        }
    }

    Ok(())
}

async fn run_server(config: WarehouseConfig) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.bind_address, config.server.port)
        .parse()
        .with_context(|| format!("Invalid bind address: {}", config.server.bind_address))?;

    info!(
        port = config.server.port,
        bind = %config.server.bind_address,
        db = %config.storage.db_path,
        engine = %config.ocr.engine,
        "Starting RoboWarehouse"
    );

    let state = runtime::build_state(&config)?;
    robowarehouse_gateway::start_server(addr, state).await
}

async fn scan_file(config: &WarehouseConfig, image: PathBuf) -> Result<()> {
    let bytes = tokio::fs::read(&image)
        .await
        .with_context(|| format!("Failed to read {}", image.display()))?;
    let normalized = decode_upload(&bytes)?;
    let recognition = runtime::build_recognizer(config)
        .recognize(&normalized.png_bytes)
        .await?;
    println!("{}", serde_json::to_string_pretty(&recognition)?);
    Ok(())
}
