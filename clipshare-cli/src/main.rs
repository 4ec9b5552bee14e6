use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use clipshare_core::RoomId;
use clipshare_server::ServerConfig;
use colored::*;
use std::net::SocketAddr;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "clipshare")]
#[command(about = "Room broker for peer-to-peer clipboard and file sharing")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the signaling broker.
    Serve {
        /// Overrides CLIPSHARE_BIND_ADDRESS.
        #[arg(long)]
        bind: Option<SocketAddr>,

        /// Log filter, overrides CLIPSHARE_LOG. RUST_LOG wins over both.
        #[arg(long)]
        log: Option<String>,
    },

    /// Print a fresh room code.
    Code,
}

fn main() -> Result<()> {
    match Cli::parse().command {
        Commands::Serve { bind, log } => {
            let mut config = ServerConfig::from_env().context("Invalid configuration")?;
            if let Some(bind) = bind {
                config.bind_address = bind;
            }
            if let Some(log) = log {
                config.log_filter = log;
            }
            serve(config)
        }
        Commands::Code => {
            println!("{}", RoomId::generate().as_str().bold());
            Ok(())
        }
    }
}

fn serve(config: ServerConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .context("Invalid log filter")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    println!("{}", "🚀 Starting clipshare broker...".green().bold());
    println!("   🔌 WebSocket: ws://{}/ws", config.bind_address);
    println!("   ❤️  Health:    http://{}/health", config.bind_address);
    println!(
        "   🧊 ICE:       {} server(s)",
        config.ice_servers.len().to_string().cyan()
    );

    let runtime = tokio::runtime::Runtime::new().context("Failed to start tokio runtime")?;
    runtime.block_on(clipshare_server::serve(config))?;

    println!("{}", "Broker stopped".yellow());
    Ok(())
}
