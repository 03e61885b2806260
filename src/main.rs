use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use memoryos::{cli, config, server};

#[derive(Parser)]
#[command(name = "memoryos", version, about = "Personal memory dashboard backend")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the HTTP API server
    Serve {
        /// Bind address (overrides config)
        #[arg(long)]
        host: Option<String>,
        /// Port (overrides config)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Check database health and provider configuration
    Doctor,
    /// Print memory analytics
    Stats {
        /// Histogram window: week, month, year, or all
        #[arg(long)]
        range: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    // A missing .env is normal.
    let _ = dotenvy::dotenv();

    let mut config = config::MemoryOsConfig::load()?;

    // Log to stderr so stdout stays clean for CLI output.
    let filter = EnvFilter::try_new(&config.server.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match args.command {
        Command::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            server::serve(config).await?;
        }
        Command::Doctor => cli::doctor(&config)?,
        Command::Stats { range } => cli::stats(&config, range.as_deref()).await?,
    }

    Ok(())
}
