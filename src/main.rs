//! rolld - dice rolling server daemon

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use rolld::{Config, Server};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Dice rolling server
#[derive(Parser, Debug)]
#[command(name = "rolld", version, about = "Roll batches of dice over HTTP and WebSocket")]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on
    #[arg(short, long)]
    bind: Option<SocketAddr>,

    /// Seed the dice for reproducible results
    #[arg(long)]
    seed: Option<u64>,

    /// Most dice a single batch may draw
    #[arg(long)]
    max_dice: Option<u64>,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,
}

// One request at a time: a single-threaded runtime, and the die source
// lock serializes batches across connections.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "rolld=info,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);
    if args.json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    let mut config = Config::load(args.config.as_deref()).context("failed to load configuration")?;
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    if let Some(max_dice) = args.max_dice {
        config.max_dice = max_dice;
    }
    config.validate().context("invalid configuration")?;
    info!("starting rolld with {:?}", config);

    let server = Server::new(config);
    server.run().await?;

    Ok(())
}
