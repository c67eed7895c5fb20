use anyhow::{Context, Result};
use clap::Parser;
use pttbot::{Config, Engine, Protocol, parse_file};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "pttbot",
    about = "Run a pttbot script against a PTT host",
    version
)]
struct Args {
    /// Path to the script file
    #[arg(short, long)]
    script: PathBuf,

    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured host
    #[arg(long)]
    host: Option<String>,

    /// Override the configured port
    #[arg(long)]
    port: Option<u16>,

    /// Connect through a WebSocket gateway at this URL
    #[arg(long)]
    url: Option<String>,

    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "pttbot=debug" } else { "pttbot=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(url) = args.url {
        config.url = url;
        config.protocol = Protocol::WebSocket;
    }
    config.validate().context("Invalid configuration")?;

    let commands = parse_file(&args.script)
        .with_context(|| format!("Failed to parse script file: {}", args.script.display()))?;

    info!(endpoint = %config.endpoint(), "starting");
    let mut engine = Engine::connect(config)
        .await
        .context("Failed to start engine")?;

    engine
        .execute(commands)
        .await
        .context("Failed to execute script")?;

    Ok(())
}
