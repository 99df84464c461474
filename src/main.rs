//! crashlab server binary.
//!
//! Loads configuration (file, environment, CLI flags, in increasing
//! precedence) and runs the API server.

use clap::Parser;
use crashlab::api::ApiServer;
use crashlab::config::ConfigLoader;

#[derive(Parser, Debug)]
#[command(name = "crashlab")]
#[command(about = "Crash-game trading simulator server", long_about = None)]
struct Args {
    /// Path to a TOML configuration file
    #[arg(long)]
    config: Option<String>,

    /// Server host (overrides config)
    #[arg(long)]
    host: Option<String>,

    /// Server port (overrides config)
    #[arg(long)]
    port: Option<u16>,

    /// Allowed CORS origins (comma-separated, use * for all)
    #[arg(long)]
    cors_origins: Option<String>,

    /// Engine tick interval in milliseconds
    #[arg(long)]
    tick_interval_ms: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "crashlab=info,tower_http=info".into()),
        )
        .init();

    let args = Args::parse();

    let mut loader = ConfigLoader::new();
    if let Some(ref path) = args.config {
        loader = loader.with_path(path);
    }
    let mut config = loader.load()?;

    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(origins) = args.cors_origins {
        config.server.cors_origins = origins.split(',').map(|s| s.trim().to_string()).collect();
    }
    if let Some(tick) = args.tick_interval_ms {
        config.engine.tick_interval_ms = tick;
    }

    ApiServer::new(config).run().await
}
