//! GTSS Daemon - entity registry service

use clap::Parser;
use gtss_daemon::error::{DaemonError, DaemonResult};
use gtss_daemon::{DaemonConfig, Server};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// GTSS Daemon CLI
#[derive(Parser)]
#[command(name = "gtssd")]
#[command(about = "GTSS Daemon - entity registry and tier classification service", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "GTSS_CONFIG")]
    config: Option<String>,

    /// Listen address, overrides the configuration file
    #[arg(short, long, env = "GTSS_LISTEN_ADDR")]
    listen: Option<String>,

    /// Log level, overrides the configuration file
    #[arg(long, env = "GTSS_LOG_LEVEL")]
    log_level: Option<String>,

    /// Enable JSON logging
    #[arg(long, env = "GTSS_LOG_JSON")]
    json: bool,

    /// Development mode: in-memory storage, configuration file ignored
    #[arg(long, env = "GTSS_DEV")]
    dev: bool,
}

#[tokio::main]
async fn main() -> DaemonResult<()> {
    let cli = Cli::parse();

    let mut config = if cli.dev {
        DaemonConfig::development()
    } else {
        DaemonConfig::load(cli.config.as_deref())
            .map_err(|e| DaemonError::Config(e.to_string()))?
    };

    if let Some(listen) = &cli.listen {
        config.server.listen_addr = listen
            .parse()
            .map_err(|e| DaemonError::Config(format!("Invalid listen address: {}", e)))?;
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    config.logging.json |= cli.json;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.logging.level.clone().into());

    if config.logging.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        listen = %config.server.listen_addr,
        "Starting GTSS daemon"
    );

    let server = Server::new(config).await?;
    server.run().await
}
