//! jsontable server binary.

use std::path::PathBuf;

use clap::Parser;

use jsontable::config::{self, AppConfig};
use jsontable::lifecycle::{self, signals, Shutdown};
use jsontable::observability;

/// JSON-file table store with an HTTP API
#[derive(Parser, Debug)]
#[command(name = "jsontable")]
#[command(version)]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address (host:port), overrides the config file
    #[arg(short, long)]
    bind: Option<String>,

    /// Storage file, overrides the config file
    #[arg(short, long)]
    storage: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => config::loader::load_config(path)?,
        None => AppConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }
    if let Some(storage) = args.storage {
        config.storage.path = storage;
    }
    config::validate_config(&config).map_err(config::ConfigError::Validation)?;

    observability::init_logging(&config.observability)?;

    tracing::info!("jsontable v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        storage = ?config.storage.path,
        insert_persistence = ?config.storage.insert_persistence,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr = config.observability.metrics_address.parse()?;
        observability::init_metrics(addr)?;
    }

    let app = lifecycle::bootstrap(config).await?;

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(shutdown.clone());

    app.server.run(app.listener, shutdown.subscribe()).await?;

    app.store.flush().await?;
    tracing::info!("Shutdown complete");
    Ok(())
}
