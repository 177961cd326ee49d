use std::sync::Arc;

use clap::Parser;
use tokio::io::BufReader;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use graph_explorer::{
    app::ExplorerApp,
    backend::BackendClient,
    config::{BackendProfile, Config, LogFormat},
};

/// Explore a graph-backed retrieval service from the terminal
#[derive(Parser, Debug)]
#[command(name = "graph-explorer", version, about)]
struct Cli {
    /// Backend base URL (overrides EXPLORER_BACKEND_URL)
    #[arg(long)]
    backend_url: Option<String>,

    /// Backend contract: chat or code (overrides EXPLORER_BACKEND_PROFILE)
    #[arg(long)]
    profile: Option<BackendProfile>,

    /// Connect to the graph store on startup
    #[arg(long)]
    connect: bool,

    /// Database name sent with the startup connect
    #[arg(long, requires = "connect")]
    db: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };
    if let Some(url) = cli.backend_url {
        config.backend.base_url = url.trim_end_matches('/').to_string();
    }
    if let Some(profile) = cli.profile {
        config.backend.profile = profile;
    }

    init_logging(&config);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Graph explorer starting..."
    );

    let client = match BackendClient::new(&config.backend, config.request.clone()) {
        Ok(c) => {
            info!(
                base_url = %config.backend.base_url,
                profile = %config.backend.profile,
                "Backend client initialized"
            );
            c
        }
        Err(e) => {
            error!(error = %e, "Failed to initialize backend client");
            return Err(e.into());
        }
    };

    match client.health().await {
        Ok(health) => info!(status = %health.status, "Backend reachable"),
        Err(e) => warn!(error = %e, "Backend health check failed; continuing"),
    }

    let mut app = ExplorerApp::new(config, Arc::new(client));
    if cli.connect {
        info!("{}", app.connect(cli.db));
    }

    let stdin = BufReader::new(tokio::io::stdin());
    if let Err(e) = app.run(stdin, tokio::io::stdout()).await {
        error!(error = %e, "Explorer error");
        return Err(e.into());
    }

    info!("Shutdown complete");
    Ok(())
}

/// Initialize tracing/logging
fn init_logging(config: &Config) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}
