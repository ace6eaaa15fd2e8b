use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use slaterunner_core::{
    load_config, load_config_from_env, validate_config, AgentPlatform, Config, LineupPipeline,
    SwarmNodeClient,
};
use slaterunner_server::{api::create_router, state::AppState};

/// Environment variable naming the config file.
const CONFIG_ENV: &str = "SLATERUNNER_CONFIG";

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = load()?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("SwarmNode base URL: {}", config.platform.base_url);
    info!(
        "Projection models: {}",
        config
            .pipeline
            .models
            .iter()
            .map(|m| format!("{}/{}", m.provider, m.model))
            .collect::<Vec<_>>()
            .join(", ")
    );

    // Create platform client
    let platform: Arc<dyn AgentPlatform> = Arc::new(
        SwarmNodeClient::new(&config.platform).context("Failed to create SwarmNode client")?,
    );

    let pipeline = Arc::new(LineupPipeline::from_config(platform, &config));

    if let Err(e) = pipeline.check_configuration() {
        warn!("{}; /submit will fail until this is configured", e);
    }
    if config.agents.signals_agent().is_none() {
        info!("No signals agent configured, signals stage will be skipped");
    }

    // Create app state
    let state = Arc::new(AppState::new(config.clone(), pipeline));

    // Create router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shut down");
    Ok(())
}

/// Load from the config file when present, otherwise from the environment.
///
/// An explicitly named config file must exist.
fn load() -> Result<Config> {
    let explicit = std::env::var(CONFIG_ENV).ok().map(PathBuf::from);
    let config_path = explicit
        .clone()
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    if explicit.is_some() || config_path.exists() {
        info!("Loading configuration from {:?}", config_path);
        return load_config(&config_path)
            .with_context(|| format!("Failed to load config from {:?}", config_path));
    }

    info!("No config file at {:?}, using environment only", config_path);
    load_config_from_env().context("Failed to load config from environment")
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
