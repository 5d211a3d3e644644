//! Server setup and lifecycle for QuickBrief.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use config::Config;
use tokio::net::TcpListener;
use tokio::signal;

use crate::error::{AppError, Result};
use crate::routes::create_router;
use crate::state::AppState;
use crate::telemetry::install_recorder;

/// Names a TOML or YAML file to load instead of the environment.
pub const CONFIG_FILE_ENV: &str = "QB_CONFIG_FILE";

pub struct BriefServer {
    state: Arc<AppState>
}

impl BriefServer {
    /// Creates a server with adapters built from `config`.
    pub fn new(config: Config) -> Result<Self> {
        let metrics = if config.observability.metrics_enabled {
            let handle = install_recorder().map_err(|e| AppError::Configuration {
                message: format!("Failed to install metrics recorder: {e}")
            })?;
            Some(handle)
        } else {
            None
        };

        let state = AppState::from_config(config, metrics)?;
        Ok(Self::with_state(Arc::new(state)))
    }

    pub fn with_state(state: Arc<AppState>) -> Self {
        Self { state }
    }

    /// Runs the HTTP server until Ctrl+C or SIGTERM.
    pub async fn run(self) -> Result<()> {
        let server = &self.state.config.server;
        let addr: SocketAddr = format!("{}:{}", server.host, server.port)
            .parse()
            .map_err(|e| AppError::Configuration {
                message: format!("Invalid address: {e}")
            })?;

        let router = create_router(self.state.clone());

        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| AppError::Server {
                message: format!("Failed to bind to {addr}: {e}")
            })?;

        tracing::info!(%addr, "QuickBrief server starting");

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| AppError::Server {
                message: format!("Server error: {e}")
            })?;

        tracing::info!("QuickBrief server stopped");
        Ok(())
    }

    #[must_use]
    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }
}

/// Signal handler for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        },
        () = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        },
    }
}

/// Reads `QB_CONFIG_FILE` when set, otherwise the environment.
pub fn load_config() -> Result<Config> {
    match std::env::var(CONFIG_FILE_ENV) {
        Ok(path) if !path.trim().is_empty() => {
            config::load_from_file(Path::new(&path)).map_err(|e| AppError::Configuration {
                message: e.to_string()
            })
        }
        _ => config::load_from_env().map_err(|e| AppError::Configuration {
            message: e.to_string()
        })
    }
}

fn init_tracing(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

pub async fn run_server(config: Config) -> Result<()> {
    config::validate(&config).map_err(|e| AppError::Configuration {
        message: e.to_string()
    })?;
    BriefServer::new(config)?.run().await
}

/// Entry point for containerized deployments.
pub async fn run_from_env() -> Result<()> {
    let config = load_config()?;
    init_tracing(&config.observability.logging_level);
    run_server(config).await
}
