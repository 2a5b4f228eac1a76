//! Health check reports in the format of the "Health Check Response Format
//! for HTTP APIs" RFC draft: a severity model, composite keys, a mergeable
//! checks collection, pluggable checkers and a concurrent HTTP probe runner.

pub mod checkers;
pub mod config;
pub mod error;
pub mod handlers;
pub mod health;
pub mod middleware;

pub use checkers::{HttpCheck, HttpCheckConfig, SystemCheck, SystemThresholds};
pub use crate::config::AppConfig;
pub use error::{HealthError, Result};
pub use handlers::routes::create_routes;
pub use health::{
    CheckOutcome, Checker, Checks, ComponentDetail, Health, HealthReporter, Key, ObservedValue,
    ReportMetadata, Status,
};

use axum::Router;
use std::{net::SocketAddr, sync::Arc};
use tokio::signal;
use tracing::{info, warn};

#[derive(Clone)]
pub struct AppState {
    pub reporter: Arc<HealthReporter>,
}

impl AppState {
    pub fn new(reporter: HealthReporter) -> Self {
        Self {
            reporter: Arc::new(reporter),
        }
    }

    /// Wires the checkers `config` enables. The probe runner is registered
    /// only when at least one target is configured.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let mut reporter = HealthReporter::new(config.report.metadata());

        if config.probe.has_targets() {
            let client = reqwest::Client::builder()
                .build()
                .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {}", e))?;
            reporter = reporter.add_check(HttpCheck::new(
                client,
                config.probe.check_config(),
                config.probe.default_timeout(),
            ));
        } else {
            warn!("No probe targets configured, HTTP checker disabled");
        }

        if config.system.enabled {
            reporter = reporter.add_check(SystemCheck::new(config.system.thresholds()));
        }

        info!("Registered checkers: {:?}", reporter.checker_names());
        Ok(Self::new(reporter))
    }
}

pub fn create_app(state: AppState) -> Router {
    let router = Router::new().merge(create_routes());
    middleware::logging::with_request_logging(router).with_state(state)
}

pub async fn run_server(app: Router, addr: SocketAddr) -> Result<()> {
    info!("Starting health server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
