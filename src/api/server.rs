//! API server setup.
//!
//! Wires the session registry, metrics and middleware stack into an axum
//! application and runs it until a shutdown signal arrives. Shutdown closes
//! every live session so no driver task outlives the server.

use super::{
    middleware::{create_cors_layer, request_id_middleware},
    routes::create_router,
    sessions::SessionRegistry,
};
use crate::config::Config;
use crate::metrics::GameMetrics;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::signal;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing::info;

/// Shared application state.
pub struct AppState {
    pub registry: SessionRegistry,
    pub metrics: Arc<GameMetrics>,
    pub started_at: std::time::Instant,
}

pub struct ApiServer {
    config: Config,
}

impl ApiServer {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Run the server until interrupted.
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        let addr = self.socket_addr()?;
        let (app, state) = self.create_app();

        info!("starting crashlab API server");
        info!(listen = %addr, "binding");
        info!(
            cors = ?self.config.server.cors_origins,
            timeout_secs = self.config.server.request_timeout_secs,
            tick_interval_ms = self.config.engine.tick_interval_ms,
            "server configuration"
        );

        let listener = tokio::net::TcpListener::bind(addr).await?;

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        // No driver tick may land after this point.
        state.registry.close_all().await;
        info!("API server stopped gracefully");
        Ok(())
    }

    /// Build the application and its state. Exposed for integration tests.
    pub fn create_app(&self) -> (axum::Router, Arc<AppState>) {
        let metrics = Arc::new(GameMetrics::new());
        let state = Arc::new(AppState {
            registry: SessionRegistry::new(self.config.engine.clone(), Arc::clone(&metrics)),
            metrics,
            started_at: std::time::Instant::now(),
        });

        let app = create_router(Arc::clone(&state))
            // Request ID middleware (first for tracing)
            .layer(axum::middleware::from_fn(request_id_middleware))
            // CORS layer (before timeout to handle preflight)
            .layer(create_cors_layer(self.config.server.cors_origins.clone()))
            .layer(TimeoutLayer::new(Duration::from_secs(
                self.config.server.request_timeout_secs,
            )))
            // Tracing layer (last for complete request tracing)
            .layer(TraceLayer::new_for_http());

        (app, state)
    }

    fn socket_addr(&self) -> Result<SocketAddr, Box<dyn std::error::Error>> {
        Ok(SocketAddr::from((
            self.config.server.host.parse::<std::net::IpAddr>()?,
            self.config.server.port,
        )))
    }
}

/// Wait for shutdown signal.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("received Ctrl+C signal");
        },
        _ = terminate => {
            info!("received terminate signal");
        },
    }
}
