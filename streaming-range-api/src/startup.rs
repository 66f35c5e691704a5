//! Application startup and lifecycle management.

use crate::config::StreamingRangeConfig;
use crate::handlers::{
    get_startup_status, health_check, metrics_handler, readiness_check, serve_audio,
    trigger_startup,
};
use crate::services::{
    init_metrics, AudioStore, ChannelMonitor, Database, DatabaseProbe, DisabledChannelMonitor,
    StartupManager, WhitelistChannelMonitor,
};
use axum::{middleware, routing::get, Router};
use service_core::error::AppError;
use service_core::middleware::metrics::metrics_middleware;
use service_core::middleware::tracing::{request_id_middleware, REQUEST_ID_HEADER};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub environment: Arc<str>,
    pub audio: Arc<AudioStore>,
    pub db: Arc<dyn DatabaseProbe>,
    pub startup: Arc<StartupManager>,
}

impl AppState {
    pub fn new(
        environment: impl Into<Arc<str>>,
        audio: AudioStore,
        db: Arc<dyn DatabaseProbe>,
        startup: Arc<StartupManager>,
    ) -> Self {
        Self {
            environment: environment.into(),
            audio: Arc::new(audio),
            db,
            startup,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/metrics", get(metrics_handler))
        .route("/api/audio/:filename", get(serve_audio))
        .route(
            "/api/startup-status",
            get(get_startup_status).post(trigger_startup),
        )
        .layer(middleware::from_fn(metrics_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Build the application with the given configuration.
    ///
    /// The database pool is created lazily, so this succeeds even while
    /// Postgres is down; startup initialization is a separate step.
    pub async fn build(config: StreamingRangeConfig) -> Result<Self, AppError> {
        init_metrics();

        let db = Arc::new(Database::connect_lazy(&config.database).map_err(|e| {
            tracing::error!(error = %e, "Failed to create PostgreSQL pool");
            e
        })?);

        let channel_monitor: Arc<dyn ChannelMonitor> =
            if config.channel_monitor.whitelist.is_empty() {
                Arc::new(DisabledChannelMonitor)
            } else {
                Arc::new(WhitelistChannelMonitor::new(
                    db.clone(),
                    config.channel_monitor.whitelist.clone(),
                ))
            };

        let startup = Arc::new(StartupManager::new(
            db.clone(),
            channel_monitor,
            &config.startup,
        ));

        let state = AppState::new(
            config.environment.as_str(),
            AudioStore::new(config.audio.directory.clone()),
            db,
            startup,
        );

        Self::bind(config, state).await
    }

    /// Bind a listener for an already assembled state.
    pub async fn bind(config: StreamingRangeConfig, state: AppState) -> Result<Self, AppError> {
        let addr = config.common.socket_addr();
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!(error = %e, addr = %addr, "Failed to bind HTTP listener");
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!(
            port = port,
            audio_dir = %state.audio.base_dir().display(),
            environment = %state.environment,
            "Streaming range listener bound"
        );

        Ok(Self {
            port,
            listener,
            state,
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn startup_manager(&self) -> Arc<StartupManager> {
        self.state.startup.clone()
    }

    /// Run the application until stopped.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        let router = build_router(self.state);

        tracing::info!(
            service = "streaming-range-api",
            version = env!("CARGO_PKG_VERSION"),
            port = self.port,
            "Service ready to accept connections"
        );

        axum::serve(self.listener, router).await.map_err(|e| {
            tracing::error!(error = %e, "HTTP server error");
            std::io::Error::other(format!("HTTP server error: {}", e))
        })
    }
}
