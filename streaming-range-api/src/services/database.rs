//! Database service for streaming-range-api.

use crate::config::DatabaseConfig;
use crate::models::DatabaseStatus;
use crate::services::metrics::{record_db_probe, DB_QUERY_DURATION};
use async_trait::async_trait;
use service_core::error::AppError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, instrument};

/// Why a liveness probe failed.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("Failed to acquire database connection: {0}")]
    Unavailable(anyhow::Error),

    #[error("Liveness query failed: {0}")]
    Query(anyhow::Error),
}

impl ProbeError {
    pub fn status(&self) -> DatabaseStatus {
        match self {
            ProbeError::Unavailable(_) => DatabaseStatus::Disconnected,
            ProbeError::Query(_) => DatabaseStatus::Error,
        }
    }
}

/// Connectivity check against the shared connection pool.
///
/// Implementations acquire a connection, run a trivial query and release the
/// connection before returning.
#[async_trait]
pub trait DatabaseProbe: Send + Sync {
    async fn ping(&self) -> Result<(), ProbeError>;
}

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create the connection pool without contacting the server.
    ///
    /// Connections are opened on first use, so the service can start and
    /// report `disconnected` while Postgres is still unreachable.
    #[instrument(skip(config), fields(service = "streaming-range-api"))]
    pub fn connect_lazy(config: &DatabaseConfig) -> Result<Self, AppError> {
        info!(
            max_connections = config.max_connections,
            min_connections = config.min_connections,
            acquire_timeout_secs = config.acquire_timeout.as_secs(),
            "Creating PostgreSQL connection pool"
        );

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.acquire_timeout)
            .idle_timeout(Duration::from_secs(600))
            .connect_lazy(&config.url)
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Invalid database configuration: {}", e))
            })?;

        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Return the subset of `channel_ids` present in `youtube_channels`.
    #[instrument(skip(self, channel_ids), fields(requested = channel_ids.len()))]
    pub async fn find_known_channels(&self, channel_ids: &[String]) -> Result<Vec<String>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["find_known_channels"])
            .start_timer();

        let known = sqlx::query_scalar::<_, String>(
            "SELECT id FROM youtube_channels WHERE id = ANY($1) ORDER BY id",
        )
        .bind(channel_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to look up channels: {}", e))
        })?;

        timer.observe_duration();
        debug!(found = known.len(), "Channel lookup completed");
        Ok(known)
    }
}

#[async_trait]
impl DatabaseProbe for Database {
    #[instrument(skip(self))]
    async fn ping(&self) -> Result<(), ProbeError> {
        let timer = DB_QUERY_DURATION.with_label_values(&["ping"]).start_timer();

        let result: Result<(), ProbeError> = async {
            let mut conn = self
                .pool
                .acquire()
                .await
                .map_err(|e| ProbeError::Unavailable(anyhow::Error::new(e)))?;

            sqlx::query("SELECT 1")
                .execute(&mut *conn)
                .await
                .map_err(|e| ProbeError::Query(anyhow::Error::new(e)))?;

            Ok(())
        }
        .await;

        timer.observe_duration();
        match &result {
            Ok(()) => record_db_probe(DatabaseStatus::Connected.as_str()),
            Err(e) => record_db_probe(e.status().as_str()),
        }
        result
    }
}
