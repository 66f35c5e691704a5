//! One-time startup sequencing.
//!
//! Initialization verifies the database (with bounded retries), then asks the
//! channel monitor to initialize. Only the database step can fail startup.
//! Concurrent callers share a single in-flight run; once a run succeeds the
//! manager stays initialized for the life of the process.

use crate::config::StartupConfig;
use crate::services::channel_monitor::ChannelMonitor;
use crate::services::database::{DatabaseProbe, ProbeError};
use crate::services::metrics::record_startup_attempt;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{error, info, instrument, warn};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Database unavailable after {attempts} attempt(s): {source}")]
    DatabaseUnavailable {
        attempts: u32,
        #[source]
        source: ProbeError,
    },
}

/// Snapshot returned by [`StartupManager::status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StartupStatus {
    pub initialized: bool,
}

pub struct StartupManager {
    db: Arc<dyn DatabaseProbe>,
    channel_monitor: Arc<dyn ChannelMonitor>,
    max_attempts: u32,
    retry_delay: Duration,
    initialized: OnceCell<()>,
}

impl StartupManager {
    pub fn new(
        db: Arc<dyn DatabaseProbe>,
        channel_monitor: Arc<dyn ChannelMonitor>,
        config: &StartupConfig,
    ) -> Self {
        Self {
            db,
            channel_monitor,
            max_attempts: config.db_max_attempts.max(1),
            retry_delay: config.db_retry_delay,
            initialized: OnceCell::new(),
        }
    }

    /// Run initialization unless it has already completed.
    ///
    /// Callers arriving while a run is in flight wait for it. If that run
    /// fails, the next caller starts a fresh one.
    pub async fn initialize(&self) -> Result<(), StartupError> {
        if self.initialized.initialized() {
            return Ok(());
        }

        self.initialized
            .get_or_try_init(|| self.run())
            .await
            .map(|_| ())
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.initialized()
    }

    pub fn status(&self) -> StartupStatus {
        StartupStatus {
            initialized: self.is_initialized(),
        }
    }

    async fn run(&self) -> Result<(), StartupError> {
        info!("Starting StreamingRange initialization");

        if let Err(e) = self.check_database().await {
            record_startup_attempt("failed");
            error!(error = %e, "Startup initialization failed");
            return Err(e);
        }

        self.initialize_channel_monitoring().await;

        record_startup_attempt("succeeded");
        info!("StreamingRange initialization complete");
        Ok(())
    }

    #[instrument(skip(self), fields(max_attempts = self.max_attempts))]
    async fn check_database(&self) -> Result<(), StartupError> {
        let mut attempt = 1;
        loop {
            match self.db.ping().await {
                Ok(()) => {
                    info!(attempt, "Database connection verified");
                    return Ok(());
                }
                Err(e) => {
                    error!(
                        attempt,
                        max_attempts = self.max_attempts,
                        error = %e,
                        "Database connection failed"
                    );
                    if attempt >= self.max_attempts {
                        return Err(StartupError::DatabaseUnavailable {
                            attempts: attempt,
                            source: e,
                        });
                    }
                    attempt += 1;
                    tokio::time::sleep(self.retry_delay).await;
                }
            }
        }
    }

    async fn initialize_channel_monitoring(&self) {
        match self.channel_monitor.initialize_channels().await {
            Ok(count) => info!(channels = count, "Channel monitoring initialized"),
            // Monitoring is not required for the site to serve traffic.
            Err(e) => warn!(error = %e, "Channel monitoring initialization failed"),
        }
    }
}
