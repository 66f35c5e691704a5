//! Channel monitoring collaborator.
//!
//! Startup only needs a single entry point from the monitor; what it tracks
//! afterwards is its own business.

use crate::services::database::Database;
use async_trait::async_trait;
use service_core::error::AppError;
use std::sync::{Arc, RwLock};
use tracing::{info, instrument, warn};

#[async_trait]
pub trait ChannelMonitor: Send + Sync {
    /// Prepare monitoring and return how many channels are now tracked.
    async fn initialize_channels(&self) -> Result<usize, AppError>;
}

/// Monitors the whitelisted YouTube channels that exist in `youtube_channels`.
pub struct WhitelistChannelMonitor {
    db: Arc<Database>,
    whitelist: Vec<String>,
    monitored: RwLock<Vec<String>>,
}

impl WhitelistChannelMonitor {
    pub fn new(db: Arc<Database>, whitelist: Vec<String>) -> Self {
        Self {
            db,
            whitelist,
            monitored: RwLock::new(Vec::new()),
        }
    }

    /// Channels found during the last successful initialization.
    pub fn monitored_channels(&self) -> Vec<String> {
        self.monitored
            .read()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    fn replace_monitored(&self, known: Vec<String>) -> Result<usize, AppError> {
        let count = known.len();
        let mut guard = self.monitored.write().map_err(|_| {
            AppError::InternalError(anyhow::anyhow!("Monitored channel list lock poisoned"))
        })?;
        *guard = known;
        Ok(count)
    }
}

/// Whitelisted ids that the database does not know about, in whitelist order.
pub fn missing_channels<'a>(whitelist: &'a [String], known: &[String]) -> Vec<&'a str> {
    whitelist
        .iter()
        .filter(|id| !known.contains(id))
        .map(String::as_str)
        .collect()
}

#[async_trait]
impl ChannelMonitor for WhitelistChannelMonitor {
    #[instrument(skip(self), fields(whitelisted = self.whitelist.len()))]
    async fn initialize_channels(&self) -> Result<usize, AppError> {
        let known = self.db.find_known_channels(&self.whitelist).await?;

        let missing = missing_channels(&self.whitelist, &known);
        if !missing.is_empty() {
            warn!(missing = ?missing, "Whitelisted channels not present in database");
        }

        let count = self.replace_monitored(known)?;

        info!(monitored = count, "Channel monitoring ready");
        Ok(count)
    }
}

/// Used when no channels are configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledChannelMonitor;

#[async_trait]
impl ChannelMonitor for DisabledChannelMonitor {
    async fn initialize_channels(&self) -> Result<usize, AppError> {
        info!("Channel whitelist empty - channel monitoring disabled");
        Ok(0)
    }
}
