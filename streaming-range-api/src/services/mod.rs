//! Services module for streaming-range-api.

pub mod audio_store;
pub mod channel_monitor;
pub mod database;
pub mod metrics;
pub mod startup_manager;

pub use audio_store::{AudioError, AudioStore};
pub use channel_monitor::{ChannelMonitor, DisabledChannelMonitor, WhitelistChannelMonitor};
pub use database::{Database, DatabaseProbe, ProbeError};
pub use metrics::{get_metrics, init_metrics};
pub use startup_manager::{StartupError, StartupManager, StartupStatus};
