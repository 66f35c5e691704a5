//! HTTP handlers for streaming-range-api.

pub mod audio;
pub mod health;
pub mod metrics;
pub mod startup_status;

pub use audio::serve_audio;
pub use health::{health_check, readiness_check};
pub use metrics::metrics_handler;
pub use startup_status::{get_startup_status, trigger_startup};
