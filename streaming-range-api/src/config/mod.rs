//! Configuration module for streaming-range-api.

use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_AUDIO_DIR: &str = "/opt/golf-directory/audio";
pub const PRODUCTION_ENVIRONMENT: &str = "production";

#[derive(Debug, Clone)]
pub struct StreamingRangeConfig {
    pub common: core_config::Config,
    pub service_name: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    /// Deployment environment name reported by the status endpoint.
    pub environment: String,
    pub database: DatabaseConfig,
    pub audio: AudioConfig,
    pub startup: StartupConfig,
    pub channel_monitor: ChannelMonitorConfig,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct AudioConfig {
    /// Directory every audio request is resolved against.
    pub directory: PathBuf,
}

#[derive(Debug, Clone)]
pub struct StartupConfig {
    /// Total database check attempts, including the first.
    pub db_max_attempts: u32,
    pub db_retry_delay: Duration,
    /// Run initialization from `main` once the listener is bound.
    pub auto_initialize: bool,
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self {
            db_max_attempts: 3,
            db_retry_delay: Duration::from_secs(2),
            auto_initialize: true,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ChannelMonitorConfig {
    /// YouTube channel ids to monitor; empty disables monitoring.
    pub whitelist: Vec<String>,
}

impl StreamingRangeConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;
        Self::from_lookup(common, |key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(common: core_config::Config, lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = lookup("APP_ENVIRONMENT").unwrap_or_else(|| "development".to_string());

        let db_max_attempts: u32 = parse_or(&lookup, "STARTUP_DB_MAX_ATTEMPTS", 3)?;
        if db_max_attempts == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "STARTUP_DB_MAX_ATTEMPTS must be at least 1"
            )));
        }

        let auto_initialize = match lookup("STARTUP_AUTO_INITIALIZE") {
            Some(raw) => parse_bool("STARTUP_AUTO_INITIALIZE", &raw)?,
            None => environment != PRODUCTION_ENVIRONMENT,
        };

        Ok(Self {
            common,
            service_name: lookup("SERVICE_NAME")
                .unwrap_or_else(|| "streaming-range-api".to_string()),
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            otlp_endpoint: lookup("OTLP_ENDPOINT").filter(|s| !s.is_empty()),
            environment,
            database: DatabaseConfig {
                url: lookup("DATABASE_URL").ok_or_else(|| {
                    AppError::ConfigError(anyhow::anyhow!("DATABASE_URL is required"))
                })?,
                max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10)?,
                min_connections: parse_or(&lookup, "DATABASE_MIN_CONNECTIONS", 0)?,
                acquire_timeout: Duration::from_secs(parse_or(
                    &lookup,
                    "DATABASE_ACQUIRE_TIMEOUT_SECS",
                    5,
                )?),
            },
            audio: AudioConfig {
                directory: lookup("AUDIO_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_AUDIO_DIR)),
            },
            startup: StartupConfig {
                db_max_attempts,
                db_retry_delay: Duration::from_millis(parse_or(
                    &lookup,
                    "STARTUP_DB_RETRY_DELAY_MS",
                    2000,
                )?),
                auto_initialize,
            },
            channel_monitor: ChannelMonitorConfig {
                whitelist: lookup("CHANNEL_WHITELIST")
                    .map(|raw| parse_list(&raw))
                    .unwrap_or_default(),
            },
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == PRODUCTION_ENVIRONMENT
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, AppError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|e| {
            AppError::ConfigError(anyhow::anyhow!("Invalid value for {}: {} ({})", key, raw, e))
        }),
        None => Ok(default),
    }
}

fn parse_bool(key: &str, raw: &str) -> Result<bool, AppError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(AppError::ConfigError(anyhow::anyhow!(
            "Invalid value for {}: {}",
            key,
            raw
        ))),
    }
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
