use axum::{extract::State, Json};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use service_core::error::AppError;

use crate::models::DatabaseStatus;
use crate::startup::AppState;

const SCHEDULER_NOTE: &str = "Scheduler removed from frontend - using Python backend";
const TRIGGER_NOTE: &str = "Frontend scheduler removed - using Python backend";

/// Scheduling now runs in the Python backend; this stays for existing clients.
#[derive(Debug, Serialize)]
pub struct SchedulerStatus {
    pub running: bool,
    pub tasks: Vec<String>,
    pub count: usize,
    pub note: &'static str,
}

impl Default for SchedulerStatus {
    fn default() -> Self {
        Self {
            running: false,
            tasks: Vec::new(),
            count: 0,
            note: SCHEDULER_NOTE,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StartupReport {
    pub initialized: bool,
    pub database: DatabaseStatus,
    pub scheduler: SchedulerStatus,
}

#[derive(Debug, Serialize)]
pub struct StartupStatusResponse {
    pub startup: StartupReport,
    pub server_time: String,
    pub environment: String,
}

#[derive(Debug, Serialize)]
pub struct TriggerStatus {
    pub initialized: bool,
    pub scheduler_running: bool,
    pub scheduler_tasks: usize,
    pub note: &'static str,
}

#[derive(Debug, Serialize)]
pub struct TriggerResponse {
    pub message: &'static str,
    pub status: TriggerStatus,
}

/// GET /api/startup-status
///
/// Database problems are reported in the `database` field, never as a
/// request failure.
#[tracing::instrument(skip(state))]
pub async fn get_startup_status(State(state): State<AppState>) -> Json<StartupStatusResponse> {
    let database = match state.db.ping().await {
        Ok(()) => DatabaseStatus::Connected,
        Err(e) => {
            tracing::warn!(error = %e, "Database probe failed");
            e.status()
        }
    };

    let status = state.startup.status();

    Json(StartupStatusResponse {
        startup: StartupReport {
            initialized: status.initialized,
            database,
            scheduler: SchedulerStatus::default(),
        },
        server_time: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        environment: state.environment.to_string(),
    })
}

/// POST /api/startup-status: run (or confirm) startup initialization.
#[tracing::instrument(skip(state))]
pub async fn trigger_startup(
    State(state): State<AppState>,
) -> Result<Json<TriggerResponse>, AppError> {
    tracing::info!("Manual startup initialization requested");

    state.startup.initialize().await.map_err(|e| {
        AppError::OperationFailed("Startup initialization failed", anyhow::Error::new(e))
    })?;

    let status = state.startup.status();

    Ok(Json(TriggerResponse {
        message: "Startup initialization completed",
        status: TriggerStatus {
            initialized: status.initialized,
            scheduler_running: false,
            scheduler_tasks: 0,
            note: TRIGGER_NOTE,
        },
    }))
}
