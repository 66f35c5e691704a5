//! Common test utilities for streaming-range-api integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use service_core::error::AppError;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;
use streaming_range_api::config::StartupConfig;
use streaming_range_api::services::{
    AudioStore, ChannelMonitor, DatabaseProbe, ProbeError, StartupManager,
};
use streaming_range_api::startup::{build_router, AppState};
use tempfile::TempDir;
use tower::ServiceExt;

static INIT: Once = Once::new();

/// Initialize tracing for tests (only once).
pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("info,streaming_range_api=debug,sqlx=warn")
            .with_test_writer()
            .try_init()
            .ok();
    });
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    Ok,
    Unavailable,
    QueryFailed,
}

/// Database probe that replays a script of outcomes, then repeats the fallback.
pub struct FakeDatabase {
    script: Mutex<VecDeque<ProbeOutcome>>,
    fallback: ProbeOutcome,
    calls: AtomicUsize,
}

impl FakeDatabase {
    pub fn healthy() -> Self {
        Self::scripted(Vec::new(), ProbeOutcome::Ok)
    }

    pub fn down() -> Self {
        Self::scripted(Vec::new(), ProbeOutcome::Unavailable)
    }

    pub fn scripted(script: Vec<ProbeOutcome>, fallback: ProbeOutcome) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DatabaseProbe for FakeDatabase {
    async fn ping(&self) -> Result<(), ProbeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let outcome = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(self.fallback);
        match outcome {
            ProbeOutcome::Ok => Ok(()),
            ProbeOutcome::Unavailable => Err(ProbeError::Unavailable(anyhow::anyhow!(
                "connection refused"
            ))),
            ProbeOutcome::QueryFailed => Err(ProbeError::Query(anyhow::anyhow!(
                "relation does not exist"
            ))),
        }
    }
}

#[derive(Default)]
pub struct FakeChannelMonitor {
    pub fail: bool,
    calls: AtomicUsize,
}

impl FakeChannelMonitor {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChannelMonitor for FakeChannelMonitor {
    async fn initialize_channels(&self) -> Result<usize, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            Err(AppError::InternalError(anyhow::anyhow!("monitor offline")))
        } else {
            Ok(3)
        }
    }
}

/// Router plus handles on its fakes and audio directory.
pub struct TestApp {
    pub router: Router,
    pub db: Arc<FakeDatabase>,
    pub channel_monitor: Arc<FakeChannelMonitor>,
    pub startup: Arc<StartupManager>,
    pub audio_dir: TempDir,
}

impl TestApp {
    pub fn spawn(db: FakeDatabase, channel_monitor: FakeChannelMonitor) -> Self {
        init_tracing();

        let db = Arc::new(db);
        let channel_monitor = Arc::new(channel_monitor);
        let config = StartupConfig {
            db_max_attempts: 3,
            db_retry_delay: Duration::from_millis(10),
            auto_initialize: false,
        };
        let startup = Arc::new(StartupManager::new(
            db.clone(),
            channel_monitor.clone(),
            &config,
        ));

        let audio_dir = tempfile::tempdir().expect("Failed to create audio dir");
        let state = AppState::new(
            "test",
            AudioStore::new(audio_dir.path()),
            db.clone(),
            startup.clone(),
        );

        Self {
            router: build_router(state),
            db,
            channel_monitor,
            startup,
            audio_dir,
        }
    }

    pub fn write_audio(&self, name: &str, bytes: &[u8]) {
        std::fs::write(self.audio_dir.path().join(name), bytes).expect("Failed to write audio");
    }

    pub async fn get(&self, uri: &str) -> Response<Body> {
        self.send(Request::get(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn post(&self, uri: &str) -> Response<Body> {
        self.send(Request::post(uri).body(Body::empty()).unwrap())
            .await
    }

    async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("Router is infallible")
    }
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .expect("Failed to read body")
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).expect("Body is not JSON")
}
