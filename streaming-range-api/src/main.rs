//! Streaming Range API entry point.

use service_core::observability::init_tracing;
use streaming_range_api::config::StreamingRangeConfig;
use streaming_range_api::startup::Application;
use tokio::signal;

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let config = StreamingRangeConfig::from_env().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        std::io::Error::other(format!("Configuration error: {}", e))
    })?;

    init_tracing(
        &config.service_name,
        &config.log_level,
        config.otlp_endpoint.as_deref(),
    );

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = %config.environment,
        http_port = %config.common.port,
        db_max_connections = %config.database.max_connections,
        audio_dir = %config.audio.directory.display(),
        startup_db_max_attempts = config.startup.db_max_attempts,
        startup_db_retry_delay_ms = config.startup.db_retry_delay.as_millis() as u64,
        auto_initialize = config.startup.auto_initialize,
        monitored_channels = config.channel_monitor.whitelist.len(),
        "Configuration loaded"
    );

    let auto_initialize = config.startup.auto_initialize;

    let app = Application::build(config).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to build application");
        std::io::Error::other(format!("Application build error: {}", e))
    })?;

    // Initialization runs alongside the server so status requests are
    // answered while the database check is still retrying.
    if auto_initialize {
        let startup = app.startup_manager();
        tokio::spawn(async move {
            if let Err(e) = startup.initialize().await {
                tracing::error!(error = %e, "Automatic startup initialization failed");
            }
        });
    } else {
        tracing::info!("Automatic startup initialization disabled");
    }

    tokio::select! {
        result = app.run_until_stopped() => {
            if let Err(e) = result {
                tracing::error!(error = %e, "Application error");
                return Err(e);
            }
        }
        _ = shutdown_signal() => {
            tracing::info!("Graceful shutdown initiated");
        }
    }

    tracing::info!("Service shutdown complete");
    Ok(())
}
