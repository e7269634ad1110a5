mod config;
mod geo;
mod models;
mod storage;
mod web;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::settings::{LoggingConfig, Settings};
use crate::geo::GeoResolver;
use crate::storage::open_store;
use crate::web::routes::AppState;
use crate::web::server::WebServer;

const DEFAULT_CONFIG_PATH: &str = "pixeltrap.toml";

/// Parse the `--config` CLI flag. Returns the path and whether it was given
/// explicitly.
fn parse_config_path() -> (String, bool) {
    let args: Vec<String> = std::env::args().collect();
    let mut config_path = None;

    let mut i = 1;
    while i < args.len() {
        if args[i] == "--config" {
            if let Some(path) = args.get(i + 1) {
                config_path = Some(path.clone());
            }
            i += 2;
        } else {
            i += 1;
        }
    }

    match config_path {
        Some(path) => (path, true),
        None => (DEFAULT_CONFIG_PATH.to_string(), false),
    }
}

/// Initialise the `tracing` subscriber with stdout and, when configured,
/// file output. The returned guard flushes the file writer on drop.
fn init_tracing(logging: &LoggingConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let stdout_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(true);

    let mut file_error = None;
    let (file_layer, guard) = if logging.file.is_empty() {
        (None, None)
    } else {
        let path = Path::new(&logging.file);
        let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("pixeltrap.log");

        match RollingFileAppender::builder()
            .rotation(Rotation::NEVER)
            .filename_prefix(name)
            .build(dir)
        {
            Ok(appender) => {
                let (writer, guard) = tracing_appender::non_blocking(appender);
                let layer = fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_target(true);
                (Some(layer), Some(guard))
            }
            Err(e) => {
                file_error = Some(e);
                (None, None)
            }
        }
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    if let Some(e) = file_error {
        error!(file = %logging.file, error = %e, "Failed to open log file, logging to stdout only");
    }

    guard
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            error!(error = %e, "Failed to listen for Ctrl+C, running until killed");
            std::future::pending::<()>().await;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // ---------------------------------------------------------------
    // 1. Configuration
    // ---------------------------------------------------------------
    let (config_path, explicit) = parse_config_path();
    let mut settings = Settings::load_or_default(&config_path, explicit)?;
    settings.apply_env();
    let settings = Arc::new(settings);

    // ---------------------------------------------------------------
    // 2. Logging
    // ---------------------------------------------------------------
    let _log_guard = init_tracing(&settings.logging);

    info!("Starting pixeltrap");
    if explicit || Path::new(&config_path).exists() {
        info!("Config loaded from {}", config_path);
    } else {
        info!("No config file found, using defaults");
    }

    // ---------------------------------------------------------------
    // 3. Storage and geolocation
    // ---------------------------------------------------------------
    let store = open_store(&settings.storage).context("Failed to open visit store")?;
    let geo = Arc::new(GeoResolver::from_config(&settings.geo)?);

    // ---------------------------------------------------------------
    // 4. HTTP server
    // ---------------------------------------------------------------
    let state = AppState {
        store,
        geo,
        settings: settings.clone(),
    };

    let server = WebServer::new(state, settings.bind_addr());
    server.run(shutdown_signal()).await?;

    info!("pixeltrap shut down gracefully");
    Ok(())
}
