use std::future::Future;
use std::net::SocketAddr;

use anyhow::{Context, Result};
use axum::{routing::get, Router};
use tower_http::services::ServeDir;
use tracing::info;

use super::routes::{self, AppState};

/// Build the application router. Unmatched paths fall through to the
/// public asset directory.
pub fn build_router(state: AppState) -> Router {
    let public_dir = state.settings.assets.public_dir.clone();

    Router::new()
        .route("/", get(routes::landing))
        .route("/track.png", get(routes::track))
        .route("/leaked", get(routes::leaked))
        .fallback_service(ServeDir::new(public_dir))
        .with_state(state)
}

/// HTTP front end for the tracking service.
pub struct WebServer {
    state: AppState,
    bind_addr: String,
}

impl WebServer {
    pub fn new(state: AppState, bind_addr: String) -> Self {
        Self { state, bind_addr }
    }

    /// Serve until `shutdown` resolves, then let in-flight requests finish.
    pub async fn run<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = build_router(self.state);

        let listener = tokio::net::TcpListener::bind(&self.bind_addr)
            .await
            .with_context(|| format!("Failed to bind {}", self.bind_addr))?;
        info!("Listening on http://{}", self.bind_addr);

        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown)
        .await
        .context("HTTP server error")?;

        Ok(())
    }
}
