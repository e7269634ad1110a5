use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::header,
    response::{Html, IntoResponse, Response},
};
use tracing::warn;

use crate::config::settings::Settings;
use crate::geo::GeoResolver;
use crate::storage::VisitStore;

use super::capture::capture;
use super::landing::render_landing;
use super::pixel::ImagePayload;
use super::report::{render_report, REPORT_LIMIT};

/// Shared state handed to every handler. Built once in `main`.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn VisitStore>,
    pub geo: Arc<GeoResolver>,
    pub settings: Arc<Settings>,
}

/// GET / -- landing page.
pub async fn landing(State(state): State<AppState>) -> Html<String> {
    Html(render_landing(&state.settings.landing))
}

/// GET /track.png -- record the visit, then answer with an image.
///
/// Always 200 with an image body, whatever happened to the lookup or write.
pub async fn track(State(state): State<AppState>, req: Request) -> Response {
    let (parts, _) = req.into_parts();
    let peer = parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);

    capture(state.store.as_ref(), &state.geo, &parts.headers, peer).await;

    let image = ImagePayload::load(&state.settings.assets.tracking_image_path()).await;
    (
        [
            (header::CONTENT_TYPE, image.content_type),
            (header::CACHE_CONTROL, "no-store, no-cache, must-revalidate"),
        ],
        image.body,
    )
        .into_response()
}

/// GET /leaked -- the most recent captures.
pub async fn leaked(State(state): State<AppState>) -> Html<String> {
    let visits = match state.store.recent(REPORT_LIMIT) {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, "Failed to read visits, rendering empty report");
            Vec::new()
        }
    };
    Html(render_report(&visits))
}
