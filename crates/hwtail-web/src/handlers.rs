//! HTTP request handlers.

use axum::Json;
use axum::body::Body;
use axum::extract::State;
use axum::http::{StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use rust_embed::Embed;
use serde::Serialize;

use hwtail_core::model::{MetricSnapshot, Status};

use crate::state::AppState;

// ============================================================
// Embedded frontend assets
// ============================================================

#[derive(Embed)]
#[folder = "static"]
struct FrontendAssets;

// ============================================================
// Stats
// ============================================================

#[utoipa::path(
    get,
    path = "/stats",
    responses(
        (status = 200, description = "Latest published metrics snapshot", body = MetricSnapshot)
    )
)]
pub(crate) async fn handle_stats(State(store): AppState) -> impl IntoResponse {
    let snapshot = MetricSnapshot::clone(&store.read());
    ([(header::CACHE_CONTROL, "no-store")], Json(snapshot))
}

// ============================================================
// Health
// ============================================================

#[derive(Serialize, utoipa::ToSchema)]
pub(crate) struct Health {
    /// Always `ok` while the server answers.
    status: &'static str,
    version: &'static str,
    /// Status of the log monitor.
    monitor: Status,
}

#[utoipa::path(
    get,
    path = "/api/v1/health",
    responses(
        (status = 200, description = "Service is healthy", body = Health)
    )
)]
pub(crate) async fn handle_health(State(store): AppState) -> Json<Health> {
    Json(Health {
        status: "ok",
        version: hwtail_core::VERSION,
        monitor: store.read().raw.status,
    })
}

// ============================================================
// Static files
// ============================================================

pub(crate) async fn serve_frontend(uri: Uri) -> Response<Body> {
    let path = uri.path().trim_start_matches('/');
    let path = if path.is_empty() { "index.html" } else { path };

    match FrontendAssets::get(path) {
        Some(file) => {
            let mime = mime_guess::from_path(path).first_or_octet_stream();
            (
                [(header::CONTENT_TYPE, mime.as_ref().to_owned())],
                file.data.into_owned(),
            )
                .into_response()
        }
        None => (StatusCode::NOT_FOUND, "not found").into_response(),
    }
}
