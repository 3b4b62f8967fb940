// HTTP request handlers
use crate::application::dashboard_service::SparklineRequest;
use crate::domain::dashboard::{ControlSnapshot, DashboardView};
use crate::infrastructure::svg::render_svg;
use crate::presentation::app_state::AppState;
use axum::{
    extract::{Json, Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Deserialize)]
pub struct SelectRequest {
    pub id: String,
}

#[derive(Deserialize)]
pub struct ViewportRequest {
    pub width: f64,
    pub height: f64,
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

pub async fn get_dashboard(State(state): State<Arc<AppState>>) -> Json<DashboardView> {
    Json(state.dashboard.view())
}

/// Sparkline for one metric as SVG; 204 until two samples have arrived
pub async fn get_sparkline(
    Path(metric): Path<String>,
    Query(request): Query<SparklineRequest>,
    State(state): State<Arc<AppState>>,
) -> Response {
    match state.dashboard.sparkline(&metric, &request) {
        Ok(Some(geometry)) => (
            [
                (header::CONTENT_TYPE, "image/svg+xml"),
                (header::CACHE_CONTROL, "no-store"),
            ],
            render_svg(&geometry, &metric),
        )
            .into_response(),
        Ok(None) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => (StatusCode::NOT_FOUND, e.to_string()).into_response(),
    }
}

pub async fn put_viewport(
    Path(metric): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(request): Json<ViewportRequest>,
) -> Response {
    match state.dashboard.observe_viewport(&metric, request.width, request.height) {
        Ok(()) => StatusCode::ACCEPTED.into_response(),
        Err(e) => (StatusCode::NOT_FOUND, e.to_string()).into_response(),
    }
}

fn selection_response(
    request: SelectRequest,
    select: impl FnOnce(&str) -> ControlSnapshot,
) -> Response {
    if request.id.trim().is_empty() {
        return (StatusCode::BAD_REQUEST, "id must not be empty").into_response();
    }
    Json(select(&request.id)).into_response()
}

pub async fn select_channel(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SelectRequest>,
) -> Response {
    selection_response(request, |id| state.dashboard.control().select_channel(id))
}

pub async fn select_stream(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SelectRequest>,
) -> Response {
    selection_response(request, |id| state.dashboard.control().select_stream(id))
}

pub async fn select_variant(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SelectRequest>,
) -> Response {
    selection_response(request, |id| state.dashboard.control().select_variant(id))
}

/// Go live / stop. Only offered once the selection triple is complete.
pub async fn toggle_intent(State(state): State<Arc<AppState>>) -> Response {
    let control = state.dashboard.control();
    if !control.is_complete() {
        tracing::warn!("Rejected intent toggle with incomplete selection");
        return (StatusCode::CONFLICT, Json(control.snapshot())).into_response();
    }
    Json(control.toggle_intent()).into_response()
}
