// Presentation layer - HTTP surface over the dashboard
pub mod app_state;
pub mod handlers;

use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    get_dashboard, get_sparkline, health_check, put_viewport, select_channel, select_stream,
    select_variant, toggle_intent,
};
use axum::Router;
use axum::routing::{get, post, put};
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(health_check))
        .route("/api/dashboard", get(get_dashboard))
        .route("/api/sparklines/:metric", get(get_sparkline))
        .route("/api/sparklines/:metric/viewport", put(put_viewport))
        .route("/api/selection/channel", post(select_channel))
        .route("/api/selection/stream", post(select_stream))
        .route("/api/selection/variant", post(select_variant))
        .route("/api/intent/toggle", post(toggle_intent))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
