// Presentation layer - HTTP routes over the application services
pub mod app_state;
pub mod handlers;
pub mod views;

use axum::routing::{get, post, put};
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    apply_filters, chart_selection, dashboard_chart, get_dashboard, get_wtp_dashboard,
    health_check, historical_readings, readings_by_oem, readings_by_parameter, recent_readings,
    redirect_to_wtp_dashboard, refresh_dashboard, select_wtp_tab, stream_wtp_dashboard,
};

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(redirect_to_wtp_dashboard))
        .route("/healthz", get(health_check))
        .route("/dashboard", get(get_dashboard))
        .route("/dashboard/filters", put(apply_filters))
        .route("/dashboard/refresh", post(refresh_dashboard))
        .route("/dashboard/charts/:kind", get(dashboard_chart))
        .route("/dashboard/chart-selection", post(chart_selection))
        .route("/dashboard/readings/oem/:oem", get(readings_by_oem))
        .route("/dashboard/readings/parameter/:parameter", get(readings_by_parameter))
        .route("/dashboard/historical", get(historical_readings))
        .route("/dashboard/recent", get(recent_readings))
        .route("/wtp-dashboard", get(get_wtp_dashboard))
        .route("/wtp-dashboard/tab/:index", put(select_wtp_tab))
        .route("/wtp-dashboard/stream", get(stream_wtp_dashboard))
        .fallback(redirect_to_wtp_dashboard)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
