// HTTP request handlers
use crate::application::chart_adapter::on_chart_select;
use crate::application::sensor_repository::{DEFAULT_RECENT_PAGE, DEFAULT_RECENT_PAGE_SIZE};
use crate::domain::chart::ChartKind;
use crate::infrastructure::http_response::{accepts_brotli, json_response};
use crate::infrastructure::snapshot_stream::stream_from_watch;
use crate::presentation::app_state::AppState;
use crate::presentation::views::{DashboardView, WtpView};
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Deserialize)]
pub struct ChartQuery {
    pub chart: Option<ChartKind>,
}

#[derive(Deserialize)]
pub struct FilterRequest {
    pub oem: Option<String>,
    pub parameter: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalQuery {
    pub stage_id: i64,
    pub parameter: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

#[derive(Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub size: Option<u32>,
}

async fn respond<T: Serialize>(value: &T, headers: &HeaderMap) -> Response {
    match json_response(value, accepts_brotli(headers)).await {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Landing route and anything unknown
pub async fn redirect_to_wtp_dashboard() -> Redirect {
    Redirect::to("/wtp-dashboard")
}

async fn dashboard_response(state: &AppState, kind: ChartKind, headers: &HeaderMap) -> Response {
    let snapshot = state.dashboard_service.snapshot().await;
    let summaries = state.dashboard_service.alert_summaries().await;
    let view = DashboardView::new(snapshot, kind, summaries);
    respond(&view, headers).await
}

/// Filterable readings view with one chart
pub async fn get_dashboard(
    Query(query): Query<ChartQuery>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    dashboard_response(&state, query.chart.unwrap_or_default(), &headers).await
}

pub async fn apply_filters(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    Json(request): Json<FilterRequest>,
) -> Response {
    state
        .dashboard_service
        .set_filters(request.oem.as_deref(), request.parameter.as_deref())
        .await;
    dashboard_response(&state, ChartKind::default(), &headers).await
}

/// Manual refresh: reloads the latest readings
pub async fn refresh_dashboard(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    state.dashboard_service.manual_refresh().await;
    dashboard_response(&state, ChartKind::default(), &headers).await
}

pub async fn dashboard_chart(
    Path(kind): Path<String>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    let kind = match kind.parse::<ChartKind>() {
        Ok(kind) => kind,
        Err(e) => return (StatusCode::BAD_REQUEST, e).into_response(),
    };

    let chart = state.dashboard_service.chart(kind).await;
    if chart.is_empty() {
        tracing::debug!("No data for {} chart", chart.kind());
    }
    respond(&chart, &headers).await
}

/// Click events from a rendered chart
pub async fn chart_selection(Json(event): Json<serde_json::Value>) -> StatusCode {
    on_chart_select(&event);
    StatusCode::NO_CONTENT
}

pub async fn readings_by_oem(
    Path(oem): Path<String>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    let readings = state.dashboard_service.readings_for_oem(&oem).await;
    respond(&readings, &headers).await
}

pub async fn readings_by_parameter(
    Path(parameter): Path<String>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    let readings = state.dashboard_service.readings_for_parameter(&parameter).await;
    respond(&readings, &headers).await
}

pub async fn historical_readings(
    Query(query): Query<HistoricalQuery>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    let readings = state
        .dashboard_service
        .historical(query.stage_id, &query.parameter, query.start_time, query.end_time)
        .await;
    respond(&readings, &headers).await
}

/// One page of recent readings, passed through as the backend shaped it
pub async fn recent_readings(
    Query(query): Query<PageQuery>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    let page = state
        .dashboard_service
        .recent(
            query.page.unwrap_or(DEFAULT_RECENT_PAGE),
            query.size.unwrap_or(DEFAULT_RECENT_PAGE_SIZE),
        )
        .await;
    respond(&page, &headers).await
}

async fn wtp_response(state: &AppState, headers: &HeaderMap) -> Response {
    let processes = state.wtp_service.processes().await;
    let overview = state.wtp_service.overview().await;
    let selected_tab = state.wtp_service.selected_tab().await;
    let view = WtpView::new(&processes, &overview, selected_tab);
    respond(&view, headers).await
}

/// Per-process KPI view
pub async fn get_wtp_dashboard(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    wtp_response(&state, &headers).await
}

pub async fn select_wtp_tab(
    Path(index): Path<usize>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    state.wtp_service.select_tab(index).await;
    wtp_response(&state, &headers).await
}

/// Process snapshots as newline-delimited JSON, one line per KPI tick
pub async fn stream_wtp_dashboard(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    stream_from_watch(state.wtp_service.subscribe(), state.shutdown.clone())
}

#[cfg(test)]
mod tests {
    use crate::application::dashboard_service::tests::populated_source;
    use crate::application::dashboard_service::DashboardService;
    use crate::application::wtp_service::WtpService;
    use crate::infrastructure::snapshot_stream::shutdown_requested;
    use crate::presentation::app_state::AppState;
    use crate::presentation::router;
    use reqwest::redirect::Policy;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::watch;

    async fn serve() -> (String, AppState) {
        let state = AppState {
            dashboard_service: DashboardService::new(
                Arc::new(populated_source()),
                Duration::from_secs(30),
            ),
            wtp_service: WtpService::new(Duration::from_secs(10)),
            shutdown: watch::channel(false).1,
        };
        state.dashboard_service.load_initial().await;

        let app = router(Arc::new(state.clone()));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{}", addr), state)
    }

    fn no_redirects() -> reqwest::Client {
        reqwest::Client::builder()
            .redirect(Policy::none())
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_unknown_routes_redirect_to_wtp_dashboard() {
        let (base, _) = serve().await;
        let client = no_redirects();

        for path in ["/", "/reports/annual", "/dashboard/nope/deeper"] {
            let response = client.get(format!("{}{}", base, path)).send().await.unwrap();
            assert_eq!(response.status(), 303, "path {}", path);
            assert_eq!(response.headers()["location"], "/wtp-dashboard");
        }

        let health = client.get(format!("{}/healthz", base)).send().await.unwrap();
        assert_eq!(health.text().await.unwrap(), "ok");
    }

    #[tokio::test]
    async fn test_dashboard_filters_and_charts() {
        let (base, _) = serve().await;
        let client = reqwest::Client::new();

        let view: Value = client
            .get(format!("{}/dashboard?chart=pie", base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(view["filteredReadings"].as_array().unwrap().len(), 10);
        assert_eq!(view["chart"]["kind"], "pie");
        assert_eq!(view["loading"], false);

        let filtered: Value = client
            .put(format!("{}/dashboard/filters", base))
            .json(&json!({"parameter": "pH"}))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(filtered["selectedOem"], "all");
        assert_eq!(filtered["selectedParameter"], "pH");
        assert_eq!(filtered["filteredReadings"].as_array().unwrap().len(), 3);
        assert_eq!(filtered["parameterGroups"][0]["value"], 3);

        let gauge: Value = client
            .get(format!("{}/dashboard/charts/gauge", base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(gauge["kind"], "gauge");
        assert_eq!(gauge["data"]["point"]["value"], 7.0);

        let bad = client
            .get(format!("{}/dashboard/charts/radar", base))
            .send()
            .await
            .unwrap();
        assert_eq!(bad.status(), 400);
    }

    #[tokio::test]
    async fn test_wtp_dashboard_view_and_tabs() {
        let (base, state) = serve().await;
        let client = reqwest::Client::new();

        let view: Value = client
            .put(format!("{}/wtp-dashboard/tab/4", base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(view["selectedTab"], 4);
        assert_eq!(view["processes"].as_array().unwrap().len(), 6);
        assert_eq!(view["overview"][0]["icon"], "trending_up");
        assert_eq!(state.wtp_service.selected_tab().await, 4);
    }

    #[tokio::test]
    async fn test_brotli_when_requested() {
        let (base, _) = serve().await;
        let response = reqwest::Client::new()
            .get(format!("{}/wtp-dashboard", base))
            .header("accept-encoding", "br")
            .send()
            .await
            .unwrap();
        assert_eq!(response.headers()["content-encoding"], "br");
    }

    #[tokio::test]
    async fn test_backend_passthroughs() {
        let (base, _) = serve().await;
        let client = reqwest::Client::new();

        let by_oem: Value = client
            .get(format!("{}/dashboard/readings/oem/Siemens", base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(by_oem.as_array().unwrap().len(), 5);
        assert_eq!(by_oem[0]["oem"], "Siemens");

        let by_parameter: Value = client
            .get(format!("{}/dashboard/readings/parameter/Chlorine", base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(by_parameter.as_array().unwrap().len(), 3);

        let historical: Value = client
            .get(format!("{}/dashboard/historical", base))
            .query(&[
                ("stageId", "2"),
                ("parameter", "pH"),
                ("startTime", "2024-05-01T00:00:00Z"),
                ("endTime", "2024-05-02T00:00:00Z"),
            ])
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(historical.as_array().unwrap().len(), 3);

        let missing_range = client
            .get(format!("{}/dashboard/historical?stageId=2&parameter=pH", base))
            .send()
            .await
            .unwrap();
        assert_eq!(missing_range.status(), 400);

        let recent = client
            .get(format!("{}/dashboard/recent", base))
            .send()
            .await
            .unwrap();
        assert_eq!(recent.status(), 200);
        assert_eq!(recent.json::<Value>().await.unwrap(), Value::Null);

        let selected = client
            .post(format!("{}/dashboard/chart-selection", base))
            .json(&json!({"name": "ABB", "value": 5}))
            .send()
            .await
            .unwrap();
        assert_eq!(selected.status(), 204);
    }

    async fn next_line(response: &mut reqwest::Response, buffer: &mut Vec<u8>) -> Value {
        loop {
            if let Some(end) = buffer.iter().position(|b| *b == b'\n') {
                let line: Vec<u8> = buffer.drain(..=end).collect();
                return serde_json::from_slice(&line).unwrap();
            }
            let chunk = tokio::time::timeout(Duration::from_secs(5), response.chunk())
                .await
                .unwrap()
                .unwrap()
                .unwrap();
            buffer.extend_from_slice(&chunk);
        }
    }

    #[tokio::test]
    async fn test_graceful_shutdown_closes_open_streams() {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let state = AppState {
            dashboard_service: DashboardService::new(
                Arc::new(populated_source()),
                Duration::from_secs(30),
            ),
            wtp_service: WtpService::new(Duration::from_secs(10)),
            shutdown: shutdown_rx.clone(),
        };

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let mut signal = shutdown_rx;
        let server = tokio::spawn(async move {
            axum::serve(listener, router(Arc::new(state)))
                .with_graceful_shutdown(async move {
                    shutdown_requested(&mut signal).await;
                })
                .await
                .unwrap();
        });

        let mut response = reqwest::Client::new()
            .get(format!("http://{}/wtp-dashboard/stream", addr))
            .send()
            .await
            .unwrap();
        let mut buffer = Vec::new();
        let initial = next_line(&mut response, &mut buffer).await;
        assert_eq!(initial.as_array().unwrap().len(), 6);

        shutdown_tx.send_replace(true);
        tokio::time::timeout(Duration::from_secs(3), server)
            .await
            .expect("server should stop while a stream is open")
            .unwrap();
    }

    #[tokio::test]
    async fn test_stream_emits_snapshot_per_tick() {
        let (base, state) = serve().await;
        let mut response = reqwest::Client::new()
            .get(format!("{}/wtp-dashboard/stream", base))
            .send()
            .await
            .unwrap();
        assert_eq!(response.headers()["content-type"], "application/x-ndjson");

        let mut buffer = Vec::new();
        let initial = next_line(&mut response, &mut buffer).await;
        assert_eq!(initial.as_array().unwrap().len(), 6);
        assert_eq!(initial[0]["kpis"][0]["trend"], "stable");

        state.wtp_service.tick().await;
        let ticked = next_line(&mut response, &mut buffer).await;
        assert_eq!(ticked.as_array().unwrap().len(), 6);
        assert!(ticked[0]["kpis"][0]["value"].is_number());
    }
}
