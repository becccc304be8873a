// Dashboard service - Loads backend data, applies filters and keeps it fresh
use crate::application::chart_adapter::to_chart_data;
use crate::application::poller::{spawn_poller, PollHandle};
use crate::application::sensor_repository::SensorDataSource;
use crate::domain::chart::{ChartData, ChartKind};
use crate::domain::sensor::{
    parse_timestamp, AlertSummary, DashboardStats, ProcessStage, RecentReadingsPage, SensorReading,
};
use chrono::{DateTime, Local, Utc};
use indexmap::IndexMap;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Filter value that leaves a dimension unconstrained.
pub const ALL: &str = "all";

pub const LOAD_ERROR_MESSAGE: &str = "Failed to load dashboard data";

/// Share outside a breached threshold past which an alert is severe.
const SEVERE_DEVIATION: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadPhase {
    Loading,
    Idle,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "result")]
pub enum LoadOutcome {
    Success,
    PartialFailure { failed: Vec<String> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Primary,
    Accent,
    Warn,
}

/// Readings of one parameter within the filtered set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterGroup {
    pub name: String,
    pub value: usize,
    pub data: Vec<SensorReading>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardState {
    pub latest_readings: Vec<SensorReading>,
    pub process_stages: Vec<ProcessStage>,
    pub oems: Vec<String>,
    pub parameters: Vec<String>,
    pub dashboard_stats: Option<DashboardStats>,
    pub alerts: Vec<SensorReading>,
    pub selected_oem: String,
    pub selected_parameter: String,
    pub filtered_readings: Vec<SensorReading>,
    pub parameter_groups: Vec<ParameterGroup>,
    pub phase: LoadPhase,
    pub loading: bool,
    pub last_outcome: Option<LoadOutcome>,
    pub error: Option<String>,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self {
            latest_readings: Vec::new(),
            process_stages: Vec::new(),
            oems: Vec::new(),
            parameters: Vec::new(),
            dashboard_stats: None,
            alerts: Vec::new(),
            selected_oem: ALL.to_string(),
            selected_parameter: ALL.to_string(),
            filtered_readings: Vec::new(),
            parameter_groups: Vec::new(),
            phase: LoadPhase::Loading,
            loading: true,
            last_outcome: None,
            error: None,
        }
    }
}

impl DashboardState {
    fn apply_filters(&mut self) {
        self.filtered_readings = filter_readings(
            &self.latest_readings,
            &self.selected_oem,
            &self.selected_parameter,
        );
        self.parameter_groups = group_by_parameter(&self.filtered_readings);
    }

    fn begin_load(&mut self) {
        self.phase = LoadPhase::Loading;
        self.loading = true;
    }

    fn finish_load(&mut self, failed: Vec<String>) {
        self.last_outcome = Some(if failed.is_empty() {
            LoadOutcome::Success
        } else {
            LoadOutcome::PartialFailure { failed }
        });
        self.phase = LoadPhase::Idle;
        self.loading = false;
    }
}

/// Intersection of the OEM and parameter constraints; `"all"` imposes none.
pub fn filter_readings(
    readings: &[SensorReading],
    oem: &str,
    parameter: &str,
) -> Vec<SensorReading> {
    readings
        .iter()
        .filter(|r| oem == ALL || r.oem == oem)
        .filter(|r| parameter == ALL || r.parameter_name == parameter)
        .cloned()
        .collect()
}

pub fn group_by_parameter(readings: &[SensorReading]) -> Vec<ParameterGroup> {
    let mut groups: IndexMap<&str, Vec<SensorReading>> = IndexMap::new();
    for reading in readings {
        groups
            .entry(reading.parameter_name.as_str())
            .or_default()
            .push(reading.clone());
    }

    groups
        .into_iter()
        .map(|(name, data)| ParameterGroup {
            name: name.to_string(),
            value: data.len(),
            data,
        })
        .collect()
}

pub fn summarize_alerts(alerts: &[SensorReading]) -> Vec<AlertSummary> {
    let mut summaries: IndexMap<&str, AlertSummary> = IndexMap::new();

    for alert in alerts {
        let summary = summaries
            .entry(alert.parameter_name.as_str())
            .or_insert_with(|| AlertSummary {
                parameter_name: alert.parameter_name.clone(),
                alert_count: 0,
                process_stages: Vec::new(),
            });
        summary.alert_count += 1;

        let stage = alert.stage_key();
        if !summary.process_stages.iter().any(|s| s == stage) {
            summary.process_stages.push(stage.to_string());
        }
    }

    summaries.into_values().collect()
}

/// Severity of an alert reading by how far it sits outside the threshold it
/// breached. Zero thresholds count as unset.
pub fn alert_severity(reading: &SensorReading) -> AlertSeverity {
    if !reading.is_alert {
        return AlertSeverity::Primary;
    }

    let value = if reading.value.is_nan() { 0.0 } else { reading.value };

    if let Some(min) = reading.threshold_min.filter(|m| *m != 0.0) {
        if value < min {
            return severity_for((value - min) / min);
        }
    }

    if let Some(max) = reading.threshold_max.filter(|m| *m != 0.0) {
        if value > max {
            return severity_for((value - max) / max);
        }
    }

    AlertSeverity::Accent
}

fn severity_for(relative_deviation: f64) -> AlertSeverity {
    if relative_deviation.abs() > SEVERE_DEVIATION {
        AlertSeverity::Warn
    } else {
        AlertSeverity::Accent
    }
}

pub fn status_icon(reading: &SensorReading) -> &'static str {
    if reading.is_alert {
        "warning"
    } else {
        "check_circle"
    }
}

/// Local date and time, e.g. `5/1/2024, 10:15:00 AM`.
pub fn format_timestamp(timestamp: &str) -> String {
    match parse_timestamp(timestamp) {
        Some(t) => t
            .with_timezone(&Local)
            .format("%-m/%-d/%Y, %-I:%M:%S %p")
            .to_string(),
        None => "Invalid Date".to_string(),
    }
}

#[derive(Clone)]
pub struct DashboardService {
    source: Arc<dyn SensorDataSource>,
    state: Arc<RwLock<DashboardState>>,
    poll_interval: Duration,
}

impl DashboardService {
    pub fn new(source: Arc<dyn SensorDataSource>, poll_interval: Duration) -> Self {
        Self {
            source,
            state: Arc::new(RwLock::new(DashboardState::default())),
            poll_interval,
        }
    }

    pub async fn snapshot(&self) -> DashboardState {
        self.state.read().await.clone()
    }

    /// Chart data for the currently filtered readings.
    pub async fn chart(&self, kind: ChartKind) -> ChartData {
        let state = self.state.read().await;
        to_chart_data(&state.filtered_readings, kind)
    }

    pub async fn alert_summaries(&self) -> Vec<AlertSummary> {
        summarize_alerts(&self.state.read().await.alerts)
    }

    /// Fetches all six data sets concurrently. A failed fetch is logged and
    /// leaves its field empty; only a broken fan-out surfaces an error.
    pub async fn load_initial(&self) {
        self.state.write().await.begin_load();

        let loaders: Vec<(&'static str, tokio::task::JoinHandle<bool>)> = vec![
            (
                "latest readings",
                self.spawn_load(|svc| async move { svc.load_latest_readings().await }),
            ),
            (
                "process stages",
                self.spawn_load(|svc| async move { svc.load_process_stages().await }),
            ),
            ("OEMs", self.spawn_load(|svc| async move { svc.load_oems().await })),
            (
                "parameters",
                self.spawn_load(|svc| async move { svc.load_parameters().await }),
            ),
            (
                "dashboard stats",
                self.spawn_load(|svc| async move { svc.load_dashboard_stats().await }),
            ),
            ("alerts", self.spawn_load(|svc| async move { svc.load_alerts().await })),
        ];

        let (names, handles): (Vec<_>, Vec<_>) = loaders.into_iter().unzip();
        let results = futures::future::join_all(handles).await;

        let mut failed = Vec::new();
        let mut orchestration_error = None;
        for (name, result) in names.into_iter().zip(results) {
            match result {
                Ok(true) => {}
                Ok(false) => failed.push(name.to_string()),
                Err(e) => {
                    tracing::error!("Error loading dashboard data: {} task failed: {}", name, e);
                    failed.push(name.to_string());
                    orchestration_error = Some(LOAD_ERROR_MESSAGE.to_string());
                }
            }
        }

        let mut state = self.state.write().await;
        if orchestration_error.is_some() {
            state.error = orchestration_error;
        }
        state.finish_load(failed);
        tracing::info!(
            "Dashboard loaded: {} readings, {} alerts",
            state.latest_readings.len(),
            state.alerts.len()
        );
    }

    fn spawn_load<F, Fut>(&self, load: F) -> tokio::task::JoinHandle<bool>
    where
        F: FnOnce(DashboardService) -> Fut,
        Fut: std::future::Future<Output = bool> + Send + 'static,
    {
        tokio::spawn(load(self.clone()))
    }

    /// Poll tick: latest readings, stats and alerts. Failures keep the
    /// previous data.
    pub async fn refresh(&self) {
        self.state.write().await.begin_load();

        let (readings, stats, alerts) = tokio::join!(
            self.load_latest_readings(),
            self.load_dashboard_stats(),
            self.load_alerts()
        );

        let failed = [
            (readings, "latest readings"),
            (stats, "dashboard stats"),
            (alerts, "alerts"),
        ]
        .into_iter()
        .filter(|(ok, _)| !ok)
        .map(|(_, name)| name.to_string())
        .collect();

        self.state.write().await.finish_load(failed);
    }

    /// Reloads the latest readings only, through the same load phases as a
    /// poll tick.
    pub async fn manual_refresh(&self) {
        self.state.write().await.begin_load();

        let failed = if self.load_latest_readings().await {
            Vec::new()
        } else {
            vec!["latest readings".to_string()]
        };

        self.state.write().await.finish_load(failed);
    }

    pub fn start_polling(&self) -> PollHandle {
        let service = self.clone();
        spawn_poller("dashboard", self.poll_interval, move || {
            let service = service.clone();
            async move { service.refresh().await }
        })
    }

    /// Readings of one OEM straight from the backend, empty on failure.
    pub async fn readings_for_oem(&self, oem: &str) -> Vec<SensorReading> {
        self.source.readings_by_oem(oem).await.unwrap_or_else(|e| {
            tracing::error!("Error loading readings for OEM {}: {}", oem, e);
            Vec::new()
        })
    }

    pub async fn readings_for_parameter(&self, parameter: &str) -> Vec<SensorReading> {
        self.source
            .readings_by_parameter(parameter)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("Error loading readings for parameter {}: {}", parameter, e);
                Vec::new()
            })
    }

    pub async fn historical(
        &self,
        stage_id: i64,
        parameter: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Vec<SensorReading> {
        self.source
            .historical_data(stage_id, parameter, start, end)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("Error loading historical data: {}", e);
                Vec::new()
            })
    }

    pub async fn recent(&self, page: u32, size: u32) -> RecentReadingsPage {
        self.source.recent_readings(page, size).await.unwrap_or_else(|e| {
            tracing::error!("Error loading recent readings: {}", e);
            RecentReadingsPage::default()
        })
    }

    pub async fn set_oem_filter(&self, oem: &str) {
        let mut state = self.state.write().await;
        state.selected_oem = oem.to_string();
        state.apply_filters();
        tracing::debug!("OEM filter set to {}", oem);
    }

    pub async fn set_parameter_filter(&self, parameter: &str) {
        let mut state = self.state.write().await;
        state.selected_parameter = parameter.to_string();
        state.apply_filters();
        tracing::debug!("Parameter filter set to {}", parameter);
    }

    /// Applies whichever filters are given; absent ones keep their value.
    pub async fn set_filters(&self, oem: Option<&str>, parameter: Option<&str>) {
        if let Some(oem) = oem {
            self.set_oem_filter(oem).await;
        }
        if let Some(parameter) = parameter {
            self.set_parameter_filter(parameter).await;
        }
    }

    async fn load_latest_readings(&self) -> bool {
        match self.source.latest_readings().await {
            Ok(readings) => {
                let mut state = self.state.write().await;
                state.latest_readings = readings;
                state.apply_filters();
                true
            }
            Err(e) => {
                tracing::error!("Error loading latest readings: {}", e);
                false
            }
        }
    }

    async fn load_process_stages(&self) -> bool {
        match self.source.process_stages().await {
            Ok(stages) => {
                self.state.write().await.process_stages = stages;
                true
            }
            Err(e) => {
                tracing::error!("Error loading process stages: {}", e);
                false
            }
        }
    }

    async fn load_oems(&self) -> bool {
        match self.source.oems().await {
            Ok(oems) => {
                self.state.write().await.oems = oems;
                true
            }
            Err(e) => {
                tracing::error!("Error loading OEMs: {}", e);
                false
            }
        }
    }

    async fn load_parameters(&self) -> bool {
        match self.source.parameters().await {
            Ok(parameters) => {
                self.state.write().await.parameters = parameters;
                true
            }
            Err(e) => {
                tracing::error!("Error loading parameters: {}", e);
                false
            }
        }
    }

    async fn load_dashboard_stats(&self) -> bool {
        match self.source.dashboard_stats().await {
            Ok(stats) => {
                self.state.write().await.dashboard_stats = stats;
                true
            }
            Err(e) => {
                tracing::error!("Error loading dashboard stats: {}", e);
                false
            }
        }
    }

    async fn load_alerts(&self) -> bool {
        match self.source.alerts().await {
            Ok(alerts) => {
                self.state.write().await.alerts = alerts;
                true
            }
            Err(e) => {
                tracing::error!("Error loading alerts: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::application::sensor_repository::{FetchError, FetchResult};
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::collections::HashSet;
    use std::sync::Mutex;

    /// In-memory backend. Operations named in `failing` return an error,
    /// the one named in `panicking` panics.
    #[derive(Default)]
    pub(crate) struct FakeSource {
        pub readings: Mutex<Vec<SensorReading>>,
        pub alerts: Vec<SensorReading>,
        pub oems: Vec<String>,
        pub parameters: Vec<String>,
        pub stats: Option<DashboardStats>,
        pub failing: Mutex<HashSet<&'static str>>,
        pub panicking: Option<&'static str>,
    }

    impl FakeSource {
        fn check(&self, op: &'static str) -> FetchResult<()> {
            if self.panicking == Some(op) {
                panic!("{} exploded", op);
            }
            if self.failing.lock().unwrap().contains(op) {
                return Err(FetchError::Status {
                    url: format!("http://backend/{}", op),
                    status: 503,
                    body: "unavailable".to_string(),
                });
            }
            Ok(())
        }

        pub fn fail(&self, op: &'static str) {
            self.failing.lock().unwrap().insert(op);
        }
    }

    #[async_trait]
    impl SensorDataSource for FakeSource {
        async fn latest_readings(&self) -> FetchResult<Vec<SensorReading>> {
            self.check("latest-readings")?;
            Ok(self.readings.lock().unwrap().clone())
        }

        async fn readings_by_oem(&self, oem: &str) -> FetchResult<Vec<SensorReading>> {
            self.check("readings-by-oem")?;
            Ok(filter_readings(&self.readings.lock().unwrap(), oem, ALL))
        }

        async fn historical_data(
            &self,
            _stage_id: i64,
            parameter: &str,
            _start: DateTime<Utc>,
            _end: DateTime<Utc>,
        ) -> FetchResult<Vec<SensorReading>> {
            self.check("historical")?;
            Ok(filter_readings(&self.readings.lock().unwrap(), ALL, parameter))
        }

        async fn alerts(&self) -> FetchResult<Vec<SensorReading>> {
            self.check("alerts")?;
            Ok(self.alerts.clone())
        }

        async fn recent_readings(&self, _page: u32, _size: u32) -> FetchResult<RecentReadingsPage> {
            self.check("recent")?;
            Ok(RecentReadingsPage::default())
        }

        async fn parameters(&self) -> FetchResult<Vec<String>> {
            self.check("parameters")?;
            Ok(self.parameters.clone())
        }

        async fn process_stages(&self) -> FetchResult<Vec<ProcessStage>> {
            self.check("process-stages")?;
            Ok(Vec::new())
        }

        async fn oems(&self) -> FetchResult<Vec<String>> {
            self.check("oems")?;
            Ok(self.oems.clone())
        }

        async fn readings_by_parameter(&self, parameter: &str) -> FetchResult<Vec<SensorReading>> {
            self.check("readings-by-parameter")?;
            Ok(filter_readings(&self.readings.lock().unwrap(), ALL, parameter))
        }

        async fn dashboard_stats(&self) -> FetchResult<Option<DashboardStats>> {
            self.check("stats")?;
            Ok(self.stats.clone())
        }
    }

    pub(crate) fn ten_readings() -> Vec<SensorReading> {
        let oems = ["ABB", "Siemens"];
        let params = ["Turbidity", "pH", "Chlorine"];
        (0..10)
            .map(|i| {
                SensorReading::new(
                    oems[i % 2],
                    params[i % 3],
                    i as f64,
                    "u",
                    &format!("2024-05-01T10:{:02}:00Z", i),
                )
                .with_stage("filtration")
            })
            .collect()
    }

    pub(crate) fn populated_source() -> FakeSource {
        FakeSource {
            readings: Mutex::new(ten_readings()),
            alerts: vec![
                SensorReading::new("ABB", "pH", 9.1, "", "2024-05-01T10:00:00Z")
                    .with_stage("intake")
                    .with_alert(true),
            ],
            oems: vec!["ABB".to_string(), "Siemens".to_string()],
            parameters: vec!["Turbidity".to_string(), "pH".to_string(), "Chlorine".to_string()],
            stats: Some(DashboardStats {
                total_readings: 10,
                active_stages: 6,
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn service(source: FakeSource) -> (DashboardService, Arc<FakeSource>) {
        let source = Arc::new(source);
        let service = DashboardService::new(source.clone(), Duration::from_secs(30));
        (service, source)
    }

    #[test]
    fn test_parameter_filter_ignores_oem_when_all() {
        let filtered = filter_readings(&ten_readings(), ALL, "pH");
        assert_eq!(filtered.len(), 3);
        assert!(filtered.iter().all(|r| r.parameter_name == "pH"));
        let oems: HashSet<&str> = filtered.iter().map(|r| r.oem.as_str()).collect();
        assert_eq!(oems.len(), 2);
    }

    #[test]
    fn test_filters_intersect() {
        let filtered = filter_readings(&ten_readings(), "ABB", "pH");
        let values: Vec<f64> = filtered.iter().map(|r| r.value).collect();
        assert_eq!(values, vec![4.0]);
        assert_eq!(filter_readings(&ten_readings(), ALL, ALL).len(), 10);
    }

    #[test]
    fn test_group_by_parameter_counts() {
        let groups = group_by_parameter(&ten_readings());
        let counts: Vec<(&str, usize)> =
            groups.iter().map(|g| (g.name.as_str(), g.value)).collect();
        assert_eq!(counts, vec![("Turbidity", 4), ("pH", 3), ("Chlorine", 3)]);
        assert_eq!(groups[1].data.len(), 3);
    }

    #[test]
    fn test_alert_severity() {
        let base = SensorReading::new("ABB", "pH", 13.0, "", "2024-05-01T10:00:00Z")
            .with_thresholds(6.0, 10.0);
        assert_eq!(alert_severity(&base), AlertSeverity::Primary);

        let severe = base.clone().with_alert(true);
        assert_eq!(alert_severity(&severe), AlertSeverity::Warn);

        let mut mild = severe.clone();
        mild.value = 10.5;
        assert_eq!(alert_severity(&mild), AlertSeverity::Accent);

        let mut low = severe.clone();
        low.value = 4.0;
        assert_eq!(alert_severity(&low), AlertSeverity::Warn);

        assert_eq!(status_icon(&severe), "warning");
        assert_eq!(status_icon(&base), "check_circle");
    }

    #[test]
    fn test_summarize_alerts() {
        let alerts = vec![
            SensorReading::new("ABB", "pH", 9.1, "", "t").with_stage("intake"),
            SensorReading::new("ABB", "pH", 9.3, "", "t").with_stage("filtration"),
            SensorReading::new("ABB", "pH", 9.4, "", "t").with_stage("intake"),
            SensorReading::new("ABB", "Turbidity", 40.0, "", "t"),
        ];
        let summaries = summarize_alerts(&alerts);
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].alert_count, 3);
        assert_eq!(summaries[0].process_stages, vec!["intake", "filtration"]);
        assert_eq!(summaries[1].process_stages, vec!["unknown"]);
    }

    #[test]
    fn test_format_invalid_timestamp() {
        assert_eq!(format_timestamp("garbage"), "Invalid Date");
        assert!(format_timestamp("2024-05-01T10:00:00Z").contains("2024"));
    }

    #[tokio::test]
    async fn test_initial_load_populates_everything() {
        let (service, _) = service(populated_source());
        assert!(service.snapshot().await.loading);

        service.load_initial().await;
        let state = service.snapshot().await;

        assert!(!state.loading);
        assert_eq!(state.phase, LoadPhase::Idle);
        assert_eq!(state.last_outcome, Some(LoadOutcome::Success));
        assert_eq!(state.latest_readings.len(), 10);
        assert_eq!(state.filtered_readings.len(), 10);
        assert_eq!(state.oems.len(), 2);
        assert_eq!(state.parameters.len(), 3);
        assert_eq!(state.alerts.len(), 1);
        assert_eq!(state.dashboard_stats.unwrap().total_readings, 10);
        assert!(state.error.is_none());
    }

    #[tokio::test]
    async fn test_failed_oems_fetch_leaves_siblings_intact() {
        let source = populated_source();
        source.fail("oems");
        let (service, _) = service(source);

        service.load_initial().await;
        let state = service.snapshot().await;

        assert!(state.oems.is_empty());
        assert_eq!(state.latest_readings.len(), 10);
        assert_eq!(state.parameters.len(), 3);
        assert!(state.dashboard_stats.is_some());
        assert!(state.error.is_none());
        assert_eq!(
            state.last_outcome,
            Some(LoadOutcome::PartialFailure {
                failed: vec!["OEMs".to_string()]
            })
        );
    }

    #[tokio::test]
    async fn test_broken_fan_out_sets_user_error() {
        let source = FakeSource {
            panicking: Some("alerts"),
            ..populated_source()
        };
        let (service, _) = service(source);

        service.load_initial().await;
        let state = service.snapshot().await;

        assert_eq!(state.error.as_deref(), Some(LOAD_ERROR_MESSAGE));
        assert!(!state.loading);
        assert_eq!(state.latest_readings.len(), 10);
    }

    #[tokio::test]
    async fn test_filters_reapply_after_reload() {
        let (service, source) = service(populated_source());
        service.load_initial().await;

        service.set_filters(Some("Siemens"), Some("Turbidity")).await;
        let state = service.snapshot().await;
        let values: Vec<f64> = state.filtered_readings.iter().map(|r| r.value).collect();
        assert_eq!(values, vec![3.0, 9.0]);
        assert_eq!(state.parameter_groups.len(), 1);

        source
            .readings
            .lock()
            .unwrap()
            .push(SensorReading::new("Siemens", "Turbidity", 11.0, "u", "2024-05-01T11:00:00Z"));
        service.manual_refresh().await;
        assert_eq!(service.snapshot().await.filtered_readings.len(), 3);

        service.set_oem_filter(ALL).await;
        service.set_parameter_filter("pH").await;
        assert_eq!(service.snapshot().await.filtered_readings.len(), 3);
    }

    #[tokio::test]
    async fn test_refresh_failure_keeps_stale_data() {
        let (service, source) = service(populated_source());
        service.load_initial().await;

        source.fail("latest-readings");
        source.fail("alerts");
        source.readings.lock().unwrap().clear();
        service.refresh().await;

        let state = service.snapshot().await;
        assert_eq!(state.latest_readings.len(), 10);
        assert_eq!(state.alerts.len(), 1);
        assert!(!state.loading);
        assert_eq!(
            state.last_outcome,
            Some(LoadOutcome::PartialFailure {
                failed: vec!["latest readings".to_string(), "alerts".to_string()]
            })
        );
    }

    #[tokio::test]
    async fn test_manual_refresh_records_outcome() {
        let (service, source) = service(populated_source());
        service.load_initial().await;

        source.fail("latest-readings");
        service.manual_refresh().await;

        let state = service.snapshot().await;
        assert!(!state.loading);
        assert_eq!(state.phase, LoadPhase::Idle);
        assert_eq!(state.latest_readings.len(), 10);
        assert_eq!(
            state.last_outcome,
            Some(LoadOutcome::PartialFailure {
                failed: vec!["latest readings".to_string()]
            })
        );

        source.failing.lock().unwrap().clear();
        service.manual_refresh().await;
        assert_eq!(
            service.snapshot().await.last_outcome,
            Some(LoadOutcome::Success)
        );
    }

    #[tokio::test]
    async fn test_chart_uses_filtered_readings() {
        let (service, _) = service(populated_source());
        service.load_initial().await;
        service.set_oem_filter("ABB").await;

        match service.chart(ChartKind::Pie).await {
            ChartData::Pie(slices) => {
                assert_eq!(slices.len(), 1);
                assert_eq!(slices[0].value, 5.0);
            }
            other => panic!("unexpected chart {:?}", other),
        }

        assert_eq!(service.alert_summaries().await.len(), 1);
    }

    #[tokio::test]
    async fn test_backend_queries_swallow_failures() {
        let (service, source) = service(populated_source());

        assert_eq!(service.readings_for_oem("ABB").await.len(), 5);
        assert_eq!(service.readings_for_parameter("Chlorine").await.len(), 3);

        let start = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 5, 2, 0, 0, 0).unwrap();
        assert_eq!(service.historical(1, "pH", start, end).await.len(), 3);

        source.fail("readings-by-oem");
        source.fail("recent");
        assert!(service.readings_for_oem("ABB").await.is_empty());
        assert_eq!(service.recent(0, 20).await, RecentReadingsPage::default());
    }

    #[tokio::test]
    async fn test_polling_refreshes_and_stops() {
        let source = Arc::new(populated_source());
        let service = DashboardService::new(source.clone(), Duration::from_millis(20));

        let handle = service.start_polling();
        tokio::time::sleep(Duration::from_millis(80)).await;
        handle.stop().await;

        let state = service.snapshot().await;
        assert_eq!(state.latest_readings.len(), 10);
        // The poll never loads the reference data sets.
        assert!(state.oems.is_empty());
    }
}
