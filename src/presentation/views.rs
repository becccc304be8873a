// View models served to the front end
use crate::application::chart_adapter;
use crate::application::dashboard_service::{
    alert_severity, format_timestamp, status_icon, AlertSeverity, DashboardState,
};
use crate::application::kpi_engine::kpi_status;
use crate::application::wtp_service::{
    count_active_alarms, process_emoji, stat_icon, status_color, trend_color, trend_description,
    trend_emoji, trend_icon,
};
use crate::domain::chart::{ChartData, ChartDataPoint, ChartKind, ChartOptions};
use crate::domain::process::{Kpi, ProcessStatus, WtpProcess};
use crate::domain::sensor::{AlertSummary, SensorReading};
use crate::application::wtp_service;
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingRow {
    #[serde(flatten)]
    pub reading: SensorReading,
    pub severity: AlertSeverity,
    pub status_icon: &'static str,
    pub color: &'static str,
    pub formatted_timestamp: String,
}

impl ReadingRow {
    fn new(reading: &SensorReading, all: &[SensorReading]) -> Self {
        Self {
            severity: alert_severity(reading),
            status_icon: status_icon(reading),
            color: chart_adapter::alert_color(all, reading.value),
            formatted_timestamp: format_timestamp(&reading.timestamp),
            reading: reading.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    #[serde(flatten)]
    pub state: DashboardState,
    pub rows: Vec<ReadingRow>,
    pub chart_kind: ChartKind,
    pub chart: ChartData,
    pub chart_options: ChartOptions,
    pub tooltips: Vec<String>,
    pub value_labels: Vec<String>,
    pub alert_summaries: Vec<AlertSummary>,
}

impl DashboardView {
    pub fn new(
        state: DashboardState,
        chart_kind: ChartKind,
        alert_summaries: Vec<AlertSummary>,
    ) -> Self {
        let chart = chart_adapter::to_chart_data(&state.filtered_readings, chart_kind);
        let rows = state
            .filtered_readings
            .iter()
            .map(|r| ReadingRow::new(r, &state.filtered_readings))
            .collect();

        Self {
            state,
            rows,
            chart_kind: chart.kind(),
            tooltips: tooltips(&chart),
            value_labels: chart_points(&chart)
                .iter()
                .map(|p| chart_adapter::format_y_axis_tick(p.value))
                .collect(),
            chart,
            chart_options: ChartOptions::default(),
            alert_summaries,
        }
    }
}

fn chart_points(chart: &ChartData) -> Vec<&ChartDataPoint> {
    match chart {
        ChartData::Line(series) => series.iter().flat_map(|s| &s.series).collect(),
        ChartData::Bar(points) | ChartData::Pie(points) => points.iter().collect(),
        ChartData::Gauge(gauge) => gauge.iter().map(|g| &g.point).collect(),
    }
}

fn tooltips(chart: &ChartData) -> Vec<String> {
    let units = match chart {
        ChartData::Gauge(Some(gauge)) => gauge.units.as_str(),
        _ => "",
    };
    chart_points(chart)
        .into_iter()
        .map(|p| chart_adapter::format_tooltip(chart.kind(), p, units))
        .collect()
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiView {
    #[serde(flatten)]
    pub kpi: Kpi,
    pub display_value: String,
    pub status: ProcessStatus,
    pub progress: f64,
    pub trend_icon: &'static str,
    pub trend_color: &'static str,
    pub trend_emoji: &'static str,
    pub trend_description: &'static str,
}

impl From<&Kpi> for KpiView {
    fn from(kpi: &Kpi) -> Self {
        Self {
            display_value: kpi.display_value(),
            status: kpi_status(kpi),
            progress: kpi.progress(),
            trend_icon: trend_icon(kpi.trend),
            trend_color: trend_color(kpi.trend),
            trend_emoji: trend_emoji(kpi.trend),
            trend_description: trend_description(kpi.trend),
            kpi: kpi.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessView {
    pub id: String,
    pub name: String,
    pub icon: String,
    pub color: String,
    pub emoji: &'static str,
    pub status: ProcessStatus,
    pub status_icon: &'static str,
    pub status_color: &'static str,
    pub kpis: Vec<KpiView>,
}

impl From<&WtpProcess> for ProcessView {
    fn from(process: &WtpProcess) -> Self {
        Self {
            id: process.id.clone(),
            name: process.name.clone(),
            icon: process.icon.clone(),
            color: process.color.clone(),
            emoji: process_emoji(&process.id),
            status: process.status,
            status_icon: wtp_service::status_icon(process.status),
            status_color: status_color(process.status),
            kpis: process.kpis.iter().map(KpiView::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewKpiView {
    #[serde(flatten)]
    pub kpi: Kpi,
    pub display_value: String,
    pub icon: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WtpView {
    pub processes: Vec<ProcessView>,
    pub overview: Vec<OverviewKpiView>,
    pub active_alarms: usize,
    pub selected_tab: usize,
}

impl WtpView {
    pub fn new(processes: &[WtpProcess], overview: &[Kpi], selected_tab: usize) -> Self {
        Self {
            processes: processes.iter().map(ProcessView::from).collect(),
            overview: overview
                .iter()
                .map(|kpi| OverviewKpiView {
                    display_value: kpi.display_value(),
                    icon: stat_icon(&kpi.name),
                    kpi: kpi.clone(),
                })
                .collect(),
            active_alarms: count_active_alarms(processes),
            selected_tab,
        }
    }
}
