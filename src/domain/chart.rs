// Chart-ready data shapes
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartDataPoint {
    pub name: String,
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl ChartDataPoint {
    pub fn new(name: String, value: f64) -> Self {
        Self {
            name,
            value,
            timestamp: None,
        }
    }

    pub fn at(name: String, value: f64, timestamp: String) -> Self {
        Self {
            name,
            value,
            timestamp: Some(timestamp),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeriesData {
    pub name: String,
    pub series: Vec<ChartDataPoint>,
}

impl TimeSeriesData {
    pub fn new(name: String, series: Vec<ChartDataPoint>) -> Self {
        Self { name, series }
    }
}

/// Single-value gauge with its displayed scale.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GaugeData {
    pub point: ChartDataPoint,
    pub min: f64,
    pub max: f64,
    pub units: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    #[default]
    Line,
    Bar,
    Pie,
    Gauge,
}

impl ChartKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartKind::Line => "line",
            ChartKind::Bar => "bar",
            ChartKind::Pie => "pie",
            ChartKind::Gauge => "gauge",
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChartKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "line" => Ok(ChartKind::Line),
            "bar" => Ok(ChartKind::Bar),
            "pie" => Ok(ChartKind::Pie),
            "gauge" => Ok(ChartKind::Gauge),
            other => Err(format!("unknown chart kind: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "lowercase")]
pub enum ChartData {
    Line(Vec<TimeSeriesData>),
    Bar(Vec<ChartDataPoint>),
    Pie(Vec<ChartDataPoint>),
    Gauge(Option<GaugeData>),
}

impl ChartData {
    pub fn kind(&self) -> ChartKind {
        match self {
            ChartData::Line(_) => ChartKind::Line,
            ChartData::Bar(_) => ChartKind::Bar,
            ChartData::Pie(_) => ChartKind::Pie,
            ChartData::Gauge(_) => ChartKind::Gauge,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            ChartData::Line(series) => series.is_empty(),
            ChartData::Bar(points) | ChartData::Pie(points) => points.is_empty(),
            ChartData::Gauge(gauge) => gauge.is_none(),
        }
    }
}

/// Display flags passed through to the renderer. They never change the data.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartOptions {
    pub height: u32,
    pub show_legend: bool,
    pub show_x_axis: bool,
    pub show_y_axis: bool,
    pub show_grid_lines: bool,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            height: 400,
            show_legend: true,
            show_x_axis: true,
            show_y_axis: true,
            show_grid_lines: true,
        }
    }
}
