// Chart adapter - Reshapes sensor readings for each chart kind
use crate::domain::chart::{ChartData, ChartDataPoint, ChartKind, GaugeData, TimeSeriesData};
use crate::domain::sensor::SensorReading;
use chrono::Local;
use indexmap::IndexMap;

const ALERT_COLOR: &str = "#f44336";

pub const COLOR_SCHEME: [&str; 10] = [
    "#3f51b5", "#2196f3", "#00bcd4", "#009688", "#4caf50", "#8bc34a", "#cddc39", "#ffeb3b",
    "#ff9800", "#ff5722",
];

const THRESHOLD_RANGE_LOW: f64 = 0.8;
const THRESHOLD_RANGE_HIGH: f64 = 1.2;
const DATA_RANGE_LOW: f64 = 0.9;
const DATA_RANGE_HIGH: f64 = 1.1;

pub fn to_chart_data(readings: &[SensorReading], kind: ChartKind) -> ChartData {
    match kind {
        ChartKind::Line => ChartData::Line(time_series(readings)),
        ChartKind::Bar => ChartData::Bar(stage_averages(readings)),
        ChartKind::Pie => ChartData::Pie(oem_counts(readings)),
        ChartKind::Gauge => ChartData::Gauge(gauge(readings)),
    }
}

/// One series per process stage, points in timestamp order.
pub fn time_series(readings: &[SensorReading]) -> Vec<TimeSeriesData> {
    let mut groups: IndexMap<&str, Vec<(Option<i64>, ChartDataPoint)>> = IndexMap::new();

    for reading in readings {
        let point = ChartDataPoint::at(
            time_of_day(reading),
            reading.value,
            reading.timestamp.clone(),
        );
        groups
            .entry(reading.stage_key())
            .or_default()
            .push((reading.timestamp_millis(), point));
    }

    groups
        .into_iter()
        .map(|(stage, mut points)| {
            points.sort_by_key(|(millis, _)| *millis);
            TimeSeriesData::new(
                stage.to_string(),
                points.into_iter().map(|(_, point)| point).collect(),
            )
        })
        .collect()
}

/// Mean value per process stage, rounded to two decimals.
pub fn stage_averages(readings: &[SensorReading]) -> Vec<ChartDataPoint> {
    let mut groups: IndexMap<&str, (f64, usize)> = IndexMap::new();

    for reading in readings {
        let (total, count) = groups.entry(reading.stage_key()).or_insert((0.0, 0));
        *total += reading.value;
        *count += 1;
    }

    groups
        .into_iter()
        .map(|(stage, (total, count))| {
            ChartDataPoint::new(stage.to_string(), round_to_cents(total / count as f64))
        })
        .collect()
}

/// Reading count per OEM.
pub fn oem_counts(readings: &[SensorReading]) -> Vec<ChartDataPoint> {
    let mut counts: IndexMap<&str, usize> = IndexMap::new();

    for reading in readings {
        *counts.entry(reading.oem.as_str()).or_insert(0) += 1;
    }

    counts
        .into_iter()
        .map(|(oem, count)| ChartDataPoint::new(oem.to_string(), count as f64))
        .collect()
}

/// Latest reading with a display range taken from its thresholds, or from
/// the spread of all values when it has none.
pub fn gauge(readings: &[SensorReading]) -> Option<GaugeData> {
    let latest = latest_reading(readings)?;

    let (min, max) = match (latest.threshold_min, latest.threshold_max) {
        (Some(low), Some(high)) => (low * THRESHOLD_RANGE_LOW, high * THRESHOLD_RANGE_HIGH),
        _ => {
            let low = readings.iter().map(|r| r.value).fold(f64::INFINITY, f64::min);
            let high = readings.iter().map(|r| r.value).fold(f64::NEG_INFINITY, f64::max);
            (low * DATA_RANGE_LOW, high * DATA_RANGE_HIGH)
        }
    };

    Some(GaugeData {
        point: ChartDataPoint::new(latest.parameter_name.clone(), latest.value),
        min,
        max,
        units: latest.unit.clone(),
    })
}

/// Single left-to-right scan; on equal timestamps the later reading wins.
/// A reading whose timestamp does not parse never displaces the current pick.
fn latest_reading(readings: &[SensorReading]) -> Option<&SensorReading> {
    let mut iter = readings.iter();
    let mut latest = iter.next()?;

    for reading in iter {
        if let (Some(candidate), Some(current)) =
            (reading.parsed_timestamp(), latest.parsed_timestamp())
        {
            if candidate >= current {
                latest = reading;
            }
        }
    }

    Some(latest)
}

// Math.round semantics: halves go up, including for negatives.
fn round_to_cents(value: f64) -> f64 {
    (value * 100.0 + 0.5).floor() / 100.0
}

fn time_of_day(reading: &SensorReading) -> String {
    match reading.parsed_timestamp() {
        Some(t) => t.with_timezone(&Local).format("%-I:%M:%S %p").to_string(),
        None => "Invalid Date".to_string(),
    }
}

/// Colour for the bar/slice holding `value`: red when the first reading
/// carrying that exact value is an alert.
pub fn alert_color(readings: &[SensorReading], value: f64) -> &'static str {
    match readings.iter().find(|r| r.value == value) {
        Some(reading) if reading.is_alert => ALERT_COLOR,
        _ => COLOR_SCHEME[0],
    }
}

pub fn format_y_axis_tick(value: f64) -> String {
    if value >= 1_000_000.0 {
        format!("{:.1}M", value / 1_000_000.0)
    } else if value >= 1000.0 {
        format!("{:.1}K", value / 1000.0)
    } else {
        format!("{:.1}", value)
    }
}

pub fn format_tooltip(kind: ChartKind, point: &ChartDataPoint, units: &str) -> String {
    match kind {
        ChartKind::Gauge => format!("{} {}", point.value, units),
        _ => format!("{}: {}", point.name, point.value),
    }
}

/// Selection hook for the host UI.
pub fn on_chart_select(event: &serde_json::Value) {
    tracing::debug!("Chart selection: {}", event);
}
