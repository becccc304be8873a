// Sensor data domain models, as served by the backend API
use chrono::{DateTime, FixedOffset, Local, NaiveDateTime, TimeZone};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorReading {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process_stage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage_name: Option<String>,
    #[serde(default)]
    pub oem: String,
    #[serde(default)]
    pub parameter_name: String,
    #[serde(default = "f64_nan", deserialize_with = "number_or_nan")]
    pub value: f64,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub is_alert: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sensor_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equipment_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold_min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold_max: Option<f64>,
}

#[cfg(test)]
impl SensorReading {
    pub fn new(oem: &str, parameter_name: &str, value: f64, unit: &str, timestamp: &str) -> Self {
        Self {
            id: None,
            process_stage: None,
            stage_name: None,
            oem: oem.to_string(),
            parameter_name: parameter_name.to_string(),
            value,
            unit: unit.to_string(),
            timestamp: timestamp.to_string(),
            is_alert: false,
            sensor_id: None,
            equipment_name: None,
            threshold_min: None,
            threshold_max: None,
        }
    }

    pub fn with_stage(mut self, stage: &str) -> Self {
        self.process_stage = Some(stage.to_string());
        self
    }

    pub fn with_thresholds(mut self, min: f64, max: f64) -> Self {
        self.threshold_min = Some(min);
        self.threshold_max = Some(max);
        self
    }

    pub fn with_alert(mut self, is_alert: bool) -> Self {
        self.is_alert = is_alert;
        self
    }
}

impl SensorReading {
    /// Process stage used as a grouping key.
    pub fn stage_key(&self) -> &str {
        self.process_stage.as_deref().unwrap_or("unknown")
    }

    pub fn parsed_timestamp(&self) -> Option<DateTime<FixedOffset>> {
        parse_timestamp(&self.timestamp)
    }

    /// Milliseconds since the epoch, `None` when the timestamp does not parse.
    pub fn timestamp_millis(&self) -> Option<i64> {
        self.parsed_timestamp().map(|t| t.timestamp_millis())
    }
}

/// Parses an ISO 8601 timestamp. Strings without an offset are read as
/// local time.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed);
    }

    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M"))
        .ok()?;

    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|t| t.fixed_offset())
}

fn f64_nan() -> f64 {
    f64::NAN
}

// Backend numbers are not validated: null becomes NaN rather than a decode error.
fn number_or_nan<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessStage {
    pub id: i64,
    pub stage_name: String,
    pub oem: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_readings: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recent_alerts: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alert_count: Option<u64>,
    pub active_stages: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_parameters: Option<u64>,
}

/// Pagination envelope from `/recent`; its shape is owned by the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecentReadingsPage(pub serde_json::Value);

/// Alert readings of one parameter and the stages that raised them.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertSummary {
    pub parameter_name: String,
    pub alert_count: usize,
    pub process_stages: Vec<String>,
}
