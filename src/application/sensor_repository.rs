// Repository trait for the dashboard backend
use crate::domain::sensor::{DashboardStats, ProcessStage, RecentReadingsPage, SensorReading};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

pub const DEFAULT_RECENT_PAGE: u32 = 0;
pub const DEFAULT_RECENT_PAGE_SIZE: u32 = 20;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("{url} responded with status {status}: {body}")]
    Status { url: String, status: u16, body: String },

    #[error("could not decode response from {url}: {message}")]
    Decode { url: String, message: String },
}

pub type FetchResult<T> = Result<T, FetchError>;

/// Read-only access to the backend's sensor resources. One call, one GET:
/// nothing is retried or cached.
#[async_trait]
pub trait SensorDataSource: Send + Sync {
    /// Latest reading of every sensor
    async fn latest_readings(&self) -> FetchResult<Vec<SensorReading>>;

    async fn readings_by_oem(&self, oem: &str) -> FetchResult<Vec<SensorReading>>;

    /// Readings of one parameter at one stage within `[start, end]`
    async fn historical_data(
        &self,
        stage_id: i64,
        parameter: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> FetchResult<Vec<SensorReading>>;

    /// Readings flagged as alerts
    async fn alerts(&self) -> FetchResult<Vec<SensorReading>>;

    async fn recent_readings(&self, page: u32, size: u32) -> FetchResult<RecentReadingsPage>;

    /// Distinct parameter names
    async fn parameters(&self) -> FetchResult<Vec<String>>;

    /// Active process stages
    async fn process_stages(&self) -> FetchResult<Vec<ProcessStage>>;

    /// Distinct OEM names
    async fn oems(&self) -> FetchResult<Vec<String>>;

    async fn readings_by_parameter(&self, parameter: &str) -> FetchResult<Vec<SensorReading>>;

    async fn dashboard_stats(&self) -> FetchResult<Option<DashboardStats>>;
}
