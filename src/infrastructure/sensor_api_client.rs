// HTTP implementation of the sensor data source
use crate::application::sensor_repository::{FetchError, FetchResult, SensorDataSource};
use crate::domain::sensor::{DashboardStats, ProcessStage, RecentReadingsPage, SensorReading};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;

#[derive(Debug, Clone)]
pub struct SensorApiClient {
    base_url: String,
    client: reqwest::Client,
}

impl SensorApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, resource: &str) -> String {
        format!("{}/{}", self.base_url, resource)
    }

    /// GET `resource` and decode the body. An empty or `null` body decodes
    /// to `None`.
    async fn get_json<T: DeserializeOwned>(
        &self,
        resource: &str,
        query: &[(&str, String)],
    ) -> FetchResult<Option<T>> {
        let url = self.url(resource);
        tracing::debug!("GET {} {:?}", url, query);

        let response = self
            .client
            .get(&url)
            .query(query)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| FetchError::Transport {
                url: url.clone(),
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status { url, status, body });
        }

        let body = response.bytes().await.map_err(|e| FetchError::Transport {
            url: url.clone(),
            message: e.to_string(),
        })?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }

        serde_json::from_slice::<Option<T>>(&body).map_err(|e| FetchError::Decode {
            url,
            message: e.to_string(),
        })
    }

    async fn get_list<T: DeserializeOwned>(
        &self,
        resource: &str,
        query: &[(&str, String)],
    ) -> FetchResult<Vec<T>> {
        Ok(self.get_json(resource, query).await?.unwrap_or_default())
    }
}

fn iso_millis(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[async_trait]
impl SensorDataSource for SensorApiClient {
    async fn latest_readings(&self) -> FetchResult<Vec<SensorReading>> {
        self.get_list("latest-readings", &[]).await
    }

    async fn readings_by_oem(&self, oem: &str) -> FetchResult<Vec<SensorReading>> {
        let resource = format!("readings/oem/{}", urlencoding::encode(oem));
        self.get_list(&resource, &[]).await
    }

    async fn historical_data(
        &self,
        stage_id: i64,
        parameter: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> FetchResult<Vec<SensorReading>> {
        let query = [
            ("stageId", stage_id.to_string()),
            ("parameter", parameter.to_string()),
            ("startTime", iso_millis(start)),
            ("endTime", iso_millis(end)),
        ];
        self.get_list("historical", &query).await
    }

    async fn alerts(&self) -> FetchResult<Vec<SensorReading>> {
        self.get_list("alerts", &[]).await
    }

    async fn recent_readings(&self, page: u32, size: u32) -> FetchResult<RecentReadingsPage> {
        let query = [("page", page.to_string()), ("size", size.to_string())];
        Ok(self.get_json("recent", &query).await?.unwrap_or_default())
    }

    async fn parameters(&self) -> FetchResult<Vec<String>> {
        self.get_list("parameters", &[]).await
    }

    async fn process_stages(&self) -> FetchResult<Vec<ProcessStage>> {
        self.get_list("process-stages", &[]).await
    }

    async fn oems(&self) -> FetchResult<Vec<String>> {
        self.get_list("oems", &[]).await
    }

    async fn readings_by_parameter(&self, parameter: &str) -> FetchResult<Vec<SensorReading>> {
        let resource = format!("readings/parameter/{}", urlencoding::encode(parameter));
        self.get_list(&resource, &[]).await
    }

    async fn dashboard_stats(&self) -> FetchResult<Option<DashboardStats>> {
        self.get_json("stats", &[]).await
    }
}
