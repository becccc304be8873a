use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_BACKEND_BASE_URL: &str = "http://localhost:8080/api/dashboard";
pub const DEFAULT_DASHBOARD_POLL_INTERVAL_MS: u64 = 30_000;
pub const DEFAULT_KPI_POLL_INTERVAL_MS: u64 = 10_000;
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:4200";

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct AppConfig {
    pub backend_base_url: String,
    pub dashboard_poll_interval_ms: u64,
    pub kpi_poll_interval_ms: u64,
    pub listen_addr: String,
}

impl AppConfig {
    pub fn dashboard_poll_interval(&self) -> Duration {
        Duration::from_millis(self.dashboard_poll_interval_ms)
    }

    pub fn kpi_poll_interval(&self) -> Duration {
        Duration::from_millis(self.kpi_poll_interval_ms)
    }
}

/// Defaults, then `config/dashboard.*` if present, then `WTP_*` variables.
pub fn load_app_config() -> anyhow::Result<AppConfig> {
    let builder = with_defaults(config::Config::builder())?
        .add_source(config::File::with_name("config/dashboard").required(false))
        .add_source(config::Environment::with_prefix("WTP"));

    finish(builder.build()?)
}

fn with_defaults(
    builder: config::ConfigBuilder<config::builder::DefaultState>,
) -> anyhow::Result<config::ConfigBuilder<config::builder::DefaultState>> {
    Ok(builder
        .set_default("backend_base_url", DEFAULT_BACKEND_BASE_URL)?
        .set_default("dashboard_poll_interval_ms", DEFAULT_DASHBOARD_POLL_INTERVAL_MS)?
        .set_default("kpi_poll_interval_ms", DEFAULT_KPI_POLL_INTERVAL_MS)?
        .set_default("listen_addr", DEFAULT_LISTEN_ADDR)?)
}

fn finish(settings: config::Config) -> anyhow::Result<AppConfig> {
    let mut config: AppConfig = settings.try_deserialize()?;
    config.backend_base_url = config.backend_base_url.trim_end_matches('/').to_string();

    if config.dashboard_poll_interval_ms == 0 || config.kpi_poll_interval_ms == 0 {
        anyhow::bail!("poll intervals must be greater than zero");
    }

    Ok(config)
}
