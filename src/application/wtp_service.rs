// WTP process service - Owns the simulated plant catalog
use crate::application::kpi_engine;
use crate::application::poller::{spawn_poller, PollHandle};
use crate::domain::process::{
    seed_overview_kpis, seed_processes, Kpi, ProcessStatus, Trend, WtpProcess,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, RwLock};

#[derive(Debug)]
struct WtpState {
    processes: Vec<WtpProcess>,
    overview: Vec<Kpi>,
    selected_tab: usize,
}

#[derive(Clone)]
pub struct WtpService {
    state: Arc<RwLock<WtpState>>,
    snapshots: Arc<watch::Sender<Vec<WtpProcess>>>,
    poll_interval: Duration,
}

impl WtpService {
    pub fn new(poll_interval: Duration) -> Self {
        Self::with_catalog(seed_processes(), poll_interval)
    }

    pub fn with_catalog(processes: Vec<WtpProcess>, poll_interval: Duration) -> Self {
        let (snapshots, _) = watch::channel(processes.clone());
        Self {
            state: Arc::new(RwLock::new(WtpState {
                processes,
                overview: seed_overview_kpis(),
                selected_tab: 0,
            })),
            snapshots: Arc::new(snapshots),
            poll_interval,
        }
    }

    pub async fn processes(&self) -> Vec<WtpProcess> {
        self.state.read().await.processes.clone()
    }

    pub async fn overview(&self) -> Vec<Kpi> {
        self.state.read().await.overview.clone()
    }

    pub async fn selected_tab(&self) -> usize {
        self.state.read().await.selected_tab
    }

    pub async fn select_tab(&self, index: usize) {
        self.state.write().await.selected_tab = index;
    }

    /// Receives the catalog after every tick.
    pub fn subscribe(&self) -> watch::Receiver<Vec<WtpProcess>> {
        self.snapshots.subscribe()
    }

    /// One simulation step over the whole catalog.
    pub async fn tick(&self) {
        let snapshot = {
            let mut state = self.state.write().await;
            kpi_engine::tick(&mut state.processes, &mut rand::rng());
            state.processes.clone()
        };

        tracing::debug!(
            "KPIs updated, {} processes off normal",
            count_active_alarms(&snapshot)
        );
        self.snapshots.send_replace(snapshot);
    }

    pub fn start_polling(&self) -> PollHandle {
        let service = self.clone();
        spawn_poller("wtp-kpis", self.poll_interval, move || {
            let service = service.clone();
            async move { service.tick().await }
        })
    }

    pub async fn active_alarm_count(&self) -> usize {
        count_active_alarms(&self.state.read().await.processes)
    }
}

pub fn count_active_alarms(processes: &[WtpProcess]) -> usize {
    processes
        .iter()
        .filter(|p| p.status != ProcessStatus::Normal)
        .count()
}

pub fn status_icon(status: ProcessStatus) -> &'static str {
    match status {
        ProcessStatus::Critical => "error",
        ProcessStatus::Warning => "warning",
        ProcessStatus::Normal => "check_circle",
    }
}

pub fn status_color(status: ProcessStatus) -> &'static str {
    match status {
        ProcessStatus::Critical => "#F44336",
        ProcessStatus::Warning => "#FF9800",
        ProcessStatus::Normal => "#4CAF50",
    }
}

pub fn trend_icon(trend: Option<Trend>) -> &'static str {
    match trend {
        Some(Trend::Up) => "trending_up",
        Some(Trend::Down) => "trending_down",
        _ => "trending_flat",
    }
}

pub fn trend_color(trend: Option<Trend>) -> &'static str {
    match trend {
        Some(Trend::Up) => "#4CAF50",
        Some(Trend::Down) => "#F44336",
        _ => "#9E9E9E",
    }
}

pub fn trend_emoji(trend: Option<Trend>) -> &'static str {
    match trend {
        Some(Trend::Up) => "📈",
        Some(Trend::Down) => "📉",
        _ => "➡️",
    }
}

pub fn trend_description(trend: Option<Trend>) -> &'static str {
    match trend {
        Some(Trend::Up) => "Increasing",
        Some(Trend::Down) => "Decreasing",
        _ => "Stable",
    }
}

pub fn process_emoji(process_id: &str) -> &'static str {
    match process_id {
        "raw-water-intake" => "🚰",
        "pretreatment" => "🔍",
        "sedimentation" => "🏺",
        "filtration" => "🗳️",
        "disinfection" => "🧪",
        "finished-water" => "💧",
        _ => "⚙️",
    }
}

pub fn stat_icon(stat_name: &str) -> &'static str {
    match stat_name.to_lowercase().as_str() {
        "overall efficiency" => "trending_up",
        "total flow rate" => "water_drop",
        "energy efficiency" => "electric_bolt",
        "water quality score" => "water_damage",
        "active alarms" => "warning",
        "system availability" => "check_circle",
        _ => "analytics",
    }
}
