// Application state for HTTP handlers
use crate::application::dashboard_service::DashboardService;
use crate::application::wtp_service::WtpService;
use tokio::sync::watch;

#[derive(Clone)]
pub struct AppState {
    pub dashboard_service: DashboardService,
    pub wtp_service: WtpService,
    /// Flips to `true` when the server starts shutting down.
    pub shutdown: watch::Receiver<bool>,
}
