// Application layer - Use cases over the domain and the backend
pub mod chart_adapter;
pub mod dashboard_service;
pub mod kpi_engine;
pub mod poller;
pub mod sensor_repository;
pub mod wtp_service;
