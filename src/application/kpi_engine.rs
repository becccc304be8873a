// KPI simulation and status derivation
use crate::domain::process::{Kpi, ProcessStatus, Trend, WtpProcess};
use rand::Rng;

/// Half-width of the random walk applied to every KPI per tick.
pub const MAX_VARIATION: f64 = 0.05;

/// A KPI above this share of its maximum is critical.
pub const CRITICAL_SHARE_OF_MAX: f64 = 0.9;

/// Deviation from target, as a share of the target, that puts a process
/// in warning.
pub const PROCESS_WARNING_DEVIATION: f64 = 0.1;

/// Deviation from target, as a share of the target, that flags a single
/// KPI as warning. Deliberately looser than the process-level rule.
pub const KPI_WARNING_DEVIATION: f64 = 0.15;

/// Perturbs every KPI and re-derives each process status.
pub fn tick<R: Rng>(processes: &mut [WtpProcess], rng: &mut R) {
    for process in processes.iter_mut() {
        for kpi in process.kpis.iter_mut() {
            let variation = (rng.random::<f64>() - 0.5) * (MAX_VARIATION * 2.0);
            apply_variation(kpi, variation);
        }
        process.status = process_status(&process.kpis);
    }
}

/// Adds `variation` to the KPI, never letting it drop below zero. The trend
/// follows the raw variation, so a KPI pinned at zero can still trend down.
pub fn apply_variation(kpi: &mut Kpi, variation: f64) {
    kpi.value = (kpi.value + variation).max(0.0);

    kpi.trend = Some(if variation > MAX_VARIATION {
        Trend::Up
    } else if variation < -MAX_VARIATION {
        Trend::Down
    } else {
        Trend::Stable
    });
}

pub fn process_status(kpis: &[Kpi]) -> ProcessStatus {
    let mut critical = 0;
    let mut warning = 0;

    for kpi in kpis {
        if is_critical(kpi) {
            critical += 1;
        } else if deviates_from_target(kpi, PROCESS_WARNING_DEVIATION) {
            warning += 1;
        }
    }

    if critical > 0 {
        ProcessStatus::Critical
    } else if warning > 0 {
        ProcessStatus::Warning
    } else {
        ProcessStatus::Normal
    }
}

pub fn kpi_status(kpi: &Kpi) -> ProcessStatus {
    if is_critical(kpi) {
        ProcessStatus::Critical
    } else if deviates_from_target(kpi, KPI_WARNING_DEVIATION) {
        ProcessStatus::Warning
    } else {
        ProcessStatus::Normal
    }
}

// A zero max or target counts as unset.
fn is_critical(kpi: &Kpi) -> bool {
    matches!(kpi.max, Some(max) if max != 0.0 && kpi.value > max * CRITICAL_SHARE_OF_MAX)
}

fn deviates_from_target(kpi: &Kpi, share: f64) -> bool {
    matches!(
        kpi.target,
        Some(target) if target != 0.0 && (kpi.value - target).abs() > target * share
    )
}
