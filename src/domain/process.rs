// WTP process and KPI domain models
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessStatus {
    Normal,
    Warning,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum KpiFormat {
    Number,
    Percentage,
    Temperature,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Stable,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Kpi {
    pub name: String,
    pub value: f64,
    pub unit: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<f64>,
    pub format: KpiFormat,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trend: Option<Trend>,
}

impl Kpi {
    pub fn new(name: &str, value: f64, unit: &str, format: KpiFormat) -> Self {
        Self {
            name: name.to_string(),
            value,
            unit: unit.to_string(),
            min: None,
            max: None,
            target: None,
            format,
            trend: None,
        }
    }

    pub fn bounded(mut self, min: f64, max: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    pub fn targeting(mut self, target: f64) -> Self {
        self.target = Some(target);
        self
    }

    pub fn trending(mut self, trend: Trend) -> Self {
        self.trend = Some(trend);
        self
    }

    /// Display string. Percentages and temperatures hug their unit, plain
    /// numbers are separated from it by a space.
    pub fn display_value(&self) -> String {
        match self.format {
            KpiFormat::Percentage | KpiFormat::Temperature => {
                format!("{:.1}{}", self.value, self.unit)
            }
            KpiFormat::Number => {
                if self.value < 10.0 {
                    format!("{:.2} {}", self.value, self.unit)
                } else {
                    format!("{:.1} {}", self.value, self.unit)
                }
            }
        }
    }

    /// Fill level for a progress bar, in percent.
    pub fn progress(&self) -> f64 {
        match self.max.filter(|max| *max != 0.0) {
            Some(max) => self.value / max * 100.0,
            None if self.format == KpiFormat::Percentage => self.value,
            None => 50.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WtpProcess {
    pub id: String,
    pub name: String,
    pub icon: String,
    pub color: String,
    pub status: ProcessStatus,
    pub kpis: Vec<Kpi>,
}

impl WtpProcess {
    pub fn new(
        id: &str,
        name: &str,
        icon: &str,
        color: &str,
        status: ProcessStatus,
        kpis: Vec<Kpi>,
    ) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            icon: icon.to_string(),
            color: color.to_string(),
            status,
            kpis,
        }
    }
}

/// Illustrative plant catalog the simulator starts from.
pub fn seed_processes() -> Vec<WtpProcess> {
    use KpiFormat::{Number, Percentage, Temperature};
    use Trend::{Down, Stable, Up};

    vec![
        WtpProcess::new(
            "raw-water-intake",
            "Raw Water Intake",
            "water_drop",
            "#2196F3",
            ProcessStatus::Normal,
            vec![
                Kpi::new("Flow Rate", 2.14, "ML/h", Number)
                    .bounded(0.0, 5.0)
                    .targeting(2.5)
                    .trending(Stable),
                Kpi::new("Water Level", 3.2, "m", Number)
                    .bounded(0.0, 5.0)
                    .targeting(4.0)
                    .trending(Down),
                Kpi::new("Turbidity", 15.8, "NTU", Number)
                    .bounded(0.0, 50.0)
                    .targeting(10.0)
                    .trending(Up),
                Kpi::new("pH Level", 7.2, "", Number)
                    .bounded(6.0, 8.5)
                    .targeting(7.5)
                    .trending(Stable),
                Kpi::new("Temperature", 22.5, "°C", Temperature)
                    .bounded(0.0, 40.0)
                    .trending(Stable),
            ],
        ),
        WtpProcess::new(
            "pretreatment",
            "Pre-Treatment",
            "filter_alt",
            "#FF9800",
            ProcessStatus::Normal,
            vec![
                Kpi::new("Coagulant Dosage", 12.5, "mg/L", Number)
                    .bounded(0.0, 30.0)
                    .targeting(15.0)
                    .trending(Stable),
                Kpi::new("Screening Efficiency", 95.2, "%", Percentage)
                    .bounded(0.0, 100.0)
                    .targeting(95.0)
                    .trending(Up),
                Kpi::new("Mixer Speed", 150.0, "RPM", Number)
                    .bounded(0.0, 300.0)
                    .targeting(180.0)
                    .trending(Stable),
                Kpi::new("Chemical Feed Rate", 8.7, "L/h", Number)
                    .bounded(0.0, 20.0)
                    .targeting(10.0)
                    .trending(Down),
                Kpi::new("pH After Coagulation", 6.8, "", Number)
                    .bounded(6.0, 8.0)
                    .targeting(7.0)
                    .trending(Stable),
            ],
        ),
        WtpProcess::new(
            "sedimentation",
            "Sedimentation",
            "layers",
            "#4CAF50",
            ProcessStatus::Warning,
            vec![
                Kpi::new("Settling Velocity", 0.8, "m/h", Number)
                    .bounded(0.0, 2.0)
                    .targeting(1.0)
                    .trending(Down),
                Kpi::new("Sludge Level", 2.1, "m", Number)
                    .bounded(0.0, 3.0)
                    .targeting(1.5)
                    .trending(Up),
                Kpi::new("Overflow Rate", 15.2, "m³/m²/h", Number)
                    .bounded(0.0, 30.0)
                    .targeting(20.0)
                    .trending(Stable),
                Kpi::new("Turbidity Removal", 85.5, "%", Percentage)
                    .bounded(0.0, 100.0)
                    .targeting(90.0)
                    .trending(Down),
                Kpi::new("Clarified Water Turbidity", 3.2, "NTU", Number)
                    .bounded(0.0, 10.0)
                    .targeting(2.0)
                    .trending(Up),
            ],
        ),
        WtpProcess::new(
            "filtration",
            "Filtration",
            "filter_list",
            "#9C27B0",
            ProcessStatus::Normal,
            vec![
                Kpi::new("Filter Loading Rate", 8.5, "m/h", Number)
                    .bounded(0.0, 15.0)
                    .targeting(10.0)
                    .trending(Stable),
                Kpi::new("Head Loss", 1.2, "m", Number)
                    .bounded(0.0, 3.0)
                    .targeting(1.5)
                    .trending(Up),
                Kpi::new("Backwash Frequency", 2.0, "times/day", Number)
                    .bounded(0.0, 6.0)
                    .targeting(3.0)
                    .trending(Stable),
                Kpi::new("Filtered Water Turbidity", 0.8, "NTU", Number)
                    .bounded(0.0, 2.0)
                    .targeting(1.0)
                    .trending(Stable),
                Kpi::new("Filter Efficiency", 98.2, "%", Percentage)
                    .bounded(0.0, 100.0)
                    .targeting(95.0)
                    .trending(Up),
            ],
        ),
        WtpProcess::new(
            "disinfection",
            "Disinfection",
            "sanitizer",
            "#F44336",
            ProcessStatus::Normal,
            vec![
                Kpi::new("Chlorine Residual", 1.47, "mg/L", Number)
                    .bounded(0.0, 3.0)
                    .targeting(1.5)
                    .trending(Stable),
                Kpi::new("Contact Time", 30.2, "min", Number)
                    .bounded(0.0, 60.0)
                    .targeting(30.0)
                    .trending(Stable),
                Kpi::new("UV Dose", 40.0, "mJ/cm²", Number)
                    .bounded(0.0, 60.0)
                    .targeting(40.0)
                    .trending(Stable),
                Kpi::new("Disinfection Efficiency", 99.9, "%", Percentage)
                    .bounded(0.0, 100.0)
                    .targeting(99.9)
                    .trending(Stable),
                Kpi::new("E.coli Count", 0.0, "CFU/100ml", Number)
                    .bounded(0.0, 10.0)
                    .targeting(0.0)
                    .trending(Stable),
            ],
        ),
        WtpProcess::new(
            "finished-water",
            "Finished Water",
            "opacity",
            "#00BCD4",
            ProcessStatus::Normal,
            vec![
                Kpi::new("Storage Level", 75.5, "%", Percentage)
                    .bounded(0.0, 100.0)
                    .targeting(80.0)
                    .trending(Down),
                Kpi::new("Distribution Pressure", 3.5, "bar", Number)
                    .bounded(0.0, 6.0)
                    .targeting(4.0)
                    .trending(Stable),
                Kpi::new("Water Quality Index", 92.3, "%", Percentage)
                    .bounded(0.0, 100.0)
                    .targeting(95.0)
                    .trending(Up),
                Kpi::new("Total Production", 1250.0, "kL/day", Number)
                    .bounded(0.0, 2000.0)
                    .targeting(1500.0)
                    .trending(Up),
                Kpi::new("Energy Consumption", 0.35, "kWh/m³", Number)
                    .bounded(0.0, 1.0)
                    .targeting(0.4)
                    .trending(Down),
            ],
        ),
    ]
}

/// Plant-wide headline figures. These are not simulated.
pub fn seed_overview_kpis() -> Vec<Kpi> {
    use KpiFormat::{Number, Percentage};

    vec![
        Kpi::new("Overall Efficiency", 94.2, "%", Percentage)
            .targeting(95.0),
        Kpi::new("Total Flow Rate", 2.14, "ML/h", Number)
            .targeting(2.5),
        Kpi::new("Energy Efficiency", 88.7, "%", Percentage)
            .targeting(90.0),
        Kpi::new("Water Quality Score", 92.3, "", Number)
            .targeting(95.0),
        Kpi::new("Active Alarms", 2.0, "", Number).targeting(0.0),
        Kpi::new("System Availability", 99.2, "%", Percentage)
            .targeting(99.5),
    ]
}
