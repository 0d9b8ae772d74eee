use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tabled::Tabled;

use crate::error::DataError;

// ── Raw CSV rows ───────────────────────────────────────────────────
//
// Every cell is read as an optional string and parsed by hand so a single
// malformed cell drops one row instead of failing the whole table.

#[derive(Debug, Deserialize)]
pub struct RawExpenditureRow {
    pub year: Option<String>,
    pub total_expenditure: Option<String>,
    pub admin_expenditure: Option<String>,
    pub clinical_expenditure: Option<String>,
    pub error_related_costs: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawWorkforceRow {
    pub region_id: Option<String>,
    pub total_workers: Option<String>,
    pub administrative_workers: Option<String>,
    pub clinical_workers: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawAdminCostRow {
    pub hospital_id: Option<String>,
    pub admin_percentage: Option<String>,
    pub hours_per_patient: Option<String>,
    pub avg_processing_time: Option<String>,
    pub error_rate: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawPatientVolumeRow {
    pub year: Option<String>,
    pub prefecture_id: Option<String>,
    pub total_patients: Option<String>,
    pub outpatient_visits: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawInterventionCostRow {
    pub implementation_phase: Option<String>,
    pub upfront_cost: Option<String>,
    pub annual_maintenance: Option<String>,
    pub training_cost: Option<String>,
}

// ── Clean records ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct ExpenditureRecord {
    pub year: Option<i32>,
    pub total_expenditure: f64,
    pub admin_expenditure: Option<f64>,
    pub clinical_expenditure: Option<f64>,
    pub error_related_costs: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorkforceRecord {
    pub region_id: Option<i32>,
    pub total_workers: f64,
    pub administrative_workers: Option<f64>,
    pub clinical_workers: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AdminCostRecord {
    pub facility_id: Option<i32>,
    pub admin_percentage: Option<f64>,
    pub hours_per_unit: f64,
    pub processing_time_hours: f64,
    pub error_rate: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PatientVolumeRecord {
    pub year: Option<i32>,
    pub region_id: Option<i32>,
    pub units_served: f64,
    pub outpatient_visits: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InterventionCostRecord {
    pub phase: String,
    pub upfront_cost: f64,
    pub annual_maintenance: f64,
    pub training_cost: f64,
}

/// The five input tables. An empty table means "no data"; the calculators
/// substitute documented constants for it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputTables {
    pub medical_expenditure: Vec<ExpenditureRecord>,
    pub workforce: Vec<WorkforceRecord>,
    pub administrative_costs: Vec<AdminCostRecord>,
    pub patient_volume: Vec<PatientVolumeRecord>,
    pub intervention_costs: Vec<InterventionCostRecord>,
}

// ── Metrics ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKey {
    AdminHoursPerUnit,
    ProcessingTimeHours,
    ErrorRate,
    UnitsPerWorker,
    CostPerUnit,
}

impl MetricKey {
    pub const ALL: [MetricKey; 5] = [
        MetricKey::AdminHoursPerUnit,
        MetricKey::ProcessingTimeHours,
        MetricKey::ErrorRate,
        MetricKey::UnitsPerWorker,
        MetricKey::CostPerUnit,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MetricKey::AdminHoursPerUnit => "admin_hours_per_unit",
            MetricKey::ProcessingTimeHours => "processing_time_hours",
            MetricKey::ErrorRate => "error_rate",
            MetricKey::UnitsPerWorker => "units_per_worker",
            MetricKey::CostPerUnit => "cost_per_unit",
        }
    }
}

impl fmt::Display for MetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named operational metrics. Serializes as a plain JSON object keyed by the
/// snake_case metric names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricSet(BTreeMap<MetricKey, f64>);

impl MetricSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: MetricKey, value: f64) {
        self.0.insert(key, value);
    }

    pub fn get(&self, key: MetricKey) -> Option<f64> {
        self.0.get(&key).copied()
    }

    /// Like `get`, but a missing key is a `DataError` naming `set`.
    pub fn require(&self, key: MetricKey, set: &'static str) -> Result<f64, DataError> {
        self.get(key)
            .ok_or(DataError::MissingMetric { metric: key, set })
    }

    pub fn iter(&self) -> impl Iterator<Item = (MetricKey, f64)> + '_ {
        self.0.iter().map(|(k, v)| (*k, *v))
    }

    /// Checks `error_rate ∈ [0, 1]` and that every other metric is a finite,
    /// non-negative number.
    pub fn validate(&self) -> Result<(), DataError> {
        for (metric, value) in self.iter() {
            let ok = match metric {
                MetricKey::ErrorRate => (0.0..=1.0).contains(&value),
                _ => value.is_finite() && value >= 0.0,
            };
            if !ok {
                return Err(DataError::InvalidMetric { metric, value });
            }
        }
        Ok(())
    }
}

impl FromIterator<(MetricKey, f64)> for MetricSet {
    fn from_iter<I: IntoIterator<Item = (MetricKey, f64)>>(iter: I) -> Self {
        MetricSet(iter.into_iter().collect())
    }
}

// ── Improvement factors ────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImprovementFactor {
    AdminEfficiencyGain,
    ProcessingSpeedGain,
    ErrorReduction,
    ThroughputIncrease,
    CostReduction,
}

impl ImprovementFactor {
    pub const ALL: [ImprovementFactor; 5] = [
        ImprovementFactor::AdminEfficiencyGain,
        ImprovementFactor::ProcessingSpeedGain,
        ImprovementFactor::ErrorReduction,
        ImprovementFactor::ThroughputIncrease,
        ImprovementFactor::CostReduction,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ImprovementFactor::AdminEfficiencyGain => "admin_efficiency_gain",
            ImprovementFactor::ProcessingSpeedGain => "processing_speed_gain",
            ImprovementFactor::ErrorReduction => "error_reduction",
            ImprovementFactor::ThroughputIncrease => "throughput_increase",
            ImprovementFactor::CostReduction => "cost_reduction",
        }
    }

    /// Throughput is a fractional increase; every other factor is a
    /// fractional reduction and must stay below 1.
    pub fn is_increase(self) -> bool {
        matches!(self, ImprovementFactor::ThroughputIncrease)
    }
}

impl fmt::Display for ImprovementFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImprovementFactors(BTreeMap<ImprovementFactor, f64>);

impl ImprovementFactors {
    pub fn empty() -> Self {
        ImprovementFactors(BTreeMap::new())
    }

    pub fn get(&self, factor: ImprovementFactor) -> Result<f64, DataError> {
        self.0
            .get(&factor)
            .copied()
            .ok_or(DataError::MissingFactor { factor })
    }

    /// Returns a copy with `factor` replaced; the original is left untouched.
    pub fn with(mut self, factor: ImprovementFactor, value: f64) -> Self {
        self.0.insert(factor, value);
        self
    }

    pub fn without(mut self, factor: ImprovementFactor) -> Self {
        self.0.remove(&factor);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (ImprovementFactor, f64)> + '_ {
        self.0.iter().map(|(k, v)| (*k, *v))
    }
}

impl Default for ImprovementFactors {
    fn default() -> Self {
        [
            (ImprovementFactor::AdminEfficiencyGain, 0.52),
            (ImprovementFactor::ProcessingSpeedGain, 0.75),
            (ImprovementFactor::ErrorReduction, 0.76),
            (ImprovementFactor::ThroughputIncrease, 0.24),
            (ImprovementFactor::CostReduction, 0.071),
        ]
        .into_iter()
        .collect()
    }
}

impl FromIterator<(ImprovementFactor, f64)> for ImprovementFactors {
    fn from_iter<I: IntoIterator<Item = (ImprovementFactor, f64)>>(iter: I) -> Self {
        ImprovementFactors(iter.into_iter().collect())
    }
}

// ── Provenance ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    Computed,
    Fallback,
}

/// A value derived from the input tables, tagged with where it came from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Derived {
    Computed(f64),
    Fallback(f64),
}

impl Derived {
    pub fn value(self) -> f64 {
        match self {
            Derived::Computed(v) | Derived::Fallback(v) => v,
        }
    }

    pub fn provenance(self) -> Provenance {
        match self {
            Derived::Computed(_) => Provenance::Computed,
            Derived::Fallback(_) => Provenance::Fallback,
        }
    }

    pub fn is_fallback(self) -> bool {
        matches!(self, Derived::Fallback(_))
    }
}

// ── Presentation rows ──────────────────────────────────────────────
//
// Formatted strings for the console tables only. CSV exports serialize the
// numeric records these rows are built from.

#[derive(Debug, Tabled, Clone)]
pub struct MetricComparisonRow {
    #[tabled(rename = "Metric")]
    pub metric: String,
    #[tabled(rename = "Baseline")]
    pub baseline: String,
    #[tabled(rename = "Improved")]
    pub improved: String,
    #[tabled(rename = "Source")]
    pub source: String,
}

#[derive(Debug, Tabled, Clone)]
pub struct RoiYearRow {
    #[tabled(rename = "Year")]
    pub year: u32,
    #[tabled(rename = "Savings")]
    pub savings: String,
    #[tabled(rename = "Costs")]
    pub costs: String,
    #[tabled(rename = "NetBenefit")]
    pub net_benefit: String,
    #[tabled(rename = "CumulativeNet")]
    pub cumulative_net: String,
    #[tabled(rename = "RoiPct")]
    pub roi_percentage: String,
}

#[derive(Debug, Tabled, Clone)]
pub struct ScenarioRow {
    #[tabled(rename = "Scenario")]
    pub scenario: String,
    #[tabled(rename = "AnnualSavings")]
    pub annual_savings: String,
    #[tabled(rename = "RoiPct")]
    pub roi_percentage: String,
    #[tabled(rename = "Payback")]
    pub payback: String,
    #[tabled(rename = "AdminTimeReductionPct")]
    pub admin_time_reduction: String,
    #[tabled(rename = "ErrorReductionPct")]
    pub error_reduction: String,
    #[tabled(rename = "ThroughputIncreasePct")]
    pub throughput_increase: String,
}

#[derive(Debug, Tabled, Clone)]
pub struct SensitivityRow {
    #[tabled(rename = "AdminEfficiency")]
    pub admin_efficiency: String,
    #[tabled(rename = "CostMultiplier")]
    pub cost_multiplier: String,
    #[tabled(rename = "AnnualSavings")]
    pub annual_savings: String,
    #[tabled(rename = "RoiPct")]
    pub roi_percentage: String,
    #[tabled(rename = "PaybackYears")]
    pub payback_years: String,
}
