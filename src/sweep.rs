//! Scenario comparison and sensitivity sweeps.
//!
//! Every point in a sweep is an independent run with its own factor set and,
//! for the sensitivity grid, its own analyzer. Nothing is mutated between
//! runs.

use crate::config::SystemConstants;
use crate::error::{AnalysisResult, ConfigurationError};
use crate::report::{AnalysisReport, ImpactAnalyzer};
use crate::types::{ImprovementFactor, ImprovementFactors, InputTables, ScenarioRow, SensitivityRow};
use crate::util::{format_number, format_payback, format_pct};
use serde::Serialize;

/// Most values a single sweep axis may produce.
pub const MAX_SWEEP_POINTS: usize = 1_000;

#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    pub key: String,
    pub name: String,
    pub factors: ImprovementFactors,
}

impl Scenario {
    /// A scenario that overrides the admin, processing, error and throughput
    /// factors and keeps the default cost reduction.
    pub fn new(
        key: &str,
        name: &str,
        admin_efficiency_gain: f64,
        processing_speed_gain: f64,
        error_reduction: f64,
        throughput_increase: f64,
    ) -> Self {
        let factors = ImprovementFactors::default()
            .with(ImprovementFactor::AdminEfficiencyGain, admin_efficiency_gain)
            .with(ImprovementFactor::ProcessingSpeedGain, processing_speed_gain)
            .with(ImprovementFactor::ErrorReduction, error_reduction)
            .with(ImprovementFactor::ThroughputIncrease, throughput_increase);
        Self {
            key: key.to_string(),
            name: name.to_string(),
            factors,
        }
    }
}

pub fn preset_scenarios() -> Vec<Scenario> {
    vec![
        Scenario::new("conservative", "Conservative Scenario", 0.30, 0.50, 0.50, 0.15),
        Scenario::new("moderate", "Moderate Scenario", 0.40, 0.60, 0.65, 0.20),
        Scenario::new("optimistic", "Optimistic Scenario", 0.52, 0.75, 0.76, 0.24),
        Scenario::new("aggressive", "Aggressive Scenario", 0.65, 0.85, 0.85, 0.30),
    ]
}

#[derive(Debug, Clone)]
pub struct ScenarioOutcome {
    pub scenario: Scenario,
    pub report: AnalysisReport,
}

/// Headline figures per scenario, keyed by scenario key when exported.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioSummary {
    pub annual_savings_scaled: f64,
    pub roi_percentage: f64,
    pub payback_period_years: Option<u32>,
    pub admin_time_reduction: f64,
    pub error_reduction: f64,
    pub throughput_increase: f64,
}

impl ScenarioOutcome {
    pub fn summary(&self) -> ScenarioSummary {
        let s = self.report.summary();
        ScenarioSummary {
            annual_savings_scaled: s.total_annual_savings_scaled,
            roi_percentage: s.total_roi_percentage,
            payback_period_years: s.payback_period_years,
            admin_time_reduction: s.admin_time_reduction_percentage,
            error_reduction: s.error_reduction_percentage,
            throughput_increase: s.throughput_increase_percentage,
        }
    }

    /// Numeric record for the comparison CSV.
    pub fn record(&self) -> ScenarioRecord {
        let s = self.report.summary();
        ScenarioRecord {
            scenario: self.scenario.key.clone(),
            name: self.scenario.name.clone(),
            annual_savings_scaled: s.total_annual_savings_scaled,
            roi_percentage: s.total_roi_percentage,
            payback_period_years: s.payback_period_years,
            admin_time_reduction_percentage: s.admin_time_reduction_percentage,
            error_reduction_percentage: s.error_reduction_percentage,
            throughput_increase_percentage: s.throughput_increase_percentage,
        }
    }

    /// Formatted row for the console preview.
    pub fn row(&self) -> ScenarioRow {
        let s = self.report.summary();
        ScenarioRow {
            scenario: self.scenario.name.clone(),
            annual_savings: format_number(s.total_annual_savings_scaled, 2),
            roi_percentage: format_number(s.total_roi_percentage, 1),
            payback: format_payback(s.payback_period_years),
            admin_time_reduction: format_pct(s.admin_time_reduction_percentage),
            error_reduction: format_pct(s.error_reduction_percentage),
            throughput_increase: format_pct(s.throughput_increase_percentage),
        }
    }
}

/// One scenario in `scenario_comparison.csv`. An empty payback cell means
/// payback is not reached within the horizon.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioRecord {
    pub scenario: String,
    pub name: String,
    pub annual_savings_scaled: f64,
    pub roi_percentage: f64,
    pub payback_period_years: Option<u32>,
    pub admin_time_reduction_percentage: f64,
    pub error_reduction_percentage: f64,
    pub throughput_increase_percentage: f64,
}

/// Runs each scenario against the same tables. Outcomes keep input order;
/// the first failing scenario aborts the comparison.
pub fn compare_scenarios(
    analyzer: &ImpactAnalyzer,
    tables: &InputTables,
    scenarios: &[Scenario],
) -> AnalysisResult<Vec<ScenarioOutcome>> {
    scenarios
        .iter()
        .map(|scenario| -> AnalysisResult<ScenarioOutcome> {
            log::info!("running scenario '{}'", scenario.key);
            let report = analyzer.generate_report(tables, scenario.factors.clone())?;
            Ok(ScenarioOutcome {
                scenario: scenario.clone(),
                report,
            })
        })
        .collect()
}

/// An inclusive `start..=end` range sampled every `step`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepRange {
    pub start: f64,
    pub end: f64,
    pub step: f64,
}

impl SweepRange {
    pub fn new(start: f64, end: f64, step: f64) -> Self {
        Self { start, end, step }
    }

    /// Values are computed as `start + i * step` so rounding does not
    /// accumulate; a small tolerance keeps `end` itself in the range. At most
    /// `MAX_SWEEP_POINTS` values are produced.
    pub fn values(&self, name: &'static str) -> Result<Vec<f64>, ConfigurationError> {
        if !(self.step.is_finite() && self.step > 0.0) {
            return Err(ConfigurationError::InvalidRange {
                name,
                reason: format!("step must be positive, got {}", self.step),
            });
        }
        if !(self.start.is_finite() && self.end.is_finite()) || self.end < self.start {
            return Err(ConfigurationError::InvalidRange {
                name,
                reason: format!("empty range {}..={}", self.start, self.end),
            });
        }
        let intervals = ((self.end - self.start) / self.step + 1e-9).floor();
        if intervals >= MAX_SWEEP_POINTS as f64 {
            return Err(ConfigurationError::InvalidRange {
                name,
                reason: format!(
                    "step {} yields more than {} values",
                    self.step, MAX_SWEEP_POINTS
                ),
            });
        }
        let count = intervals as usize + 1;
        Ok((0..count)
            .map(|i| self.start + i as f64 * self.step)
            .collect())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SensitivityRanges {
    pub admin_efficiency: SweepRange,
    pub error_cost_multiplier: SweepRange,
}

impl Default for SensitivityRanges {
    fn default() -> Self {
        Self {
            admin_efficiency: SweepRange::new(0.20, 0.70, 0.10),
            error_cost_multiplier: SweepRange::new(1.0, 2.0, 0.2),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensitivityPoint {
    pub admin_efficiency: f64,
    pub cost_multiplier: f64,
    pub annual_savings_scaled: f64,
    pub roi_percentage: f64,
    pub payback_years: Option<u32>,
}

impl SensitivityPoint {
    pub fn row(&self) -> SensitivityRow {
        SensitivityRow {
            admin_efficiency: format_number(self.admin_efficiency, 2),
            cost_multiplier: format_number(self.cost_multiplier, 1),
            annual_savings: format_number(self.annual_savings_scaled, 2),
            roi_percentage: format_number(self.roi_percentage, 1),
            payback_years: self
                .payback_years
                .map(|y| y.to_string())
                .unwrap_or_else(|| "-".to_string()),
        }
    }
}

/// Sweeps admin efficiency against the error-cost multiplier, holding every
/// other factor at `base_factors`.
pub fn sensitivity_grid(
    analyzer: &ImpactAnalyzer,
    tables: &InputTables,
    base_factors: &ImprovementFactors,
    ranges: &SensitivityRanges,
) -> AnalysisResult<Vec<SensitivityPoint>> {
    let admin_values = ranges.admin_efficiency.values("admin_efficiency")?;
    let multiplier_values = ranges.error_cost_multiplier.values("error_cost_multiplier")?;

    let mut points = Vec::with_capacity(admin_values.len() * multiplier_values.len());
    for &admin_efficiency in &admin_values {
        for &cost_multiplier in &multiplier_values {
            let run_analyzer = analyzer.with_constants(SystemConstants {
                error_cost_multiplier: cost_multiplier,
                ..analyzer.constants().clone()
            })?;
            let factors = base_factors
                .clone()
                .with(ImprovementFactor::AdminEfficiencyGain, admin_efficiency);
            let report = run_analyzer.generate_report(tables, factors)?;
            let summary = report.summary();
            points.push(SensitivityPoint {
                admin_efficiency,
                cost_multiplier,
                annual_savings_scaled: summary.total_annual_savings_scaled,
                roi_percentage: summary.total_roi_percentage,
                payback_years: summary.payback_period_years,
            });
        }
    }
    log::info!("sensitivity grid: {} points", points.len());
    Ok(points)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensitivitySummary {
    pub min_annual_savings_scaled: f64,
    pub max_annual_savings_scaled: f64,
    pub min_roi_percentage: f64,
    pub max_roi_percentage: f64,
    /// Extremes over the points that reach payback at all.
    pub min_payback_years: Option<u32>,
    pub max_payback_years: Option<u32>,
}

pub fn summarize_sensitivity(points: &[SensitivityPoint]) -> Option<SensitivitySummary> {
    if points.is_empty() {
        return None;
    }
    let fold_min = |f: fn(&SensitivityPoint) -> f64| {
        points.iter().map(f).fold(f64::INFINITY, f64::min)
    };
    let fold_max = |f: fn(&SensitivityPoint) -> f64| {
        points.iter().map(f).fold(f64::NEG_INFINITY, f64::max)
    };
    let paybacks = points.iter().filter_map(|p| p.payback_years);
    Some(SensitivitySummary {
        min_annual_savings_scaled: fold_min(|p| p.annual_savings_scaled),
        max_annual_savings_scaled: fold_max(|p| p.annual_savings_scaled),
        min_roi_percentage: fold_min(|p| p.roi_percentage),
        max_roi_percentage: fold_max(|p| p.roi_percentage),
        min_payback_years: paybacks.clone().min(),
        max_payback_years: paybacks.max(),
    })
}
