//! Analysis configuration: improvement factors, system constants and
//! projection parameters.
//!
//! Sections merge at the top level only. A config file that supplies
//! `improvement_factors` replaces the whole default factor set, so leaving a
//! factor out of that object is reported when a run needs it.

use crate::error::{AnalysisResult, ConfigurationError};
use crate::types::ImprovementFactors;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Longest projection the engine will build.
pub const MAX_HORIZON_YEARS: u32 = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConstants {
    /// Units (patients) served per year.
    pub annual_units_served: f64,
    pub average_hourly_wage: f64,
    pub error_cost_multiplier: f64,
    /// Total yearly system expenditure before the intervention.
    pub total_system_cost: f64,
    /// Share of per-unit cost that comes back as revenue for extra throughput.
    pub recoverable_revenue_fraction: f64,
    /// Share of processing time that is paid staff time.
    pub paid_staff_time_fraction: f64,
    pub units_per_worker_baseline: f64,
    // Population context kept with the constants for exported configs. No
    // savings or ROI formula reads these three.
    pub aging_population_pct: f64,
    pub admin_cost_pct: f64,
    pub total_population: f64,
}

impl Default for SystemConstants {
    fn default() -> Self {
        Self {
            annual_units_served: 47_000_000.0,
            average_hourly_wage: 3_000.0,
            error_cost_multiplier: 1.5,
            total_system_cost: 45e12,
            recoverable_revenue_fraction: 0.7,
            paid_staff_time_fraction: 0.1,
            units_per_worker_baseline: 20.0,
            aging_population_pct: 0.291,
            admin_cost_pct: 0.016,
            total_population: 125_000_000.0,
        }
    }
}

impl SystemConstants {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let non_negative = [
            ("annual_units_served", self.annual_units_served),
            ("average_hourly_wage", self.average_hourly_wage),
            ("error_cost_multiplier", self.error_cost_multiplier),
            ("total_system_cost", self.total_system_cost),
            ("units_per_worker_baseline", self.units_per_worker_baseline),
            ("total_population", self.total_population),
        ];
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigurationError::NegativeConstant { name, value });
            }
        }
        let fractions = [
            ("recoverable_revenue_fraction", self.recoverable_revenue_fraction),
            ("paid_staff_time_fraction", self.paid_staff_time_fraction),
            ("aging_population_pct", self.aging_population_pct),
            ("admin_cost_pct", self.admin_cost_pct),
        ];
        for (name, value) in fractions {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigurationError::FractionOutOfRange { name, value });
            }
        }
        Ok(())
    }
}

/// Unknown keys are rejected so a rate the projection does not model is
/// reported instead of ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisParams {
    pub roi_analysis_years: u32,
    /// Yearly compounding applied to savings as the rollout matures.
    pub savings_growth_rate: f64,
    /// Used for the net present value of the projection.
    pub discount_rate: f64,
}

impl Default for AnalysisParams {
    fn default() -> Self {
        Self {
            roi_analysis_years: 5,
            savings_growth_rate: 0.05,
            discount_rate: 0.03,
        }
    }
}

impl AnalysisParams {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if !(1..=MAX_HORIZON_YEARS).contains(&self.roi_analysis_years) {
            return Err(ConfigurationError::InvalidHorizon {
                years: self.roi_analysis_years,
            });
        }
        // Growth may be negative (shrinking savings); it only has to keep the
        // compounding base positive.
        if !(self.savings_growth_rate.is_finite() && self.savings_growth_rate > -1.0) {
            return Err(ConfigurationError::FractionOutOfRange {
                name: "savings_growth_rate",
                value: self.savings_growth_rate,
            });
        }
        if !(self.discount_rate.is_finite() && self.discount_rate > -1.0) {
            return Err(ConfigurationError::FractionOutOfRange {
                name: "discount_rate",
                value: self.discount_rate,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub data_dir: String,
    pub results_dir: String,
    /// Divisor applied to monetary totals in the report summary.
    pub currency_scale: f64,
    pub currency_unit: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            data_dir: "data/".to_string(),
            results_dir: "results/".to_string(),
            currency_scale: 1e12,
            currency_unit: "trillion yen".to_string(),
        }
    }
}

impl OutputConfig {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if !(self.currency_scale.is_finite() && self.currency_scale > 0.0) {
            return Err(ConfigurationError::NegativeConstant {
                name: "currency_scale",
                value: self.currency_scale,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub improvement_factors: ImprovementFactors,
    pub system_constants: SystemConstants,
    pub analysis_params: AnalysisParams,
    pub output: OutputConfig,
}

/// Load configuration from a JSON file.
///
/// `None` or a path that does not exist yields the defaults. A file that
/// exists but does not parse is an error rather than a silent default.
pub fn load_config(path: Option<&Path>) -> AnalysisResult<AnalysisConfig> {
    let Some(path) = path else {
        return Ok(AnalysisConfig::default());
    };
    if !path.exists() {
        log::warn!(
            "config file {} not found, using default configuration",
            path.display()
        );
        return Ok(AnalysisConfig::default());
    }
    let text = std::fs::read_to_string(path)?;
    let config: AnalysisConfig = serde_json::from_str(&text)?;
    log::info!("loaded configuration from {}", path.display());
    Ok(config)
}

pub fn save_config(config: &AnalysisConfig, path: &Path) -> AnalysisResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let s = serde_json::to_string_pretty(config)?;
    std::fs::write(path, s)?;
    Ok(())
}
