//! Multi-year ROI projection with payback detection.
//!
//! ROI percentages are expressed against the upfront investment. With no
//! upfront investment there is no base to measure against, and every ROI
//! figure is reported as 0. Every figure in a projection is finite; an
//! overflow anywhere is a `DataError::NonFinite`.

use crate::config::AnalysisParams;
use crate::error::{AnalysisResult, ConfigurationError};
use crate::types::{InputTables, Provenance};
use crate::util::ensure_finite;
use serde::{Deserialize, Serialize};

pub const FALLBACK_UPFRONT_COST: f64 = 3e12;
pub const FALLBACK_ANNUAL_RECURRING_COST: f64 = 0.6e12;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestmentCosts {
    pub upfront_cost: f64,
    pub annual_recurring_cost: f64,
    /// Reported alongside the projection; not part of the ROI base.
    pub training_cost: f64,
    pub provenance: Provenance,
}

impl InvestmentCosts {
    pub fn new(upfront_cost: f64, annual_recurring_cost: f64) -> Self {
        Self {
            upfront_cost,
            annual_recurring_cost,
            training_cost: 0.0,
            provenance: Provenance::Computed,
        }
    }

    /// Sums the phase rows of the intervention-costs table, or uses the
    /// documented fallback when the table is empty.
    pub fn from_tables(tables: &InputTables) -> Self {
        let phases = &tables.intervention_costs;
        if phases.is_empty() {
            log::warn!(
                "intervention costs unavailable, using fallback upfront {} and recurring {}",
                FALLBACK_UPFRONT_COST,
                FALLBACK_ANNUAL_RECURRING_COST
            );
            return Self {
                upfront_cost: FALLBACK_UPFRONT_COST,
                annual_recurring_cost: FALLBACK_ANNUAL_RECURRING_COST,
                training_cost: 0.0,
                provenance: Provenance::Fallback,
            };
        }
        Self {
            upfront_cost: phases.iter().map(|p| p.upfront_cost).sum(),
            annual_recurring_cost: phases.iter().map(|p| p.annual_maintenance).sum(),
            training_cost: phases.iter().map(|p| p.training_cost).sum(),
            provenance: Provenance::Computed,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let fields = [
            ("upfront_cost", self.upfront_cost),
            ("annual_recurring_cost", self.annual_recurring_cost),
            ("training_cost", self.training_cost),
        ];
        for (name, value) in fields {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigurationError::NegativeConstant { name, value });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearProjection {
    pub year: u32,
    pub savings: f64,
    pub costs: f64,
    pub net_benefit: f64,
    pub cumulative_net: f64,
    pub roi_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoiProjection {
    pub yearly: Vec<YearProjection>,
    pub total_roi_percentage: f64,
    /// First year whose cumulative net benefit is non-negative; `None` when
    /// the horizon ends first.
    pub payback_period_years: Option<u32>,
    pub total_investment: f64,
    pub total_savings: f64,
    pub net_benefit: f64,
    pub net_present_value: f64,
}

impl RoiProjection {
    pub fn horizon_years(&self) -> u32 {
        self.yearly.len() as u32
    }
}

fn roi_pct(cumulative_net: f64, upfront_cost: f64) -> f64 {
    if upfront_cost > 0.0 {
        cumulative_net / upfront_cost * 100.0
    } else {
        0.0
    }
}

/// Horizon and cost problems are `ConfigurationError`s; non-finite savings
/// or an overflowing projection are `DataError`s.
pub fn project_roi(
    annual_savings: f64,
    costs: &InvestmentCosts,
    params: &AnalysisParams,
) -> AnalysisResult<RoiProjection> {
    params.validate()?;
    costs.validate()?;
    ensure_finite("annual_savings", annual_savings)?;

    let years = params.roi_analysis_years;
    let upfront = costs.upfront_cost;
    let mut yearly = Vec::with_capacity(years as usize);
    let mut cumulative_net = 0.0;
    let mut discounted_net = 0.0;
    let mut payback_period_years = None;

    for year in 1..=years {
        let exponent = (year - 1) as i32;
        let savings = ensure_finite(
            "yearly savings",
            annual_savings * (1.0 + params.savings_growth_rate).powi(exponent),
        )?;
        let yearly_costs = costs.annual_recurring_cost;
        let net = savings - yearly_costs;
        cumulative_net = ensure_finite("cumulative_net", cumulative_net + net)?;
        discounted_net = ensure_finite(
            "discounted net benefit",
            discounted_net + net / (1.0 + params.discount_rate).powi(year as i32),
        )?;

        if payback_period_years.is_none() && cumulative_net >= 0.0 {
            payback_period_years = Some(year);
        }

        yearly.push(YearProjection {
            year,
            savings,
            costs: yearly_costs,
            net_benefit: net,
            cumulative_net,
            roi_percentage: ensure_finite("roi_percentage", roi_pct(cumulative_net, upfront))?,
        });
    }

    let projection = RoiProjection {
        yearly,
        total_roi_percentage: ensure_finite(
            "total_roi_percentage",
            roi_pct(cumulative_net, upfront),
        )?,
        payback_period_years,
        total_investment: ensure_finite(
            "total_investment",
            upfront + costs.annual_recurring_cost * years as f64,
        )?,
        total_savings: ensure_finite("total_savings", cumulative_net + upfront)?,
        net_benefit: cumulative_net,
        net_present_value: ensure_finite("net_present_value", discounted_net - upfront)?,
    };
    log::debug!(
        "roi over {} years: {:.1}%, payback {:?}",
        years,
        projection.total_roi_percentage,
        projection.payback_period_years
    );
    Ok(projection)
}
